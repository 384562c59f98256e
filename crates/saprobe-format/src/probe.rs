//! 容器格式探测.

use crate::format_id::FormatId;

/// 探测置信度
pub type ProbeScore = u32;

/// 仅扩展名匹配
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 魔数完全匹配
pub const SCORE_MAX: ProbeScore = 100;

/// 探测结果
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// 识别出的格式
    pub format_id: FormatId,
    /// 置信度分数
    pub score: ProbeScore,
}

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据文件头部数据探测格式
    ///
    /// # 返回
    /// - `Some(score)`: 探测成功, 返回置信度
    /// - `None`: 不是此格式
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;

    /// 获取此探测器对应的格式标识
    fn format_id(&self) -> FormatId;
}

/// 文件名扩展名是否属于给定格式
pub(crate) fn extension_matches(filename: Option<&str>, format_id: FormatId) -> bool {
    filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| format_id.extensions().contains(&ext.as_str()))
}
