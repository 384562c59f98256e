//! 解封装器 (Demuxer) trait 定义.

use saprobe_codec::Packet;
use saprobe_core::SaprobeResult;

use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::stream::Stream;

/// 解封装器 trait
///
/// 使用流程:
/// 1. 调用 `open()` 打开容器并解析头部
/// 2. 调用 `streams()` 获取流信息
/// 3. 循环调用 `read_packet()` 读取数据包, 直到返回 `Eof`
pub trait Demuxer: Send {
    /// 获取格式标识
    fn format_id(&self) -> FormatId;

    /// 获取格式名称
    fn name(&self) -> &str;

    /// 打开容器并解析头部信息
    fn open(&mut self, io: &mut IoContext) -> SaprobeResult<()>;

    /// 获取所有流信息
    fn streams(&self) -> &[Stream];

    /// 读取下一个数据包
    ///
    /// # 返回
    /// - `Err(SaprobeError::Eof)`: 已到达末尾
    fn read_packet(&mut self, io: &mut IoContext) -> SaprobeResult<Packet>;

    /// 获取容器时长 (秒), None 表示未知
    fn duration(&self) -> Option<f64>;
}
