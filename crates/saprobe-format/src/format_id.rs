//! 容器格式标识符.

use std::fmt;

/// 容器格式标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FormatId {
    /// MPEG-4 Part 14 / QuickTime (M4A)
    Mp4,
    /// WAV (RIFF WAVE)
    Wav,
}

impl FormatId {
    /// 获取格式名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Wav => "wav",
        }
    }

    /// 常见文件扩展名
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Mp4 => &["m4a", "mp4", "mov"],
            Self::Wav => &["wav"],
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
