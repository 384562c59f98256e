//! 编解码器标识符.

use std::fmt;

/// 编解码器标识符
///
/// 唯一标识一种编解码算法, 与容器格式无关.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知编解码器
    None,
    /// Apple Lossless (ALAC)
    Alac,
    /// FLAC (Free Lossless Audio Codec)
    Flac,
    /// MP3 (MPEG Audio Layer III)
    Mp3,
    /// Vorbis
    Vorbis,
    /// AAC (Advanced Audio Coding)
    Aac,
    /// PCM 有符号 16 位小端
    PcmS16le,
    /// PCM 有符号 24 位小端
    PcmS24le,
    /// PCM 有符号 32 位小端
    PcmS32le,
}

impl CodecId {
    /// 获取编解码器的人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Alac => "alac",
            Self::Flac => "flac",
            Self::Mp3 => "mp3",
            Self::Vorbis => "vorbis",
            Self::Aac => "aac",
            Self::PcmS16le => "pcm_s16le",
            Self::PcmS24le => "pcm_s24le",
            Self::PcmS32le => "pcm_s32le",
        }
    }

    /// 按位深选择 PCM 小端编解码器
    pub const fn pcm_for_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::PcmS16le),
            24 => Some(Self::PcmS24le),
            32 => Some(Self::PcmS32le),
            _ => None,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
