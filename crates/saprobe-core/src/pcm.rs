//! PCM 输出格式定义.
//!
//! 所有解码器的输出都是交错排列的小端有符号整数 PCM,
//! 这里定义其位深与整体格式描述.

use std::fmt;

use crate::error::{SaprobeError, SaprobeResult};

/// PCM 采样位深
///
/// 20 位采样左对齐存放在 3 个字节中.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 16 位
    Depth16,
    /// 20 位 (3 字节存储)
    Depth20,
    /// 24 位
    Depth24,
    /// 32 位
    Depth32,
}

impl BitDepth {
    /// 由位数构造, 仅接受 16/20/24/32
    pub fn from_bits(bits: u32) -> SaprobeResult<Self> {
        match bits {
            16 => Ok(Self::Depth16),
            20 => Ok(Self::Depth20),
            24 => Ok(Self::Depth24),
            32 => Ok(Self::Depth32),
            other => Err(SaprobeError::Unsupported(format!("{other} 位采样"))),
        }
    }

    /// 位数
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Depth16 => 16,
            Self::Depth20 => 20,
            Self::Depth24 => 24,
            Self::Depth32 => 32,
        }
    }

    /// 每个采样点占用的字节数
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Depth16 => 2,
            Self::Depth20 | Self::Depth24 => 3,
            Self::Depth32 => 4,
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// 解码输出的 PCM 格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 采样位深
    pub bit_depth: BitDepth,
    /// 声道数
    pub channels: u32,
}

impl PcmFormat {
    /// 一个采样帧 (所有声道各一个采样) 的字节数
    pub const fn frame_bytes(&self) -> usize {
        self.bit_depth.bytes_per_sample() * self.channels as usize
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} 位, {} 声道",
            self.sample_rate, self.bit_depth, self.channels
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_位深_字节数() {
        assert_eq!(BitDepth::Depth16.bytes_per_sample(), 2);
        assert_eq!(BitDepth::Depth20.bytes_per_sample(), 3);
        assert_eq!(BitDepth::Depth24.bytes_per_sample(), 3);
        assert_eq!(BitDepth::Depth32.bytes_per_sample(), 4);
    }

    #[test]
    fn test_位深_拒绝非标准值() {
        assert!(BitDepth::from_bits(8).is_err());
        assert_eq!(BitDepth::from_bits(20).unwrap(), BitDepth::Depth20);
    }

    #[test]
    fn test_采样帧字节数() {
        let fmt = PcmFormat {
            sample_rate: 44100,
            bit_depth: BitDepth::Depth24,
            channels: 6,
        };
        assert_eq!(fmt.frame_bytes(), 18);
        assert_eq!(fmt.to_string(), "44100 Hz, 24 位, 6 声道");
    }
}
