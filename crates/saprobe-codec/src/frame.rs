//! 解码后的帧数据 (Frame).

use saprobe_core::{PcmFormat, Rational};

use crate::packet::NOPTS_VALUE;

/// 音频帧
///
/// 交错小端有符号 PCM, 每个样本占 `format.bit_depth.bytes_per_sample()` 字节.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// 交错 PCM 数据
    pub data: Vec<u8>,
    /// 本帧包含的采样数 (每声道)
    pub nb_samples: u32,
    /// PCM 格式
    pub format: PcmFormat,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 时间基
    pub time_base: Rational,
    /// 帧时长 (以 time_base 为单位)
    pub duration: i64,
}

impl AudioFrame {
    /// 用已解码数据创建音频帧, 采样数由数据长度推出
    pub fn new(data: Vec<u8>, format: PcmFormat) -> Self {
        let frame_bytes = format.frame_bytes();
        let nb_samples = if frame_bytes == 0 {
            0
        } else {
            (data.len() / frame_bytes) as u32
        };
        Self {
            data,
            nb_samples,
            format,
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
        }
    }
}

/// 帧
#[derive(Debug, Clone)]
pub enum Frame {
    /// 音频帧
    Audio(AudioFrame),
}

impl Frame {
    /// 取出音频帧
    pub fn into_audio(self) -> AudioFrame {
        match self {
            Frame::Audio(af) => af,
        }
    }
}
