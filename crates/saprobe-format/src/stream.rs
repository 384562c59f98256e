//! 流信息定义.

use saprobe_codec::{AudioCodecParams, CodecId, CodecParameters, CodecParamsType};
use saprobe_core::{BitDepth, ChannelLayout, Rational};

/// 音频流信息
#[derive(Debug, Clone)]
pub struct Stream {
    /// 流索引 (从 0 开始)
    pub index: usize,
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 时间基
    pub time_base: Rational,
    /// 流时长 (以 time_base 为单位, -1 表示未知)
    pub duration: i64,
    /// 总帧数 (0 表示未知)
    pub nb_frames: u64,
    /// 编解码器私有数据 (ALAC magic cookie)
    pub extra_data: Vec<u8>,
    /// 音频参数
    pub params: AudioStreamParams,
}

/// 音频流参数
#[derive(Debug, Clone)]
pub struct AudioStreamParams {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 位深
    pub bit_depth: BitDepth,
    /// 码率 (bps, 0 表示未知)
    pub bit_rate: u64,
    /// 每帧采样数 (0 表示可变)
    pub frame_size: u32,
}

impl Stream {
    /// 生成打开解码器所需的参数
    pub fn codec_parameters(&self) -> CodecParameters {
        CodecParameters {
            codec_id: self.codec_id,
            extra_data: self.extra_data.clone(),
            bit_rate: self.params.bit_rate,
            params: CodecParamsType::Audio(AudioCodecParams {
                sample_rate: self.params.sample_rate,
                channel_layout: self.params.channel_layout,
                bit_depth: self.params.bit_depth,
                frame_size: self.params.frame_size,
            }),
        }
    }
}
