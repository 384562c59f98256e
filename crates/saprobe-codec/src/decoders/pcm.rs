//! PCM 音频解码器.
//!
//! 小端有符号 PCM 原样透传, 按 block_align 切分采样.

use log::debug;
use saprobe_core::{BitDepth, PcmFormat, SaprobeError, SaprobeResult};

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::decoder::Decoder;
use crate::frame::{AudioFrame, Frame};
use crate::packet::Packet;

/// PCM 音频解码器
pub struct PcmDecoder {
    codec_id: CodecId,
    bit_depth: BitDepth,
    /// 打开后确定的输出格式
    format: Option<PcmFormat>,
    output_frame: Option<Frame>,
    flushing: bool,
}

impl PcmDecoder {
    fn create(codec_id: CodecId, bit_depth: BitDepth) -> SaprobeResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            codec_id,
            bit_depth,
            format: None,
            output_frame: None,
            flushing: false,
        }))
    }

    pub fn new_s16le() -> SaprobeResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS16le, BitDepth::Depth16)
    }

    pub fn new_s24le() -> SaprobeResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS24le, BitDepth::Depth24)
    }

    pub fn new_s32le() -> SaprobeResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS32le, BitDepth::Depth32)
    }
}

impl Decoder for PcmDecoder {
    fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    fn name(&self) -> &str {
        self.codec_id.name()
    }

    fn open(&mut self, params: &CodecParameters) -> SaprobeResult<()> {
        let audio = params
            .audio()
            .ok_or_else(|| SaprobeError::InvalidArgument("PCM 解码器需要音频参数".into()))?;

        if audio.sample_rate == 0 {
            return Err(SaprobeError::InvalidArgument("采样率不能为 0".into()));
        }
        if audio.channel_layout.channels == 0 {
            return Err(SaprobeError::InvalidArgument("声道数不能为 0".into()));
        }

        let format = PcmFormat {
            sample_rate: audio.sample_rate,
            bit_depth: self.bit_depth,
            channels: audio.channel_layout.channels,
        };
        self.format = Some(format);
        self.output_frame = None;
        self.flushing = false;

        debug!("打开 {} 解码器: {}", self.name(), format);
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> SaprobeResult<()> {
        let format = self
            .format
            .ok_or_else(|| SaprobeError::Codec("解码器未打开, 请先调用 open()".into()))?;
        if self.output_frame.is_some() {
            return Err(SaprobeError::NeedMoreData);
        }

        // 空包 = flush
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }

        let block_align = format.frame_bytes();
        if packet.data.len() % block_align != 0 {
            return Err(SaprobeError::InvalidData(format!(
                "数据大小 {} 不是 block_align {} 的整数倍",
                packet.data.len(),
                block_align,
            )));
        }

        let mut frame = AudioFrame::new(packet.data.to_vec(), format);
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = packet.duration;
        self.output_frame = Some(Frame::Audio(frame));
        Ok(())
    }

    fn receive_frame(&mut self) -> SaprobeResult<Frame> {
        if let Some(frame) = self.output_frame.take() {
            return Ok(frame);
        }
        if self.flushing {
            return Err(SaprobeError::Eof);
        }
        Err(SaprobeError::NeedMoreData)
    }

    fn flush(&mut self) {
        self.output_frame = None;
        self.flushing = false;
    }
}
