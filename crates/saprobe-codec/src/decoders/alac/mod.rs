//! ALAC (Apple Lossless) 解码器.
//!
//! 码流按层拆分:
//! - `bitcursor`: MSB 优先位读取
//! - `entropy`: 自适应 Golomb 残差解码
//! - `predictor`: 自适应 FIR 预测还原
//! - `matrix`: 立体声反混合与 PCM 打包
//! - `element`: 数据包元素状态机
//!
//! `PacketDecoder` 可脱离框架单独使用, `AlacDecoder` 把它接入 `Decoder` trait.

mod bitcursor;
mod config;
mod element;
mod entropy;
mod matrix;
mod predictor;

pub use config::{AlacConfig, CONFIG_SIZE};
pub use element::PacketDecoder;

use log::debug;
use saprobe_core::{SaprobeError, SaprobeResult};

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::decoder::Decoder;
use crate::frame::{AudioFrame, Frame};
use crate::packet::Packet;

/// ALAC 解码器
pub struct AlacDecoder {
    inner: Option<PacketDecoder>,
    output_frame: Option<Frame>,
    flushing: bool,
}

impl AlacDecoder {
    /// 创建解码器实例 (工厂函数)
    pub fn create() -> SaprobeResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            inner: None,
            output_frame: None,
            flushing: false,
        }))
    }
}

impl Decoder for AlacDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Alac
    }

    fn name(&self) -> &str {
        "alac"
    }

    fn open(&mut self, params: &CodecParameters) -> SaprobeResult<()> {
        let config = AlacConfig::parse(&params.extra_data)?;
        let inner = PacketDecoder::new(config)?;
        debug!(
            "打开 ALAC 解码器: {}, 帧长 {}, pb={} mb={} kb={}",
            inner.format(),
            config.frame_length,
            config.pb,
            config.mb,
            config.kb,
        );
        self.inner = Some(inner);
        self.output_frame = None;
        self.flushing = false;
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> SaprobeResult<()> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| SaprobeError::Codec("解码器未打开, 请先调用 open()".into()))?;
        if self.output_frame.is_some() {
            return Err(SaprobeError::NeedMoreData);
        }

        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }

        let pcm = inner.decode_packet(&packet.data)?;
        let mut frame = AudioFrame::new(pcm, inner.format());
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
