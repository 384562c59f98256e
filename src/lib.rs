//! # saprobe
//!
//! 纯 Rust 音频解码库: 识别输入格式, 解码为交错小端有符号 PCM.
//!
//! - **ALAC**: 原生解码器 (MP4/M4A 容器)
//! - **WAV**: PCM 直通
//! - **FLAC / MP3 / Vorbis / AAC**: 经由 symphonia (`symphonia-backend` 特性)
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use saprobe::format::IoContext;
//!
//! let mut io = IoContext::open_read("song.m4a")?;
//! let audio = saprobe::decode(&mut io)?;
//! println!("{}: {}, {} 字节 PCM", audio.codec, audio.format, audio.pcm.len());
//! # Ok::<(), saprobe::core::SaprobeError>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `saprobe-core` | 核心类型、错误与位写入工具 |
//! | `saprobe-codec` | 解码器框架与 ALAC 解码器 |
//! | `saprobe-format` | 容器解封装/封装与格式识别 |

use log::debug;

/// 核心类型与工具
pub use saprobe_core as core;

/// 解码器框架
pub use saprobe_codec as codec;

/// 容器格式框架
pub use saprobe_format as format;

pub use saprobe_format::Codec;

use saprobe_codec::{CodecRegistry, Packet};
use saprobe_core::{PcmFormat, SaprobeError, SaprobeResult};
use saprobe_format::{FormatId, FormatRegistry, IoContext};

/// 获取 saprobe 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码器的注册表
pub fn default_codec_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    saprobe_codec::register_all(&mut registry);
    registry
}

/// 创建已注册所有内置容器格式的注册表
pub fn default_format_registry() -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    saprobe_format::register_all(&mut registry);
    registry
}

/// 整个文件的解码结果
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// 交错小端有符号 PCM
    pub pcm: Vec<u8>,
    pub format: PcmFormat,
    /// 识别出的源编解码器
    pub codec: Codec,
}

/// 识别并解码整个输入
pub fn decode(io: &mut IoContext) -> SaprobeResult<DecodedAudio> {
    let codec = saprobe_format::identify(io)?;
    debug!("输入编解码器: {}", codec);

    let (pcm, format) = match codec {
        Codec::Alac => decode_native(io, FormatId::Mp4)?,
        Codec::Wav => decode_native(io, FormatId::Wav)?,
        Codec::Flac | Codec::Mp3 | Codec::Vorbis | Codec::Aac => decode_backend(io, codec)?,
        Codec::Unknown => {
            return Err(SaprobeError::Unsupported("无法识别的音频格式".into()));
        }
    };

    Ok(DecodedAudio { pcm, format, codec })
}

/// 从文件路径解码
pub fn decode_file(path: &str) -> SaprobeResult<DecodedAudio> {
    let mut io = IoContext::open_read(path)?;
    decode(&mut io)
}

/// 原生流水线: 解封装器 → 注册表中的解码器 → 按序拼接 PCM
fn decode_native(io: &mut IoContext, format_id: FormatId) -> SaprobeResult<(Vec<u8>, PcmFormat)> {
    let mut demuxer = default_format_registry().create_demuxer(format_id)?;
    demuxer.open(io)?;
    let stream = demuxer
        .streams()
        .first()
        .cloned()
        .ok_or_else(|| SaprobeError::Format("容器中没有音频流".into()))?;

    let format = PcmFormat {
        sample_rate: stream.params.sample_rate,
        bit_depth: stream.params.bit_depth,
        channels: stream.params.channel_layout.channels,
    };

    let mut decoder = default_codec_registry().create_decoder(stream.codec_id)?;
    decoder.open(&stream.codec_parameters())?;

    let frame_estimate = stream.params.frame_size.max(1) as usize;
    let capacity = (stream.nb_frames as usize)
        .saturating_mul(frame_estimate)
        .saturating_mul(format.frame_bytes())
        .min(1 << 30);
    let mut pcm = Vec::with_capacity(capacity);

    loop {
        let packet = match demuxer.read_packet(io) {
            Ok(packet) => packet,
            Err(SaprobeError::Eof) => break,
            Err(e) => return Err(e),
        };
        decoder.send_packet(&packet)?;
        drain_frames(decoder.as_mut(), &mut pcm)?;
    }

    decoder.send_packet(&Packet::empty())?;
    drain_frames(decoder.as_mut(), &mut pcm)?;

    debug!(
        "{} 解码完成: {}, {} 字节 PCM",
        demuxer.name(),
        format,
        pcm.len()
    );
    Ok((pcm, format))
}

fn drain_frames(decoder: &mut dyn saprobe_codec::Decoder, pcm: &mut Vec<u8>) -> SaprobeResult<()> {
    loop {
        match decoder.receive_frame() {
            Ok(frame) => pcm.extend_from_slice(&frame.into_audio().data),
            Err(SaprobeError::NeedMoreData | SaprobeError::Eof) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

#[cfg(feature = "symphonia-backend")]
fn decode_backend(io: &mut IoContext, codec: Codec) -> SaprobeResult<(Vec<u8>, PcmFormat)> {
    let data = io.read_to_end()?;
    let audio = saprobe_codec::decoders::backend::decode_whole(data, codec.codec_id())?;
    Ok((audio.pcm, audio.format))
}

#[cfg(not(feature = "symphonia-backend"))]
fn decode_backend(_io: &mut IoContext, codec: Codec) -> SaprobeResult<(Vec<u8>, PcmFormat)> {
    Err(SaprobeError::Unsupported(format!(
        "{} 解码需要启用 symphonia-backend 特性",
        codec
    )))
}
