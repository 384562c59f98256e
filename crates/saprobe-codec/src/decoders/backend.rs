//! symphonia 后端整文件解码.
//!
//! FLAC 保留原生位深, 有损格式 (MP3/Vorbis/AAC) 统一输出 16 位.
//! symphonia 自行完成容器解析, 这里只负责把解码缓冲区转成交错小端 PCM.

use std::io::Cursor;

use log::{debug, warn};
use saprobe_core::{BitDepth, PcmFormat, SaprobeError, SaprobeResult};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::conv::ConvertibleSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::codec_id::CodecId;

/// 整文件解码结果
#[derive(Debug, Clone)]
pub struct BackendAudio {
    /// 交错小端 PCM
    pub pcm: Vec<u8>,
    /// PCM 格式
    pub format: PcmFormat,
}

/// 样本输出方式
enum Sink {
    /// 满幅 i32 右移回原生位深
    Native {
        depth: BitDepth,
        buf: Option<SampleBuffer<i32>>,
    },
    /// 浮点样本量化为 16 位
    Lossy { buf: Option<SampleBuffer<f32>> },
}

impl Sink {
    fn bit_depth(&self) -> BitDepth {
        match self {
            Sink::Native { depth, .. } => *depth,
            Sink::Lossy { .. } => BitDepth::Depth16,
        }
    }

    fn push(&mut self, decoded: AudioBufferRef<'_>, out: &mut Vec<u8>) {
        match self {
            Sink::Native { depth, buf } => {
                let buf = sample_buffer(buf, &decoded);
                buf.copy_interleaved_ref(decoded);
                for &s in buf.samples() {
                    pack_native(s, *depth, out);
                }
            }
            Sink::Lossy { buf } => {
                let buf = sample_buffer(buf, &decoded);
                buf.copy_interleaved_ref(decoded);
                for &s in buf.samples() {
                    out.extend_from_slice(&f32_to_s16(s).to_le_bytes());
                }
            }
        }
    }
}

/// 复用样本缓冲区, 容量不足时重建
fn sample_buffer<'a, S: ConvertibleSample>(
    slot: &'a mut Option<SampleBuffer<S>>,
    decoded: &AudioBufferRef<'_>,
) -> &'a mut SampleBuffer<S> {
    let spec = *decoded.spec();
    let frames = decoded.capacity();
    let needed = frames * spec.channels.count();
    if slot.as_ref().is_none_or(|b| b.capacity() < needed) {
        *slot = None;
    }
    slot.get_or_insert_with(|| SampleBuffer::new(frames as u64, spec))
}

/// 满幅 i32 样本按容器字节数左对齐写出, 20 位因此落在 3 字节的高 20 位
fn pack_native(sample: i32, depth: BitDepth, out: &mut Vec<u8>) {
    let bytes = depth.bytes_per_sample();
    let shifted = sample >> (32 - 8 * bytes as u32);
    out.extend_from_slice(&shifted.to_le_bytes()[..bytes]);
}

/// 浮点样本量化为 16 位, 越界钳位
fn f32_to_s16(sample: f32) -> i16 {
    (f64::from(sample) * f64::from(i16::MAX))
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// 使用 symphonia 解码整个文件
///
/// 只接受 FLAC/MP3/Vorbis/AAC, 其余返回 `Unsupported`.
pub fn decode_whole(data: Vec<u8>, codec: CodecId) -> SaprobeResult<BackendAudio> {
    let extension = match codec {
        CodecId::Flac => "flac",
        CodecId::Mp3 => "mp3",
        CodecId::Vorbis => "ogg",
        CodecId::Aac => "m4a",
        other => {
            return Err(SaprobeError::Unsupported(format!(
                "symphonia 后端不处理 {}",
                other
            )));
        }
    };

    let mut hint = Hint::new();
    hint.with_extension(extension);
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    // MP3 按 LAME 头裁掉编码器延迟与填充
    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| SaprobeError::Format(format!("symphonia 探测 {} 失败: {}", codec, e)))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SaprobeError::Format("未找到音频轨道".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u32)
        .unwrap_or(0);

    let mut sink = if codec == CodecId::Flac {
        let bits = track
            .codec_params
            .bits_per_sample
            .ok_or_else(|| SaprobeError::Format("FLAC 流缺少位深".into()))?;
        Sink::Native {
            depth: BitDepth::from_bits(bits)?,
            buf: None,
        }
    } else {
        Sink::Lossy { buf: None }
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SaprobeError::Codec(format!("创建 {} 解码器失败: {}", codec, e)))?;

    debug!(
        "symphonia 解码 {}: {} Hz, {} 声道, 输出 {}",
        codec,
        sample_rate,
        channels,
        sink.bit_depth(),
    );

    let mut pcm = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(SaprobeError::Format(format!("读取数据包失败: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("跳过无法解码的数据包: {}", msg);
                continue;
            }
            Err(e) => return Err(SaprobeError::Codec(format!("{} 解码失败: {}", codec, e))),
        };

        // 部分容器直到首帧才给出声道与采样率
        let spec = *decoded.spec();
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        if channels == 0 {
            channels = spec.channels.count() as u32;
        }
        sink.push(decoded, &mut pcm);
    }

    if sample_rate == 0 || channels == 0 {
        return Err(SaprobeError::Format("无法确定采样率或声道数".into()));
    }

    Ok(BackendAudio {
        pcm,
        format: PcmFormat {
            sample_rate,
            bit_depth: sink.bit_depth(),
            channels,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_原生位深打包() {
        let mut out = Vec::new();
        pack_native(0x1234_0000, BitDepth::Depth16, &mut out);
        pack_native(-256, BitDepth::Depth24, &mut out);
        pack_native(0x7FFF_F000, BitDepth::Depth20, &mut out);
        pack_native(-2, BitDepth::Depth32, &mut out);
        assert_eq!(
            out,
            [
                0x34, 0x12, // 16
                0xFF, 0xFF, 0xFF, // 24
                0xF0, 0xFF, 0x7F, // 20, 左对齐到 24
                0xFE, 0xFF, 0xFF, 0xFF, // 32
            ]
        );
    }

    #[test]
    fn test_浮点量化与钳位() {
        assert_eq!(f32_to_s16(0.0), 0);
        assert_eq!(f32_to_s16(1.0), 32767);
        assert_eq!(f32_to_s16(-1.0), -32767);
        assert_eq!(f32_to_s16(2.5), 32767);
        assert_eq!(f32_to_s16(-3.0), -32768);
        assert_eq!(f32_to_s16(0.5), 16384);
    }

    #[test]
    fn test_不支持的编解码器() {
        let err = decode_whole(Vec::new(), CodecId::Alac).unwrap_err();
        assert!(matches!(err, SaprobeError::Unsupported(_)));
    }

    #[test]
    fn test_损坏数据报格式错误() {
        let err = decode_whole(vec![0u8; 64], CodecId::Flac).unwrap_err();
        assert!(matches!(err, SaprobeError::Format(_)));
    }
}
