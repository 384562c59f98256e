//! WAV (RIFF WAVE) 解封装器.
//!
//! 文件结构:
//! ```text
//! RIFF header:  "RIFF" + file_size-8 + "WAVE"
//! fmt  chunk:   "fmt " + chunk_size + audio_format + channels + sample_rate
//!              + byte_rate + block_align + bits_per_sample [+ 扩展]
//! data chunk:   "data" + data_size + PCM samples...
//! ```
//!
//! 只接受整数 PCM: 格式码 1, 或子格式 GUID 为 PCM 的 WAVE_FORMAT_EXTENSIBLE.

use bytes::Bytes;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use saprobe_codec::{CodecId, Packet};
use saprobe_core::{BitDepth, ChannelLayout, Rational, SaprobeError, SaprobeResult};

use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX, extension_matches};
use crate::stream::{AudioStreamParams, Stream};

/// 格式码: PCM 整数
pub(crate) const WAV_FORMAT_PCM: u16 = 0x0001;
/// 格式码: WAVE_FORMAT_EXTENSIBLE
pub(crate) const WAV_FORMAT_EXTENSIBLE: u16 = 0xFFFE;
/// PCM 子格式 GUID
pub(crate) const KSDATAFORMAT_SUBTYPE_PCM: [u8; 16] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// fmt 块最多解析的字节数 (WAVE_FORMAT_EXTENSIBLE 的完整长度)
const FMT_MAX_PARSED: usize = 40;

/// 每个数据包的采样帧数
const FRAMES_PER_PACKET: usize = 4096;

/// fmt 块解析结果
#[derive(Debug, Clone, Copy)]
struct WavFmt {
    channels: u16,
    sample_rate: u32,
    bit_depth: BitDepth,
}

impl WavFmt {
    /// 解析 fmt 块内容 (至多前 40 字节)
    fn parse(buf: &[u8], chunk_size: u32) -> SaprobeResult<Self> {
        let audio_format = LittleEndian::read_u16(&buf[0..2]);
        let channels = LittleEndian::read_u16(&buf[2..4]);
        let sample_rate = LittleEndian::read_u32(&buf[4..8]);
        let bits = LittleEndian::read_u16(&buf[14..16]);

        debug!(
            "fmt: format=0x{:04X}, channels={}, rate={}, bits={}",
            audio_format, channels, sample_rate, bits,
        );

        match audio_format {
            WAV_FORMAT_PCM => {}
            WAV_FORMAT_EXTENSIBLE => {
                if chunk_size < FMT_MAX_PARSED as u32 {
                    return Err(SaprobeError::Unsupported(
                        "WAVE_FORMAT_EXTENSIBLE 的 fmt 块不足 40 字节".into(),
                    ));
                }
                if buf[24..40] != KSDATAFORMAT_SUBTYPE_PCM {
                    return Err(SaprobeError::Unsupported("WAV 子格式不是 PCM".into()));
                }
            }
            other => {
                return Err(SaprobeError::Unsupported(format!(
                    "不支持的 WAV 格式码: 0x{:04X}",
                    other
                )));
            }
        }

        if CodecId::pcm_for_bits(u32::from(bits)).is_none() {
            return Err(SaprobeError::Unsupported(format!(
                "无效位深 {} (必须为 16/24/32)",
                bits
            )));
        }
        if channels == 0 {
            return Err(SaprobeError::InvalidData("WAV 声道数为 0".into()));
        }

        Ok(Self {
            channels,
            sample_rate,
            bit_depth: BitDepth::from_bits(u32::from(bits))?,
        })
    }

    fn block_align(&self) -> usize {
        self.bit_depth.bytes_per_sample() * usize::from(self.channels)
    }
}

/// WAV 解封装器
pub struct WavDemuxer {
    streams: Vec<Stream>,
    /// data 块在文件中的起始偏移
    data_offset: u64,
    /// data 块的大小 (字节)
    data_size: u64,
    /// 当前读取位置 (相对于 data 块起始)
    data_pos: u64,
    /// 块对齐 (每个采样帧的字节数)
    block_align: usize,
    sample_rate: u32,
}

impl WavDemuxer {
    /// 创建 WAV 解封装器实例 (工厂函数)
    pub fn create() -> SaprobeResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            streams: Vec::new(),
            data_offset: 0,
            data_size: 0,
            data_pos: 0,
            block_align: 0,
            sample_rate: 0,
        }))
    }

    fn read_fmt(io: &mut IoContext, chunk_size: u32) -> SaprobeResult<WavFmt> {
        if chunk_size < 16 {
            return Err(SaprobeError::Unsupported("fmt 块不足 16 字节".into()));
        }
        let to_read = (chunk_size as usize).min(FMT_MAX_PARSED);
        let mut buf = [0u8; FMT_MAX_PARSED];
        io.read_exact(&mut buf[..to_read])?;
        if to_read < chunk_size as usize {
            io.skip(chunk_size as usize - to_read)?;
        }
        WavFmt::parse(&buf, chunk_size)
    }
}

impl Demuxer for WavDemuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Wav
    }

    fn name(&self) -> &str {
        "wav"
    }

    fn open(&mut self, io: &mut IoContext) -> SaprobeResult<()> {
        let riff_tag = io.read_tag()?;
        let _file_size = io.read_u32_le()?;
        let wave_tag = io.read_tag()?;
        if &riff_tag != b"RIFF" || &wave_tag != b"WAVE" {
            return Err(SaprobeError::Format("不是 WAV 文件".into()));
        }

        let mut fmt: Option<WavFmt> = None;
        let mut data: Option<(u64, u64)> = None;

        loop {
            let chunk_id = match io.read_tag() {
                Ok(tag) => tag,
                Err(SaprobeError::Eof) => break,
                Err(e) => return Err(e),
            };
            let chunk_size = io.read_u32_le()?;

            match &chunk_id {
                b"fmt " => {
                    fmt = Some(Self::read_fmt(io, chunk_size)?);
                }
                b"data" => {
                    if data.is_none() {
                        data = Some((io.position()?, u64::from(chunk_size)));
                    }
                    // fmt 已知时直接从这里开始读数据
                    if fmt.is_some() {
                        break;
                    }
                    io.skip(chunk_size as usize)?;
                }
                _ => {
                    warn!(
                        "跳过未知块: '{}', 大小={}",
                        String::from_utf8_lossy(&chunk_id),
                        chunk_size
                    );
                    io.skip(chunk_size as usize)?;
                }
            }

            // 块按偶数字节对齐
            if chunk_size % 2 == 1 {
                match io.skip(1) {
                    Ok(()) | Err(SaprobeError::Eof) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        let fmt = fmt.ok_or_else(|| SaprobeError::Format("缺少 fmt 块".into()))?;
        let (data_offset, data_size) =
            data.ok_or_else(|| SaprobeError::Format("缺少 data 块".into()))?;
        if io.position()? != data_offset {
            io.seek(std::io::SeekFrom::Start(data_offset))?;
        }

        let block_align = fmt.block_align();
        let total_frames = data_size / block_align as u64;
        let codec_id = CodecId::pcm_for_bits(fmt.bit_depth.bits())
            .ok_or_else(|| SaprobeError::Unsupported(format!("{}", fmt.bit_depth)))?;
        let time_base = Rational::new(1, fmt.sample_rate as i32);

        self.streams = vec![Stream {
            index: 0,
            codec_id,
            time_base,
            duration: total_frames as i64,
            nb_frames: total_frames,
            extra_data: Vec::new(),
            params: AudioStreamParams {
                sample_rate: fmt.sample_rate,
                channel_layout: ChannelLayout::from_channels(u32::from(fmt.channels)),
                bit_depth: fmt.bit_depth,
                bit_rate: u64::from(fmt.sample_rate) * (block_align as u64) * 8,
                frame_size: 0,
            },
        }];
        self.data_offset = data_offset;
        self.data_size = data_size;
        self.data_pos = 0;
        self.block_align = block_align;
        self.sample_rate = fmt.sample_rate;

        debug!(
            "WAV 打开完成: {} Hz, {} 声道, {}, 总帧数={}",
            fmt.sample_rate, fmt.channels, fmt.bit_depth, total_frames,
        );
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> SaprobeResult<Packet> {
        if self.block_align == 0 {
            return Err(SaprobeError::Format("解封装器未打开".into()));
        }
        let remaining = self.data_size.saturating_sub(self.data_pos);
        let want = (FRAMES_PER_PACKET * self.block_align).min(remaining as usize);
        let want = want - want % self.block_align;
        if want == 0 {
            return Err(SaprobeError::Eof);
        }

        // data 块大小可能超出实际文件 (流式写出的 WAV), 以实际读到的为准
        let mut data = vec![0u8; want];
        let got = io.read_up_to(&mut data)?;
        let got = got - got % self.block_align;
        if got == 0 {
            self.data_pos = self.data_size;
            return Err(SaprobeError::Eof);
        }
        data.truncate(got);
        if got < want {
            debug!("WAV data 块被截断: 期望 {} 字节, 实际 {}", want, got);
            self.data_size = self.data_pos + got as u64;
        }

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.pts = (self.data_pos / self.block_align as u64) as i64;
        pkt.dts = pkt.pts;
        pkt.duration = (got / self.block_align) as i64;
        pkt.time_base = Rational::new(1, self.sample_rate as i32);
        pkt.is_keyframe = true;
        pkt.pos = (self.data_offset + self.data_pos) as i64;

        self.data_pos += got as u64;
        Ok(pkt)
    }

    fn duration(&self) -> Option<f64> {
        let stream = self.streams.first()?;
        if self.sample_rate == 0 {
            return None;
        }
        Some(stream.nb_frames as f64 / f64::from(self.sample_rate))
    }
}

/// WAV 格式探测器
pub struct WavProbe;

impl FormatProbe for WavProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            return Some(SCORE_MAX);
        }
        extension_matches(filename, FormatId::Wav).then_some(SCORE_EXTENSION)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Wav
    }
}
