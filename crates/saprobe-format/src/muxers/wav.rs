//! WAV (RIFF WAVE) 封装器.
//!
//! 写入流程:
//! 1. `write_header()` - 写入 RIFF 和 fmt 块, data 大小先写预估值
//! 2. `write_packet()` - 追加 PCM 数据
//! 3. `write_trailer()` - 补齐填充字节, 可 seek 时回填 RIFF 与 data 大小
//!
//! 声道数大于 2 或位深大于 16 时使用 WAVE_FORMAT_EXTENSIBLE (fmt 块 40 字节),
//! 否则写 16 字节的普通 PCM fmt 块.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use saprobe_codec::Packet;
use saprobe_core::{ChannelLayout, PcmFormat, SaprobeError, SaprobeResult};

use crate::demuxers::wav::{KSDATAFORMAT_SUBTYPE_PCM, WAV_FORMAT_EXTENSIBLE, WAV_FORMAT_PCM};
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::muxer::Muxer;
use crate::stream::Stream;

/// 普通 PCM 头部长度
const SIMPLE_HEADER_SIZE: u64 = 44;
/// 扩展格式头部长度
const EXTENSIBLE_HEADER_SIZE: u64 = 68;

fn use_extensible(format: &PcmFormat) -> bool {
    format.channels > 2 || format.bit_depth.bits() > 16
}

/// 头部长度 (字节)
pub fn header_size(format: &PcmFormat) -> u64 {
    if use_extensible(format) {
        EXTENSIBLE_HEADER_SIZE
    } else {
        SIMPLE_HEADER_SIZE
    }
}

/// 写入完整 WAV 头部, `data_len` 为 data 块的有效字节数
pub fn write_header<W: Write>(w: &mut W, format: &PcmFormat, data_len: u32) -> io::Result<()> {
    let channels = u16::try_from(format.channels)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "声道数超出 WAV 范围"))?;
    // 20 位样本左对齐存放在 3 字节容器中
    let container_bits = (format.bit_depth.bytes_per_sample() * 8) as u16;
    let block_align = channels * container_bits / 8;
    let byte_rate = format.sample_rate * u32::from(block_align);
    let pad = data_len & 1;
    let header = header_size(format) as u32;
    let riff_size = (header - 8).saturating_add(data_len).saturating_add(pad);

    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(riff_size)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    if use_extensible(format) {
        w.write_u32::<LittleEndian>(40)?;
        w.write_u16::<LittleEndian>(WAV_FORMAT_EXTENSIBLE)?;
    } else {
        w.write_u32::<LittleEndian>(16)?;
        w.write_u16::<LittleEndian>(WAV_FORMAT_PCM)?;
    }
    w.write_u16::<LittleEndian>(channels)?;
    w.write_u32::<LittleEndian>(format.sample_rate)?;
    w.write_u32::<LittleEndian>(byte_rate)?;
    w.write_u16::<LittleEndian>(block_align)?;
    w.write_u16::<LittleEndian>(container_bits)?;
    if use_extensible(format) {
        w.write_u16::<LittleEndian>(22)?; // cbSize
        w.write_u16::<LittleEndian>(format.bit_depth.bits() as u16)?;
        w.write_u32::<LittleEndian>(ChannelLayout::from_channels(format.channels).mask.bits())?;
        w.write_all(&KSDATAFORMAT_SUBTYPE_PCM)?;
    }

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_len)?;
    Ok(())
}

fn validate(format: &PcmFormat) -> SaprobeResult<()> {
    if format.channels == 0 || format.channels > u32::from(u16::MAX) {
        return Err(SaprobeError::InvalidArgument(format!(
            "无效声道数: {}",
            format.channels
        )));
    }
    if format.sample_rate == 0 {
        return Err(SaprobeError::InvalidArgument("采样率不能为 0".into()));
    }
    Ok(())
}

fn data_len_u32(len: u64) -> SaprobeResult<u32> {
    u32::try_from(len)
        .map_err(|_| SaprobeError::InvalidArgument(format!("PCM 数据过大 ({} 字节), 超出 WAV 上限", len)))
}

/// 一次性把交错 PCM 封装为 WAV 并写入 `w`
pub fn encode<W: Write>(w: &mut W, pcm: &[u8], format: &PcmFormat) -> SaprobeResult<()> {
    validate(format)?;
    let data_len = data_len_u32(pcm.len() as u64)?;
    write_header(w, format, data_len)?;
    w.write_all(pcm)?;
    if data_len % 2 == 1 {
        w.write_u8(0)?;
    }
    Ok(())
}

/// 一次性封装到内存
pub fn encode_to_vec(pcm: &[u8], format: &PcmFormat) -> SaprobeResult<Vec<u8>> {
    let mut out = Vec::with_capacity(header_size(format) as usize + pcm.len() + 1);
    encode(&mut out, pcm, format)?;
    Ok(out)
}

/// WAV 封装器
pub struct WavMuxer {
    /// 写入头部时使用的 data 大小 (不可 seek 的输出依赖它)
    expected_data_len: u64,
    /// 头部在输出中的起始偏移
    header_offset: u64,
    format: Option<PcmFormat>,
    /// 已写入的数据字节数
    data_written: u64,
}

impl WavMuxer {
    /// 创建 WAV 封装器实例 (工厂函数)
    pub fn create() -> SaprobeResult<Box<dyn Muxer>> {
        Ok(Box::new(Self::with_data_len(0)))
    }

    /// 预先声明 data 大小, 输出不可 seek 时头部依然正确
    pub fn with_data_len(expected_data_len: u64) -> Self {
        Self {
            expected_data_len,
            header_offset: 0,
            format: None,
            data_written: 0,
        }
    }
}

impl Muxer for WavMuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Wav
    }

    fn name(&self) -> &str {
        "wav"
    }

    fn write_header(&mut self, io: &mut IoContext, streams: &[Stream]) -> SaprobeResult<()> {
        let [stream] = streams else {
            return Err(SaprobeError::InvalidArgument("WAV 仅支持单个音频流".into()));
        };
        let format = PcmFormat {
            sample_rate: stream.params.sample_rate,
            bit_depth: stream.params.bit_depth,
            channels: stream.params.channel_layout.channels,
        };
        validate(&format)?;

        let mut header = Vec::with_capacity(EXTENSIBLE_HEADER_SIZE as usize);
        write_header(&mut header, &format, data_len_u32(self.expected_data_len)?)?;
        self.header_offset = io.position()?;
        io.write_all(&header)?;

        self.format = Some(format);
        self.data_written = 0;
        debug!(
            "WAV 写入头部: {} Hz, {} 声道, {}, 头部 {} 字节",
            format.sample_rate,
            format.channels,
            format.bit_depth,
            header.len(),
        );
        Ok(())
    }

    fn write_packet(&mut self, io: &mut IoContext, packet: &Packet) -> SaprobeResult<()> {
        if self.format.is_none() {
            return Err(SaprobeError::InvalidArgument("尚未写入 WAV 头部".into()));
        }
        io.write_all(&packet.data)?;
        self.data_written += packet.data.len() as u64;
        Ok(())
    }

    fn write_trailer(&mut self, io: &mut IoContext) -> SaprobeResult<()> {
        let format = self
            .format
            .ok_or_else(|| SaprobeError::InvalidArgument("尚未写入 WAV 头部".into()))?;
        let data_len = data_len_u32(self.data_written)?;
        if data_len % 2 == 1 {
            io.write_all(&[0])?;
        }

        if self.data_written != self.expected_data_len {
            if !io.is_seekable() {
                return Err(SaprobeError::InvalidArgument(format!(
                    "输出不可 seek, 且实际数据 {} 字节与预声明的 {} 字节不符",
                    self.data_written, self.expected_data_len
                )));
            }
            let end = io.position()?;
            let mut header = Vec::with_capacity(EXTENSIBLE_HEADER_SIZE as usize);
            write_header(&mut header, &format, data_len)?;
            io.seek(io::SeekFrom::Start(self.header_offset))?;
            io.write_all(&header)?;
            io.seek(io::SeekFrom::Start(end))?;
            debug!("WAV 回填头部: data_size={}", data_len);
        }
        io.flush()
    }
}
