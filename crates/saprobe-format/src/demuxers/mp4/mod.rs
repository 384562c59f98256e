//! MP4/M4A (ISO Base Media File Format) 解封装器, 只暴露 ALAC 音轨.
//!
//! # Box 树结构
//! ```text
//! ftyp                  文件类型
//! moov                  影片元数据
//! ├── mvhd              影片头部 (时长, 时间刻度)
//! └── trak              轨道
//!     └── mdia          媒体信息
//!         ├── mdhd      媒体头部 (时间刻度, 时长)
//!         ├── hdlr      处理器引用 (soun)
//!         └── minf      媒体详细信息
//!             └── stbl  采样表
//!                 ├── stsd  采样描述 (alac 条目 + magic cookie)
//!                 ├── stts  时间→采样映射
//!                 ├── stsc  采样→块映射
//!                 ├── stsz  采样大小
//!                 └── stco/co64  块偏移
//! mdat                  媒体数据
//! ```
//!
//! 第一个 stsd 含 `alac` 条目的轨道胜出, 其余轨道忽略.

mod boxes;
mod sample_table;

use bytes::Bytes;
use log::{debug, warn};
use saprobe_codec::decoders::alac::AlacConfig;
use saprobe_codec::{CodecId, Packet};
use saprobe_core::{
    AlacError, BitDepth, ChannelLayout, Rational, SaprobeError, SaprobeResult,
};

use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX, extension_matches};
use crate::stream::{AudioStreamParams, Stream};

use self::boxes::{BoxType, FtypBox, find_child, read_box_header};
use self::sample_table::{SampleDescription, SampleInfo, SampleTable, fourcc_to_codec_id};

/// 单个 trak 的解析结果
#[derive(Default)]
struct TrackInfo {
    timescale: u32,
    duration: u64,
    handler: [u8; 4],
    table: SampleTable,
}

/// MP4 解封装器
pub struct Mp4Demuxer {
    streams: Vec<Stream>,
    /// ALAC 轨道展开后的采样表
    samples: Vec<SampleInfo>,
    /// 下一个要读取的采样
    next_sample: usize,
    /// 遇到过空 cookie 的 ALAC 条目
    saw_invalid_cookie: bool,
    /// 文件总时长 (秒)
    file_duration: Option<f64>,
}

impl Mp4Demuxer {
    /// 创建 MP4 解封装器实例 (工厂函数)
    pub fn create() -> SaprobeResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            streams: Vec::new(),
            samples: Vec::new(),
            next_sample: 0,
            saw_invalid_cookie: false,
            file_duration: None,
        }))
    }

    /// 解析 moov box 内容
    fn parse_moov(&mut self, io: &mut IoContext, moov_end: u64) -> SaprobeResult<()> {
        let data_limit = io.size().unwrap_or(u64::MAX);
        while io.position()? < moov_end {
            let header = read_box_header(io)?;
            let box_end = header.end(moov_end)?;

            match header.box_type {
                BoxType::Mvhd => self.parse_mvhd(io)?,
                BoxType::Trak if self.streams.is_empty() => {
                    let mut track = TrackInfo::default();
                    Self::parse_trak_boxes(io, box_end, &mut track)?;
                    self.select_track(track, data_limit)?;
                }
                _ => {}
            }

            io.seek(std::io::SeekFrom::Start(box_end))?;
        }
        Ok(())
    }

    /// 解析 mvhd (Movie Header Box)
    fn parse_mvhd(&mut self, io: &mut IoContext) -> SaprobeResult<()> {
        let version = io.read_u8()?;
        io.skip(3)?;
        let (timescale, duration) = if version == 1 {
            io.skip(16)?;
            (io.read_u32_be()?, io.read_u64_be()?)
        } else {
            io.skip(8)?;
            (io.read_u32_be()?, u64::from(io.read_u32_be()?))
        };
        if timescale > 0 {
            self.file_duration = Some(duration as f64 / f64::from(timescale));
        }
        debug!("mvhd: timescale={}, duration={}", timescale, duration);
        Ok(())
    }

    /// 递归解析 trak 内部的 box
    fn parse_trak_boxes(io: &mut IoContext, end: u64, track: &mut TrackInfo) -> SaprobeResult<()> {
        while io.position()? < end {
            let header = read_box_header(io)?;
            let box_end = header.end(end)?;

            match header.box_type {
                BoxType::Mdia | BoxType::Minf | BoxType::Stbl => {
                    Self::parse_trak_boxes(io, box_end, track)?;
                }
                BoxType::Mdhd => Self::parse_mdhd(io, track)?,
                BoxType::Hdlr => {
                    io.skip(8)?; // version/flags + pre_defined
                    track.handler = io.read_tag()?;
                }
                BoxType::Stsd => track.table.parse_stsd(io, box_end)?,
                BoxType::Stts => track.table.parse_stts(io, box_end)?,
                BoxType::Stsc => track.table.parse_stsc(io, box_end)?,
                BoxType::Stsz => track.table.parse_stsz(io, box_end)?,
                BoxType::Stco => track.table.parse_chunk_offsets(io, box_end, false)?,
                BoxType::Co64 => track.table.parse_chunk_offsets(io, box_end, true)?,
                _ => {}
            }

            io.seek(std::io::SeekFrom::Start(box_end))?;
        }
        Ok(())
    }

    /// 解析 mdhd (Media Header Box)
    fn parse_mdhd(io: &mut IoContext, track: &mut TrackInfo) -> SaprobeResult<()> {
        let version = io.read_u8()?;
        io.skip(3)?;
        if version == 1 {
            io.skip(16)?;
            track.timescale = io.read_u32_be()?;
            track.duration = io.read_u64_be()?;
        } else {
            io.skip(8)?;
            track.timescale = io.read_u32_be()?;
            track.duration = u64::from(io.read_u32_be()?);
        }
        Ok(())
    }

    /// 若轨道含 ALAC 条目则建立流, 否则跳过
    fn select_track(&mut self, track: TrackInfo, data_limit: u64) -> SaprobeResult<()> {
        let description = &track.table.description;
        if description.invalid_cookie {
            self.saw_invalid_cookie = true;
        }
        let Some(entry) = &description.alac else {
            debug!(
                "MP4: 跳过非 ALAC 轨道 (handler={}, codec={})",
                String::from_utf8_lossy(&track.handler),
                description.codec_id(),
            );
            return Ok(());
        };

        let config = AlacConfig::parse(&entry.cookie)?;
        let bit_depth = BitDepth::from_bits(u32::from(config.bit_depth))
            .map_err(|_| SaprobeError::Alac(AlacError::UnsupportedBitDepth))?;
        if !(1..=8).contains(&config.num_channels) {
            return Err(SaprobeError::Alac(AlacError::InvalidConfig));
        }
        let sample_rate = if config.sample_rate > 0 {
            config.sample_rate
        } else {
            entry.sample_rate
        };
        if u32::from(entry.channel_count) != u32::from(config.num_channels) {
            warn!(
                "MP4: 采样条目声道数 {} 与 cookie 声道数 {} 不一致, 以 cookie 为准",
                entry.channel_count, config.num_channels
            );
        }

        let samples = track.table.flatten(data_limit)?;
        let timescale = if track.timescale > 0 {
            track.timescale
        } else {
            sample_rate.max(1)
        };
        let time_base_den = i32::try_from(timescale)
            .map_err(|_| SaprobeError::Format(format!("timescale 超出范围: {timescale}")))?;

        debug!(
            "MP4: ALAC 轨道: {} Hz, {} 声道, {}, frame_length={}, 采样数={}, timescale={}",
            sample_rate,
            config.num_channels,
            bit_depth,
            config.frame_length,
            samples.len(),
            timescale,
        );

        self.streams.push(Stream {
            index: 0,
            codec_id: CodecId::Alac,
            time_base: Rational::new(1, time_base_den),
            duration: if track.timescale > 0 {
                track.duration as i64
            } else {
                -1
            },
            nb_frames: samples.len() as u64,
            extra_data: entry.cookie.clone(),
            params: AudioStreamParams {
                sample_rate,
                channel_layout: ChannelLayout::from_channels(u32::from(config.num_channels)),
                bit_depth,
                bit_rate: u64::from(config.avg_bit_rate),
                frame_size: config.frame_length,
            },
        });
        self.samples = samples;
        self.next_sample = 0;
        Ok(())
    }
}

impl Demuxer for Mp4Demuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Mp4
    }

    fn name(&self) -> &str {
        "mp4"
    }

    fn open(&mut self, io: &mut IoContext) -> SaprobeResult<()> {
        let file_size = io.size().unwrap_or(u64::MAX);

        loop {
            let pos = io.position()?;
            if pos >= file_size {
                break;
            }

            let header = match read_box_header(io) {
                Ok(h) => h,
                Err(SaprobeError::Eof) => break,
                Err(e) => return Err(e),
            };
            let box_end = header.end(file_size)?;

            match header.box_type {
                BoxType::Ftyp => {
                    let size = box_end.saturating_sub(header.content_start);
                    let ftyp = FtypBox::parse(io, size)?;
                    debug!("MP4: ftyp major_brand={}", ftyp.major_brand_str());
                }
                BoxType::Moov => self.parse_moov(io, box_end)?,
                BoxType::Mdat => {
                    debug!(
                        "MP4: mdat @ {}, {} 字节",
                        header.content_start,
                        box_end.saturating_sub(header.content_start)
                    );
                }
                _ => {}
            }

            if box_end == u64::MAX {
                break;
            }
            io.seek(std::io::SeekFrom::Start(box_end))?;
        }

        if self.streams.is_empty() {
            if self.saw_invalid_cookie {
                return Err(SaprobeError::Format("ALAC magic cookie 无效".into()));
            }
            return Err(SaprobeError::Format("未找到 ALAC 轨道 (no ALAC track)".into()));
        }
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> SaprobeResult<Packet> {
        let Some(sample) = self.samples.get(self.next_sample).copied() else {
            return Err(SaprobeError::Eof);
        };
        let index = self.next_sample;

        io.seek(std::io::SeekFrom::Start(sample.offset))?;
        let data = io.read_bytes(sample.size as usize).map_err(|e| match e {
            SaprobeError::Eof => SaprobeError::InvalidData(format!(
                "采样 {} (偏移 {}, {} 字节) 超出文件末尾",
                index, sample.offset, sample.size
            )),
            other => other,
        })?;

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.pts = sample.pts;
        pkt.dts = sample.pts;
        pkt.duration = sample.duration;
        pkt.is_keyframe = true;
        pkt.pos = sample.offset as i64;
        if let Some(stream) = self.streams.first() {
            pkt.time_base = stream.time_base;
        }

        self.next_sample += 1;
        Ok(pkt)
    }

    fn duration(&self) -> Option<f64> {
        self.file_duration
    }
}

/// MP4 格式探测器
pub struct Mp4Probe;

impl FormatProbe for Mp4Probe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(SCORE_MAX);
        }
        extension_matches(filename, FormatId::Mp4).then_some(SCORE_EXTENSION)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Mp4
    }
}

/// 探测 M4A 中第一个可识别音频条目的编解码器
///
/// 沿 moov → trak → mdia → minf → stbl → stsd 查找, 只看 stsd 的第一个条目,
/// 结果为 ALAC 或 AAC. 结构损坏或找不到时返回 `None`. 不恢复 I/O 位置.
pub fn probe_codec(io: &mut IoContext) -> Option<CodecId> {
    let end = io.size().unwrap_or(u64::MAX);
    let (moov_start, moov_end) = find_child(io, 0, end, BoxType::Moov).ok()??;

    let mut pos = moov_start;
    while pos < moov_end {
        io.seek(std::io::SeekFrom::Start(pos)).ok()?;
        let header = read_box_header(io).ok()?;
        let trak_end = header.end(moov_end).ok()?;
        if header.box_type == BoxType::Trak {
            if let Some(codec) = probe_trak(io, header.content_start, trak_end) {
                return Some(codec);
            }
        }
        if trak_end <= pos {
            break;
        }
        pos = trak_end;
    }
    None
}

fn probe_trak(io: &mut IoContext, start: u64, end: u64) -> Option<CodecId> {
    let mut range = (start, end);
    for target in [BoxType::Mdia, BoxType::Minf, BoxType::Stbl, BoxType::Stsd] {
        range = find_child(io, range.0, range.1, target).ok()??;
    }
    let (stsd_start, stsd_end) = range;
    io.seek(std::io::SeekFrom::Start(stsd_start)).ok()?;
    // 只需 version/flags、条目数与第一个条目头部
    let len = stsd_end.saturating_sub(stsd_start).min(16);
    let head = io.read_bytes(len as usize).ok()?;
    match SampleDescription::parse(&head).first_fourcc {
        Some(ref fourcc) => match fourcc_to_codec_id(fourcc) {
            CodecId::Alac => Some(CodecId::Alac),
            CodecId::Aac => Some(CodecId::Aac),
            _ => None,
        },
        None => None,
    }
}
