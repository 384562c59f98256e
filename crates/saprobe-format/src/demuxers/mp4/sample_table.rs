//! MP4 采样表 (Sample Table) 解析.
//!
//! 采样表 (stbl) 包含了从 packet 索引到文件偏移的完整映射:
//! - stsd: 采样描述 (ALAC magic cookie 就在这里)
//! - stts: 解码时间→采样编号映射 (delta 编码)
//! - stsc: 采样→块映射 (压缩的 Run-Length 编码)
//! - stsz: 每个采样的字节大小
//! - stco/co64: 每个块的文件偏移
//!
//! 打开时一次性展开为逐采样的 (偏移, 大小, 时间戳) 列表.

use byteorder::{BigEndian, ByteOrder};
use saprobe_codec::CodecId;
use saprobe_core::{SaprobeError, SaprobeResult};

use crate::io::IoContext;

/// 采样条目头部: size(4) + type(4)
const SAMPLE_ENTRY_HEADER_SIZE: usize = 8;
/// 标准 AudioSampleEntry 字段长度
const AUDIO_ENTRY_BASE_SIZE: usize = 28;
/// QuickTime 声音描述 version 1 额外字段
const AUDIO_ENTRY_V1_EXTRA: usize = 16;

/// 时间→采样条目 (stts)
#[derive(Debug, Clone)]
struct SttsEntry {
    count: u32,
    delta: u32,
}

/// 采样→块条目 (stsc)
#[derive(Debug, Clone)]
struct StscEntry {
    /// 起始块号 (1-based)
    first_chunk: u32,
    samples_per_chunk: u32,
}

/// stsd 中找到的 ALAC 采样条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlacEntry {
    /// magic cookie, 保留 frma/alac 外壳, 由配置解析剥离
    pub cookie: Vec<u8>,
    /// 条目中的声道数
    pub channel_count: u16,
    /// 条目中的采样率 (16.16 定点的整数部分)
    pub sample_rate: u32,
}

/// stsd 解析结果
#[derive(Debug, Default)]
pub struct SampleDescription {
    /// 第一个条目的 FourCC
    pub first_fourcc: Option<[u8; 4]>,
    /// 第一个有效的 ALAC 条目
    pub alac: Option<AlacEntry>,
    /// 遇到 ALAC 条目但 cookie 区间为空
    pub invalid_cookie: bool,
}

impl SampleDescription {
    /// 解析 stsd 载荷 (box 头部之后的全部内容, 从 version/flags 开始)
    pub fn parse(data: &[u8]) -> Self {
        let mut desc = Self::default();
        if data.len() < 8 {
            return desc;
        }

        let entry_count = BigEndian::read_u32(&data[4..8]);
        let mut pos = 8usize;

        for _ in 0..entry_count {
            if pos + SAMPLE_ENTRY_HEADER_SIZE > data.len() {
                break;
            }
            let entry_size = BigEndian::read_u32(&data[pos..pos + 4]) as usize;
            let fourcc: [u8; 4] = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
            if desc.first_fourcc.is_none() {
                desc.first_fourcc = Some(fourcc);
            }
            if entry_size == 0 {
                break;
            }

            let entry_end = pos.saturating_add(entry_size);
            if entry_size < SAMPLE_ENTRY_HEADER_SIZE + AUDIO_ENTRY_BASE_SIZE
                || entry_end > data.len()
                || &fourcc != b"alac"
            {
                pos = entry_end;
                continue;
            }

            let entry = &data[pos..entry_end];
            // reserved(6) + data_reference_index(2) 之后是声音描述版本号
            let version = BigEndian::read_u16(&entry[16..18]);
            let mut cookie_start = SAMPLE_ENTRY_HEADER_SIZE + AUDIO_ENTRY_BASE_SIZE;
            if version == 1 {
                cookie_start += AUDIO_ENTRY_V1_EXTRA;
            }
            if cookie_start >= entry.len() {
                desc.invalid_cookie = true;
                pos = entry_end;
                continue;
            }

            desc.alac = Some(AlacEntry {
                cookie: entry[cookie_start..].to_vec(),
                channel_count: BigEndian::read_u16(&entry[24..26]),
                sample_rate: BigEndian::read_u32(&entry[32..36]) >> 16,
            });
            break;
        }
        desc
    }

    /// 按第一个条目映射编解码器
    pub fn codec_id(&self) -> CodecId {
        match &self.alac {
            Some(_) => CodecId::Alac,
            None => self
                .first_fourcc
                .as_ref()
                .map_or(CodecId::None, fourcc_to_codec_id),
        }
    }
}

/// FourCC 到编解码器标识的映射
pub fn fourcc_to_codec_id(fourcc: &[u8; 4]) -> CodecId {
    match fourcc {
        b"alac" => CodecId::Alac,
        b"mp4a" => CodecId::Aac,
        b"fLaC" => CodecId::Flac,
        b".mp3" => CodecId::Mp3,
        _ => CodecId::None,
    }
}

/// 展开后的单个采样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInfo {
    /// 文件偏移
    pub offset: u64,
    /// 字节大小
    pub size: u32,
    /// 解码时间戳 (以媒体 timescale 为单位)
    pub pts: i64,
    /// 时长 (以媒体 timescale 为单位)
    pub duration: i64,
}

/// 采样表
#[derive(Debug, Default)]
pub struct SampleTable {
    pub description: SampleDescription,
    stts_entries: Vec<SttsEntry>,
    stsc_entries: Option<Vec<StscEntry>>,
    /// 统一采样大小 (0 表示使用逐样本大小表)
    constant_sample_size: u32,
    sample_sizes: Vec<u32>,
    /// stsz 声明的采样数, None 表示缺少 stsz
    sample_count: Option<u32>,
    chunk_offsets: Option<Vec<u64>>,
}

/// 读取 version/flags 后的计数, 并按剩余空间限制上限
fn read_entry_count(io: &mut IoContext, box_end: u64, entry_size: u64) -> SaprobeResult<usize> {
    let declared = u64::from(io.read_u32_be()?);
    let available = box_end.saturating_sub(io.position()?) / entry_size;
    Ok(declared.min(available) as usize)
}

fn skip_version_flags(io: &mut IoContext) -> SaprobeResult<()> {
    io.skip(4)
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 stsd (Sample Description Box)
    pub fn parse_stsd(&mut self, io: &mut IoContext, box_end: u64) -> SaprobeResult<()> {
        let len = box_end.saturating_sub(io.position()?) as usize;
        let payload = io.read_bytes(len)?;
        self.description = SampleDescription::parse(&payload);
        Ok(())
    }

    pub fn parse_stts(&mut self, io: &mut IoContext, box_end: u64) -> SaprobeResult<()> {
        skip_version_flags(io)?;
        let count = read_entry_count(io, box_end, 8)?;
        let raw = io.read_bytes(count * 8)?;
        self.stts_entries = raw
            .chunks_exact(8)
            .map(|e| SttsEntry {
                count: BigEndian::read_u32(&e[0..4]),
                delta: BigEndian::read_u32(&e[4..8]),
            })
            .collect();
        Ok(())
    }

    pub fn parse_stsc(&mut self, io: &mut IoContext, box_end: u64) -> SaprobeResult<()> {
        skip_version_flags(io)?;
        let count = read_entry_count(io, box_end, 12)?;
        let raw = io.read_bytes(count * 12)?;
        self.stsc_entries = Some(
            raw.chunks_exact(12)
                .map(|e| StscEntry {
                    first_chunk: BigEndian::read_u32(&e[0..4]),
                    samples_per_chunk: BigEndian::read_u32(&e[4..8]),
                })
                .collect(),
        );
        Ok(())
    }

    pub fn parse_stsz(&mut self, io: &mut IoContext, box_end: u64) -> SaprobeResult<()> {
        skip_version_flags(io)?;
        self.constant_sample_size = io.read_u32_be()?;
        let declared = io.read_u32_be()?;
        self.sample_count = Some(declared);
        self.sample_sizes.clear();
        if self.constant_sample_size == 0 {
            let available = box_end.saturating_sub(io.position()?) / 4;
            let count = u64::from(declared).min(available) as usize;
            let raw = io.read_bytes(count * 4)?;
            self.sample_sizes = raw.chunks_exact(4).map(BigEndian::read_u32).collect();
        }
        Ok(())
    }

    /// 解析 stco (32 位) 或 co64 (64 位) 块偏移表
    pub fn parse_chunk_offsets(
        &mut self,
        io: &mut IoContext,
        box_end: u64,
        is_64bit: bool,
    ) -> SaprobeResult<()> {
        skip_version_flags(io)?;
        let width = if is_64bit { 8 } else { 4 };
        let count = read_entry_count(io, box_end, width as u64)?;
        let raw = io.read_bytes(count * width)?;
        self.chunk_offsets = Some(if is_64bit {
            raw.chunks_exact(8).map(BigEndian::read_u64).collect()
        } else {
            raw.chunks_exact(4)
                .map(|e| u64::from(BigEndian::read_u32(e)))
                .collect()
        });
        Ok(())
    }

    /// 1-based 块号对应的每块采样数: 取最后一个 first_chunk <= chunk 的条目
    fn samples_per_chunk(entries: &[StscEntry], chunk_number: u32) -> u32 {
        entries
            .iter()
            .take_while(|e| e.first_chunk <= chunk_number)
            .last()
            .map_or(0, |e| e.samples_per_chunk)
    }

    /// 展开为逐采样列表
    ///
    /// 采样互不重叠, 声明的总字节数不能超过 `data_limit` (文件大小).
    pub fn flatten(&self, data_limit: u64) -> SaprobeResult<Vec<SampleInfo>> {
        let chunk_offsets = self
            .chunk_offsets
            .as_ref()
            .ok_or_else(|| SaprobeError::Format("缺少块偏移 box (stco/co64)".into()))?;
        let stsc = self
            .stsc_entries
            .as_ref()
            .ok_or_else(|| SaprobeError::Format("缺少 stsc box".into()))?;
        let sample_count = self
            .sample_count
            .ok_or_else(|| SaprobeError::Format("缺少 stsz box".into()))? as usize;

        let mut deltas = self
            .stts_entries
            .iter()
            .flat_map(|e| std::iter::repeat(e.delta).take(e.count as usize));
        let mut pts = 0i64;
        let mut total_bytes = 0u64;

        let mut samples = Vec::with_capacity(sample_count.min(1 << 20));
        'chunks: for (chunk_idx, &chunk_offset) in chunk_offsets.iter().enumerate() {
            let spc = Self::samples_per_chunk(stsc, chunk_idx as u32 + 1);
            let mut offset = chunk_offset;
            for _ in 0..spc {
                if samples.len() >= sample_count {
                    break 'chunks;
                }
                let size = if self.constant_sample_size != 0 {
                    self.constant_sample_size
                } else {
                    match self.sample_sizes.get(samples.len()) {
                        Some(&size) => size,
                        None => break 'chunks,
                    }
                };
                total_bytes = total_bytes.saturating_add(u64::from(size));
                if total_bytes > data_limit {
                    return Err(SaprobeError::Format(format!(
                        "采样表数据量超过文件大小 ({} 字节, 第 {} 个采样)",
                        data_limit,
                        samples.len()
                    )));
                }
                let duration = i64::from(deltas.next().unwrap_or(0));
                samples.push(SampleInfo {
                    offset,
                    size,
                    pts,
                    duration,
                });
                offset += u64::from(size);
                pts += duration;
            }
        }
        Ok(samples)
    }
}
