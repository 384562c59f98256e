//! MP4 Box (Atom) 头部解析.
//!
//! ISO 14496-12 定义的 Box 结构:
//! ```text
//! Size:       4 bytes (big-endian, 含头部本身)
//! Type:       4 bytes (FourCC)
//! [ExtSize]:  8 bytes (仅当 Size==1 时存在, 64-bit 大小)
//! ```
//!
//! 特殊大小值:
//! - 0: Box 延伸到父容器 (或文件) 末尾
//! - 1: 使用 64-bit 扩展大小

use saprobe_core::{SaprobeError, SaprobeResult};

use crate::io::IoContext;

/// 解封装关心的 Box 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxType {
    /// ftyp - 文件类型
    Ftyp,
    /// moov - 影片元数据
    Moov,
    /// mvhd - 影片头部
    Mvhd,
    /// trak - 轨道
    Trak,
    /// mdia - 媒体
    Mdia,
    /// mdhd - 媒体头部
    Mdhd,
    /// hdlr - 处理器引用
    Hdlr,
    /// minf - 媒体信息
    Minf,
    /// stbl - 采样表
    Stbl,
    /// stsd - 采样描述
    Stsd,
    /// stts - 时间→采样映射
    Stts,
    /// stsc - 采样→块映射
    Stsc,
    /// stsz - 采样大小
    Stsz,
    /// stco - 块偏移 (32位)
    Stco,
    /// co64 - 块偏移 (64位)
    Co64,
    /// mdat - 媒体数据
    Mdat,
    Unknown([u8; 4]),
}

impl BoxType {
    /// 从 4 字节 FourCC 创建
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Self {
        match fourcc {
            b"ftyp" => Self::Ftyp,
            b"moov" => Self::Moov,
            b"mvhd" => Self::Mvhd,
            b"trak" => Self::Trak,
            b"mdia" => Self::Mdia,
            b"mdhd" => Self::Mdhd,
            b"hdlr" => Self::Hdlr,
            b"minf" => Self::Minf,
            b"stbl" => Self::Stbl,
            b"stsd" => Self::Stsd,
            b"stts" => Self::Stts,
            b"stsc" => Self::Stsc,
            b"stsz" => Self::Stsz,
            b"stco" => Self::Stco,
            b"co64" => Self::Co64,
            b"mdat" => Self::Mdat,
            _ => Self::Unknown(*fourcc),
        }
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(cc) => write!(f, "{}", String::from_utf8_lossy(cc)),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// 已解析的 Box 头部
#[derive(Debug)]
pub struct BoxHeader {
    /// Box 总大小 (含头部, 0 表示到父容器末尾)
    pub size: u64,
    pub box_type: BoxType,
    /// 头部大小 (8 或 16 字节)
    pub header_size: u64,
    /// 内容区域的起始偏移
    pub content_start: u64,
}

impl BoxHeader {
    /// Box 结束位置, 不超出父容器
    pub fn end(&self, parent_end: u64) -> SaprobeResult<u64> {
        if self.size == 0 {
            return Ok(parent_end);
        }
        if self.size < self.header_size {
            return Err(SaprobeError::Format(format!(
                "MP4 box '{}' 大小无效: {}",
                self.box_type, self.size
            )));
        }
        let end = self
            .content_start
            .saturating_add(self.size - self.header_size);
        Ok(end.min(parent_end))
    }
}

/// 读取一个 Box 头部
pub fn read_box_header(io: &mut IoContext) -> SaprobeResult<BoxHeader> {
    let size32 = io.read_u32_be()?;
    let fourcc = io.read_tag()?;
    let box_type = BoxType::from_fourcc(&fourcc);

    let (size, header_size) = if size32 == 1 {
        (io.read_u64_be()?, 16u64)
    } else {
        (u64::from(size32), 8u64)
    };

    Ok(BoxHeader {
        size,
        box_type,
        header_size,
        content_start: io.position()?,
    })
}

/// 在 `[start, end)` 范围内查找第一个指定类型的子 Box, 返回其 (内容起点, 结束位置)
pub fn find_child(
    io: &mut IoContext,
    start: u64,
    end: u64,
    target: BoxType,
) -> SaprobeResult<Option<(u64, u64)>> {
    let mut pos = start;
    while pos < end {
        io.seek(std::io::SeekFrom::Start(pos))?;
        let header = read_box_header(io)?;
        let box_end = header.end(end)?;
        if header.box_type == target {
            return Ok(Some((header.content_start, box_end)));
        }
        if box_end <= pos {
            break;
        }
        pos = box_end;
    }
    Ok(None)
}

/// ftyp Box 数据
pub struct FtypBox {
    /// 主品牌
    pub major_brand: [u8; 4],
    pub minor_version: u32,
    /// 兼容品牌列表
    pub compatible_brands: Vec<[u8; 4]>,
}

impl FtypBox {
    /// 解析 ftyp box 内容
    pub fn parse(io: &mut IoContext, content_size: u64) -> SaprobeResult<Self> {
        let major_brand = io.read_tag()?;
        let minor_version = io.read_u32_be()?;

        let brand_count = (content_size.saturating_sub(8) / 4) as usize;
        let mut compatible_brands = Vec::with_capacity(brand_count.min(64));
        for _ in 0..brand_count {
            compatible_brands.push(io.read_tag()?);
        }

        Ok(Self {
            major_brand,
            minor_version,
            compatible_brands,
        })
    }

    /// 获取主品牌字符串
    pub fn major_brand_str(&self) -> String {
        String::from_utf8_lossy(&self.major_brand).to_string()
    }
}
