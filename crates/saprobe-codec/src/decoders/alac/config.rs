//! ALAC magic cookie (ALACSpecificConfig).
//!
//! 24 字节大端记录. 旧式 cookie 可能带 `frma` 与 `alac` 原子外壳, 各 12 字节, 解析前剥离.

use saprobe_core::AlacError;

/// ALACSpecificConfig 长度
pub const CONFIG_SIZE: usize = 24;

/// 外壳原子长度: size(4) + type(4) + 载荷(4)
const WRAPPER_ATOM_SIZE: usize = 12;

/// 解码配置, 构造后不再修改
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlacConfig {
    /// 每帧采样数
    pub frame_length: u32,
    /// 兼容版本, 只支持 0
    pub compatible_version: u8,
    /// 位深
    pub bit_depth: u8,
    /// 熵解码均值更新系数
    pub pb: u8,
    /// 熵解码初始均值
    pub mb: u8,
    /// Rice 参数上限
    pub kb: u8,
    /// 声道数
    pub num_channels: u8,
    pub max_run: u16,
    pub max_frame_bytes: u32,
    pub avg_bit_rate: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
}

fn strip_atom<'a>(data: &'a [u8], fourcc: &[u8; 4]) -> &'a [u8] {
    if data.len() >= WRAPPER_ATOM_SIZE && &data[4..8] == fourcc {
        &data[WRAPPER_ATOM_SIZE..]
    } else {
        data
    }
}

impl AlacConfig {
    /// 解析 magic cookie
    pub fn parse(cookie: &[u8]) -> Result<Self, AlacError> {
        let data = strip_atom(cookie, b"frma");
        let data = strip_atom(data, b"alac");

        if data.len() < CONFIG_SIZE {
            return Err(AlacError::InvalidConfig);
        }
        let compatible_version = data[4];
        if compatible_version != 0 {
            return Err(AlacError::InvalidConfig);
        }

        let be32 = |at: usize| u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        Ok(Self {
            frame_length: be32(0),
            compatible_version,
            bit_depth: data[5],
            pb: data[6],
            mb: data[7],
            kb: data[8],
            num_channels: data[9],
            max_run: u16::from_be_bytes([data[10], data[11]]),
            max_frame_bytes: be32(12),
            avg_bit_rate: be32(16),
            sample_rate: be32(20),
        })
    }

    /// 序列化为 24 字节记录 (不带外壳)
    pub fn to_bytes(&self) -> [u8; CONFIG_SIZE] {
        let mut out = [0u8; CONFIG_SIZE];
        out[0..4].copy_from_slice(&self.frame_length.to_be_bytes());
        out[4] = self.compatible_version;
        out[5] = self.bit_depth;
        out[6] = self.pb;
        out[7] = self.mb;
        out[8] = self.kb;
        out[9] = self.num_channels;
        out[10..12].copy_from_slice(&self.max_run.to_be_bytes());
        out[12..16].copy_from_slice(&self.max_frame_bytes.to_be_bytes());
        out[16..20].copy_from_slice(&self.avg_bit_rate.to_be_bytes());
        out[20..24].copy_from_slice(&self.sample_rate.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AlacConfig {
        AlacConfig {
            frame_length: 4096,
            compatible_version: 0,
            bit_depth: 16,
            pb: 40,
            mb: 10,
            kb: 14,
            num_channels: 2,
            max_run: 255,
            max_frame_bytes: 0,
            avg_bit_rate: 0,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_解析_幂等() {
        let cfg = sample_config();
        let bytes = cfg.to_bytes();
        let parsed = AlacConfig::parse(&bytes).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(AlacConfig::parse(&parsed.to_bytes()).unwrap(), parsed);
    }

    #[test]
    fn test_剥离_frma_与_alac_外壳() {
        let cfg = sample_config();
        let mut cookie = Vec::new();
        cookie.extend_from_slice(&12u32.to_be_bytes());
        cookie.extend_from_slice(b"frma");
        cookie.extend_from_slice(b"alac");
        cookie.extend_from_slice(&36u32.to_be_bytes());
        cookie.extend_from_slice(b"alac");
        cookie.extend_from_slice(&[0, 0, 0, 0]);
        cookie.extend_from_slice(&cfg.to_bytes());
        assert_eq!(AlacConfig::parse(&cookie).unwrap(), cfg);
    }

    #[test]
    fn test_过短_拒绝() {
        let bytes = sample_config().to_bytes();
        assert_eq!(
            AlacConfig::parse(&bytes[..23]),
            Err(AlacError::InvalidConfig)
        );
    }

    #[test]
    fn test_兼容版本非零_拒绝() {
        let mut bytes = sample_config().to_bytes();
        bytes[4] = 1;
        assert_eq!(AlacConfig::parse(&bytes), Err(AlacError::InvalidConfig));
    }
}
