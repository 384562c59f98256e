//! 容器格式注册表.
//!
//! 管理已注册的解封装器/封装器, 支持按格式标识查找和自动探测.

use std::collections::HashMap;

use saprobe_core::{SaprobeError, SaprobeResult};

use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::muxer::Muxer;
use crate::probe::{FormatProbe, ProbeResult};

/// 解封装器工厂函数类型
pub type DemuxerFactory = fn() -> SaprobeResult<Box<dyn Demuxer>>;

/// 封装器工厂函数类型
pub type MuxerFactory = fn() -> SaprobeResult<Box<dyn Muxer>>;

/// 探测时最多读取的头部字节数
const PROBE_SIZE: u64 = 8192;

/// 容器格式注册表
pub struct FormatRegistry {
    demuxers: HashMap<FormatId, (String, DemuxerFactory)>,
    muxers: HashMap<FormatId, (String, MuxerFactory)>,
    probes: Vec<Box<dyn FormatProbe + Send>>,
}

impl FormatRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            demuxers: HashMap::new(),
            muxers: HashMap::new(),
            probes: Vec::new(),
        }
    }

    /// 注册一个解封装器
    pub fn register_demuxer(
        &mut self,
        format_id: FormatId,
        name: impl Into<String>,
        factory: DemuxerFactory,
    ) {
        self.demuxers.insert(format_id, (name.into(), factory));
    }

    /// 注册一个封装器
    pub fn register_muxer(&mut self, format_id: FormatId, name: impl Into<String>, factory: MuxerFactory) {
        self.muxers.insert(format_id, (name.into(), factory));
    }

    /// 注册一个格式探测器
    pub fn register_probe(&mut self, probe: Box<dyn FormatProbe + Send>) {
        self.probes.push(probe);
    }

    /// 创建指定格式的解封装器实例
    pub fn create_demuxer(&self, format_id: FormatId) -> SaprobeResult<Box<dyn Demuxer>> {
        let (_, factory) = self.demuxers.get(&format_id).ok_or_else(|| {
            SaprobeError::FormatNotFound(format!("未找到 {} 的解封装器", format_id))
        })?;
        factory()
    }

    /// 创建指定格式的封装器实例
    pub fn create_muxer(&self, format_id: FormatId) -> SaprobeResult<Box<dyn Muxer>> {
        let (_, factory) = self.muxers.get(&format_id).ok_or_else(|| {
            SaprobeError::FormatNotFound(format!("未找到 {} 的封装器", format_id))
        })?;
        factory()
    }

    /// 探测数据的容器格式, 返回置信度最高的结果
    pub fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeResult> {
        let mut best: Option<ProbeResult> = None;
        for probe in &self.probes {
            if let Some(score) = probe.probe(data, filename) {
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(ProbeResult {
                        format_id: probe.format_id(),
                        score,
                    });
                }
            }
        }
        best
    }

    /// 已注册的解封装器
    pub fn list_demuxers(&self) -> Vec<(FormatId, &str)> {
        self.demuxers
            .iter()
            .map(|(id, (name, _))| (*id, name.as_str()))
            .collect()
    }

    /// 已注册的封装器
    pub fn list_muxers(&self) -> Vec<(FormatId, &str)> {
        self.muxers
            .iter()
            .map(|(id, (name, _))| (*id, name.as_str()))
            .collect()
    }

    /// 探测输入格式 (不打开解封装器), 完成后 seek 回起始位置
    pub fn probe_input(&self, io: &mut IoContext, filename: Option<&str>) -> SaprobeResult<ProbeResult> {
        let probe_size = io.size().unwrap_or(PROBE_SIZE).clamp(12, PROBE_SIZE) as usize;
        let mut probe_buf = vec![0u8; probe_size];
        let got = io.read_up_to(&mut probe_buf)?;
        probe_buf.truncate(got);

        let result = self
            .probe(&probe_buf, filename)
            .ok_or_else(|| SaprobeError::FormatNotFound("无法识别输入文件格式".into()))?;

        io.seek(std::io::SeekFrom::Start(0))?;
        Ok(result)
    }

    /// 自动探测格式, 创建对应的解封装器并调用 `open()`
    pub fn open_input(&self, io: &mut IoContext, filename: Option<&str>) -> SaprobeResult<Box<dyn Demuxer>> {
        let result = self.probe_input(io, filename)?;
        let mut demuxer = self.create_demuxer(result.format_id)?;
        demuxer.open(io)?;
        Ok(demuxer)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::muxers::wav::encode_to_vec;
    use crate::probe::SCORE_MAX;
    use saprobe_core::{BitDepth, PcmFormat};

    fn registry() -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        crate::register_all(&mut registry);
        registry
    }

    #[test]
    fn test_注册表_内置格式() {
        let registry = registry();
        let mut demuxers: Vec<&str> = registry.list_demuxers().into_iter().map(|(_, n)| n).collect();
        demuxers.sort_unstable();
        assert_eq!(demuxers, vec!["mp4", "wav"]);
        assert_eq!(registry.list_muxers().len(), 1);
        assert!(registry.create_muxer(FormatId::Wav).is_ok());
        assert!(matches!(
            registry.create_muxer(FormatId::Mp4).err(),
            Some(SaprobeError::FormatNotFound(_))
        ));
    }

    #[test]
    fn test_探测并打开_wav() {
        let format = PcmFormat {
            sample_rate: 8000,
            bit_depth: BitDepth::Depth16,
            channels: 1,
        };
        let wav = encode_to_vec(&[1, 0, 2, 0], &format).unwrap();
        let mut io = IoContext::from_memory(wav);

        let registry = registry();
        let result = registry.probe_input(&mut io, None).unwrap();
        assert_eq!(result.format_id, FormatId::Wav);
        assert_eq!(result.score, SCORE_MAX);
        assert_eq!(io.position().unwrap(), 0);

        let demuxer = registry.open_input(&mut io, None).unwrap();
        assert_eq!(demuxer.streams()[0].nb_frames, 2);
    }

    #[test]
    fn test_无法识别的输入() {
        let mut io = IoContext::from_memory(b"hello".to_vec());
        assert!(matches!(
            registry().probe_input(&mut io, Some("a.txt")),
            Err(SaprobeError::FormatNotFound(_))
        ));
    }
}
