//! 解码器注册表.
//!
//! 按 CodecId 查找并实例化解码器.

use std::collections::HashMap;

use saprobe_core::{SaprobeError, SaprobeResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;

/// 解码器工厂函数类型
pub type DecoderFactory = fn() -> SaprobeResult<Box<dyn Decoder>>;

/// 解码器注册表
pub struct CodecRegistry {
    decoders: HashMap<CodecId, Vec<DecoderEntry>>,
}

/// 解码器注册条目
struct DecoderEntry {
    name: String,
    factory: DecoderFactory,
}

impl CodecRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// 注册一个解码器
    pub fn register_decoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: DecoderFactory,
    ) {
        self.decoders
            .entry(codec_id)
            .or_default()
            .push(DecoderEntry {
                name: name.into(),
                factory,
            });
    }

    /// 创建指定编解码器 ID 的解码器实例
    ///
    /// 同一 ID 注册了多个实现时使用最先注册的.
    pub fn create_decoder(&self, codec_id: CodecId) -> SaprobeResult<Box<dyn Decoder>> {
        let entry = self
            .decoders
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| SaprobeError::CodecNotFound(format!("未找到 {} 的解码器", codec_id)))?;
        (entry.factory)()
    }

    /// 获取所有已注册的解码器名称
    pub fn list_decoders(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.decoders {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_注册所有解码器() {
        let mut registry = CodecRegistry::new();
        crate::register_all(&mut registry);
        // 3 个 PCM + ALAC
        assert_eq!(registry.list_decoders().len(), 4);
    }

    #[test]
    fn test_按codec_id创建解码器() {
        let mut registry = CodecRegistry::new();
        crate::register_all(&mut registry);

        for id in [
            CodecId::Alac,
            CodecId::PcmS16le,
            CodecId::PcmS24le,
            CodecId::PcmS32le,
        ] {
            let dec = registry.create_decoder(id);
            assert!(dec.is_ok(), "创建 {} 解码器失败", id);
            assert_eq!(dec.unwrap().codec_id(), id);
        }
    }

    #[test]
    fn test_未注册的解码器返回错误() {
        let registry = CodecRegistry::new();
        let err = registry.create_decoder(CodecId::Alac).err().unwrap();
        assert!(matches!(err, SaprobeError::CodecNotFound(_)));
    }
}
