//! 解码器实现模块.

pub mod alac;
#[cfg(feature = "symphonia-backend")]
pub mod backend;
pub mod pcm;

use crate::codec_id::CodecId;
use crate::registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all_decoders(registry: &mut CodecRegistry) {
    registry.register_decoder(CodecId::PcmS16le, "pcm_s16le", pcm::PcmDecoder::new_s16le);
    registry.register_decoder(CodecId::PcmS24le, "pcm_s24le", pcm::PcmDecoder::new_s24le);
    registry.register_decoder(CodecId::PcmS32le, "pcm_s32le", pcm::PcmDecoder::new_s32le);
    registry.register_decoder(CodecId::Alac, "alac", alac::AlacDecoder::create);
}
