//! 解封装器实现模块.

pub mod mp4;
pub mod wav;

use crate::format_id::FormatId;
use crate::registry::FormatRegistry;

/// 注册所有内置解封装器
pub fn register_all_demuxers(registry: &mut FormatRegistry) {
    registry.register_demuxer(FormatId::Wav, "wav", wav::WavDemuxer::create);
    registry.register_probe(Box::new(wav::WavProbe));

    registry.register_demuxer(FormatId::Mp4, "mp4", mp4::Mp4Demuxer::create);
    registry.register_probe(Box::new(mp4::Mp4Probe));
}
