//! # saprobe-format
//!
//! saprobe 容器格式库, 提供解封装/封装框架与格式识别.
//!
//! - **解封装**: MP4 (ALAC 轨道), WAV
//! - **封装**: WAV (含 WAVE_FORMAT_EXTENSIBLE)
//! - **识别**: `identify()` 按文件头判定编解码器

pub mod demuxer;
pub mod demuxers;
pub mod detect;
pub mod format_id;
pub mod io;
pub mod muxer;
pub mod muxers;
pub mod probe;
pub mod registry;
pub mod stream;

// 重导出常用类型
pub use demuxer::Demuxer;
pub use detect::{Codec, identify};
pub use format_id::FormatId;
pub use io::IoContext;
pub use muxer::Muxer;
pub use probe::ProbeResult;
pub use registry::FormatRegistry;
pub use stream::Stream;

/// 注册所有内置容器格式
pub fn register_all(registry: &mut FormatRegistry) {
    demuxers::register_all_demuxers(registry);
    muxers::register_all_muxers(registry);
}
