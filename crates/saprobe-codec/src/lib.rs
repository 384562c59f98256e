//! # saprobe-codec
//!
//! saprobe 音频解码器库, 提供解码器框架与 Packet/Frame 抽象.
//!
//! ## 支持的解码器
//!
//! - **原生**: ALAC, PCM (S16/S24/S32 小端)
//! - **symphonia 后端** (`symphonia-backend` 特性): FLAC, MP3, Vorbis, AAC
//!
//! ## 使用示例
//!
//! ```rust
//! use saprobe_codec::{CodecId, CodecRegistry};
//!
//! let mut reg = CodecRegistry::new();
//! saprobe_codec::register_all(&mut reg);
//!
//! let decoder = reg.create_decoder(CodecId::Alac).unwrap();
//! assert_eq!(decoder.name(), "alac");
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod registry;

// 重导出常用类型
pub use codec_id::CodecId;
pub use codec_parameters::{AudioCodecParams, CodecParameters, CodecParamsType};
pub use decoder::Decoder;
pub use frame::{AudioFrame, Frame};
pub use packet::Packet;
pub use registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
}
