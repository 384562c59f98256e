//! # saprobe-core
//!
//! saprobe 音频解码框架核心库, 提供基础类型定义、错误处理和位写入工具.
//!
//! 上层的编解码器与容器格式 crate 都依赖这里的 PCM 格式描述与统一错误类型.

pub mod bitwriter;
pub mod channel_layout;
pub mod error;
pub mod pcm;
pub mod rational;

// 重导出常用类型
pub use channel_layout::{ChannelLayout, ChannelMask};
pub use error::{AlacError, SaprobeError, SaprobeResult};
pub use pcm::{BitDepth, PcmFormat};
pub use rational::Rational;
