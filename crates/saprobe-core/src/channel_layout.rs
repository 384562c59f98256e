//! 声道布局.
//!
//! 掩码位与 WAVE_FORMAT_EXTENSIBLE 的 dwChannelMask 逐位对应,
//! WAV 封装器直接写入 `mask.bits()`.

use bitflags::bitflags;

bitflags! {
    /// 扬声器位置掩码
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelMask: u32 {
        const FRONT_LEFT    = 0x001;
        const FRONT_RIGHT   = 0x002;
        const FRONT_CENTER  = 0x004;
        /// 低频效果 (LFE)
        const LOW_FREQUENCY = 0x008;
        const BACK_LEFT     = 0x010;
        const BACK_RIGHT    = 0x020;
        const SIDE_LEFT     = 0x200;
        const SIDE_RIGHT    = 0x400;
    }
}

impl ChannelMask {
    /// 声道数对应的默认掩码, 没有约定布局的声道数返回空掩码
    pub const fn for_channels(channels: u32) -> Self {
        let front = Self::FRONT_LEFT.union(Self::FRONT_RIGHT);
        let back = Self::BACK_LEFT.union(Self::BACK_RIGHT);
        let surround = front
            .union(Self::FRONT_CENTER)
            .union(Self::LOW_FREQUENCY)
            .union(back);
        match channels {
            1 => Self::FRONT_CENTER,
            2 => front,
            4 => front.union(back),
            6 => surround,
            8 => surround.union(Self::SIDE_LEFT).union(Self::SIDE_RIGHT),
            _ => Self::empty(),
        }
    }
}

/// 声道布局: 声道数与扬声器掩码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    pub channels: u32,
    pub mask: ChannelMask,
}

impl ChannelLayout {
    pub const fn from_channels(channels: u32) -> Self {
        Self {
            channels,
            mask: ChannelMask::for_channels(channels),
        }
    }
}
