//! 立体声反混合与交错 PCM 打包.
//!
//! 输出为交错小端有符号 PCM, 步长 `声道数 × 每样本字节数`,
//! 偏移 `声道索引 × 每样本字节数`. 20 位样本左移 4 位后存 3 字节;
//! 24/32 位在 `bytes_shifted != 0` 时拼接移位字节区的低位.

use saprobe_core::BitDepth;

/// 声道对的混合参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct StereoMix {
    pub(crate) bits: u32,
    pub(crate) res: i32,
}

impl StereoMix {
    /// 由 (u, v) 还原 (左, 右)
    #[inline]
    fn unmix(self, u: i32, v: i32) -> (i32, i32) {
        if self.res == 0 {
            return (u, v);
        }
        let left = u
            .wrapping_add(v)
            .wrapping_sub(self.res.wrapping_mul(v) >> self.bits.min(31));
        (left, left.wrapping_sub(v))
    }
}

/// 交错输出目标
pub(crate) struct Interleaved<'a> {
    pub(crate) out: &'a mut [u8],
    pub(crate) depth: BitDepth,
    pub(crate) num_channels: usize,
}

impl Interleaved<'_> {
    #[inline]
    fn put(&mut self, pos: usize, value: i32) {
        match self.depth {
            BitDepth::Depth16 => {
                self.out[pos..pos + 2].copy_from_slice(&(value as i16).to_le_bytes());
            }
            BitDepth::Depth20 => {
                self.out[pos..pos + 3].copy_from_slice(&(value << 4).to_le_bytes()[..3]);
            }
            BitDepth::Depth24 => {
                self.out[pos..pos + 3].copy_from_slice(&value.to_le_bytes()[..3]);
            }
            BitDepth::Depth32 => {
                self.out[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }

    /// 移位字节只在 24/32 位下生效
    #[inline]
    fn restore_low_bytes(&self, value: i32, low: u16, bytes_shifted: u32) -> i32 {
        match self.depth {
            BitDepth::Depth24 | BitDepth::Depth32 if bytes_shifted != 0 => {
                (value << (bytes_shifted * 8)) | i32::from(low)
            }
            _ => value,
        }
    }

    /// 写入单声道元素
    pub(crate) fn write_mono(
        &mut self,
        mix_u: &[i32],
        chan_idx: usize,
        num_samples: usize,
        shift_buf: &[u16],
        bytes_shifted: u32,
    ) {
        let bps = self.depth.bytes_per_sample();
        let stride = self.num_channels * bps;
        let offset = chan_idx * bps;
        for (idx, &u) in mix_u[..num_samples].iter().enumerate() {
            let low = shift_buf.get(idx).copied().unwrap_or(0);
            let value = self.restore_low_bytes(u, low, bytes_shifted);
            self.put(offset + idx * stride, value);
        }
    }

    /// 反混合并写入声道对
    ///
    /// `shift_buf` 按 `[2i]` 左, `[2i + 1]` 右交错.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write_stereo(
        &mut self,
        mix_u: &[i32],
        mix_v: &[i32],
        chan_idx: usize,
        num_samples: usize,
        mix: StereoMix,
        shift_buf: &[u16],
        bytes_shifted: u32,
    ) {
        let bps = self.depth.bytes_per_sample();
        let stride = self.num_channels * bps;
        let offset = chan_idx * bps;
        let pairs = mix_u[..num_samples].iter().zip(&mix_v[..num_samples]);
        for (idx, (&u, &v)) in pairs.enumerate() {
            let (left, right) = mix.unmix(u, v);
            let low_l = shift_buf.get(idx * 2).copied().unwrap_or(0);
            let low_r = shift_buf.get(idx * 2 + 1).copied().unwrap_or(0);
            let left = self.restore_low_bytes(left, low_l, bytes_shifted);
            let right = self.restore_low_bytes(right, low_r, bytes_shifted);

            let pos = offset + idx * stride;
            self.put(pos, left);
            self.put(pos + bps, right);
        }
    }
}
