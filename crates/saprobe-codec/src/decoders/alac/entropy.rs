//! 自适应 Golomb-Rice 熵解码.
//!
//! 每个声道块独立解码一组预测残差. 解码器维护一个带 9 位小数的滑动均值,
//! 由它推导每个样本的 Rice 参数 k; 均值足够小时切换到零游程模式.
//! 所有算术都按 32 位无符号回绕进行.

use saprobe_core::AlacError;

use super::bitcursor::BitCursor;

const QB_SHIFT: u32 = 9;
const QUANT_BITS: u32 = 1 << QB_SHIFT;
const MMUL_SHIFT: u32 = 2;
const MDEN_SHIFT: u32 = QB_SHIFT - MMUL_SHIFT - 1;
const MOFF: u32 = 1 << (MDEN_SHIFT - 2);
const BITOFF: i32 = 24;

/// 前缀长度上限, 达到上限后改读转义字段
const MAX_PREFIX_16: u32 = 9;
const MAX_PREFIX_32: u32 = 9;
const MAX_DATATYPE_16: u32 = 16;

const MAX_MEAN_CLAMP: u32 = 0xffff;
const MEAN_CLAMP_VAL: u32 = 0xffff;

/// 零游程达到此长度时不再为下一个样本保留进位
const MAX_ZERO_RUN: u32 = 65535;

/// 移位量不小于 32 时结果为 0
#[inline]
fn shr(value: u32, shift: u32) -> u32 {
    value.checked_shr(shift).unwrap_or(0)
}

#[inline]
fn shl(value: u32, shift: u32) -> u32 {
    value.checked_shl(shift).unwrap_or(0)
}

/// 前导零个数, 0 返回 32
#[inline]
fn lead(m: u32) -> u32 {
    m.leading_zeros()
}

/// floor(log2(x + 3))
#[inline]
fn lg3a(x: u32) -> u32 {
    31 - lead(x.wrapping_add(3))
}

#[inline]
fn read32(input: &[u8], offset: usize) -> u32 {
    let byte = |i: usize| u32::from(input.get(offset + i).copied().unwrap_or(0));
    (byte(0) << 24) | (byte(1) << 16) | (byte(2) << 8) | byte(3)
}

/// 从任意位偏移读取最多 33 位 (跨 5 个字节)
fn stream_bits(input: &[u8], bit_offset: u32, num_bits: u32) -> u32 {
    let byte_offset = (bit_offset >> 3) as usize;
    let sub = bit_offset & 7;
    let load1 = read32(input, byte_offset);

    if num_bits + sub > 32 {
        let head = shr(load1 << sub, 32u32.wrapping_sub(num_bits));
        let tail = u32::from(input.get(byte_offset + 4).copied().unwrap_or(0));
        return head | (tail >> (8 - (num_bits + sub - 32)));
    }

    let value = shr(load1, 32 - num_bits - sub);
    if num_bits < 32 {
        value & (shl(1, num_bits).wrapping_sub(1))
    } else {
        value
    }
}

/// 16 位变体码字, 用于零游程长度
fn dyn_get(input: &[u8], bit_pos: &mut u32, m: u32, k: u32) -> u32 {
    let mut pos = *bit_pos;
    let mut stream = read32(input, (pos >> 3) as usize) << (pos & 7);
    let prefix = lead(!stream);

    let result = if prefix >= MAX_PREFIX_16 {
        pos += MAX_PREFIX_16;
        stream <<= MAX_PREFIX_16;
        pos += MAX_DATATYPE_16;
        stream >> (32 - MAX_DATATYPE_16)
    } else {
        pos += prefix + 1;
        stream = shl(stream, prefix + 1);
        let val = shr(stream, 32u32.wrapping_sub(k));
        pos = pos.wrapping_add(k);
        if val < 2 {
            pos = pos.wrapping_sub(1);
            prefix.wrapping_mul(m)
        } else {
            prefix.wrapping_mul(m).wrapping_add(val).wrapping_sub(1)
        }
    };

    *bit_pos = pos;
    result
}

/// 32 位变体码字, 用于样本残差; 前缀溢出时读取 `max_bits` 位转义值
fn dyn_get_32bit(input: &[u8], bit_pos: &mut u32, m: u32, k: u32, max_bits: u32) -> u32 {
    let mut pos = *bit_pos;
    let stream = read32(input, (pos >> 3) as usize) << (pos & 7);
    let mut result = lead(!stream);

    if result >= MAX_PREFIX_32 {
        result = stream_bits(input, pos + MAX_PREFIX_32, max_bits);
        pos = pos.wrapping_add(MAX_PREFIX_32 + max_bits);
    } else {
        pos += result + 1;
        if k != 1 {
            let v = shr(stream << (result + 1), 32u32.wrapping_sub(k));
            if v >= 2 {
                result = result.wrapping_mul(m).wrapping_add(v).wrapping_sub(1);
                pos = pos.wrapping_add(k);
            } else {
                result = result.wrapping_mul(m);
                pos = pos.wrapping_add(k.wrapping_sub(1));
            }
        }
    }

    *bit_pos = pos;
    result
}

/// 自适应 Golomb 参数
///
/// 每个声道块新建一份, 均值与零游程标志只在 [`AdaptiveGolomb::decompress`] 内部存活.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AdaptiveGolomb {
    /// 初始均值
    mb0: u32,
    /// 均值更新系数, 已乘以块的 pb_factor / 4
    pb: u32,
    /// k 的上限
    kb: u32,
    /// 零游程 m 的掩码, 2^kb - 1
    wb: u32,
}

impl AdaptiveGolomb {
    pub(crate) fn new(mb: u32, pb: u32, pb_factor: u32, kb: u32) -> Self {
        Self {
            mb0: mb,
            pb: pb.wrapping_mul(pb_factor) / 4,
            kb,
            wb: shl(1, kb).wrapping_sub(1),
        }
    }

    /// 解码 `out.len()` 个残差, 游标前进恰好消耗的位数
    ///
    /// `chan_bits` 是转义字段宽度.
    pub(crate) fn decompress(
        &self,
        cursor: &mut BitCursor,
        out: &mut [i32],
        chan_bits: u32,
    ) -> Result<(), AlacError> {
        let num_samples = out.len();
        let input = cursor.remaining_bytes();
        let start = cursor.bit_idx();
        // 上限按整包位数计算, 与起始字节无关
        let max_pos = (cursor.size() as u32).wrapping_mul(8);
        let mut bit_pos = start;

        let mut mean = self.mb0;
        let mut zmode = 0u32;
        let mut count = 0usize;

        while count < num_samples {
            if bit_pos >= max_pos {
                return Err(AlacError::BitstreamOverrun);
            }

            let k = lg3a(mean >> QB_SHIFT).min(self.kb);
            let m = shl(1, k).wrapping_sub(1);
            let residual = dyn_get_32bit(input, &mut bit_pos, m, k, chan_bits);

            // 最低位为符号: 奇数取负
            let n = residual.wrapping_add(zmode);
            let magnitude = (n.wrapping_add(1) >> 1) as i32;
            let sign = (-((n & 1) as i32)) | 1;
            out[count] = magnitude.wrapping_mul(sign);
            count += 1;

            mean = self
                .pb
                .wrapping_mul(n)
                .wrapping_add(mean)
                .wrapping_sub(self.pb.wrapping_mul(mean) >> QB_SHIFT);
            if residual > MAX_MEAN_CLAMP {
                mean = MEAN_CLAMP_VAL;
            }

            zmode = 0;

            if (mean << MMUL_SHIFT) < QUANT_BITS && count < num_samples {
                zmode = 1;

                let k = (lead(mean) as i32 - BITOFF + ((mean + MOFF) >> MDEN_SHIFT) as i32).max(0)
                    as u32;
                let mz = shl(1, k).wrapping_sub(1) & self.wb;
                let run = dyn_get(input, &mut bit_pos, mz, k);

                if count + run as usize > num_samples {
                    return Err(AlacError::SampleCountOverrun);
                }
                out[count..count + run as usize].fill(0);
                count += run as usize;

                if run >= MAX_ZERO_RUN {
                    zmode = 0;
                }
                mean = 0;
            }
        }

        cursor.advance(bit_pos.wrapping_sub(start) as usize);
        Ok(())
    }
}
