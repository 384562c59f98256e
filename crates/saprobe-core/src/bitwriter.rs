//! 比特流写入器.
//!
//! 按大端位序 (MSB first) 向字节缓冲区写入数据, 主要用于在测试和基准中
//! 手工拼装 ALAC 数据包.

/// 比特流写入器
///
/// # 示例
/// ```
/// use saprobe_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001, 4);
/// bw.write_bits(0b01010101, 8);
/// assert_eq!(bw.finish(), vec![0b10110001, 0b01010101]);
/// ```
pub struct BitWriter {
    /// 已完成的字节
    data: Vec<u8>,
    /// 正在填充的字节
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.flush_byte();
        }
    }

    /// 写入 `value` 的低 `n` 位 (最多 32 位), 高位在前
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);

        let mut remaining = n;
        while remaining > 0 {
            let room = 8 - u32::from(self.bit_count);
            let take = remaining.min(room);
            let chunk = ((u64::from(value) >> (remaining - take)) & ((1u64 << take) - 1)) as u8;

            self.current_byte = ((u16::from(self.current_byte) << take) as u8) | chunk;
            self.bit_count += take as u8;
            if self.bit_count == 8 {
                self.flush_byte();
            }
            remaining -= take;
        }
    }

    /// 写入有符号整数 (二进制补码, 取低 `n` 位)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) {
        let mask = ((1u64 << n) - 1) as u32;
        self.write_bits(value as u32 & mask, n);
    }

    /// 写入一元编码: `count` 个 `!stop_bit`, 然后一个 `stop_bit`
    pub fn write_unary(&mut self, count: u32, stop_bit: u32) {
        let fill = 1 - (stop_bit & 1);
        for _ in 0..count {
            self.write_bit(fill);
        }
        self.write_bit(stop_bit & 1);
    }

    /// 对齐到字节边界 (用 0 填充)
    pub fn align_to_byte(&mut self) {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.flush_byte();
        }
    }

    /// 写入完整字节
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }

    /// 完成写入, 不足一字节的部分用 0 补齐
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }

    fn flush_byte(&mut self) {
        self.data.push(self.current_byte);
        self.current_byte = 0;
        self.bit_count = 0;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_basic() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b1011, 4);
        bw.write_bits(0b0001, 4);
        assert_eq!(bw.finish(), vec![0b10110001]);
    }

    #[test]
    fn test_write_bits_跨字节() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        bw.write_bits(0x1FF, 9);
        bw.write_bits(0, 4);
        assert_eq!(bw.finish(), vec![0b1011_1111, 0b1111_0000]);
    }

    #[test]
    fn test_write_bits_32_bit() {
        let mut bw = BitWriter::new();
        bw.write_bit(1);
        bw.write_bits(0xFF00FF00, 32);
        assert_eq!(bw.bits_written(), 33);
        assert_eq!(bw.finish(), vec![0xFF, 0x80, 0x7F, 0x80, 0x00]);
    }

    #[test]
    fn test_write_unary() {
        let mut bw = BitWriter::new();
        bw.write_unary(3, 0); // 1110
        bw.write_unary(0, 0); // 0
        bw.write_bits(0, 3);
        assert_eq!(bw.finish(), vec![0b11100000]);
    }

    #[test]
    fn test_write_bits_signed() {
        let mut bw = BitWriter::new();
        bw.write_bits_signed(-1, 4);
        bw.write_bits_signed(-8, 4);
        assert_eq!(bw.finish(), vec![0b1111_1000]);
    }

    #[test]
    fn test_align_and_bytes() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        bw.align_to_byte();
        bw.write_bytes(&[0x01, 0x02]);
        bw.write_bit(1);
        bw.write_bytes(&[0xFF]);
        assert_eq!(bw.finish(), vec![0b10100000, 0x01, 0x02, 0xFF, 0x80]);
    }
}
