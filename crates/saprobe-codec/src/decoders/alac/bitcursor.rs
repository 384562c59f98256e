//! ALAC 数据包位游标.
//!
//! 在数据包副本上按 MSB 优先顺序读取. 副本末尾补 4 个零字节,
//! 使 24 位窗口读取在包尾也能安全取到数据. 读取本身不做越界检查,
//! 越过副本的位一律按 0 处理, 由调用方通过 [`BitCursor::past_end`] 判定溢出.

/// 末尾填充的零字节数
const PADDING: usize = 4;

/// 数据包位游标
#[derive(Debug, Clone)]
pub(crate) struct BitCursor {
    /// 补零后的数据副本
    buf: Vec<u8>,
    /// 当前字节位置
    pos: usize,
    /// 当前字节内的位偏移 (0-7)
    bit_idx: u32,
    /// 未补零的数据长度
    size: usize,
}

/// 游标位置快照, 用于回到移位字节区读取
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorMark {
    pos: usize,
    bit_idx: u32,
}

impl BitCursor {
    /// 复制数据包并补零
    pub(crate) fn new(data: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(data.len() + PADDING);
        buf.extend_from_slice(data);
        buf.resize(data.len() + PADDING, 0);
        Self {
            buf,
            pos: 0,
            bit_idx: 0,
            size: data.len(),
        }
    }

    #[inline]
    fn byte_at(&self, idx: usize) -> u32 {
        u32::from(self.buf.get(idx).copied().unwrap_or(0))
    }

    /// 读取 `n` 位 (n <= 16), 24 位窗口
    #[inline]
    pub(crate) fn read(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 16);
        if n == 0 {
            return 0;
        }
        let window = (self.byte_at(self.pos) << 16)
            | (self.byte_at(self.pos + 1) << 8)
            | self.byte_at(self.pos + 2);
        let value = ((window << self.bit_idx) & 0x00FF_FFFF) >> (24 - n);
        self.advance(n as usize);
        value
    }

    /// 读取 `n` 位 (n <= 8), 16 位窗口
    #[inline]
    pub(crate) fn read_small(&mut self, n: u32) -> u8 {
        debug_assert!(n <= 8);
        if n == 0 {
            return 0;
        }
        let window = ((self.byte_at(self.pos) << 8) | self.byte_at(self.pos + 1)) as u16;
        let value = (window << self.bit_idx) >> (16 - n);
        self.advance(n as usize);
        value as u8
    }

    /// 读取单个位
    #[inline]
    pub(crate) fn read_one(&mut self) -> u8 {
        let value = (self.byte_at(self.pos) >> (7 - self.bit_idx)) & 1;
        self.advance(1);
        value as u8
    }

    /// 跳过 `n` 位
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        let bits = self.bit_idx as usize + n;
        self.pos += bits >> 3;
        self.bit_idx = (bits & 7) as u32;
    }

    /// 前进到下一个字节边界, 已对齐时不动
    pub(crate) fn byte_align(&mut self) {
        if self.bit_idx != 0 {
            self.advance(8 - self.bit_idx as usize);
        }
    }

    /// 字节位置是否已到达数据末尾
    pub(crate) fn past_end(&self) -> bool {
        self.pos >= self.size
    }

    /// 记录当前位置
    pub(crate) fn snapshot(&self) -> CursorMark {
        CursorMark {
            pos: self.pos,
            bit_idx: self.bit_idx,
        }
    }

    /// 以快照位置创建独立游标, 共享同一份数据
    pub(crate) fn reader_at(&self, mark: CursorMark) -> MarkReader<'_> {
        MarkReader {
            cursor: self,
            pos: mark.pos,
            bit_idx: mark.bit_idx,
        }
    }

    /// 从当前字节起的原始数据 (含填充)
    pub(crate) fn remaining_bytes(&self) -> &[u8] {
        self.buf.get(self.pos..).unwrap_or(&[])
    }

    pub(crate) fn bit_idx(&self) -> u32 {
        self.bit_idx
    }

    /// 未补零的数据长度 (字节)
    pub(crate) fn size(&self) -> usize {
        self.size
    }
}

/// 基于快照位置的只读游标
///
/// 与主游标共享数据, 各自维护位置.
pub(crate) struct MarkReader<'a> {
    cursor: &'a BitCursor,
    pos: usize,
    bit_idx: u32,
}

impl MarkReader<'_> {
    /// 读取 `n` 位 (n <= 16)
    pub(crate) fn read(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let c = self.cursor;
        let window =
            (c.byte_at(self.pos) << 16) | (c.byte_at(self.pos + 1) << 8) | c.byte_at(self.pos + 2);
        let value = ((window << self.bit_idx) & 0x00FF_FFFF) >> (24 - n);
        let bits = self.bit_idx + n;
        self.pos += (bits >> 3) as usize;
        self.bit_idx = bits & 7;
        value
    }
}
