//! I/O 抽象层.
//!
//! 为解封装器/封装器提供带读缓冲的统一读写接口, 后端可以是文件、内存或任意 `Write`.

use std::io::{self, Read, Seek, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use saprobe_core::{SaprobeError, SaprobeResult};

/// I/O 后端 trait
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 全部写入
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持 seek
    fn is_seekable(&self) -> bool;
    /// 刷新写缓冲
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// I/O 上下文
pub struct IoContext {
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: &str) -> SaprobeResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从文件路径打开 (写入)
    pub fn open_write(path: &str) -> SaprobeResult<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从内存数据创建, 写入时覆盖或追加
    pub fn from_memory(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data)))
    }

    /// 包装任意写入目标 (不可 seek, 如标准输出)
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::new(Box::new(WriterBackend::new(writer)))
    }

    // ========================
    // 读取方法
    // ========================

    /// 读取指定字节数
    pub fn read_exact(&mut self, buf: &mut [u8]) -> SaprobeResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    return Err(SaprobeError::Eof);
                }
            }
        }
        Ok(())
    }

    /// 尽量读取, 返回实际读到的字节数 (小于请求值表示到达末尾)
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> SaprobeResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            if self.buf_pos == self.buf_len {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
            let to_copy = (self.buf_len - self.buf_pos).min(buf.len() - total_read);
            buf[total_read..total_read + to_copy]
                .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
            self.buf_pos += to_copy;
            total_read += to_copy;
        }
        Ok(total_read)
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> SaprobeResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// 读取 u32 小端
    pub fn read_u32_le(&mut self) -> SaprobeResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// 读取 u32 大端
    pub fn read_u32_be(&mut self) -> SaprobeResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    /// 读取 u64 大端
    pub fn read_u64_be(&mut self) -> SaprobeResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(BigEndian::read_u64(&buf))
    }

    /// 读取 4 字节标签 (FourCC)
    pub fn read_tag(&mut self) -> SaprobeResult<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取指定数量的字节
    pub fn read_bytes(&mut self, count: usize) -> SaprobeResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 从当前位置读取到末尾
    pub fn read_to_end(&mut self) -> SaprobeResult<Vec<u8>> {
        let mut out = self.buffer[self.buf_pos..self.buf_len].to_vec();
        self.buf_pos = self.buf_len;
        let mut chunk = vec![0u8; DEFAULT_BUFFER_SIZE];
        loop {
            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> SaprobeResult<()> {
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }

        let remaining = count - buffered;
        self.buf_pos = self.buf_len;

        if self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
        } else {
            // 逐块丢弃
            let mut left = remaining;
            while left > 0 {
                let to_read = left.min(self.buffer.len());
                let n = self.inner.read(&mut self.buffer[..to_read])?;
                if n == 0 {
                    return Err(SaprobeError::Eof);
                }
                left -= n;
            }
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(())
    }

    // ========================
    // 写入方法
    // ========================

    /// 写入全部数据
    pub fn write_all(&mut self, buf: &[u8]) -> SaprobeResult<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    /// 刷新写缓冲
    pub fn flush(&mut self) -> SaprobeResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek), 会清空读缓冲区
    pub fn seek(&mut self, pos: io::SeekFrom) -> SaprobeResult<u64> {
        // 相对定位要扣除尚未消耗的缓冲数据
        let pos = match pos {
            io::SeekFrom::Current(offset) => {
                io::SeekFrom::Current(offset - (self.buf_len - self.buf_pos) as i64)
            }
            other => other,
        };
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 获取当前位置 (扣除读缓冲中尚未消耗的数据)
    pub fn position(&mut self) -> SaprobeResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    /// 是否支持随机访问
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// 获取总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// 内存缓冲区 I/O 后端, 可读写可 seek
struct MemoryBackend {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryBackend {
    fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.pos > self.data.len() {
            self.data.resize(self.pos, 0);
        }
        // 覆盖已有数据, 超出部分追加
        let overlap = (self.data.len() - self.pos).min(buf.len());
        self.data[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
        self.data.extend_from_slice(&buf[overlap..]);
        self.pos += buf.len();
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 只写流后端 (标准输出等)
struct WriterBackend<W> {
    writer: W,
    written: u64,
}

impl<W: Write> WriterBackend<W> {
    fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }
}

impl<W: Write + Send> IoBackend for WriterBackend<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "只写流不支持读取"))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "只写流不支持 seek"))
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.written)
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_大小端整数读取() {
        let mut io = IoContext::from_memory(vec![
            0x01, 0x02, 0x03, 0x04, 0x01, 0x02, 0x03, 0x04, 0, 0, 0, 0, 0, 0, 0x01, 0x00,
        ]);
        assert_eq!(io.read_u32_be().unwrap(), 0x0102_0304);
        assert_eq!(io.read_u32_le().unwrap(), 0x0403_0201);
        assert_eq!(io.read_u64_be().unwrap(), 0x0100);
        assert!(matches!(io.read_u8().unwrap_err(), SaprobeError::Eof));
    }

    #[test]
    fn test_位置与跳过_考虑缓冲() {
        let mut io = IoContext::from_memory((0u8..100).collect());
        assert_eq!(io.read_u8().unwrap(), 0);
        assert_eq!(io.position().unwrap(), 1);
        io.skip(9).unwrap();
        assert_eq!(io.read_u8().unwrap(), 10);
        io.seek(io::SeekFrom::Current(4)).unwrap();
        assert_eq!(io.read_u8().unwrap(), 15);
        io.seek(io::SeekFrom::Start(0)).unwrap();
        assert_eq!(io.read_tag().unwrap(), [0, 1, 2, 3]);
    }

    #[test]
    fn test_读取到末尾() {
        let mut io = IoContext::from_memory(vec![1, 2, 3, 4, 5]);
        io.skip(2).unwrap();
        assert_eq!(io.read_to_end().unwrap(), vec![3, 4, 5]);
    }

    #[test]
    fn test_尽量读取_短文件() {
        let mut io = IoContext::from_memory(vec![7, 8, 9]);
        let mut buf = [0u8; 12];
        assert_eq!(io.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[7, 8, 9]);
    }

    #[test]
    fn test_内存后端_覆盖写入() {
        let mut io = IoContext::from_memory(Vec::new());
        io.write_all(b"RIFF\0\0\0\0").unwrap();
        io.seek(io::SeekFrom::Start(4)).unwrap();
        io.write_all(&0x2Au32.to_le_bytes()).unwrap();
        assert_eq!(io.position().unwrap(), 8);
        assert_eq!(io.size(), Some(8));

        io.seek(io::SeekFrom::Start(0)).unwrap();
        assert_eq!(&io.read_tag().unwrap(), b"RIFF");
        assert_eq!(io.read_u32_le().unwrap(), 0x2A);
    }

    #[test]
    fn test_文件后端读写() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("io.bin");
        let path = path.to_str().unwrap();

        let mut out = IoContext::open_write(path).unwrap();
        out.write_all(b"data\xEF\xBE").unwrap();
        out.flush().unwrap();
        drop(out);

        let mut input = IoContext::open_read(path).unwrap();
        assert_eq!(input.size(), Some(6));
        assert_eq!(&input.read_tag().unwrap(), b"data");
        assert_eq!(input.read_bytes(2).unwrap(), vec![0xEF, 0xBE]);
    }
}
