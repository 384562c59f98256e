//! 数据包元素状态机.
//!
//! 一个数据包由若干元素组成, 每个元素以 3 位类型标签开头.
//! SCE/LFE 解码一个声道, CPE 解码一个声道对, DSE/FIL 跳过, END 结束本包.

use saprobe_core::{AlacError, BitDepth, PcmFormat};

use super::bitcursor::BitCursor;
use super::config::AlacConfig;
use super::entropy::AdaptiveGolomb;
use super::matrix::{Interleaved, StereoMix};
use super::predictor;

const ELEM_SCE: u8 = 0;
const ELEM_CPE: u8 = 1;
const ELEM_CCE: u8 = 2;
const ELEM_LFE: u8 = 3;
const ELEM_DSE: u8 = 4;
const ELEM_PCE: u8 = 5;
const ELEM_FIL: u8 = 6;
const ELEM_END: u8 = 7;

/// 每个声道块最多的预测系数个数
const MAX_COEFS: usize = 32;

/// 支持的最大声道数
const MAX_CHANNELS: u8 = 8;

/// 声道头部
struct ElementHeader {
    bytes_shifted: u32,
    escape: bool,
    num_samples: usize,
}

/// 单个声道块的预测参数
struct ChannelParams {
    mode: u32,
    den_shift: u32,
    pb_factor: u32,
    num_coefs: u32,
    coefs: [i16; MAX_COEFS],
}

impl ChannelParams {
    fn read(cursor: &mut BitCursor) -> Self {
        let header = cursor.read(8);
        let mode = header >> 4;
        let den_shift = header & 0xf;
        let header = cursor.read(8);
        let pb_factor = header >> 5;
        let num_coefs = header & 0x1f;

        let mut coefs = [0i16; MAX_COEFS];
        for c in coefs.iter_mut().take(num_coefs as usize) {
            *c = cursor.read(16) as i16;
        }
        Self {
            mode,
            den_shift,
            pb_factor,
            num_coefs,
            coefs,
        }
    }
}

/// 还原目标缓冲区
#[derive(Clone, Copy)]
enum MixSlot {
    U,
    V,
}

/// 符号扩展 `chan_bits` 位原始值
#[inline]
fn sign_extend(raw: i32, shift: u32) -> i32 {
    if shift >= 32 { 0 } else { (raw << shift) >> shift }
}

/// ALAC 数据包解码器
///
/// 持有配置与按 `frame_length` 一次性分配的暂存缓冲区, 跨数据包复用.
/// 解码需要 `&mut self`, 同一解码器不会被并发使用.
pub struct PacketDecoder {
    config: AlacConfig,
    format: PcmFormat,
    mix_u: Vec<i32>,
    mix_v: Vec<i32>,
    predictor: Vec<i32>,
    shift_buffer: Vec<u16>,
}

impl PacketDecoder {
    /// 由配置创建解码器
    pub fn new(config: AlacConfig) -> Result<Self, AlacError> {
        let bit_depth = match config.bit_depth {
            16 => BitDepth::Depth16,
            20 => BitDepth::Depth20,
            24 => BitDepth::Depth24,
            32 => BitDepth::Depth32,
            _ => return Err(AlacError::UnsupportedBitDepth),
        };
        if config.num_channels == 0 || config.num_channels > MAX_CHANNELS {
            return Err(AlacError::InvalidConfig);
        }

        let frame_length = config.frame_length as usize;
        Ok(Self {
            config,
            format: PcmFormat {
                sample_rate: config.sample_rate,
                bit_depth,
                channels: u32::from(config.num_channels),
            },
            mix_u: vec![0; frame_length],
            mix_v: vec![0; frame_length],
            predictor: vec![0; frame_length],
            shift_buffer: vec![0; frame_length * 2],
        })
    }

    /// 输出 PCM 格式
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// 解码一个数据包, 返回交错小端 PCM
    ///
    /// 输出长度为 `采样数 × 声道数 × 每样本字节数`, 未出现的声道保持静音.
    pub fn decode_packet(&mut self, packet: &[u8]) -> Result<Vec<u8>, AlacError> {
        let mut cursor = BitCursor::new(packet);
        let num_channels = self.format.channels as usize;
        let bps = self.format.bit_depth.bytes_per_sample();
        let mut num_samples = self.config.frame_length as usize;
        let mut chan_idx = 0usize;

        let mut output = vec![0u8; num_samples * num_channels * bps];

        loop {
            if cursor.past_end() {
                return Err(AlacError::BitstreamOverrun);
            }

            match cursor.read_small(3) {
                ELEM_SCE | ELEM_LFE => {
                    num_samples =
                        self.decode_sce(&mut cursor, &mut output, chan_idx, num_samples)?;
                    chan_idx += 1;
                }
                ELEM_CPE => {
                    // 声道对放不下时本帧隐式结束
                    if chan_idx + 2 > num_channels {
                        break;
                    }
                    num_samples =
                        self.decode_cpe(&mut cursor, &mut output, chan_idx, num_samples)?;
                    chan_idx += 2;
                }
                ELEM_CCE | ELEM_PCE => return Err(AlacError::UnsupportedElement),
                ELEM_DSE => skip_dse(&mut cursor)?,
                ELEM_FIL => skip_fil(&mut cursor)?,
                ELEM_END..=u8::MAX => {
                    cursor.byte_align();
                    break;
                }
            }

            if chan_idx >= num_channels {
                break;
            }
        }

        output.truncate(num_samples * num_channels * bps);
        Ok(output)
    }

    /// 读取声道头部, 没有部分帧标志时沿用本包前一元素的采样数
    fn read_header(
        &self,
        cursor: &mut BitCursor,
        mut num_samples: usize,
    ) -> Result<ElementHeader, AlacError> {
        // 元素实例标签
        let _ = cursor.read_small(4);

        if cursor.read(12) != 0 {
            return Err(AlacError::InvalidHeader);
        }

        let flags = cursor.read(4);
        let partial_frame = flags >> 3;
        let bytes_shifted = (flags >> 1) & 0x3;
        if bytes_shifted == 3 {
            return Err(AlacError::InvalidShiftEncoding);
        }
        let escape = flags & 0x1 != 0;

        if partial_frame != 0 {
            let high = cursor.read(16);
            let low = cursor.read(16);
            num_samples = ((high << 16) | low) as usize;
            if num_samples > self.config.frame_length as usize {
                return Err(AlacError::SampleCountOverrun);
            }
        }

        Ok(ElementHeader {
            bytes_shifted,
            escape,
            num_samples,
        })
    }

    fn golomb(&self, pb_factor: u32) -> AdaptiveGolomb {
        AdaptiveGolomb::new(
            u32::from(self.config.mb),
            u32::from(self.config.pb),
            pb_factor,
            u32::from(self.config.kb),
        )
    }

    /// 熵解码并还原一个声道块
    fn decode_channel(
        &mut self,
        cursor: &mut BitCursor,
        params: &mut ChannelParams,
        num_samples: usize,
        chan_bits: u32,
        slot: MixSlot,
    ) -> Result<(), AlacError> {
        let golomb = self.golomb(params.pb_factor);
        golomb.decompress(cursor, &mut self.predictor[..num_samples], chan_bits)?;

        if params.mode != 0 {
            predictor::delta_in_place(&mut self.predictor[..num_samples], chan_bits);
        }

        let target = match slot {
            MixSlot::U => &mut self.mix_u,
            MixSlot::V => &mut self.mix_v,
        };
        predictor::unpc_block(
            &self.predictor,
            target,
            num_samples,
            &mut params.coefs,
            params.num_coefs,
            chan_bits,
            params.den_shift,
        );
        Ok(())
    }

    fn decode_sce(
        &mut self,
        cursor: &mut BitCursor,
        output: &mut [u8],
        chan_idx: usize,
        num_samples: usize,
    ) -> Result<usize, AlacError> {
        let header = self.read_header(cursor, num_samples)?;
        let depth = u32::from(self.config.bit_depth);
        let chan_bits = depth.wrapping_sub(header.bytes_shifted * 8);
        let ns = header.num_samples;
        let mut bytes_shifted = header.bytes_shifted;

        if !header.escape {
            // 混合参数, 单声道不使用
            let _ = cursor.read(8);
            let _ = cursor.read(8);
            let mut params = ChannelParams::read(cursor);

            let mark = cursor.snapshot();
            if bytes_shifted != 0 {
                cursor.advance((bytes_shifted * 8) as usize * ns);
            }

            self.decode_channel(cursor, &mut params, ns, chan_bits, MixSlot::U)?;

            if bytes_shifted != 0 {
                let mut side = cursor.reader_at(mark);
                for slot in &mut self.shift_buffer[..ns] {
                    *slot = side.read(bytes_shifted * 8) as u16;
                }
            }
        } else {
            self.read_escape_mono(cursor, chan_bits, ns);
            bytes_shifted = 0;
        }

        let mut dst = Interleaved {
            out: output,
            depth: self.format.bit_depth,
            num_channels: self.format.channels as usize,
        };
        dst.write_mono(&self.mix_u, chan_idx, ns, &self.shift_buffer, bytes_shifted);
        Ok(ns)
    }

    fn decode_cpe(
        &mut self,
        cursor: &mut BitCursor,
        output: &mut [u8],
        chan_idx: usize,
        num_samples: usize,
    ) -> Result<usize, AlacError> {
        let header = self.read_header(cursor, num_samples)?;
        let depth = u32::from(self.config.bit_depth);
        // 声道对去相关多占 1 位
        let chan_bits = depth.wrapping_sub(header.bytes_shifted * 8) + 1;
        let ns = header.num_samples;
        let mut bytes_shifted = header.bytes_shifted;
        let mut mix = StereoMix::default();

        if !header.escape {
            mix.bits = cursor.read(8);
            mix.res = i32::from(cursor.read(8) as u8 as i8);

            let mut params_u = ChannelParams::read(cursor);
            let mut params_v = ChannelParams::read(cursor);

            let mark = cursor.snapshot();
            if bytes_shifted != 0 {
                cursor.advance((bytes_shifted * 8) as usize * 2 * ns);
            }

            self.decode_channel(cursor, &mut params_u, ns, chan_bits, MixSlot::U)?;
            self.decode_channel(cursor, &mut params_v, ns, chan_bits, MixSlot::V)?;

            if bytes_shifted != 0 {
                let mut side = cursor.reader_at(mark);
                for slot in &mut self.shift_buffer[..ns * 2] {
                    *slot = side.read(bytes_shifted * 8) as u16;
                }
            }
        } else {
            // 转义模式不加去相关位
            self.read_escape_pair(cursor, depth, ns);
            bytes_shifted = 0;
        }

        let mut dst = Interleaved {
            out: output,
            depth: self.format.bit_depth,
            num_channels: self.format.channels as usize,
        };
        dst.write_stereo(
            &self.mix_u,
            &self.mix_v,
            chan_idx,
            ns,
            mix,
            &self.shift_buffer,
            bytes_shifted,
        );
        Ok(ns)
    }

    fn read_escape_mono(&mut self, cursor: &mut BitCursor, chan_bits: u32, ns: usize) {
        for slot in &mut self.mix_u[..ns] {
            *slot = read_escape_sample(cursor, chan_bits);
        }
    }

    fn read_escape_pair(&mut self, cursor: &mut BitCursor, chan_bits: u32, ns: usize) {
        for i in 0..ns {
            self.mix_u[i] = read_escape_sample(cursor, chan_bits);
            self.mix_v[i] = read_escape_sample(cursor, chan_bits);
        }
    }
}

/// 读取一个未压缩样本, 超过 16 位时拆成 16 位加剩余位
fn read_escape_sample(cursor: &mut BitCursor, chan_bits: u32) -> i32 {
    let shift = 32u32.wrapping_sub(chan_bits);
    if chan_bits <= 16 {
        sign_extend(cursor.read(chan_bits) as i32, shift)
    } else {
        let high = ((cursor.read(16) as i32) << 16) >> shift;
        high | cursor.read(chan_bits - 16) as i32
    }
}

fn skip_dse(cursor: &mut BitCursor) -> Result<(), AlacError> {
    // 元素实例标签
    let _ = cursor.read_small(4);
    let align = cursor.read_one();

    let mut count = usize::from(cursor.read_small(8));
    if count == 255 {
        count += usize::from(cursor.read_small(8));
    }
    if align != 0 {
        cursor.byte_align();
    }

    cursor.advance(count * 8);
    if cursor.past_end() {
        return Err(AlacError::BitstreamOverrun);
    }
    Ok(())
}

fn skip_fil(cursor: &mut BitCursor) -> Result<(), AlacError> {
    let mut count = i16::from(cursor.read_small(4));
    if count == 15 {
        count += i16::from(cursor.read_small(8)) - 1;
    }

    cursor.advance(count as usize * 8);
    if cursor.past_end() {
        return Err(AlacError::BitstreamOverrun);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::alac::entropy::tests::encode_residuals;
    use saprobe_core::bitwriter::BitWriter;

    fn config(bit_depth: u8, num_channels: u8, frame_length: u32) -> AlacConfig {
        AlacConfig {
            frame_length,
            compatible_version: 0,
            bit_depth,
            pb: 40,
            mb: 10,
            kb: 14,
            num_channels,
            max_run: 255,
            max_frame_bytes: 0,
            avg_bit_rate: 0,
            sample_rate: 44100,
        }
    }

    fn golomb() -> AdaptiveGolomb {
        AdaptiveGolomb::new(10, 40, 4, 14)
    }

    fn header(bw: &mut BitWriter, tag: u32, bytes_shifted: u32, escape: bool, partial: Option<u32>) {
        bw.write_bits(tag, 3);
        bw.write_bits(0, 4);
        bw.write_bits(0, 12);
        let flags = (u32::from(partial.is_some()) << 3) | (bytes_shifted << 1) | u32::from(escape);
        bw.write_bits(flags, 4);
        if let Some(n) = partial {
            bw.write_bits(n >> 16, 16);
            bw.write_bits(n & 0xFFFF, 16);
        }
    }

    fn channel_params(bw: &mut BitWriter, mode: u32, den_shift: u32, coefs: &[i16]) {
        bw.write_bits((mode << 4) | den_shift, 8);
        bw.write_bits((4 << 5) | coefs.len() as u32, 8);
        for &c in coefs {
            bw.write_bits_signed(i32::from(c), 16);
        }
    }

    fn end(mut bw: BitWriter) -> Vec<u8> {
        bw.write_bits(u32::from(ELEM_END), 3);
        bw.finish()
    }

    fn decode(cfg: AlacConfig, packet: &[u8]) -> Result<Vec<u8>, AlacError> {
        PacketDecoder::new(cfg)?.decode_packet(packet)
    }

    fn escape_mono_packet(samples: &[i32], bits: u32, partial: Option<u32>) -> Vec<u8> {
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 0, true, partial);
        for &s in samples {
            if bits <= 16 {
                bw.write_bits_signed(s, bits);
            } else {
                bw.write_bits_signed(s >> (bits - 16), 16);
                bw.write_bits_signed(s, bits - 16);
            }
        }
        end(bw)
    }

    #[test]
    fn test_转义单声道_部分帧裁剪() {
        let packet = escape_mono_packet(&[10, -5, 3], 16, Some(3));
        let pcm = decode(config(16, 1, 4096), &packet).unwrap();
        assert_eq!(pcm, [0x0A, 0x00, 0xFB, 0xFF, 0x03, 0x00]);
    }

    #[test]
    fn test_压缩与转义等价() {
        let samples = [10, -5, 3, 7, -300, 1200, 0, 0, 5, -32768];
        let cfg = config(16, 1, samples.len() as u32);

        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 0, false, None);
        bw.write_bits(0, 16);
        channel_params(&mut bw, 0, 0, &[]);
        encode_residuals(&mut bw, &golomb(), &samples, 16);
        let compressed = decode(cfg, &end(bw)).unwrap();

        let escaped = decode(cfg, &escape_mono_packet(&samples, 16, None)).unwrap();
        assert_eq!(compressed, escaped);
        assert_eq!(compressed.len(), samples.len() * 2);
    }

    #[test]
    fn test_一阶差分预处理() {
        let cfg = config(16, 1, 3);
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 0, false, None);
        bw.write_bits(0, 16);
        channel_params(&mut bw, 1, 0, &[]);
        encode_residuals(&mut bw, &golomb(), &[100, -20, 5], 16);
        let pcm = decode(cfg, &end(bw)).unwrap();
        assert_eq!(pcm, [100, 0, 80, 0, 85, 0]);
    }

    #[test]
    fn test_声道对反混合() {
        let cfg = config(16, 2, 2);
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_CPE), 0, false, None);
        bw.write_bits(1, 8); // mix_bits
        bw.write_bits(2, 8); // mix_res
        channel_params(&mut bw, 0, 0, &[]);
        channel_params(&mut bw, 0, 0, &[]);
        encode_residuals(&mut bw, &golomb(), &[10, 20], 17);
        encode_residuals(&mut bw, &golomb(), &[2, 4], 17);
        let pcm = decode(cfg, &end(bw)).unwrap();
        assert_eq!(pcm, [10, 0, 8, 0, 20, 0, 16, 0]);
    }

    #[test]
    fn test_零混合_单声道与立体声对称() {
        let u = [7, -3, 250];
        let v = [-1, 9, -250];

        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_CPE), 0, false, None);
        bw.write_bits(0, 16);
        channel_params(&mut bw, 0, 0, &[]);
        channel_params(&mut bw, 0, 0, &[]);
        encode_residuals(&mut bw, &golomb(), &u, 17);
        encode_residuals(&mut bw, &golomb(), &v, 17);
        let stereo = decode(config(16, 2, 3), &end(bw)).unwrap();

        let left = decode(config(16, 1, 3), &escape_mono_packet(&u, 16, None)).unwrap();
        let right = decode(config(16, 1, 3), &escape_mono_packet(&v, 16, None)).unwrap();
        let mut expected = Vec::new();
        for i in 0..3 {
            expected.extend_from_slice(&left[i * 2..i * 2 + 2]);
            expected.extend_from_slice(&right[i * 2..i * 2 + 2]);
        }
        assert_eq!(stereo, expected);
    }

    #[test]
    fn test_声道对转义_不加去相关位() {
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_CPE), 0, true, None);
        for (l, r) in [(1, -1), (-32768, 32767)] {
            bw.write_bits_signed(l, 16);
            bw.write_bits_signed(r, 16);
        }
        let pcm = decode(config(16, 2, 2), &end(bw)).unwrap();
        assert_eq!(pcm, [1, 0, 0xFF, 0xFF, 0x00, 0x80, 0xFF, 0x7F]);
    }

    #[test]
    fn test_24_位移位字节() {
        let cfg = config(24, 1, 2);
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 1, false, None);
        bw.write_bits(0, 16);
        channel_params(&mut bw, 0, 0, &[]);
        bw.write_bits(0xAA, 8);
        bw.write_bits(0x55, 8);
        encode_residuals(&mut bw, &golomb(), &[1, -2], 16);
        let pcm = decode(cfg, &end(bw)).unwrap();
        assert_eq!(pcm, [0xAA, 0x01, 0x00, 0x55, 0xFE, 0xFF]);
    }

    #[test]
    fn test_声道对_24_位移位字节_左右交错() {
        let cfg = config(24, 2, 2);
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_CPE), 1, false, None);
        bw.write_bits(0, 16);
        channel_params(&mut bw, 0, 0, &[]);
        channel_params(&mut bw, 0, 0, &[]);
        // 移位字节区: L0 R0 L1 R1
        for low in [0x11, 0x22, 0x33, 0x44] {
            bw.write_bits(low, 8);
        }
        encode_residuals(&mut bw, &golomb(), &[1, -2], 17);
        encode_residuals(&mut bw, &golomb(), &[3, -4], 17);
        let pcm = decode(cfg, &end(bw)).unwrap();
        assert_eq!(
            pcm,
            [
                0x11, 0x01, 0x00, 0x22, 0x03, 0x00, //
                0x33, 0xFE, 0xFF, 0x44, 0xFC, 0xFF,
            ]
        );
    }

    #[test]
    fn test_部分帧采样数_沿用到后续元素() {
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 0, true, Some(2));
        bw.write_bits_signed(1, 16);
        bw.write_bits_signed(2, 16);
        header(&mut bw, u32::from(ELEM_SCE), 0, true, None);
        bw.write_bits_signed(3, 16);
        bw.write_bits_signed(4, 16);
        let pcm = decode(config(16, 2, 4096), &end(bw)).unwrap();
        assert_eq!(pcm, [1, 0, 3, 0, 2, 0, 4, 0]);
    }

    #[test]
    fn test_20_位转义() {
        let packet = escape_mono_packet(&[-1, 0x7FFFF], 20, None);
        let pcm = decode(config(20, 1, 2), &packet).unwrap();
        assert_eq!(pcm, [0xF0, 0xFF, 0xFF, 0xF0, 0xFF, 0x7F]);
    }

    #[test]
    fn test_跳过数据流与填充元素() {
        let mut bw = BitWriter::new();
        bw.write_bits(u32::from(ELEM_DSE), 3);
        bw.write_bits(0, 4);
        bw.write_bit(1); // 对齐
        bw.write_bits(2, 8);
        bw.align_to_byte();
        bw.write_bytes(&[0xDE, 0xAD]);
        bw.write_bits(u32::from(ELEM_FIL), 3);
        bw.write_bits(1, 4);
        bw.write_bits(0xEE, 8);
        header(&mut bw, u32::from(ELEM_SCE), 0, true, None);
        bw.write_bits_signed(-2, 16);
        let pcm = decode(config(16, 1, 1), &end(bw)).unwrap();
        assert_eq!(pcm, [0xFE, 0xFF]);
    }

    #[test]
    fn test_声道对溢出_隐式结束() {
        let mut bw = BitWriter::new();
        bw.write_bits(u32::from(ELEM_CPE), 3);
        let pcm = decode(config(16, 1, 4), &bw.finish()).unwrap();
        assert_eq!(pcm, vec![0u8; 8]);
    }

    #[test]
    fn test_多声道_静音补齐() {
        // 3 声道配置只给出第一个声道
        let packet = escape_mono_packet(&[1, 2], 16, None);
        let pcm = decode(config(16, 3, 2), &packet).unwrap();
        assert_eq!(pcm, [1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_错误_保留位非零() {
        let mut bw = BitWriter::new();
        bw.write_bits(u32::from(ELEM_SCE), 3);
        bw.write_bits(0, 4);
        bw.write_bits(1, 12);
        bw.write_bits(0, 16);
        let err = decode(config(16, 1, 4), &bw.finish()).unwrap_err();
        assert_eq!(err, AlacError::InvalidHeader);
    }

    #[test]
    fn test_错误_移位字节保留值() {
        let mut bw = BitWriter::new();
        header(&mut bw, u32::from(ELEM_SCE), 3, false, None);
        bw.write_bits(0, 16);
        let err = decode(config(16, 1, 4), &bw.finish()).unwrap_err();
        assert_eq!(err, AlacError::InvalidShiftEncoding);
    }

    #[test]
    fn test_错误_不支持的元素() {
        for tag in [ELEM_CCE, ELEM_PCE] {
            let mut bw = BitWriter::new();
            bw.write_bits(u32::from(tag), 3);
            let err = decode(config(16, 1, 4), &bw.finish()).unwrap_err();
            assert_eq!(err, AlacError::UnsupportedElement);
        }
    }

    #[test]
    fn test_错误_空包越界() {
        let err = decode(config(16, 1, 4), &[]).unwrap_err();
        assert_eq!(err, AlacError::BitstreamOverrun);
    }

    #[test]
    fn test_错误_部分帧采样数超限() {
        let packet = escape_mono_packet(&[0; 5], 16, Some(5));
        let err = decode(config(16, 1, 4), &packet).unwrap_err();
        assert_eq!(err, AlacError::SampleCountOverrun);
    }

    #[test]
    fn test_错误_位深不支持() {
        assert_eq!(
            PacketDecoder::new(config(8, 1, 4)).err(),
            Some(AlacError::UnsupportedBitDepth)
        );
        assert_eq!(
            PacketDecoder::new(config(16, 0, 4)).err(),
            Some(AlacError::InvalidConfig)
        );
    }

    #[test]
    fn test_暂存缓冲区跨包复用() {
        let cfg = config(16, 1, 4);
        let mut dec = PacketDecoder::new(cfg).unwrap();
        let first = dec
            .decode_packet(&escape_mono_packet(&[1, 2, 3, 4], 16, None))
            .unwrap();
        let second = dec
            .decode_packet(&escape_mono_packet(&[9], 16, Some(1)))
            .unwrap();
        assert_eq!(first, [1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(second, [9, 0]);
        assert_eq!(dec.format().bit_depth, BitDepth::Depth16);
    }
}
