//! 端到端集成测试: symphonia 后端 (FLAC 原生位深) 与格式识别.
//!
//! 测试流程: 手工构造 verbatim 子帧 FLAC → 识别 → symphonia 解码 → 验证 PCM

#![cfg(feature = "symphonia-backend")]

use saprobe::Codec;
use saprobe::core::bitwriter::BitWriter;
use saprobe::core::{BitDepth, SaprobeError};
use saprobe::format::IoContext;

const BLOCK_SIZE: usize = 192;

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &b in data {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &b in data {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// 44.1kHz 16 位立体声, 单帧 192 采样, 两个 verbatim 子帧
fn build_flac(left: &[i16], right: &[i16]) -> Vec<u8> {
    assert_eq!(left.len(), BLOCK_SIZE);
    assert_eq!(right.len(), BLOCK_SIZE);

    let mut out = b"fLaC".to_vec();
    // 最后一个元数据块, STREAMINFO, 34 字节
    out.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    let mut info = BitWriter::new();
    info.write_bits(BLOCK_SIZE as u32, 16);
    info.write_bits(BLOCK_SIZE as u32, 16);
    info.write_bits(0, 24);
    info.write_bits(0, 24);
    info.write_bits(44100, 20);
    info.write_bits(1, 3); // 声道数 - 1
    info.write_bits(15, 5); // 位深 - 1
    info.write_bits(0, 4);
    info.write_bits(BLOCK_SIZE as u32, 32);
    info.write_bytes(&[0u8; 16]); // MD5
    out.extend_from_slice(&info.finish());

    // 帧头: 同步码, 块大小 192, 44.1kHz, 独立双声道, 16 位, 帧号 0
    let mut header = vec![0xFF, 0xF8, 0x19, 0x18, 0x00];
    header.push(crc8(&header));

    let mut body = BitWriter::new();
    for channel in [left, right] {
        body.write_bits(0x02, 8); // verbatim 子帧
        for &s in channel {
            body.write_bits_signed(i32::from(s), 16);
        }
    }

    let mut frame = header;
    frame.extend_from_slice(&body.finish());
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    out.extend_from_slice(&frame);
    out
}

#[test]
fn test_flac_原生_16_位解码() {
    let left: Vec<i16> = (0..BLOCK_SIZE as i32).map(|i| (i * 150 - 14000) as i16).collect();
    let right: Vec<i16> = left.iter().map(|s| s.wrapping_neg() / 2).collect();

    let mut io = IoContext::from_memory(build_flac(&left, &right));
    let audio = saprobe::decode(&mut io).unwrap();

    assert_eq!(audio.codec, Codec::Flac);
    assert_eq!(audio.format.sample_rate, 44100);
    assert_eq!(audio.format.bit_depth, BitDepth::Depth16);
    assert_eq!(audio.format.channels, 2);

    let expected: Vec<u8> = left
        .iter()
        .zip(&right)
        .flat_map(|(l, r)| [l.to_le_bytes(), r.to_le_bytes()].concat())
        .collect();
    assert_eq!(audio.pcm, expected);
}

#[test]
fn test_flac_损坏数据_报错() {
    let mut data = b"fLaC".to_vec();
    data.extend_from_slice(&[0u8; 32]);
    let mut io = IoContext::from_memory(data);
    assert!(saprobe::decode(&mut io).is_err());
}

#[test]
fn test_未知格式_不支持() {
    let mut io = IoContext::from_memory(vec![0x42; 128]);
    let err = saprobe::decode(&mut io).unwrap_err();
    assert!(matches!(err, SaprobeError::Unsupported(_)));
}

#[test]
fn test_识别_不改变读取位置() {
    let left = vec![0i16; BLOCK_SIZE];
    let mut io = IoContext::from_memory(build_flac(&left, &left));
    assert_eq!(saprobe::format::identify(&mut io).unwrap(), Codec::Flac);
    assert_eq!(io.position().unwrap(), 0);
}
