//! saprobe 性能基准测试.
//!
//! 覆盖 ALAC 数据包解码、解码器框架收发、WAV 封装与格式识别.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use saprobe::codec::decoders::alac::{AlacConfig, PacketDecoder};
use saprobe::codec::{CodecId, CodecParameters, CodecParamsType, Packet};
use saprobe::core::bitwriter::BitWriter;
use saprobe::core::{BitDepth, PcmFormat};
use saprobe::format::IoContext;
use saprobe::format::muxers::wav;

const FRAME_LENGTH: u32 = 4096;

fn alac_config(bit_depth: u8) -> AlacConfig {
    AlacConfig {
        frame_length: FRAME_LENGTH,
        compatible_version: 0,
        bit_depth,
        pb: 40,
        mb: 10,
        kb: 14,
        num_channels: 2,
        max_run: 255,
        max_frame_bytes: 0,
        avg_bit_rate: 0,
        sample_rate: 44100,
    }
}

/// 整帧转义模式立体声数据包 (CPE)
fn escape_stereo_packet(bit_depth: u32) -> Vec<u8> {
    let mut bw = BitWriter::new();
    bw.write_bits(1, 3);
    bw.write_bits(0, 4);
    bw.write_bits(0, 12);
    bw.write_bits(1, 4);
    let peak = (1i32 << (bit_depth - 1)) - 1;
    for i in 0..FRAME_LENGTH as i32 {
        let l = (i * 7919) % peak;
        for s in [l, -l / 3] {
            if bit_depth <= 16 {
                bw.write_bits_signed(s, bit_depth);
            } else {
                bw.write_bits_signed(s >> (bit_depth - 16), 16);
                bw.write_bits_signed(s, bit_depth - 16);
            }
        }
    }
    bw.write_bits(7, 3);
    bw.finish()
}

fn bench_alac_packet(c: &mut Criterion) {
    let mut group = c.benchmark_group("alac_escape_stereo");
    for bits in [16u8, 24] {
        let packet = escape_stereo_packet(u32::from(bits));
        let mut decoder = PacketDecoder::new(alac_config(bits)).unwrap();
        let out_bytes = FRAME_LENGTH as u64 * 2 * decoder.format().bit_depth.bytes_per_sample() as u64;
        group.throughput(Throughput::Bytes(out_bytes));
        group.bench_function(format!("{bits}bit_4096"), |b| {
            b.iter(|| decoder.decode_packet(black_box(&packet)).unwrap());
        });
    }
    group.finish();
}

fn bench_alac_decoder_framework(c: &mut Criterion) {
    let packet = Packet::from_data(escape_stereo_packet(16));
    let params = CodecParameters {
        codec_id: CodecId::Alac,
        extra_data: alac_config(16).to_bytes().to_vec(),
        bit_rate: 0,
        params: CodecParamsType::None,
    };
    let registry = saprobe::default_codec_registry();

    c.bench_function("alac_send_receive_16bit_4096", |b| {
        let mut dec = registry.create_decoder(CodecId::Alac).unwrap();
        dec.open(&params).unwrap();
        b.iter(|| {
            dec.send_packet(black_box(&packet)).unwrap();
            black_box(dec.receive_frame().unwrap());
        });
    });
}

fn bench_wav_encode(c: &mut Criterion) {
    let format = PcmFormat {
        sample_rate: 48000,
        bit_depth: BitDepth::Depth24,
        channels: 6,
    };
    let pcm: Vec<u8> = (0..48000 * format.frame_bytes()).map(|i| i as u8).collect();

    let mut group = c.benchmark_group("wav_encode");
    group.throughput(Throughput::Bytes(pcm.len() as u64));
    group.bench_function("24bit_6ch_1s", |b| {
        b.iter(|| wav::encode_to_vec(black_box(&pcm), &format).unwrap());
    });
    group.finish();
}

fn bench_wav_decode(c: &mut Criterion) {
    let format = PcmFormat {
        sample_rate: 44100,
        bit_depth: BitDepth::Depth16,
        channels: 2,
    };
    let pcm: Vec<u8> = (0..44100 * format.frame_bytes()).map(|i| (i * 31) as u8).collect();
    let file = wav::encode_to_vec(&pcm, &format).unwrap();

    c.bench_function("wav_decode_16bit_stereo_1s", |b| {
        b.iter(|| {
            let mut io = IoContext::from_memory(black_box(file.clone()));
            saprobe::decode(&mut io).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_alac_packet,
    bench_alac_decoder_framework,
    bench_wav_encode,
    bench_wav_decode,
);
criterion_main!(benches);
