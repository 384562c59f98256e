//! `decode` 子命令.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use saprobe::DecodedAudio;
use saprobe_format::IoContext;
use saprobe_format::muxers::wav;

/// 输出到 stdout 的占位路径
const STDOUT_PATH: &str = "-";

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 输入音频文件
    pub input: PathBuf,

    /// 输出文件路径 (- 表示 stdout)
    #[arg(short, long, default_value = STDOUT_PATH)]
    pub output: String,

    /// 请求的输出位深 (0 表示原生位深)
    #[arg(short, long, default_value_t = 0)]
    pub bit_depth: u32,

    /// 只打印格式信息, 不输出 PCM
    #[arg(short, long)]
    pub info: bool,

    /// 与 --info 配合, 以 JSON 输出到 stdout
    #[arg(long)]
    pub json: bool,

    /// 输出原始 PCM 而非 WAV
    #[arg(long)]
    pub raw: bool,
}

/// 格式摘要
#[derive(Debug, Serialize)]
struct Summary {
    codec: String,
    sample_rate: u32,
    bit_depth: u32,
    channels: u32,
    pcm_bytes: usize,
}

impl Summary {
    fn from_audio(audio: &DecodedAudio) -> Self {
        Self {
            codec: audio.codec.to_string(),
            sample_rate: audio.format.sample_rate,
            bit_depth: audio.format.bit_depth.bits(),
            channels: audio.format.channels,
            pcm_bytes: audio.pcm.len(),
        }
    }

    fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "codec:       {}", self.codec)?;
        writeln!(w, "sample rate: {} Hz", self.sample_rate)?;
        writeln!(w, "bit depth:   {}", self.bit_depth)?;
        writeln!(w, "channels:    {}", self.channels)?;
        writeln!(w, "pcm bytes:   {}", self.pcm_bytes)
    }
}

pub fn run(args: &DecodeArgs) -> Result<()> {
    let path = args.input.to_string_lossy();
    let mut input =
        IoContext::open_read(&path).with_context(|| format!("无法打开输入文件 '{path}'"))?;
    let audio = saprobe::decode(&mut input).with_context(|| format!("解码 '{path}' 失败"))?;

    log::info!(
        "{}: {}, {} 字节 PCM",
        audio.codec,
        audio.format,
        audio.pcm.len()
    );

    if args.info {
        let summary = Summary::from_audio(&audio);
        if args.json {
            let json = serde_json::to_string_pretty(&summary).context("序列化格式信息失败")?;
            println!("{json}");
        } else {
            summary
                .write_text(&mut io::stderr().lock())
                .context("写入格式信息失败")?;
        }
        return Ok(());
    }

    check_bit_depth(&audio, args.bit_depth)?;

    if args.raw {
        write_output(&args.output, |w| {
            w.write_all(&audio.pcm).context("写入 PCM 失败")
        })
    } else {
        write_output(&args.output, |mut w| {
            wav::encode(&mut w, &audio.pcm, &audio.format).context("WAV 封装失败")
        })
    }
}

/// 请求位深必须与原生位深一致
fn check_bit_depth(audio: &DecodedAudio, requested: u32) -> Result<()> {
    let native = audio.format.bit_depth.bits();
    if requested > 0 && requested != native {
        bail!("原生位深为 {native} 位, 请求 {requested} 位: 暂不支持位深转换");
    }
    Ok(())
}

fn write_output<F>(output: &str, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if output == STDOUT_PATH {
        let mut out = io::stdout().lock();
        body(&mut out)?;
        return out.flush().context("刷新 stdout 失败");
    }

    let file = File::create(Path::new(output))
        .with_context(|| format!("无法创建输出文件 '{output}'"))?;
    let mut out = BufWriter::new(file);
    body(&mut out)?;
    out.flush()
        .with_context(|| format!("写入输出文件 '{output}' 失败"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saprobe_core::{BitDepth, PcmFormat};

    fn stereo16() -> PcmFormat {
        PcmFormat {
            sample_rate: 44100,
            bit_depth: BitDepth::Depth16,
            channels: 2,
        }
    }

    fn ramp_pcm(frames: usize) -> Vec<u8> {
        (0..frames * 2)
            .flat_map(|i| ((i as i16).wrapping_mul(37)).to_le_bytes())
            .collect()
    }

    fn write_wav_input(dir: &Path, pcm: &[u8]) -> PathBuf {
        let path = dir.join("input.wav");
        std::fs::write(&path, wav::encode_to_vec(pcm, &stereo16()).unwrap()).unwrap();
        path
    }

    fn args(input: PathBuf, output: &Path) -> DecodeArgs {
        DecodeArgs {
            input,
            output: output.to_string_lossy().into_owned(),
            bit_depth: 0,
            info: false,
            json: false,
            raw: false,
        }
    }

    #[test]
    fn test_摘要_文本格式() {
        let summary = Summary {
            codec: "ALAC".into(),
            sample_rate: 44100,
            bit_depth: 16,
            channels: 2,
            pcm_bytes: 1024,
        };
        let mut out = Vec::new();
        summary.write_text(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "codec:       ALAC\n\
             sample rate: 44100 Hz\n\
             bit depth:   16\n\
             channels:    2\n\
             pcm bytes:   1024\n"
        );
    }

    #[test]
    fn test_摘要_json_字段() {
        let summary = Summary {
            codec: "WAV".into(),
            sample_rate: 48000,
            bit_depth: 24,
            channels: 6,
            pcm_bytes: 18,
        };
        let value: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["codec"], "WAV");
        assert_eq!(value["sample_rate"], 48000);
        assert_eq!(value["bit_depth"], 24);
        assert_eq!(value["channels"], 6);
        assert_eq!(value["pcm_bytes"], 18);
    }

    #[test]
    fn test_解码_输出_wav_文件() {
        let dir = tempfile::tempdir().unwrap();
        let pcm = ramp_pcm(100);
        let input = write_wav_input(dir.path(), &pcm);
        let output = dir.path().join("out.wav");

        run(&args(input, &output)).unwrap();

        let written = std::fs::read(&output).unwrap();
        assert_eq!(written, wav::encode_to_vec(&pcm, &stereo16()).unwrap());
    }

    #[test]
    fn test_解码_输出_原始_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let pcm = ramp_pcm(33);
        let input = write_wav_input(dir.path(), &pcm);
        let output = dir.path().join("out.pcm");

        let mut a = args(input, &output);
        a.raw = true;
        a.bit_depth = 16;
        run(&a).unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), pcm);
    }

    #[test]
    fn test_解码_位深不一致_报错() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_wav_input(dir.path(), &ramp_pcm(8));
        let output = dir.path().join("out.wav");

        let mut a = args(input, &output);
        a.bit_depth = 24;
        let err = run(&a).unwrap_err();
        assert!(format!("{err:#}").contains("暂不支持位深转换"));
        assert!(!output.exists());
    }

    #[test]
    fn test_解码_信息模式_忽略位深() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_wav_input(dir.path(), &ramp_pcm(8));
        let output = dir.path().join("out.wav");

        let mut a = args(input, &output);
        a.info = true;
        a.bit_depth = 24;
        run(&a).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_解码_未知格式_报错() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("noise.bin");
        std::fs::write(&input, [0x11u8; 64]).unwrap();

        let err = run(&args(input, &dir.path().join("out.wav"))).unwrap_err();
        assert!(err.chain().any(|cause| cause
            .downcast_ref::<saprobe_core::SaprobeError>()
            .is_some_and(|e| matches!(e, saprobe_core::SaprobeError::Unsupported(_)))));
    }

    #[test]
    fn test_解码_输入不存在_报错() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&args(dir.path().join("missing.m4a"), &dir.path().join("o"))).unwrap_err();
        assert!(format!("{err:#}").contains("无法打开输入文件"));
    }
}
