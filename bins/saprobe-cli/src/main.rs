//! saprobe - 音频解码命令行工具
//!
//! 识别输入格式并解码为 WAV 或原始 PCM, 也可只打印格式摘要.

mod decode;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use decode::DecodeArgs;

#[derive(Parser, Debug)]
#[command(name = "saprobe", version, about = "纯 Rust 音频解码工具")]
struct Cli {
    /// 日志级别 (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 额外写入按天滚动的日志文件到该目录
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 解码音频文件为 PCM (默认 WAV 封装)
    Decode(DecodeArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init("saprobe", cli.verbose, cli.log_dir.as_deref()) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }

    let result = match &cli.command {
        Command::Decode(args) => decode::run(args),
    };

    if let Err(e) = result {
        log::debug!("命令失败: {e:?}");
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_命令行_解码参数() {
        let cli = Cli::try_parse_from([
            "saprobe", "-vv", "decode", "in.m4a", "-o", "out.wav", "-b", "24", "--raw",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Decode(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("in.m4a"));
        assert_eq!(args.output, "out.wav");
        assert_eq!(args.bit_depth, 24);
        assert!(args.raw);
        assert!(!args.info);
    }

    #[test]
    fn test_命令行_默认值() {
        let cli = Cli::try_parse_from(["saprobe", "decode", "in.flac"]).unwrap();
        let Command::Decode(args) = cli.command;
        assert_eq!(args.output, "-");
        assert_eq!(args.bit_depth, 0);
        assert!(!args.json);
        assert!(cli.log_dir.is_none());
    }

    #[test]
    fn test_命令行_全局参数可后置() {
        let cli =
            Cli::try_parse_from(["saprobe", "decode", "a.wav", "-i", "--log-dir", "logs", "-v"])
                .unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_命令行_缺少输入_报错() {
        assert!(Cli::try_parse_from(["saprobe", "decode"]).is_err());
    }
}
