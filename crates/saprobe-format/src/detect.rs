//! 按文件头识别音频编解码器.
//!
//! 只需前 12 字节即可判定大部分格式; M4A 容器需要进一步查看 stsd
//! 才能区分 ALAC 与 AAC.

use std::fmt;
use std::io::SeekFrom;

use log::debug;
use saprobe_codec::CodecId;
use saprobe_core::{SaprobeError, SaprobeResult};

use crate::demuxers::mp4;
use crate::io::IoContext;

/// 识别所需的最少头部字节数
const HEADER_SIZE: usize = 12;

/// 识别出的音频编解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Unknown,
    Flac,
    /// MP4/M4A 容器中的 ALAC
    Alac,
    Mp3,
    /// Ogg Vorbis
    Vorbis,
    /// RIFF WAVE (PCM)
    Wav,
    /// MP4/M4A 容器中的 AAC
    Aac,
}

impl Codec {
    /// 对应的编解码器标识, WAV 按实际位深决定, 这里返回 `None`
    pub fn codec_id(&self) -> CodecId {
        match self {
            Self::Flac => CodecId::Flac,
            Self::Alac => CodecId::Alac,
            Self::Mp3 => CodecId::Mp3,
            Self::Vorbis => CodecId::Vorbis,
            Self::Aac => CodecId::Aac,
            Self::Wav | Self::Unknown => CodecId::None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Flac => "FLAC",
            Self::Alac => "ALAC",
            Self::Mp3 => "MP3",
            Self::Vorbis => "Vorbis",
            Self::Wav => "WAV",
            Self::Aac => "AAC",
        };
        f.write_str(name)
    }
}

/// 识别输入的编解码器, 返回前把 I/O 位置恢复到 0
pub fn identify(io: &mut IoContext) -> SaprobeResult<Codec> {
    let mut header = [0u8; HEADER_SIZE];
    let got = io.read_up_to(&mut header)?;
    io.seek(SeekFrom::Start(0))?;
    if got < HEADER_SIZE {
        return Err(SaprobeError::InvalidData(format!(
            "文件头不足 {} 字节 (实际 {})",
            HEADER_SIZE, got
        )));
    }

    let codec = if &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE" {
        Codec::Wav
    } else if &header[0..4] == b"fLaC" {
        Codec::Flac
    } else if &header[0..4] == b"OggS" {
        Codec::Vorbis
    } else if &header[4..8] == b"ftyp" {
        let probed = mp4::probe_codec(io);
        io.seek(SeekFrom::Start(0))?;
        match probed {
            Some(CodecId::Aac) => Codec::Aac,
            Some(_) => Codec::Alac,
            None => {
                debug!("M4A 未找到可识别的采样条目, 按 ALAC 处理");
                Codec::Alac
            }
        }
    } else if &header[0..3] == b"ID3" {
        Codec::Mp3
    } else if header[0] == 0xFF && header[1] & 0xE0 == 0xE0 {
        // MPEG 帧同步字 (11 个 1)
        Codec::Mp3
    } else {
        Codec::Unknown
    };

    debug!("识别结果: {}", codec);
    Ok(codec)
}
