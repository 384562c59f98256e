//! 统一错误类型定义.
//!
//! 所有 saprobe crate 共用的错误类型, 支持跨模块传播.
//! ALAC 码流错误单独成枚举, 调用方可以精确匹配具体的失败原因.

use thiserror::Error;

/// ALAC 码流解码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlacError {
    /// 读取位置越过数据包末尾
    #[error("ALAC 码流越界")]
    BitstreamOverrun,

    /// 声道头部保留位不为零
    #[error("ALAC 声道头部无效")]
    InvalidHeader,

    /// bytes_shifted 取到保留值 3
    #[error("ALAC 移位字节编码无效")]
    InvalidShiftEncoding,

    /// 遇到 CCE 或 PCE 元素
    #[error("不支持的 ALAC 元素")]
    UnsupportedElement,

    /// 采样数超过帧长度
    #[error("ALAC 采样数超出帧长度")]
    SampleCountOverrun,

    /// magic cookie 过短或版本不兼容
    #[error("ALAC 配置无效")]
    InvalidConfig,

    /// 位深不是 16/20/24/32
    #[error("不支持的 ALAC 位深")]
    UnsupportedBitDepth,
}

/// saprobe 框架统一错误类型
#[derive(Debug, Error)]
pub enum SaprobeError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 编解码器错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 容器格式错误
    #[error("格式错误: {0}")]
    Format(String),

    /// ALAC 码流错误
    #[error(transparent)]
    Alac(#[from] AlacError),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到指定的编解码器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),

    /// 未找到指定的容器格式
    #[error("未找到容器格式: {0}")]
    FormatNotFound(String),

    /// 无效数据 (损坏的文件等)
    #[error("无效数据: {0}")]
    InvalidData(String),
}

/// saprobe 框架统一 Result 类型
pub type SaprobeResult<T> = Result<T, SaprobeError>;
