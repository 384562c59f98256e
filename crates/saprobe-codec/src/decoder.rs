//! 解码器 trait 定义.

use saprobe_core::SaprobeResult;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::Frame;
use crate::packet::Packet;

/// 解码器 trait
///
/// 解码流程:
/// 1. 调用 `open()` 传入容器提供的参数
/// 2. 调用 `send_packet()` 送入压缩数据
/// 3. 调用 `receive_frame()` 取出解码后的帧
/// 4. 送入空包 (flush) 后 `receive_frame()` 返回 `Eof`
pub trait Decoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 使用参数配置解码器
    fn open(&mut self, _params: &CodecParameters) -> SaprobeResult<()> {
        Ok(())
    }

    /// 送入一个压缩数据包进行解码
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(SaprobeError::NeedMoreData)`: 上一帧尚未取出
    fn send_packet(&mut self, packet: &Packet) -> SaprobeResult<()>;

    /// 从解码器取出一帧解码数据
    ///
    /// # 返回
    /// - `Err(SaprobeError::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(SaprobeError::Eof)`: 所有帧已取出
    fn receive_frame(&mut self) -> SaprobeResult<Frame>;

    /// 刷新解码器, 清空内部状态
    fn flush(&mut self);
}
