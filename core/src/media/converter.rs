//! 像素格式转换接口
//!
//! 转换器在解码器打开后按其输出参数一次性创建，把解码帧写入预分配的 YUV420P 目标帧。
//! 源与目标尺寸相同，只改变像素排列。

use crate::error::{PlayerError, Result};
use crate::media::decoder::{CodecState, DecodedFrame};
use crate::media::frame::ConvertedFrame;

/// 解码帧到目标帧的转换器
pub trait FrameConverter<C: CodecState + ?Sized> {
    /// 按转换器的输出尺寸与数值范围分配目标帧
    ///
    /// # Errors
    ///
    /// - 尺寸为零时返回 `Conversion`
    /// - 内存分配失败时返回 `Resource`
    fn allocate_target(&self) -> Result<ConvertedFrame>;

    /// 把一帧写入目标帧
    ///
    /// # Errors
    ///
    /// - 帧尺寸、像素格式与创建时不一致，或目标帧尺寸不符时返回 `Conversion`
    fn convert<'f>(&mut self, frame: &C::Frame<'f>, dst: &mut ConvertedFrame) -> Result<()>
    where
        C: 'f;
}

/// 转换前的尺寸校验：帧与目标都必须与转换器创建时的尺寸一致
///
/// # Errors
///
/// - 任一尺寸不一致时返回 `Conversion`，此时目标帧保持不变
pub fn check_dimensions(
    width: u32,
    height: u32,
    frame: &impl DecodedFrame,
    dst: &ConvertedFrame,
) -> Result<()> {
    if (frame.width(), frame.height()) != (width, height) {
        return Err(PlayerError::Conversion(format!(
            "帧尺寸 {}x{} 与转换上下文 {width}x{height} 不一致",
            frame.width(),
            frame.height()
        )));
    }
    if (dst.width(), dst.height()) != (width, height) {
        return Err(PlayerError::Conversion(format!(
            "目标帧尺寸 {}x{} 与转换上下文 {width}x{height} 不一致",
            dst.width(),
            dst.height()
        )));
    }
    Ok(())
}
