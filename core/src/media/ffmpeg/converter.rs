//! swscale 像素格式转换

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use tracing::debug;

use super::codec::{FfmpegCodec, FfmpegFrame};
use crate::error::{PlayerError, Result};
use crate::media::converter::{FrameConverter, check_dimensions};
use crate::media::frame::{ColorRange, ConvertedFrame, PlaneView};

/// swscale 转换上下文
///
/// 按解码器输出的格式与尺寸一次性创建，之后每帧只执行转换，不重新分配
pub struct FfmpegConverter {
    /// swscale 上下文（双三次插值，尺寸不变）
    context: scaling::Context,
    /// 输入格式与尺寸
    input: (Pixel, u32, u32),
    /// 转换输出的数值范围
    range: ColorRange,
    /// 预分配的 YUV420P 输出帧
    output: ffmpeg::frame::Video,
}

impl FfmpegConverter {
    /// 创建 `pixel` → YUV420P 的转换上下文
    ///
    /// # Errors
    ///
    /// - 像素格式未知或尺寸为零时返回 `StreamInfo`
    /// - swscale 不支持该输入格式时返回 `Resource`
    pub(super) fn new(pixel: Pixel, width: u32, height: u32, range: ColorRange) -> Result<Self> {
        if pixel == Pixel::None || width == 0 || height == 0 {
            return Err(PlayerError::StreamInfo(format!(
                "无法为 {pixel:?} {width}x{height} 创建转换上下文"
            )));
        }
        let context = scaling::Context::get(
            pixel,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BICUBIC,
        )
        .map_err(|e| PlayerError::Resource(format!("无法创建转换上下文 {pixel:?}: {e}")))?;
        debug!(?pixel, width, height, ?range, "已创建 YUV420P 转换上下文");
        Ok(Self {
            context,
            input: (pixel, width, height),
            range,
            output: ffmpeg::frame::Video::new(Pixel::YUV420P, width, height),
        })
    }
}

impl FrameConverter<FfmpegCodec> for FfmpegConverter {
    fn allocate_target(&self) -> Result<ConvertedFrame> {
        let (_, width, height) = self.input;
        ConvertedFrame::allocate(width, height, self.range)
    }

    fn convert<'f>(&mut self, frame: &FfmpegFrame<'f>, dst: &mut ConvertedFrame) -> Result<()>
    where
        FfmpegCodec: 'f,
    {
        let (pixel, width, height) = self.input;
        check_dimensions(width, height, frame, dst)?;
        if frame.video.format() != pixel {
            return Err(PlayerError::Conversion(format!(
                "帧像素格式 {:?} 与转换上下文 {pixel:?} 不一致",
                frame.video.format()
            )));
        }
        self.context
            .run(frame.video, &mut self.output)
            .map_err(|e| PlayerError::Conversion(e.to_string()))?;
        for plane in 0..ConvertedFrame::FORMAT.plane_count() {
            dst.write_plane(
                plane,
                PlaneView {
                    data: self.output.data(plane),
                    stride: self.output.stride(plane),
                },
            )?;
        }
        Ok(())
    }
}
