//! `FFmpeg` 解复用与解码后端
//!
//! - `FfmpegOpener`：构造时完成进程级一次性初始化
//! - `FfmpegSource`：容器解复用与流探测
//! - `FfmpegCodec`：视频解码，解码帧借用复用的内部缓冲
//! - `FfmpegConverter`：swscale 转换上下文，把解码帧写入 YUV420P 目标帧

mod codec;
mod converter;
mod source;

use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;

use crate::error::{PlayerError, Result};
use crate::media::frame::{ColorRange, MediaType};

pub use codec::{FfmpegCodec, FfmpegFrame};
pub use converter::FfmpegConverter;
pub use source::{FfmpegOpener, FfmpegPacket, FfmpegSource};

/// 进程级一次性初始化：注册格式与编解码器，并把库日志降到 error
///
/// 初始化结果被缓存，之后不会重新初始化，也不会反初始化
fn init() -> Result<()> {
    static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    INIT.get_or_init(|| -> std::result::Result<(), String> {
        ffmpeg::init().map_err(|e| e.to_string())?;
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        Ok(())
    })
    .clone()
    .map_err(|e| PlayerError::Resource(format!("FFmpeg 初始化失败: {e}")))
}

/// 像素格式名称，未知格式返回 `None`
fn pixel_name(pixel: Pixel) -> Option<String> {
    if pixel == Pixel::None {
        return None;
    }
    pixel.descriptor().map(|d| d.name().to_string())
}

/// JPEG 完整范围格式（swscale 会把它们转换为有限范围输出）
const fn is_jpeg_pixel(pixel: Pixel) -> bool {
    matches!(
        pixel,
        Pixel::YUVJ420P | Pixel::YUVJ422P | Pixel::YUVJ444P
    )
}

/// 映射流的媒体类型
const fn media_type(medium: ffmpeg::media::Type) -> MediaType {
    match medium {
        ffmpeg::media::Type::Video => MediaType::Video,
        ffmpeg::media::Type::Audio => MediaType::Audio,
        ffmpeg::media::Type::Subtitle => MediaType::Subtitle,
        ffmpeg::media::Type::Data => MediaType::Data,
        ffmpeg::media::Type::Attachment => MediaType::Attachment,
        _ => MediaType::Unknown,
    }
}

/// 由容器声明的范围与像素格式推断 YUV 数值范围
const fn color_range(range: ffmpeg::util::color::Range, jpeg_format: bool) -> ColorRange {
    if jpeg_format || matches!(range, ffmpeg::util::color::Range::JPEG) {
        ColorRange::Full
    } else {
        ColorRange::Limited
    }
}
