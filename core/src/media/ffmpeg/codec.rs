//! `FFmpeg` 视频解码器

use ffmpeg_next as ffmpeg;

use super::converter::FfmpegConverter;
use super::source::FfmpegPacket;
use super::{color_range, is_jpeg_pixel, pixel_name};
use crate::error::{PlayerError, Result};
use crate::media::decoder::{CodecState, DecodedFrame};
use crate::media::frame::{ColorRange, StreamDescriptor};

/// 借用解码器内部缓冲的解码帧
pub struct FfmpegFrame<'a> {
    pub(super) video: &'a ffmpeg::frame::Video,
}

impl DecodedFrame for FfmpegFrame<'_> {
    fn width(&self) -> u32 {
        self.video.width()
    }

    fn height(&self) -> u32 {
        self.video.height()
    }
}

/// `FFmpeg` 视频解码器
///
/// 解码结果写入复用的内部帧缓冲，对外只暴露借用
pub struct FfmpegCodec {
    /// 底层解码器
    decoder: ffmpeg::decoder::Video,
    /// 复用的解码帧
    frame: ffmpeg::frame::Video,
    /// 是否已发送流结束
    eof_sent: bool,
}

impl FfmpegCodec {
    pub(super) fn new(decoder: ffmpeg::decoder::Video) -> Self {
        Self {
            decoder,
            frame: ffmpeg::frame::Video::empty(),
            eof_sent: false,
        }
    }

    /// 尝试取回一帧；解码器需要更多输入或已取尽时返回 false
    fn receive(&mut self) -> Result<bool> {
        match self.decoder.receive_frame(&mut self.frame) {
            Ok(()) => Ok(true),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                Ok(false)
            }
            Err(ffmpeg::Error::Eof) => Ok(false),
            Err(e) => Err(PlayerError::Decode(e.to_string())),
        }
    }

    /// 转换输出的数值范围：JPEG 格式由 swscale 压到有限范围，其余沿用解码器声明
    fn output_range(&self) -> ColorRange {
        if is_jpeg_pixel(self.decoder.format()) {
            ColorRange::Limited
        } else {
            color_range(self.decoder.color_range(), false)
        }
    }
}

impl CodecState for FfmpegCodec {
    type Packet = FfmpegPacket;
    type Frame<'a> = FfmpegFrame<'a>;
    type Converter = FfmpegConverter;

    fn resolve(&self, stream: &StreamDescriptor) -> StreamDescriptor {
        let pixel = self.decoder.format();
        StreamDescriptor {
            width: self.decoder.width(),
            height: self.decoder.height(),
            format: pixel_name(pixel),
            range: color_range(self.decoder.color_range(), is_jpeg_pixel(pixel)),
            ..stream.clone()
        }
    }

    fn converter(&self) -> Result<FfmpegConverter> {
        FfmpegConverter::new(
            self.decoder.format(),
            self.decoder.width(),
            self.decoder.height(),
            self.output_range(),
        )
    }

    fn decode(&mut self, packet: &FfmpegPacket) -> Result<Option<FfmpegFrame<'_>>> {
        let mut received = false;
        match self.decoder.send_packet(&packet.packet) {
            Ok(()) => {}
            // 解码器输出队列已满：先取走一帧再重新送入
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                received = self.receive()?;
                self.decoder
                    .send_packet(&packet.packet)
                    .map_err(|e| PlayerError::Decode(e.to_string()))?;
            }
            Err(e) => return Err(PlayerError::Decode(e.to_string())),
        }
        if !received {
            received = self.receive()?;
        }
        Ok(received.then_some(FfmpegFrame { video: &self.frame }))
    }

    fn drain(&mut self) -> Result<Option<FfmpegFrame<'_>>> {
        if !self.eof_sent {
            self.decoder
                .send_eof()
                .map_err(|e| PlayerError::Decode(e.to_string()))?;
            self.eof_sent = true;
        }
        let received = self.receive()?;
        Ok(received.then_some(FfmpegFrame { video: &self.frame }))
    }
}
