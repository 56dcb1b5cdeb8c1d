//! `FFmpeg` 媒体源：打开容器、探测流、读取数据包

use std::path::Path;

use ffmpeg_next as ffmpeg;
use tracing::debug;

use super::{FfmpegCodec, color_range, init, is_jpeg_pixel, media_type, pixel_name};
use crate::error::{PlayerError, Result};
use crate::media::decoder::{EncodedPacket, MediaSource, SourceOpener};
use crate::media::frame::{ColorRange, MediaType, StreamDescriptor};

/// `FFmpeg` 媒体源打开器
///
/// 只能通过 `new` 构造，构造即完成库的一次性初始化
#[derive(Debug)]
pub struct FfmpegOpener {
    _initialized: (),
}

impl FfmpegOpener {
    /// 初始化 `FFmpeg` 并创建打开器
    ///
    /// # Errors
    ///
    /// - 库初始化失败时返回 `Resource`
    pub fn new() -> Result<Self> {
        init()?;
        Ok(Self { _initialized: () })
    }
}

impl SourceOpener for FfmpegOpener {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource> {
        let input = ffmpeg::format::input(&path).map_err(|e| PlayerError::SourceOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let streams = input
            .streams()
            .map(|stream| describe(&stream))
            .collect::<Result<Vec<_>>>()?;
        Ok(FfmpegSource { input, streams })
    }
}

/// 由容器流参数生成流描述
///
/// 视频流的格式或尺寸无法确定时记为未解析（格式 `None`、尺寸 0），只在被选中时才视为错误
fn describe(stream: &ffmpeg::format::stream::Stream<'_>) -> Result<StreamDescriptor> {
    let index = stream.index();
    let ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| PlayerError::StreamInfo(format!("流 #{index}: {e}")))?;
    let media_type = media_type(ctx.medium());
    let mut descriptor = StreamDescriptor {
        index,
        media_type,
        codec: ctx.id().name().to_string(),
        width: 0,
        height: 0,
        format: None,
        range: ColorRange::Limited,
    };
    if media_type != MediaType::Video {
        return Ok(descriptor);
    }

    match ctx.decoder().video() {
        Ok(video) => {
            let pixel = video.format();
            let format = pixel_name(pixel);
            if format.is_some() && video.width() != 0 && video.height() != 0 {
                descriptor.width = video.width();
                descriptor.height = video.height();
                descriptor.format = format;
                descriptor.range = color_range(video.color_range(), is_jpeg_pixel(pixel));
            } else {
                debug!(index, ?pixel, "视频流参数未解析");
            }
        }
        Err(e) => debug!(index, "无法读取视频流参数: {e}"),
    }
    Ok(descriptor)
}

/// `FFmpeg` 媒体源
pub struct FfmpegSource {
    /// 解复用上下文
    input: ffmpeg::format::context::Input,
    /// 探测得到的流描述
    streams: Vec<StreamDescriptor>,
}

impl MediaSource for FfmpegSource {
    type Packet = FfmpegPacket;
    type Codec = FfmpegCodec;

    fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    fn open_decoder(&mut self, stream: &StreamDescriptor) -> Result<FfmpegCodec> {
        let st = self.input.stream(stream.index).ok_or_else(|| {
            PlayerError::StreamInfo(format!("容器中不存在流 #{}", stream.index))
        })?;
        let ctx = ffmpeg::codec::context::Context::from_parameters(st.parameters())
            .map_err(|e| PlayerError::StreamInfo(format!("流 #{}: {e}", stream.index)))?;
        let codec = ffmpeg::codec::decoder::find(ctx.id())
            .ok_or_else(|| PlayerError::UnsupportedCodec(stream.codec.clone()))?;
        let decoder = ctx
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|e| PlayerError::DecoderOpen(format!("{}: {e}", stream.codec)))?;
        Ok(FfmpegCodec::new(decoder))
    }

    fn read_packet(&mut self) -> Result<Option<FfmpegPacket>> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(FfmpegPacket { packet })),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(PlayerError::Read(e.to_string())),
        }
    }
}

/// `FFmpeg` 数据包
pub struct FfmpegPacket {
    /// 底层数据包
    pub(super) packet: ffmpeg::Packet,
}

impl EncodedPacket for FfmpegPacket {
    fn stream_index(&self) -> usize {
        self.packet.stream()
    }
}
