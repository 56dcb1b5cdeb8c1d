//! 解码会话与解码能力抽象
//!
//! - `SourceOpener` / `MediaSource` / `CodecState` / `EncodedPacket` / `DecodedFrame`：解复用与解码的能力接口
//! - `DecoderSession`：独占媒体源与解码器，按 打开 → 选流 → 打开解码器 → 读包/解码 → 关闭 的顺序使用

use std::path::Path;

use tracing::{debug, info};

use crate::error::{PlayerError, Result};
use crate::media::converter::FrameConverter;
use crate::media::frame::{MediaType, StreamDescriptor};

/// 已读出的压缩数据包，离开作用域即释放
pub trait EncodedPacket {
    /// 所属流索引
    fn stream_index(&self) -> usize;
}

/// 解码器产出的一帧
pub trait DecodedFrame {
    /// 宽度
    fn width(&self) -> u32;
    /// 高度
    fn height(&self) -> u32;
}

/// 已打开的解码器
pub trait CodecState {
    /// 可送入的数据包类型
    type Packet: EncodedPacket;
    /// 解码帧类型，借用解码器内部缓冲
    type Frame<'a>: DecodedFrame
    where
        Self: 'a;
    /// 与解码器输出匹配的转换器
    type Converter: FrameConverter<Self>;

    /// 以已打开解码器的实际参数补全流描述
    ///
    /// 默认沿用容器声明的参数
    fn resolve(&self, stream: &StreamDescriptor) -> StreamDescriptor {
        stream.clone()
    }

    /// 按解码器输出的格式与尺寸创建转换器
    ///
    /// # Errors
    ///
    /// - 转换上下文创建失败时返回 `Resource`
    fn converter(&self) -> Result<Self::Converter>;

    /// 送入一个数据包，至多取回一帧
    ///
    /// 返回的帧借用解码器内部缓冲，下一次解码前必须用完
    ///
    /// # Errors
    ///
    /// - 数据包损坏或解码器拒绝时返回 `Decode`
    fn decode(&mut self, packet: &Self::Packet) -> Result<Option<Self::Frame<'_>>>;

    /// 流结束后冲刷解码器，每次取回一帧缓存帧，`None` 表示已取尽
    ///
    /// # Errors
    ///
    /// - 冲刷失败时返回 `Decode`
    fn drain(&mut self) -> Result<Option<Self::Frame<'_>>>;
}

/// 已打开的媒体源
pub trait MediaSource {
    /// 数据包类型
    type Packet: EncodedPacket;
    /// 解码器类型
    type Codec: CodecState<Packet = Self::Packet>;

    /// 容器声明顺序的全部流
    fn streams(&self) -> &[StreamDescriptor];

    /// 为指定流打开解码器
    ///
    /// # Errors
    ///
    /// - 未注册对应解码器时返回 `UnsupportedCodec`
    /// - 解码器初始化失败时返回 `DecoderOpen`
    fn open_decoder(&mut self, stream: &StreamDescriptor) -> Result<Self::Codec>;

    /// 读取下一个数据包，`None` 表示流结束
    ///
    /// # Errors
    ///
    /// - 非流结束的读取失败返回 `Read`
    fn read_packet(&mut self) -> Result<Option<Self::Packet>>;
}

/// 按路径打开媒体源
pub trait SourceOpener {
    /// 媒体源类型
    type Source: MediaSource;

    /// 打开媒体源并探测流信息
    ///
    /// # Errors
    ///
    /// - 容器无法解析时返回 `SourceOpen`
    /// - 流元数据无法解析时返回 `StreamInfo`
    fn open(&self, path: &Path) -> Result<Self::Source>;
}

/// 解码会话
///
/// 独占媒体源与解码器；`close` 幂等，`Drop` 时自动调用，保证所有退出路径都会释放资源。
pub struct DecoderSession<S: MediaSource> {
    /// 媒体源（关闭后为 None）
    source: Option<S>,
    /// 解码器（打开前与关闭后为 None）
    codec: Option<S::Codec>,
    /// 已选中的视频流
    selected: Option<StreamDescriptor>,
}

impl<S: MediaSource> DecoderSession<S> {
    /// 打开媒体源并输出流信息
    ///
    /// # Errors
    ///
    /// - 透传 `SourceOpener::open` 的错误
    pub fn open<O>(opener: &O, path: &Path) -> Result<Self>
    where
        O: SourceOpener<Source = S>,
    {
        let source = opener.open(path)?;
        info!(path = %path.display(), streams = source.streams().len(), "已打开媒体源");
        for stream in source.streams() {
            info!("  {stream}");
        }
        Ok(Self {
            source: Some(source),
            codec: None,
            selected: None,
        })
    }

    /// 容器中的全部流（关闭后为空）
    #[must_use]
    pub fn streams(&self) -> &[StreamDescriptor] {
        match &self.source {
            Some(source) => source.streams(),
            None => &[],
        }
    }

    /// 选择第一个视频流
    ///
    /// # Errors
    ///
    /// - 没有视频流时返回 `NoVideoStream`
    pub fn select_video_stream(&mut self) -> Result<StreamDescriptor> {
        let stream = self
            .streams()
            .iter()
            .find(|s| s.media_type == MediaType::Video)
            .cloned()
            .ok_or(PlayerError::NoVideoStream)?;
        info!(index = stream.index, "选中视频流");
        self.selected = Some(stream.clone());
        Ok(stream)
    }

    /// 为选中的流打开解码器，返回以解码器参数为准的流描述
    ///
    /// # Errors
    ///
    /// - 会话已关闭或解码器已打开时返回 `Lifecycle`
    /// - 透传 `MediaSource::open_decoder` 的错误
    /// - 解码器仍无法确定像素格式或尺寸时返回 `StreamInfo`（解码器留在会话中，随会话释放）
    pub fn open_decoder(&mut self, stream: &StreamDescriptor) -> Result<StreamDescriptor> {
        if self.codec.is_some() {
            return Err(PlayerError::Lifecycle("解码器已打开"));
        }
        let source = self
            .source
            .as_mut()
            .ok_or(PlayerError::Lifecycle("会话已关闭"))?;
        let codec = source.open_decoder(stream)?;
        let resolved = codec.resolve(stream);
        info!(codec = %resolved.codec, "已打开解码器");
        self.codec = Some(codec);
        self.selected = Some(resolved.clone());
        if !resolved.is_resolved() {
            return Err(PlayerError::StreamInfo(format!(
                "视频流 #{} 像素格式或尺寸无效: {}x{} {}",
                resolved.index,
                resolved.width,
                resolved.height,
                resolved.format.as_deref().unwrap_or("?")
            )));
        }
        Ok(resolved)
    }

    /// 按已打开解码器的输出创建转换器
    ///
    /// # Errors
    ///
    /// - 解码器未打开时返回 `Lifecycle`
    /// - 透传 `CodecState::converter` 的错误
    pub fn converter(&self) -> Result<<S::Codec as CodecState>::Converter> {
        self.codec
            .as_ref()
            .ok_or(PlayerError::Lifecycle("解码器未打开"))?
            .converter()
    }

    /// 已选中的视频流
    #[must_use]
    pub const fn selected(&self) -> Option<&StreamDescriptor> {
        self.selected.as_ref()
    }

    /// 读取下一个数据包
    ///
    /// # Errors
    ///
    /// - 会话已关闭时返回 `Lifecycle`
    /// - 透传 `MediaSource::read_packet` 的错误
    pub fn read_packet(&mut self) -> Result<Option<S::Packet>> {
        self.source
            .as_mut()
            .ok_or(PlayerError::Lifecycle("会话已关闭"))?
            .read_packet()
    }

    /// 解码一个数据包，不属于选中流的包直接返回 `None`
    ///
    /// # Errors
    ///
    /// - 解码器未打开时返回 `Lifecycle`
    /// - 透传 `CodecState::decode` 的错误
    pub fn decode(
        &mut self,
        packet: &S::Packet,
    ) -> Result<Option<<S::Codec as CodecState>::Frame<'_>>> {
        let selected = self.selected.as_ref().map(|s| s.index);
        let codec = self
            .codec
            .as_mut()
            .ok_or(PlayerError::Lifecycle("解码器未打开"))?;
        if selected != Some(packet.stream_index()) {
            return Ok(None);
        }
        codec.decode(packet)
    }

    /// 冲刷解码器
    ///
    /// # Errors
    ///
    /// - 解码器未打开时返回 `Lifecycle`
    /// - 透传 `CodecState::drain` 的错误
    pub fn drain(&mut self) -> Result<Option<<S::Codec as CodecState>::Frame<'_>>> {
        self.codec
            .as_mut()
            .ok_or(PlayerError::Lifecycle("解码器未打开"))?
            .drain()
    }

    /// 先释放解码器，再释放媒体源；重复调用无副作用
    pub fn close(&mut self) {
        if let Some(codec) = self.codec.take() {
            drop(codec);
            debug!("已关闭解码器");
        }
        if let Some(source) = self.source.take() {
            drop(source);
            debug!("已关闭媒体源");
        }
    }
}

impl<S: MediaSource> Drop for DecoderSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// 只探测流信息，不打开解码器
///
/// # Errors
///
/// - 透传 `SourceOpener::open` 的错误
pub fn probe<O: SourceOpener>(opener: &O, path: &Path) -> Result<Vec<StreamDescriptor>> {
    let source = opener.open(path)?;
    Ok(source.streams().to_vec())
}
