//! 播放状态机
//!
//! 初始化 → 流式播放 → 冲刷（可选）→ 终止。
//!
//! - 初始化阶段按顺序获取：解码会话、视频流、解码器、转换器、目标帧、呈现表面、可上传图像。
//!   任一步失败都会按相反顺序释放之前获取的资源后返回错误。
//! - 流式阶段每轮：读包 → 跳过非视频包 → 解码 → 转换 → 呈现 → 节奏 → 检查退出。
//!   退出检查发生在下一次读包之前，不会打断进行中的解码/转换/呈现。
//! - 单包解码错误记录后跳过，连续失败超过上限时终止。

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::config::DecodeConfig;
use crate::error::{PlayerError, Result};
use crate::loops::pacing::Pacer;
use crate::media::converter::FrameConverter;
use crate::media::decoder::{CodecState, DecoderSession, EncodedPacket, MediaSource, SourceOpener};
use crate::media::frame::ConvertedFrame;
use crate::sink::{PresentationSink, SurfaceGuard};

/// 播放结束原因
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// 输入读尽
    #[default]
    EndOfStream,
    /// 用户请求退出
    UserQuit,
}

/// 播放统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// 读取的数据包总数
    pub packets_read: u64,
    /// 因不属于视频流而跳过的数据包数
    pub packets_skipped: u64,
    /// 呈现的帧数（含冲刷阶段）
    pub frames_presented: u64,
    /// 冲刷阶段呈现的帧数
    pub frames_drained: u64,
    /// 被跳过的解码错误数
    pub decode_errors: u64,
    /// 结束原因
    pub outcome: PlaybackOutcome,
}

/// 连续解码错误计数
struct DecodeErrors {
    /// 上限（0 表示不限）
    limit: u32,
    /// 当前连续失败次数
    consecutive: u32,
}

impl DecodeErrors {
    /// 记录一次失败，超过上限时返回升级后的错误
    fn record(&mut self, summary: &mut PlaybackSummary, reason: String) -> Result<()> {
        self.consecutive = self.consecutive.saturating_add(1);
        summary.decode_errors += 1;
        warn!(consecutive = self.consecutive, "跳过无法解码的数据包: {reason}");
        if self.limit != 0 && self.consecutive >= self.limit {
            return Err(PlayerError::TooManyDecodeErrors {
                count: self.consecutive,
                last: reason,
            });
        }
        Ok(())
    }

    const fn reset(&mut self) {
        self.consecutive = 0;
    }
}

/// 初始化完成后的管线，只借用各资源；资源的释放由 `play` 中的声明顺序保证
struct Pipeline<'a, S: MediaSource, K: PresentationSink + ?Sized, P: Pacer + ?Sized> {
    session: &'a mut DecoderSession<S>,
    converter: &'a mut <S::Codec as CodecState>::Converter,
    target: &'a mut ConvertedFrame,
    sink: &'a mut K,
    pacer: &'a mut P,
    video_index: usize,
    errors: DecodeErrors,
    summary: PlaybackSummary,
}

impl<S: MediaSource, K: PresentationSink + ?Sized, P: Pacer + ?Sized> Pipeline<'_, S, K, P> {
    /// 流式阶段：直到输入读尽或用户退出
    fn stream(&mut self) -> Result<PlaybackOutcome> {
        loop {
            let Some(packet) = self.session.read_packet()? else {
                info!(packets = self.summary.packets_read, "输入已读尽");
                return Ok(PlaybackOutcome::EndOfStream);
            };
            self.summary.packets_read += 1;
            if packet.stream_index() == self.video_index {
                self.decode_packet(&packet)?;
            } else {
                self.summary.packets_skipped += 1;
            }
            drop(packet);

            if self.sink.poll_quit() {
                info!("用户请求退出");
                return Ok(PlaybackOutcome::UserQuit);
            }
        }
    }

    /// 解码一个视频包，产出帧则转换并呈现
    fn decode_packet(&mut self, packet: &S::Packet) -> Result<()> {
        match self.session.decode(packet) {
            Ok(Some(frame)) => {
                self.errors.reset();
                self.converter.convert(&frame, self.target)?;
            }
            Ok(None) => {
                self.errors.reset();
                return Ok(());
            }
            Err(PlayerError::Decode(reason)) => {
                return self.errors.record(&mut self.summary, reason);
            }
            Err(e) => return Err(e),
        }
        self.present()
    }

    /// 冲刷阶段：取出解码器中缓存的帧，逐帧呈现
    fn drain(&mut self) -> Result<PlaybackOutcome> {
        loop {
            match self.session.drain() {
                Ok(Some(frame)) => self.converter.convert(&frame, self.target)?,
                Ok(None) => return Ok(PlaybackOutcome::EndOfStream),
                Err(PlayerError::Decode(reason)) => {
                    self.summary.decode_errors += 1;
                    warn!("冲刷解码器失败，放弃剩余缓存帧: {reason}");
                    return Ok(PlaybackOutcome::EndOfStream);
                }
                Err(e) => return Err(e),
            }
            self.present()?;
            self.summary.frames_drained += 1;

            if self.sink.poll_quit() {
                info!("用户请求退出");
                return Ok(PlaybackOutcome::UserQuit);
            }
        }
    }

    /// 呈现目标帧并按策略等待
    fn present(&mut self) -> Result<()> {
        self.sink.present(self.target)?;
        self.summary.frames_presented += 1;
        debug!(frame = self.summary.frames_presented, "已呈现");
        self.pacer.pace();
        Ok(())
    }
}

/// 播放一个媒体文件直到输入读尽或用户退出
///
/// # Errors
///
/// - 初始化阶段的任一失败（打开源、探测、选流、打开解码器、分配、创建表面）
/// - 读包失败、呈现失败、格式转换失败
/// - 连续解码失败超过 `max_consecutive_errors`
pub fn play<O, K, P>(
    opener: &O,
    sink: &mut K,
    pacer: &mut P,
    path: &Path,
    config: &DecodeConfig,
) -> Result<PlaybackSummary>
where
    O: SourceOpener,
    K: PresentationSink + ?Sized,
    P: Pacer + ?Sized,
{
    let result = run(opener, sink, pacer, path, config);
    match &result {
        Ok(summary) => info!(
            outcome = ?summary.outcome,
            packets = summary.packets_read,
            skipped = summary.packets_skipped,
            frames = summary.frames_presented,
            drained = summary.frames_drained,
            decode_errors = summary.decode_errors,
            "播放结束"
        ),
        Err(e) => error!("播放终止: {e}"),
    }
    result
}

fn run<O, K, P>(
    opener: &O,
    sink: &mut K,
    pacer: &mut P,
    path: &Path,
    config: &DecodeConfig,
) -> Result<PlaybackSummary>
where
    O: SourceOpener,
    K: PresentationSink + ?Sized,
    P: Pacer + ?Sized,
{
    // 局部变量按声明的相反顺序析构，即资源获取的相反顺序
    let mut session = DecoderSession::open(opener, path)?;
    let stream = session.select_video_stream()?;
    let stream = session.open_decoder(&stream)?;
    let mut converter = session.converter()?;
    let mut target = converter.allocate_target()?;
    let mut surface = SurfaceGuard::create(sink, stream.width, stream.height)?;
    surface.create_uploadable_image(stream.width, stream.height, ConvertedFrame::FORMAT)?;
    info!(
        width = stream.width,
        height = stream.height,
        format = stream.format.as_deref().unwrap_or("?"),
        "开始播放"
    );

    let mut pipeline = Pipeline {
        session: &mut session,
        converter: &mut converter,
        target: &mut target,
        sink: &mut *surface,
        pacer,
        video_index: stream.index,
        errors: DecodeErrors {
            limit: config.max_consecutive_errors,
            consecutive: 0,
        },
        summary: PlaybackSummary::default(),
    };
    let mut outcome = pipeline.stream()?;
    if outcome == PlaybackOutcome::EndOfStream && config.drain_on_eof {
        debug!("冲刷解码器");
        outcome = pipeline.drain()?;
    }
    let mut summary = pipeline.summary;
    summary.outcome = outcome;

    drop(surface);
    drop(target);
    drop(converter);
    session.close();
    Ok(summary)
}
