//! # framerush - winit 平台实现
//!
//! 提供基于 winit 窗口与 wgpu 渲染的呈现端，以及命令行入口使用的播放/探测函数

#![cfg(not(target_arch = "wasm32"))]

mod gpu;
mod renderer;
mod sink;

use std::path::Path;

use framerush::config::PlayerConfig;
use framerush::loops::{PlaybackSummary, pacer_from_config, play};
use framerush::media::ffmpeg::FfmpegOpener;
use framerush::media::{StreamDescriptor, probe};

pub use sink::WinitSink;

/// 在窗口中播放一个媒体文件直到结束或用户退出
///
/// # Errors
///
/// - FFmpeg 初始化失败
/// - 播放循环的任一失败（见 [`framerush::PlayerError`]）
pub fn play_file(path: &Path, config: &PlayerConfig) -> framerush::Result<PlaybackSummary> {
    let opener = FfmpegOpener::new()?;
    let mut sink = WinitSink::new(&config.window);
    let mut pacer = pacer_from_config(&config.pacing);
    play(&opener, &mut sink, pacer.as_mut(), path, &config.decode)
}

/// 探测媒体文件中的全部流，不创建窗口
///
/// # Errors
///
/// - FFmpeg 初始化失败、文件无法打开或流信息无法读取
pub fn probe_file(path: &Path) -> framerush::Result<Vec<StreamDescriptor>> {
    let opener = FfmpegOpener::new()?;
    probe(&opener, path)
}
