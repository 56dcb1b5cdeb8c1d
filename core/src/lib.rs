//! # framerush
//!
//! 解码 → 格式转换 → 呈现 的单线程视频播放管线。
//!
//! - `media`：解码会话、帧视图与像素格式转换
//! - `loops`：播放状态机与帧间节奏控制
//! - `sink`：呈现端抽象
//! - `config` / `logging`：运行配置与日志初始化

pub mod config;
pub mod error;
pub mod logging;
pub mod loops;
pub mod media;
pub mod sink;

pub use error::{PlayerError, Result};
