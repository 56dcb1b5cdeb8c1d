//! 播放循环与帧间节奏
//!
//! - `playback`：初始化 → 流式播放 → 冲刷 → 终止 的状态机
//! - `pacing`：每次呈现后的节奏策略

pub mod pacing;
pub mod playback;

pub use pacing::{FixedDelay, FixedInterval, Pacer, Unpaced, pacer_from_config};
pub use playback::{PlaybackOutcome, PlaybackSummary, play};
