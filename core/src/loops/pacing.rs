//! 帧间节奏策略
//!
//! 节奏与时间戳无关，只限制呈现速率；播放循环在每次呈现后调用一次 `pace`。

use std::thread;
use std::time::{Duration, Instant};

use crate::config::{PacingConfig, PacingMode};

/// 节奏策略
pub trait Pacer {
    /// 一帧呈现完成后调用，按策略阻塞当前线程
    fn pace(&mut self);
}

/// 每次呈现后固定休眠
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// 创建固定休眠策略
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 休眠时长
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Pacer for FixedDelay {
    fn pace(&mut self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// 固定节拍：下一次呈现安排在上一节拍之后一个间隔
///
/// 解码与呈现耗时计入间隔；落后时从当前时刻重新起拍，不追帧
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl FixedInterval {
    /// 创建固定节拍策略
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
        }
    }

    /// 节拍间隔
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Pacer for FixedInterval {
    fn pace(&mut self) {
        let now = Instant::now();
        let base = self.next_tick.unwrap_or(now);
        let Some(tick) = base.checked_add(self.interval) else {
            self.next_tick = Some(now);
            return;
        };
        if let Some(wait) = tick.checked_duration_since(now) {
            thread::sleep(wait);
            self.next_tick = Some(tick);
        } else {
            self.next_tick = Some(now);
        }
    }
}

/// 不限速
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn pace(&mut self) {}
}

/// 按配置构造节奏策略
#[must_use]
pub fn pacer_from_config(config: &PacingConfig) -> Box<dyn Pacer> {
    match config.mode {
        PacingMode::Delay => Box::new(FixedDelay::new(config.delay)),
        PacingMode::Interval => Box::new(FixedInterval::new(config.delay)),
        PacingMode::Unpaced => Box::new(Unpaced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_sleeps_at_least_delay() {
        let mut pacer = FixedDelay::new(Duration::from_millis(15));
        let start = Instant::now();
        pacer.pace();
        pacer.pace();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn fixed_interval_keeps_cadence() {
        let mut pacer = FixedInterval::new(Duration::from_millis(10));
        let start = Instant::now();
        for _ in 0..3 {
            pacer.pace();
        }
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn fixed_interval_does_not_catch_up_when_late() {
        let mut pacer = FixedInterval::new(Duration::from_millis(20));
        pacer.pace();
        thread::sleep(Duration::from_millis(60));
        let start = Instant::now();
        pacer.pace();
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn config_selects_strategy() {
        let mut config = PacingConfig {
            mode: PacingMode::Unpaced,
            delay: Duration::from_secs(5),
        };
        let start = Instant::now();
        pacer_from_config(&config).pace();
        assert!(start.elapsed() < Duration::from_secs(1));

        config.mode = PacingMode::Delay;
        config.delay = Duration::from_millis(5);
        let start = Instant::now();
        pacer_from_config(&config).pace();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
