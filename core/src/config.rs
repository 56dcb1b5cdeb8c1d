//! 播放器配置定义与解析

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

/// 播放器运行时配置
///
/// 所有字段都有默认值，空文件等价于默认配置
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// 帧间节奏
    pub pacing: PacingConfig,
    /// 解码容错
    pub decode: DecodeConfig,
    /// 窗口
    pub window: WindowConfig,
    /// 日志
    pub log: LogConfig,
}

/// 节奏模式
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// 每次呈现后固定休眠
    #[default]
    Delay,
    /// 固定节拍，扣除解码耗时
    Interval,
    /// 不限速
    #[serde(rename = "none")]
    Unpaced,
}

/// 节奏配置
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    /// 节奏模式
    pub mode: PacingMode,
    #[serde(rename = "delay_ms", deserialize_with = "de_duration_ms")]
    /// 每帧间隔（毫秒）
    pub delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            mode: PacingMode::Delay,
            delay: Duration::from_millis(20),
        }
    }
}

/// 解码容错配置
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// 连续解码失败多少次后终止（0 表示从不终止）
    pub max_consecutive_errors: u32,
    /// 流结束时是否冲刷解码器中缓存的帧
    pub drain_on_eof: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 32,
            drain_on_eof: true,
        }
    }
}

/// 窗口配置
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    /// 窗口标题
    pub title: String,
    /// 是否等待垂直同步
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "framerush".to_string(),
            vsync: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// 默认过滤器（`RUST_LOG` 优先）
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// 从 TOML 字符串解析播放器配置
///
/// # Errors
///
/// - TOML 解析失败
/// - 配置字段反序列化失败
pub fn parse_config_str(s: &str) -> Result<PlayerConfig> {
    let cfg: PlayerConfig = toml::from_str(s)?;
    Ok(cfg)
}

/// 从指定路径加载播放器配置（TOML）
///
/// # Errors
///
/// - 读取文件失败
/// - TOML 解析失败
/// - 配置字段反序列化失败
pub fn load_config(path: &Path) -> Result<PlayerConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
    parse_config_str(&s).with_context(|| format!("配置文件格式错误: {}", path.display()))
}

/// 反序列化毫秒为 `Duration`
fn de_duration_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config_str("").unwrap();
        assert_eq!(cfg, PlayerConfig::default());
        assert_eq!(cfg.pacing.mode, PacingMode::Delay);
        assert_eq!(cfg.pacing.delay, Duration::from_millis(20));
        assert_eq!(cfg.decode.max_consecutive_errors, 32);
        assert!(cfg.decode.drain_on_eof);
        assert_eq!(cfg.window.title, "framerush");
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = parse_config_str(
            r#"
            [pacing]
            mode = "interval"
            delay_ms = 40

            [decode]
            drain_on_eof = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.pacing.mode, PacingMode::Interval);
        assert_eq!(cfg.pacing.delay, Duration::from_millis(40));
        assert!(!cfg.decode.drain_on_eof);
        assert_eq!(cfg.decode.max_consecutive_errors, 32);
        assert!(cfg.window.vsync);
    }

    #[test]
    fn none_mode_maps_to_unpaced() {
        let cfg = parse_config_str("[pacing]\nmode = \"none\"\n").unwrap();
        assert_eq!(cfg.pacing.mode, PacingMode::Unpaced);
    }

    #[test]
    fn unknown_mode_and_fields_are_rejected() {
        assert!(parse_config_str("[pacing]\nmode = \"vsync\"\n").is_err());
        assert!(parse_config_str("[pacing]\nfps = 30\n").is_err());
        assert!(parse_config_str("[audio]\nvolume = 1\n").is_err());
        assert!(parse_config_str("[pacing]\ndelay_ms = -1\n").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ntitle = \"demo\"\nvsync = false").unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.window.title, "demo");
        assert!(!cfg.window.vsync);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
