//! 日志系统初始化模块

use anyhow::Result;

/// 初始化全局日志系统
///
/// 使用 `tracing-subscriber`，环境变量 `RUST_LOG` 优先于配置中的默认过滤器
///
/// # 使用方式
///
/// ```bash
/// RUST_LOG=debug framerush video.mp4   # 输出每帧的调试日志
/// RUST_LOG=warn framerush video.mp4    # 仅警告和错误
/// ```
///
/// # Errors
///
/// - 默认过滤器语法错误
/// - 全局订阅者已被设置
pub fn init_logging(default_filter: &str) -> Result<()> {
    use tracing_subscriber::fmt::time::FormatTime;
    use tracing_subscriber::{EnvFilter, fmt};

    // 自定义时间格式化器：只显示 HH:MM:SS.微秒
    struct CustomTime;

    impl FormatTime for CustomTime {
        fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default();

            let total_secs = now.as_secs();
            let micros = now.subsec_micros();

            let h = (total_secs / 3600) % 24;
            let m = (total_secs / 60) % 60;
            let s = total_secs % 60;

            write!(w, "{h:02}:{m:02}:{s:02}.{micros:06}")
        }
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    // 日志写到标准错误，标准输出留给 --probe
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(true)
        .with_timer(CustomTime)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志系统初始化失败: {e}"))
}
