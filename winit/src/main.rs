//! # framerush 主程序

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use framerush::{
    PlayerError,
    config::{PacingMode, PlayerConfig, load_config},
    logging,
};

/// 未显式指定时在工作目录查找的配置文件
const DEFAULT_CONFIG: &str = "config_player.toml";

#[derive(Parser)]
#[command(version, about = "逐帧解码并在窗口中播放视频文件")]
/// 命令行参数
struct ExecArgs {
    /// 要播放的媒体文件
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// 配置文件路径
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 每帧呈现后的等待时长（毫秒），覆盖配置
    #[arg(long, value_name = "MS", conflicts_with = "no_pacing")]
    delay_ms: Option<u64>,
    /// 不做帧间等待
    #[arg(long)]
    no_pacing: bool,
    /// 只打印流信息，不创建窗口
    #[arg(long)]
    probe: bool,
}

impl ExecArgs {
    /// 读取配置并应用命令行覆盖项
    fn player_config(&self) -> Result<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => load_config(Path::new(DEFAULT_CONFIG))?,
            None => PlayerConfig::default(),
        };
        if let Some(ms) = self.delay_ms {
            config.pacing.delay = Duration::from_millis(ms);
        }
        if self.no_pacing {
            config.pacing.mode = PacingMode::Unpaced;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = match ExecArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if let Err(io) = e.print() {
                eprintln!("无法输出用法信息: {io}");
            }
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {e:#}");
            let code = e.downcast_ref::<PlayerError>().map_or(1, PlayerError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(args: &ExecArgs) -> Result<()> {
    let config = args.player_config()?;
    logging::init_logging(&config.log.filter)?;

    if args.probe {
        for stream in framerush_winit::probe_file(&args.input)? {
            println!("{stream}");
        }
        return Ok(());
    }

    let summary = framerush_winit::play_file(&args.input, &config)?;
    tracing::debug!(?summary, "退出");
    Ok(())
}
