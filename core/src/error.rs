//! 播放管线错误分类
//!
//! - 初始化错误：打开源、探测流、查找/打开解码器、分配缓冲、创建表面，全部致命
//! - 流式错误：读包、解码升级、呈现失败，同样致命
//! - 单包解码错误由播放循环吸收，不在此处体现
//!
//! 每个变体映射到一个互不相同的非零进程退出码。

use std::path::PathBuf;

use thiserror::Error;

/// 播放管线错误
#[derive(Debug, Error)]
pub enum PlayerError {
    /// 无法打开或解析媒体容器
    #[error("无法打开媒体源 {}: {reason}", path.display())]
    SourceOpen {
        /// 输入路径
        path: PathBuf,
        /// 底层原因
        reason: String,
    },

    /// 无法解析流元数据
    #[error("无法解析流信息: {0}")]
    StreamInfo(String),

    /// 容器中不存在视频流
    #[error("未找到视频流")]
    NoVideoStream,

    /// 没有为该编码注册的解码器
    #[error("不支持的编码: {0}")]
    UnsupportedCodec(String),

    /// 解码器初始化失败
    #[error("无法打开解码器: {0}")]
    DecoderOpen(String),

    /// 转换上下文与帧的尺寸或格式不一致
    #[error("像素格式转换失败: {0}")]
    Conversion(String),

    /// 缓冲或纹理分配失败
    #[error("资源分配失败: {0}")]
    Resource(String),

    /// 平台无法创建显示表面
    #[error("无法创建显示表面: {0}")]
    SurfaceCreation(String),

    /// 读取数据包失败（非流结束）
    #[error("读取数据包失败: {0}")]
    Read(String),

    /// 单次解码失败
    #[error("解码失败: {0}")]
    Decode(String),

    /// 连续解码失败次数超过上限
    #[error("连续 {count} 次解码失败，最后一次: {last}")]
    TooManyDecodeErrors {
        /// 连续失败次数
        count: u32,
        /// 最后一次错误描述
        last: String,
    },

    /// 上传或呈现帧失败
    #[error("呈现失败: {0}")]
    Present(String),

    /// 在错误的会话状态下调用操作
    #[error("会话状态错误: {0}")]
    Lifecycle(&'static str),
}

impl PlayerError {
    /// 是否属于初始化阶段的错误
    ///
    /// 初始化时尺寸或像素格式无效报告为 `StreamInfo`，`Conversion` 只出现在流式阶段
    #[must_use]
    pub const fn is_initialization(&self) -> bool {
        matches!(
            self,
            Self::SourceOpen { .. }
                | Self::StreamInfo(_)
                | Self::NoVideoStream
                | Self::UnsupportedCodec(_)
                | Self::DecoderOpen(_)
                | Self::Resource(_)
                | Self::SurfaceCreation(_)
        )
    }

    /// 进程退出码（1 保留给用法与配置错误）
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::SourceOpen { .. } => 2,
            Self::StreamInfo(_) => 3,
            Self::NoVideoStream => 4,
            Self::UnsupportedCodec(_) => 5,
            Self::DecoderOpen(_) => 6,
            Self::Conversion(_) => 7,
            Self::Resource(_) => 8,
            Self::SurfaceCreation(_) => 9,
            Self::Read(_) => 10,
            Self::Decode(_) | Self::TooManyDecodeErrors { .. } => 11,
            Self::Present(_) => 12,
            Self::Lifecycle(_) => 13,
        }
    }
}

/// 播放管线结果类型
pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            PlayerError::SourceOpen {
                path: PathBuf::from("a.mp4"),
                reason: "x".into(),
            },
            PlayerError::StreamInfo("x".into()),
            PlayerError::NoVideoStream,
            PlayerError::UnsupportedCodec("x".into()),
            PlayerError::DecoderOpen("x".into()),
            PlayerError::Conversion("x".into()),
            PlayerError::Resource("x".into()),
            PlayerError::SurfaceCreation("x".into()),
            PlayerError::Read("x".into()),
            PlayerError::Decode("x".into()),
            PlayerError::Present("x".into()),
            PlayerError::Lifecycle("x"),
        ];
        let mut codes: Vec<u8> = errors.iter().map(PlayerError::exit_code).collect();
        assert!(codes.iter().all(|c| *c > 1));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn decode_escalation_shares_decode_code() {
        let err = PlayerError::TooManyDecodeErrors {
            count: 3,
            last: "bad".into(),
        };
        assert_eq!(err.exit_code(), PlayerError::Decode(String::new()).exit_code());
        assert!(!err.is_initialization());
        assert!(PlayerError::NoVideoStream.is_initialization());
    }

    #[test]
    fn conversion_belongs_to_the_streaming_phase() {
        assert!(PlayerError::StreamInfo("0x0".into()).is_initialization());
        assert!(!PlayerError::Conversion("4x2 != 2x2".into()).is_initialization());
        assert!(!PlayerError::Read("x".into()).is_initialization());
    }
}
