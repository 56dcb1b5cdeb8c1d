//! 呈现端抽象
//!
//! 播放循环只通过 `PresentationSink` 与窗口/渲染器交互；
//! `SurfaceGuard` 保证表面在所有退出路径上被销毁。

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::media::frame::{ConvertedFrame, PixelFormat};

/// 呈现端
pub trait PresentationSink {
    /// 按视频尺寸创建窗口与渲染目标
    ///
    /// 失败时不得遗留已创建的部分资源
    ///
    /// # Errors
    ///
    /// - 平台无法满足请求时返回 `SurfaceCreation`
    fn create_surface(&mut self, width: u32, height: u32) -> Result<()>;

    /// 创建与目标帧布局一致的可上传图像
    ///
    /// # Errors
    ///
    /// - 尺寸超过设备限制或分配失败时返回 `Resource`
    fn create_uploadable_image(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<()>;

    /// 上传各平面并呈现到屏幕，返回时帧已进入显示队列
    ///
    /// # Errors
    ///
    /// - 上传或呈现失败时返回 `Present`
    fn present(&mut self, frame: &ConvertedFrame) -> Result<()>;

    /// 非阻塞地检查用户是否请求退出
    fn poll_quit(&mut self) -> bool;

    /// 释放窗口、渲染器与图像；重复调用无副作用
    fn destroy_surface(&mut self);
}

/// 已创建表面的守卫，离开作用域时调用 `destroy_surface`
pub struct SurfaceGuard<'a, K: PresentationSink + ?Sized> {
    /// 被守护的呈现端
    sink: &'a mut K,
}

impl<'a, K: PresentationSink + ?Sized> SurfaceGuard<'a, K> {
    /// 创建表面并返回守卫
    ///
    /// # Errors
    ///
    /// - 透传 `PresentationSink::create_surface` 的错误
    pub fn create(sink: &'a mut K, width: u32, height: u32) -> Result<Self> {
        sink.create_surface(width, height)?;
        Ok(Self { sink })
    }
}

impl<K: PresentationSink + ?Sized> Deref for SurfaceGuard<'_, K> {
    type Target = K;

    fn deref(&self) -> &K {
        self.sink
    }
}

impl<K: PresentationSink + ?Sized> DerefMut for SurfaceGuard<'_, K> {
    fn deref_mut(&mut self) -> &mut K {
        self.sink
    }
}

impl<K: PresentationSink + ?Sized> Drop for SurfaceGuard<'_, K> {
    fn drop(&mut self) {
        self.sink.destroy_surface();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;

    #[derive(Default)]
    struct Counting {
        created: u32,
        destroyed: u32,
        fail_create: bool,
    }

    impl PresentationSink for Counting {
        fn create_surface(&mut self, _width: u32, _height: u32) -> Result<()> {
            if self.fail_create {
                return Err(PlayerError::SurfaceCreation("no display".into()));
            }
            self.created += 1;
            Ok(())
        }

        fn create_uploadable_image(&mut self, _: u32, _: u32, _: PixelFormat) -> Result<()> {
            Ok(())
        }

        fn present(&mut self, _frame: &ConvertedFrame) -> Result<()> {
            Ok(())
        }

        fn poll_quit(&mut self) -> bool {
            false
        }

        fn destroy_surface(&mut self) {
            self.destroyed += 1;
        }
    }

    #[test]
    fn guard_destroys_on_drop() {
        let mut sink = Counting::default();
        {
            let mut guard = SurfaceGuard::create(&mut sink, 4, 4).unwrap();
            assert!(!guard.poll_quit());
        }
        assert_eq!((sink.created, sink.destroyed), (1, 1));
    }

    #[test]
    fn failed_creation_does_not_destroy() {
        let mut sink = Counting {
            fail_create: true,
            ..Counting::default()
        };
        assert!(SurfaceGuard::create(&mut sink, 4, 4).is_err());
        assert_eq!(sink.destroyed, 0);
    }
}
