//! 基于 winit + wgpu 的呈现端
//!
//! 事件循环按需创建，由播放循环通过 `pump_app_events` 非阻塞驱动；
//! 窗口尺寸固定为视频尺寸，关闭窗口或按下 Esc 视为退出请求。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

use framerush::config::WindowConfig;
use framerush::media::{ConvertedFrame, PixelFormat};
use framerush::sink::PresentationSink;
use framerush::{PlayerError, Result};

use crate::gpu;
use crate::renderer::Renderer;

/// 等待窗口创建时单次泵事件的超时
const CREATE_PUMP_TIMEOUT: Duration = Duration::from_millis(10);
/// 等待窗口创建的最大泵事件次数
const CREATE_PUMP_LIMIT: u32 = 500;

/// 窗口事件处理器
struct Handler {
    /// 窗口标题
    title: String,
    /// 待创建的窗口尺寸
    pending: Option<PhysicalSize<u32>>,
    /// 窗口创建失败原因
    create_error: Option<String>,
    /// 当前窗口
    window: Option<Arc<Window>>,
    /// 渲染器（持有引用窗口的表面，须先于窗口释放）
    renderer: Option<Renderer>,
    /// 是否收到退出请求
    quit: bool,
}

impl Handler {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(size) = self.pending.take() else {
            return;
        };
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(size)
            .with_resizable(false);
        match event_loop.create_window(attrs) {
            Ok(w) => self.window = Some(Arc::new(w)),
            Err(e) => self.create_error = Some(e.to_string()),
        }
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                debug!("窗口关闭请求");
                self.quit = true;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    debug!("Esc 按下");
                    self.quit = true;
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }
}

/// winit 窗口呈现端
pub struct WinitSink {
    /// 是否与显示器刷新同步
    vsync: bool,
    /// 事件循环（首次创建表面时建立，进程内只能创建一次）
    event_loop: Option<EventLoop<()>>,
    /// 事件处理器
    handler: Handler,
}

impl WinitSink {
    /// 按窗口配置创建呈现端，此时不创建任何窗口
    #[must_use]
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            vsync: config.vsync,
            event_loop: None,
            handler: Handler {
                title: config.title.clone(),
                pending: None,
                create_error: None,
                window: None,
                renderer: None,
                quit: false,
            },
        }
    }

    /// 非阻塞地处理积压的窗口事件，返回事件循环是否要求退出
    fn pump(&mut self, timeout: Duration) -> bool {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return false;
        };
        matches!(
            event_loop.pump_app_events(Some(timeout), &mut self.handler),
            PumpStatus::Exit(_)
        )
    }

    fn open_window(&mut self, width: u32, height: u32) -> Result<Arc<Window>> {
        if self.event_loop.is_none() {
            let event_loop = EventLoop::new()
                .map_err(|e| PlayerError::SurfaceCreation(format!("无法创建事件循环: {e}")))?;
            self.event_loop = Some(event_loop);
        }
        self.handler.pending = Some(PhysicalSize::new(width, height));
        self.handler.create_error = None;
        for _ in 0..CREATE_PUMP_LIMIT {
            if self.pump(CREATE_PUMP_TIMEOUT) {
                return Err(PlayerError::SurfaceCreation("事件循环已退出".into()));
            }
            if let Some(reason) = self.handler.create_error.take() {
                return Err(PlayerError::SurfaceCreation(format!("无法创建窗口: {reason}")));
            }
            if let Some(window) = &self.handler.window {
                return Ok(Arc::clone(window));
            }
        }
        self.handler.pending = None;
        Err(PlayerError::SurfaceCreation("等待窗口创建超时".into()))
    }
}

impl PresentationSink for WinitSink {
    fn create_surface(&mut self, width: u32, height: u32) -> Result<()> {
        if self.handler.window.is_some() {
            return Err(PlayerError::Lifecycle("表面已创建"));
        }
        let window = self.open_window(width, height)?;
        let size = window.inner_size();
        if size != PhysicalSize::new(width, height) {
            warn!(
                requested = %format!("{width}x{height}"),
                actual = %format!("{}x{}", size.width, size.height),
                "窗口尺寸与视频尺寸不一致"
            );
        }
        let surface_size = if size.width == 0 || size.height == 0 {
            (width, height)
        } else {
            (size.width, size.height)
        };
        match gpu::init_gpu(Arc::clone(&window), surface_size, self.vsync) {
            Ok(ctx) => {
                info!(
                    format = ?ctx.config.format,
                    present_mode = ?ctx.config.present_mode,
                    "渲染表面已创建"
                );
                self.handler.renderer = Some(Renderer::new(ctx));
                Ok(())
            }
            Err(e) => {
                self.handler.window = None;
                Err(PlayerError::SurfaceCreation(format!("{e:#}")))
            }
        }
    }

    fn create_uploadable_image(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<()> {
        let renderer = self
            .handler
            .renderer
            .as_mut()
            .ok_or(PlayerError::Lifecycle("表面尚未创建"))?;
        renderer.create_image(width, height, format)
    }

    fn present(&mut self, frame: &ConvertedFrame) -> Result<()> {
        let renderer = self
            .handler
            .renderer
            .as_mut()
            .ok_or_else(|| PlayerError::Present("表面尚未创建".into()))?;
        renderer.present(frame)
    }

    fn poll_quit(&mut self) -> bool {
        if self.pump(Duration::ZERO) {
            self.handler.quit = true;
        }
        self.handler.quit
    }

    fn destroy_surface(&mut self) {
        let had_window = self.handler.window.is_some();
        self.handler.renderer = None;
        self.handler.window = None;
        if had_window {
            // 让平台处理窗口销毁
            self.pump(Duration::ZERO);
            debug!("渲染表面已释放");
        }
    }
}

impl Drop for WinitSink {
    fn drop(&mut self) {
        self.destroy_surface();
    }
}
