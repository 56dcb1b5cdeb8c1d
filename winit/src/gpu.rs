//! GPU 初始化与表面配置模块
//!
//! 负责创建 wgpu 实例、设备、队列和配置表面

use std::sync::Arc;

use anyhow::Result;
use futures_lite::future;
use winit::window::Window;

/// GPU 初始化结果
pub struct GpuContext {
    /// wgpu 表面
    pub surface: wgpu::Surface<'static>,
    /// GPU 设备
    pub device: wgpu::Device,
    /// 命令队列
    pub queue: wgpu::Queue,
    /// 表面配置
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// 按新尺寸重新配置表面，零尺寸（最小化）时保持原配置
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// 以当前配置重新配置表面
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// 初始化 GPU 上下文
///
/// # 参数
///
/// - `window`: 窗口（表面持有其共享引用）
/// - `size`: 初始表面尺寸 (width, height)
/// - `vsync`: 是否与显示器刷新同步
///
/// # Errors
///
/// - 表面创建失败
/// - 适配器请求失败
/// - 设备创建失败
pub fn init_gpu(window: Arc<Window>, size: (u32, u32), vsync: bool) -> Result<GpuContext> {
    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window)?;

    let adapter = future::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        force_fallback_adapter: false,
        compatible_surface: Some(&surface),
    }))
    .map_err(|e| anyhow::anyhow!("request_adapter failed: {:?}", e))?;

    let (device, queue) = future::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
        label: None,
    }))?;

    // 着色器输出的已是伽马编码的 RGB，优先选择非 sRGB 格式避免二次编码
    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);
    let present_mode = if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::AutoNoVsync
    };
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.0.max(1),
        height: size.1.max(1),
        present_mode,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &config);

    Ok(GpuContext {
        surface,
        device,
        queue,
        config,
    })
}
