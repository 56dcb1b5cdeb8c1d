//! YUV 纹理上传与绘制
//!
//! 三个 `R8Unorm` 纹理分别承载 Y/U/V 平面，片元着色器完成颜色空间转换。

use bytemuck::{Pod, Zeroable};
use framerush::media::{ColorRange, ConvertedFrame, PixelFormat, PlaneView};
use framerush::{PlayerError, Result};

use crate::gpu::GpuContext;

#[repr(C, align(16))]
#[derive(Clone, Copy, Zeroable, Pod)]
/// 颜色转换参数
struct ColorParamsUniform {
    /// 是否为完整范围（0/1）
    full_range: u32,
    /// 对齐填充
    _pad: [u32; 3],
}

/// 单个平面纹理
struct PlaneTexture {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

impl PlaneTexture {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self {
            texture,
            width,
            height,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, plane: PlaneView<'_>) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            plane.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(plane.stride as u32),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn view(&self) -> wgpu::TextureView {
        self.texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }
}

/// 可上传图像：与目标帧布局一致的三平面纹理及其绑定
struct UploadImage {
    width: u32,
    height: u32,
    planes: [PlaneTexture; 3],
    bind_group: wgpu::BindGroup,
}

/// 视频渲染器
pub struct Renderer {
    gpu: GpuContext,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    /// 最近一次写入的颜色范围
    range: Option<ColorRange>,
    image: Option<UploadImage>,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

impl Renderer {
    /// 创建渲染器并初始化管线与缓冲
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("yuv-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("yuv.wgsl").into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("yuv-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("yuv-pl"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("yuv-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("yuv-params"),
            size: std::mem::size_of::<ColorParamsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("yuv-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..wgpu::SamplerDescriptor::default()
        });

        Self {
            gpu,
            pipeline,
            bind_group_layout,
            sampler,
            params_buffer,
            range: None,
            image: None,
        }
    }

    /// 窗口尺寸变化时重新配置表面
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// 创建与目标帧布局一致的三平面纹理
    ///
    /// # Errors
    ///
    /// - 格式不是 YUV420P 或尺寸超过设备纹理上限时返回 `Resource`
    pub fn create_image(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<()> {
        if format != ConvertedFrame::FORMAT {
            return Err(PlayerError::Resource(format!("不支持的图像格式: {format}")));
        }
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(PlayerError::Resource(format!(
                "图像尺寸 {width}x{height} 超出设备限制 {max}x{max}"
            )));
        }
        let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
        let device = &self.gpu.device;
        let planes = [
            PlaneTexture::new(device, "video-y", width, height),
            PlaneTexture::new(device, "video-u", cw, ch),
            PlaneTexture::new(device, "video-v", cw, ch),
        ];
        let views = planes.each_ref().map(PlaneTexture::view);
        let [y_view, u_view, v_view] = &views;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("yuv-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(y_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(u_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(v_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.image = Some(UploadImage {
            width,
            height,
            planes,
            bind_group,
        });
        Ok(())
    }

    /// 上传三个平面并绘制一帧
    ///
    /// # Errors
    ///
    /// - 尚未创建图像、帧尺寸不一致或获取交换链纹理失败时返回 `Present`
    pub fn present(&mut self, frame: &ConvertedFrame) -> Result<()> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| PlayerError::Present("可上传图像尚未创建".into()))?;
        if frame.width() != image.width || frame.height() != image.height {
            return Err(PlayerError::Present(format!(
                "帧尺寸不匹配: 期望 {}x{}, 实际 {}x{}",
                image.width,
                image.height,
                frame.width(),
                frame.height()
            )));
        }

        let queue = &self.gpu.queue;
        if self.range != Some(frame.range()) {
            let uni = ColorParamsUniform {
                full_range: u32::from(frame.range() == ColorRange::Full),
                _pad: [0; 3],
            };
            queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uni));
            self.range = Some(frame.range());
        }
        for (i, texture) in image.planes.iter().enumerate() {
            let plane = frame
                .plane(i)
                .ok_or_else(|| PlayerError::Present(format!("目标帧缺少平面 {i}")))?;
            texture.upload(queue, plane);
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                self.gpu.reconfigure();
                self.gpu
                    .surface
                    .get_current_texture()
                    .map_err(|e| PlayerError::Present(format!("无法获取交换链纹理: {e}")))?
            }
            Err(e) => return Err(PlayerError::Present(format!("无法获取交换链纹理: {e}"))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("video-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &image.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
        self.gpu.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}
