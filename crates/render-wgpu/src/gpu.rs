use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cubeview_geometry::{Topology, Vertex};
use cubeview_render::{BufferId, Device, FrameStatus, RenderError, ViewportRect};
use glam::Mat4;
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

/// Upper bound on draws recorded between `begin_frame` and `present`.
const MAX_DRAWS_PER_FRAME: u64 = 64;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    mvp: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Errors while bringing up the GPU.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    /// Index count after triangulation; zero for vertex buffers.
    triangle_indices: u32,
}

struct PendingDraw {
    vertices: BufferId,
    indices: BufferId,
    index_count: u32,
    uniforms: DrawUniforms,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear_color: [f32; 4],
    draws: Vec<PendingDraw>,
}

/// [`Device`] backed by a wgpu surface.
///
/// Draws are recorded during the frame and encoded into a single render pass
/// at `present`. Quads are split into triangles when index data is uploaded.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    depth_texture: wgpu::TextureView,
    buffers: BTreeMap<BufferId, GpuBuffer>,
    next_buffer: u32,
    viewport: ViewportRect,
    projection: Mat4,
    model_view: Mat4,
    color: [f32; 3],
    frame: Option<Frame>,
}

impl WgpuDevice {
    /// Create a surface on `target` and a device able to present to it.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(InitError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubeview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are written as-is, without sRGB encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(InitError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_size = std::mem::size_of::<DrawUniforms>() as u64;
        let uniform_stride = align_to(
            uniform_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: uniform_stride * MAX_DRAWS_PER_FRAME,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(uniform_size),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flat_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FLAT_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flat_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // Face winding of loaded geometry is not normalized, so nothing is culled.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = create_depth_texture(&device, config.width, config.height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            viewport: ViewportRect::full(config.width, config.height),
            config,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            depth_texture,
            buffers: BTreeMap::new(),
            next_buffer: 0,
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            color: [1.0, 1.0, 1.0],
            frame: None,
        })
    }

    fn upload(
        &mut self,
        what: &'static str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
        triangle_indices: u32,
    ) -> Result<BufferId, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(what),
                contents,
                usage,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            buffer.destroy();
            return Err(RenderError::Allocation {
                what,
                bytes: contents.len() as u64,
                reason: err.to_string(),
            });
        }

        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                triangle_indices,
            },
        );
        tracing::debug!(?id, what, bytes = contents.len(), "buffer uploaded");
        Ok(id)
    }

    fn encode_frame(&self, frame: &Frame) {
        for (slot, draw) in frame.draws.iter().enumerate() {
            self.queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::bytes_of(&draw.uniforms),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(vp) = clamp_viewport(self.viewport, self.config.width, self.config.height) {
                pass.set_viewport(
                    vp.x as f32,
                    vp.y as f32,
                    vp.width as f32,
                    vp.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_pipeline(&self.pipeline);

                for (slot, draw) in frame.draws.iter().enumerate() {
                    let (Some(vertices), Some(indices)) =
                        (self.buffers.get(&draw.vertices), self.buffers.get(&draw.indices))
                    else {
                        tracing::warn!(
                            vertices = ?draw.vertices,
                            indices = ?draw.indices,
                            "draw references freed buffer"
                        );
                        continue;
                    };
                    let offset = slot as u64 * self.uniform_stride;
                    pass.set_bind_group(0, &self.uniform_bind_group, &[offset as u32]);
                    pass.set_vertex_buffer(0, vertices.buffer.slice(..));
                    pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
                    let count = draw.index_count.min(indices.triangle_indices);
                    pass.draw_indexed(0..count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl Device for WgpuDevice {
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<BufferId, RenderError> {
        self.upload(
            "vertex",
            bytemuck::cast_slice(vertices),
            wgpu::BufferUsages::VERTEX,
            0,
        )
    }

    fn upload_indices(
        &mut self,
        indices: &[u32],
        topology: Topology,
    ) -> Result<BufferId, RenderError> {
        let triangles = topology.triangulate(indices);
        self.upload(
            "index",
            bytemuck::cast_slice(&triangles),
            wgpu::BufferUsages::INDEX,
            triangles.len() as u32,
        )
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(gpu) = self.buffers.remove(&buffer) {
            gpu.buffer.destroy();
        }
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = create_depth_texture(&self.device, self.config.width, self.config.height);
    }

    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.viewport = viewport;
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn set_model_view(&mut self, model_view: Mat4) {
        self.model_view = model_view;
    }

    fn set_color(&mut self, color: [f32; 3]) {
        self.color = color;
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<FrameStatus, RenderError> {
        if self.frame.take().is_some() {
            tracing::warn!("previous frame was never presented");
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Err(RenderError::Device(e.to_string()));
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame {
            output,
            view,
            clear_color,
            draws: Vec::new(),
        });
        Ok(FrameStatus::Ready)
    }

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        topology: Topology,
    ) {
        let uniforms = DrawUniforms {
            mvp: (self.projection * self.model_view).to_cols_array_2d(),
            color: [self.color[0], self.color[1], self.color[2], 1.0],
        };
        let Some(frame) = self.frame.as_mut() else {
            tracing::warn!("draw outside a frame ignored");
            return;
        };
        if frame.draws.len() as u64 >= MAX_DRAWS_PER_FRAME {
            tracing::warn!("per-frame draw limit reached, draw dropped");
            return;
        }
        frame.draws.push(PendingDraw {
            vertices,
            indices,
            index_count: topology.triangulated_len(index_count),
            uniforms,
        });
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        self.encode_frame(&frame);
        frame.output.present();
        Ok(())
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Fit a viewport inside the render target. `None` when nothing is left.
fn clamp_viewport(viewport: ViewportRect, width: u32, height: u32) -> Option<ViewportRect> {
    let x = viewport.x.min(width);
    let y = viewport.y.min(height);
    let clamped = ViewportRect {
        x,
        y,
        width: viewport.width.min(width - x),
        height: viewport.height.min(height - y),
    };
    (clamped.width > 0 && clamped.height > 0).then_some(clamped)
}
