use std::io::Cursor;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use image::{ImageFormat, RgbaImage};
use wgpu::util::DeviceExt;
use wgpu::{
    DepthBiasState, MultisampleState, PipelineCompilationOptions, ShaderSource, StencilState,
};

use crate::camera::Camera;
use crate::capture::{CapturedImage, RenderSurface};
use crate::error::{CustomizerError, Result};
use crate::rendering::config::RenderConfig;
use crate::rendering::draw_list::{draw_list, DrawItem};
use crate::scene_graph::Scene;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BYTES_PER_PIXEL: u32 = 4;

const POSITION_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Per-draw uniform block, laid out to match `Draw` in `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct DrawUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    light: [f32; 4],
}

impl DrawUniform {
    fn new(item: &DrawItem, view_proj: Mat4, toward_camera: Vec3, config: &RenderConfig) -> Self {
        let alpha = if item.is_transparent() {
            item.material.opacity().clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: item.world.to_cols_array_2d(),
            color: item.material.color().to_vec3().extend(alpha).to_array(),
            emissive: item
                .material
                .emissive()
                .to_vec3()
                .extend(config.emissive_weight)
                .to_array(),
            light: toward_camera.extend(config.ambient).to_array(),
        }
    }
}

struct GpuPrimitive {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuDraw {
    transparent: bool,
    bind_group: wgpu::BindGroup,
    primitives: Vec<GpuPrimitive>,
}

struct RenderTarget {
    size: wgpu::Extent3d,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            size,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
        }
    }
}

/// Headless wgpu surface rendering into an offscreen texture that is copied
/// back to the CPU on `read_pixels`.
pub struct OffscreenSurface {
    config: RenderConfig,
    camera: Camera,
    device: wgpu::Device,
    queue: wgpu::Queue,
    draw_layout: wgpu::BindGroupLayout,
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    target: Option<RenderTarget>,
}

impl OffscreenSurface {
    /// Opens a GPU device. The surface starts detached; call
    /// [`OffscreenSurface::attach`] before rendering.
    pub fn new(config: RenderConfig) -> Result<Self> {
        pollster::block_on(Self::create(config))
    }

    async fn create(config: RenderConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| CustomizerError::RenderDevice(format!("No GPU adapter: {}", err)))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: Some("Capture Device"),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| CustomizerError::RenderDevice(err.to_string()))?;

        log::info!("Rendering with {}", adapter.get_info().name);

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Capture Pipeline Layout"),
            bind_group_layouts: &[&draw_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let opaque_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            "Opaque pipeline",
            wgpu::BlendState::REPLACE,
            true,
        );
        let transparent_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            "Transparent pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );

        Ok(Self {
            config,
            camera: Camera::default(),
            device,
            queue,
            draw_layout,
            opaque_pipeline,
            transparent_pipeline,
            target: None,
        })
    }

    pub fn attach(&mut self, width: u32, height: u32) {
        log::debug!("Attaching offscreen target {}x{}", width, height);
        self.target = Some(RenderTarget::new(&self.device, width.max(1), height.max(1)));
    }

    pub fn detach(&mut self) {
        self.target = None;
    }

    fn upload(&self, item: &DrawItem, view_proj: Mat4, toward_camera: Vec3) -> GpuDraw {
        let uniform = DrawUniform::new(item, view_proj, toward_camera, &self.config);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniform"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &self.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let primitives = item
            .model
            .primitives
            .iter()
            .filter(|primitive| !primitive.indices.is_empty())
            .map(|primitive| GpuPrimitive {
                vertices: self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(item.model.name.as_str()),
                        contents: bytemuck::cast_slice(&primitive.positions),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                indices: self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(item.model.name.as_str()),
                        contents: bytemuck::cast_slice(&primitive.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                index_count: primitive.indices.len() as u32,
            })
            .collect();

        GpuDraw {
            transparent: item.is_transparent(),
            bind_group,
            primitives,
        }
    }
}

impl RenderSurface for OffscreenSurface {
    fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn render(&mut self, scene: &Scene) -> Result<()> {
        let target = self
            .target
            .as_ref()
            .ok_or(CustomizerError::RenderSurfaceNotReady)?;

        let resolution = Vec2::new(target.size.width as f32, target.size.height as f32);
        let view_proj = self.camera.get_vp_matrix(resolution);
        let toward_camera = -self.camera.view_direction();

        let draws: Vec<GpuDraw> = draw_list(scene, &self.camera)
            .iter()
            .map(|item| self.upload(item, view_proj, toward_camera))
            .collect();

        let background = self.config.background;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.r as f64,
                            g: background.g as f64,
                            b: background.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in &draws {
                let pipeline = if draw.transparent {
                    &self.transparent_pipeline
                } else {
                    &self.opaque_pipeline
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);

                for primitive in &draw.primitives {
                    render_pass.set_vertex_buffer(0, primitive.vertices.slice(..));
                    render_pass
                        .set_index_buffer(primitive.indices.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..primitive.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<CapturedImage> {
        let target = self
            .target
            .as_ref()
            .ok_or(CustomizerError::RenderSurfaceNotReady)?;
        let wgpu::Extent3d { width, height, .. } = target.size;
        let padded_row = padded_bytes_per_row(width);

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback"),
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Copy Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            target.size,
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| CustomizerError::RenderDevice(err.to_string()))?;
        receiver
            .recv()
            .map_err(|_| CustomizerError::RenderDevice("Read-back was dropped".to_string()))?
            .map_err(|err| CustomizerError::RenderDevice(err.to_string()))?;

        let pixels = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, width, height, padded_row)
        };
        readback.unmap();

        let frame = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            CustomizerError::RenderDevice("Read-back size does not match target".to_string())
        })?;

        let mut bytes = Vec::new();
        frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(CapturedImage(bytes))
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    blend: wgpu::BlendState,
    depth_write_enabled: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[POSITION_VBL],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Imported meshes do not agree on winding
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Texture-to-buffer copies need rows aligned to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_PIXEL).div_ceil(align) * align
}

fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    data.chunks(padded_row as usize)
        .take(height as usize)
        .flat_map(|padded| &padded[..row.min(padded.len())])
        .copied()
        .collect()
}
