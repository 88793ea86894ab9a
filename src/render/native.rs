use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::config;
use crate::render::mesh::{MeshData, Vertex};
use crate::render::overlay::StatsOverlay;
use crate::render::{RenderSurface, SurfaceSize};
use crate::scene::{Scene, SceneNode};
use crate::stats::FrameStats;

/// GPU renderer backed by wgpu that draws the scene graph into a window.
///
/// The graphics context and the overlay both live behind `Option` so that
/// [`release`](RenderSurface::release) can drop them while the struct itself
/// stays owned by the controller.
pub struct Renderer {
    window: Arc<Window>,
    gpu: Option<GpuContext>,
    overlay: Option<StatsOverlay>,
    size: SurfaceSize,
}

impl Renderer {
    /// Initializes the GPU context for the window and uploads the scene's
    /// meshes. The scene's shape is fixed after construction; only node
    /// transforms change per frame.
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self> {
        let inner = window.inner_size();
        if inner.width == 0 || inner.height == 0 {
            return Err(anyhow!("window has zero area"));
        }
        let size = SurfaceSize::new(inner.width, inner.height);

        let gpu = GpuContext::new(Arc::clone(&window), size, scene).await?;
        let overlay = StatsOverlay::new(&window, &gpu.device, gpu.config.format);
        info!("renderer ready at {}x{}", size.width, size.height);

        Ok(Self {
            window,
            gpu: Some(gpu),
            overlay: Some(overlay),
            size,
        })
    }
}

impl RenderSurface for Renderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reconfigure(size);
            debug!("surface resized to {}x{}", size.width, size.height);
        }
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        stats: &FrameStats,
    ) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            debug!("render after release ignored");
            return Ok(());
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost; reconfiguring and skipping frame");
                gpu.reconfigure(self.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(err) => {
                warn!("surface error: {err}; skipping frame");
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.draw_scene(&view, scene, camera);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.draw(&gpu.device, &gpu.queue, &self.window, &view, self.size, stats);
        }
        output.present();
        Ok(())
    }

    fn release(&mut self) {
        self.overlay = None;
        if self.gpu.take().is_some() {
            info!("graphics context released");
        }
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }
}

/// Everything that dies with the graphics context.
struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    shadow: ShadowMap,
    scene_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    meshes: HashMap<String, MeshBuffers>,
}

impl GpuContext {
    async fn new(window: Arc<Window>, size: SurfaceSize, scene: &Scene) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("turntable-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| {
                    matches!(
                        mode,
                        wgpu::PresentMode::Mailbox | wgpu::PresentMode::Immediate
                    )
                })
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, size.width, size.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GlobalUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        // Per-object uniform layout
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ObjectConstants>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // Shadow map texture + comparison sampler for the main pass
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow = ShadowMap::create(&device, &shadow_layout);

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: (3 * std::mem::size_of::<f32>()) as u64,
                    shader_location: 1,
                },
            ],
        }];

        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("scene-pipeline-layout"),
                bind_group_layouts: &[&global_layout, &object_layout, &shadow_layout],
                push_constant_ranges: &[],
            });
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene-pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        // Depth-only pass from the light's point of view; the bias pushes
        // stored depths back to keep surfaces from shadowing themselves.
        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("shadow-pipeline-layout"),
                bind_group_layouts: &[&global_layout, &object_layout],
                push_constant_ranges: &[],
            });
        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow-pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: ShadowMap::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview: None,
            cache: None,
        });

        let mut meshes = HashMap::new();
        for node in scene.meshes() {
            if let Some(shape) = node.shape() {
                let data = MeshData::from_shape(shape);
                meshes.insert(
                    node.name.clone(),
                    MeshBuffers::upload(&device, &data, &node.name),
                );
            }
        }

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            shadow,
            scene_pipeline,
            shadow_pipeline,
            global_buffer,
            global_bind_group,
            object_layout,
            meshes,
        })
    }

    /// Reconfigures the swap chain and depth buffer for a new size. The
    /// shadow map keeps its fixed resolution.
    fn reconfigure(&mut self, size: SurfaceSize) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, size.width, size.height);
    }

    /// Records and submits the shadow pass and the main pass.
    fn draw_scene(&self, view: &wgpu::TextureView, scene: &Scene, camera: &PerspectiveCamera) {
        let globals = build_globals(scene, camera);
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&globals));

        // Per-object uniforms are rebuilt every frame; transforms change.
        let mut draws = Vec::new();
        for node in scene.meshes() {
            let Some(mesh) = self.meshes.get(&node.name) else {
                debug!("no mesh uploaded for node {}", node.name);
                continue;
            };
            let constants = object_constants(node);
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("object-uniform"),
                    contents: bytes_of(&constants),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("object-bind-group"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            draws.push(DrawCall {
                mesh,
                bind_group,
                casts_shadow: node.cast_shadow,
            });
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow-pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            for draw in draws.iter().filter(|draw| draw.casts_shadow) {
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertex.slice(..));
                pass.set_index_buffer(draw.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }
        }

        {
            let clear = config::CLEAR_COLOR;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            pass.set_bind_group(2, &self.shadow.bind_group, &[]);
            for draw in &draws {
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertex.slice(..));
                pass.set_index_buffer(draw.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

struct DrawCall<'a> {
    mesh: &'a MeshBuffers,
    bind_group: wgpu::BindGroup,
    casts_shadow: bool,
}

/// View-projection of the directional light's orthographic frustum, sized to
/// cover the ground plane with margin.
fn light_matrix(light_position: Vec3) -> Mat4 {
    let view = Mat4::look_at_rh(light_position, Vec3::ZERO, Vec3::Y);
    let half = config::shadow::HALF_EXTENT;
    let projection = Mat4::orthographic_rh(
        -half,
        half,
        -half,
        half,
        config::shadow::NEAR,
        config::shadow::FAR,
    );
    projection * view
}

fn build_globals(scene: &Scene, camera: &PerspectiveCamera) -> GlobalUniform {
    let sun = scene.directional();
    let sun_position = sun
        .map(|node| node.position)
        .unwrap_or(config::scene::SUN_POSITION);
    let sun_color = sun.map(|node| node.color).unwrap_or(Vec3::ONE);
    let sun_intensity = sun.map(|node| node.intensity).unwrap_or(1.0);
    let ambient = scene.ambient();
    let ambient_color = ambient.map(|node| node.color).unwrap_or(Vec3::ONE);
    let ambient_intensity = ambient
        .map(|node| node.intensity)
        .unwrap_or(config::scene::AMBIENT_INTENSITY);

    GlobalUniform {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_view_proj: light_matrix(sun_position).to_cols_array_2d(),
        camera_position: camera.position.extend(1.0).into(),
        light_direction: sun_position
            .normalize_or_zero()
            .extend(sun_intensity)
            .into(),
        light_color: sun_color
            .extend(1.0 / config::shadow::MAP_SIZE as f32)
            .into(),
        ambient: ambient_color.extend(ambient_intensity).into(),
    }
}

fn object_constants(node: &SceneNode) -> ObjectConstants {
    let model = node.model_matrix();
    let normal = Mat3::from_mat4(model).inverse().transpose();
    ObjectConstants {
        model: model.to_cols_array_2d(),
        normal: mat3_to_3x4(normal),
        color: node.color.extend(1.0).into(),
        flags: [f32::from(node.receive_shadow), 0.0, 0.0, 0.0],
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: data.index_count(),
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct ShadowMap {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn create(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let resolution = config::shadow::MAP_SIZE;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Linear filtering on a comparison sampler gives hardware PCF; the
        // shader widens it to a 3x3 kernel.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-bind-group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        Self {
            _texture: texture,
            view,
            bind_group,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    /// xyz: direction toward the light, w: intensity.
    light_direction: [f32; 4],
    /// rgb: light color, w: shadow map texel size.
    light_color: [f32; 4],
    /// rgb: ambient color, w: intensity.
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
    /// x: receives shadows.
    flags: [f32; 4],
}

const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    flags: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@group(2) @binding(0)
var shadow_map: texture_depth_2d;
@group(2) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

@vertex
fn vs_shadow(input: VertexInput) -> @builtin(position) vec4<f32> {
    return globals.light_view_proj * object.model * vec4<f32>(input.position, 1.0);
}

fn fetch_shadow(world_pos: vec3<f32>) -> f32 {
    let light_space = globals.light_view_proj * vec4<f32>(world_pos, 1.0);
    if (light_space.w <= 0.0) {
        return 1.0;
    }
    let proj = light_space.xyz / light_space.w;
    let uv = proj.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    if (proj.z <= 0.0 || proj.z >= 1.0
        || any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0))) {
        return 1.0;
    }

    let texel = globals.light_color.w;
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(
                shadow_map, shadow_sampler, uv + offset, proj.z
            );
        }
    }
    return lit / 9.0;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let diffuse = max(dot(normal, globals.light_direction.xyz), 0.0);

    var shadow = 1.0;
    if (object.flags.x > 0.5) {
        shadow = fetch_shadow(input.world_pos);
    }

    let sun = globals.light_color.rgb * globals.light_direction.w * diffuse * shadow;
    let fill = globals.ambient.rgb * globals.ambient.w;
    let lit_color = (fill + sun) * object.color.rgb;
    return vec4<f32>(lit_color, object.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectConstants>() % 16, 0);
    }

    #[test]
    fn light_matrix_keeps_the_scene_in_frustum() {
        let matrix = light_matrix(config::scene::SUN_POSITION);
        // The origin and the ground corners land inside clip space.
        for point in [
            Vec3::ZERO,
            Vec3::new(5.0, -1.0, 5.0),
            Vec3::new(-5.0, -1.0, -5.0),
        ] {
            let clip = matrix * point.extend(1.0);
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() <= 1.0, "x out of frustum for {point:?}");
            assert!(ndc.y.abs() <= 1.0, "y out of frustum for {point:?}");
            assert!((0.0..=1.0).contains(&ndc.z), "depth out of range for {point:?}");
        }
    }

    #[test]
    fn object_constants_carry_shadow_flag_and_color() {
        let scene = Scene::demo();
        let cube = object_constants(scene.get("Cube").unwrap());
        assert_eq!(cube.flags[0], 1.0);
        assert_eq!(cube.color, [0.0, 1.0, 0.0, 1.0]);

        let sun_intensity = build_globals(&scene, &PerspectiveCamera::demo(1.0)).light_direction[3];
        assert_eq!(sun_intensity, 1.0);
    }

    #[test]
    fn globals_reflect_the_demo_lights() {
        let scene = Scene::demo();
        let camera = PerspectiveCamera::demo(4.0 / 3.0);
        let globals = build_globals(&scene, &camera);
        assert_eq!(globals.ambient[3], 0.4);
        assert_eq!(globals.camera_position[0], 2.0);
        // Direction points from the origin toward the sun.
        let direction = Vec3::new(
            globals.light_direction[0],
            globals.light_direction[1],
            globals.light_direction[2],
        );
        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.dot(config::scene::SUN_POSITION) > 0.0);
    }
}
