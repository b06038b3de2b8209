//! The wgpu implementation of [`RenderBackend`].
//!
//! Pipelines are created once per [`ScalarShaderVariant`] and shared by every program
//! handle of that variant. Each draw records its own render pass that loads the
//! current target contents, so draws compose in submission order.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::backend::{
    validate_attribute, validate_texture, AttributeLayout, BufferHandle, DrawCall, ProgramDesc,
    ProgramHandle, RenderBackend, ScalarSource, TextureHandle,
};
use crate::color_maps::{ColorMap, COLORMAP_RESOLUTION};
use crate::error::{RenderError, RenderResult};
use crate::scalar_render::FrameUniforms;
use crate::shader::ScalarShaderVariant;

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct RenderTarget {
    color: wgpu::TextureView,
    depth: Option<wgpu::TextureView>,
}

/// Offscreen color and depth attachments created by [`WgpuBackend::create_offscreen_target`].
pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub depth: Option<wgpu::Texture>,
    pub width: u32,
    pub height: u32,
}

/// Renders scalar quantities with wgpu.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    frame_layout: wgpu::BindGroupLayout,
    geometry_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<ScalarShaderVariant, wgpu::RenderPipeline>,
    programs: HashMap<u64, ScalarShaderVariant>,
    buffers: HashMap<u64, wgpu::Buffer>,
    textures: HashMap<u64, GpuTexture>,
    color_maps: HashMap<String, TextureHandle>,
    colormap_sampler: wgpu::Sampler,
    empty_scalar_texture: GpuTexture,
    target: Option<RenderTarget>,
    view_projection: Mat4,
    light_direction: Vec3,
    next_id: u64,
}

impl WgpuBackend {
    /// Creates a backend on an existing device, rendering into targets of the given formats.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scalar frame bind group layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        // Positions, normals, barycentrics, edge_is_real, values
        let geometry_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..5).map(storage_entry).collect();
        let geometry_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scalar geometry bind group layout"),
            entries: &geometry_entries,
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scalar texture bind group layout"),
            entries: &[
                // Color map lookup table
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D1,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Scalar field texture, read with textureLoad
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scalar pipeline layout"),
            bind_group_layouts: &[&frame_layout, &geometry_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let colormap_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("colormap sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let empty_scalar_texture = upload_scalar_texture(&device, &queue, "empty scalar texture", 1, 1, &[0.0]);

        Self {
            device,
            queue,
            color_format,
            depth_format,
            frame_layout,
            geometry_layout,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            color_maps: HashMap::new(),
            colormap_sampler,
            empty_scalar_texture,
            target: None,
            view_projection: Mat4::IDENTITY,
            light_direction: Vec3::new(0.3, 0.5, 1.0),
            next_id: 0,
        }
    }

    /// Creates a backend on a new device with no window surface.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("scalarscope device (headless)"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        log::info!("headless backend on adapter '{}'", adapter.get_info().name);

        Ok(Self::new(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            Some(wgpu::TextureFormat::Depth32Float),
        ))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    pub fn set_light_direction(&mut self, direction: Vec3) {
        self.light_direction = direction;
    }

    /// Sets the attachments subsequent draws render into.
    pub fn set_target(&mut self, color: wgpu::TextureView, depth: Option<wgpu::TextureView>) {
        if depth.is_some() != self.depth_format.is_some() {
            log::warn!("render target depth attachment does not match the pipeline depth format");
        }
        self.target = Some(RenderTarget { color, depth });
    }

    /// Allocates offscreen attachments in the backend's formats and makes them the target.
    pub fn create_offscreen_target(&mut self, width: u32, height: u32) -> OffscreenTarget {
        let width = width.max(1);
        let height = height.max(1);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = self.depth_format.map(|format| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen depth"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
        });

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth
            .as_ref()
            .map(|d| d.create_view(&wgpu::TextureViewDescriptor::default()));
        self.target = Some(RenderTarget {
            color: color_view,
            depth: depth_view,
        });

        OffscreenTarget {
            color,
            depth,
            width,
            height,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_pipeline(&mut self, variant: ScalarShaderVariant) -> RenderResult<()> {
        if self.pipelines.contains_key(&variant) {
            return Ok(());
        }
        let builder = variant.builder();
        let shader = builder.build_module(&self.device)?;

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: builder.label(),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(builder.vertex_entry()),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(builder.fragment_entry()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        log::debug!("created pipeline for {variant:?}");
        self.pipelines.insert(variant, pipeline);
        Ok(())
    }

    fn buffer(&self, handle: BufferHandle, what: &'static str) -> RenderResult<&wgpu::Buffer> {
        self.buffers
            .get(&handle.raw())
            .ok_or(RenderError::InvalidHandle(what))
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        self.ensure_pipeline(desc.variant)?;
        let id = self.next_id();
        self.programs.insert(id, desc.variant);
        log::debug!("program '{}' uses {:?}", desc.label, desc.variant);
        Ok(ProgramHandle::from_raw(id))
    }

    fn create_attribute_buffer(
        &mut self,
        label: &str,
        layout: AttributeLayout,
        data: &[f32],
    ) -> RenderResult<BufferHandle> {
        validate_attribute(layout, data)?;
        // Storage bindings must not be empty
        let padding = [0.0f32; 4];
        let contents: &[f32] = if data.is_empty() { &padding } else { data };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(contents),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
        let id = self.next_id();
        self.buffers.insert(id, buffer);
        Ok(BufferHandle::from_raw(id))
    }

    fn create_scalar_texture(
        &mut self,
        label: &str,
        dim_x: u32,
        dim_y: u32,
        data: &[f32],
    ) -> RenderResult<TextureHandle> {
        validate_texture(
            dim_x,
            dim_y,
            data,
            self.device.limits().max_texture_dimension_2d,
        )?;
        let texture = upload_scalar_texture(&self.device, &self.queue, label, dim_x, dim_y, data);
        let id = self.next_id();
        self.textures.insert(id, texture);
        Ok(TextureHandle::from_raw(id))
    }

    fn color_map_texture(&mut self, color_map: &ColorMap) -> RenderResult<TextureHandle> {
        if let Some(&handle) = self.color_maps.get(&color_map.name) {
            return Ok(handle);
        }

        let pixel_data = color_map.lut_rgba8(COLORMAP_RESOLUTION);
        let size = wgpu::Extent3d {
            width: COLORMAP_RESOLUTION,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("colormap texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D1,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixel_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(COLORMAP_RESOLUTION * 4),
                rows_per_image: None,
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D1),
            ..Default::default()
        });

        let id = self.next_id();
        self.textures.insert(
            id,
            GpuTexture {
                _texture: texture,
                view,
            },
        );
        let handle = TextureHandle::from_raw(id);
        self.color_maps.insert(color_map.name.clone(), handle);
        log::debug!("uploaded color map '{}'", color_map.name);
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.raw());
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer.raw()) {
            buffer.destroy();
        }
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.raw());
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> RenderResult<()> {
        let geometry = call.geometry;
        if geometry.vertex_count == 0 {
            return Ok(());
        }
        let target = self.target.as_ref().ok_or(RenderError::NoRenderTarget)?;
        let variant = *self
            .programs
            .get(&call.program.raw())
            .ok_or(RenderError::InvalidHandle("program"))?;
        let pipeline = self
            .pipelines
            .get(&variant)
            .ok_or(RenderError::InvalidHandle("pipeline"))?;

        let frame = FrameUniforms::new(self.view_projection, call.model, self.light_direction);
        let frame_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scalar frame uniforms"),
                contents: bytemuck::bytes_of(&frame),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let scalar_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scalar uniforms"),
                contents: bytemuck::bytes_of(&call.uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let frame_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scalar frame bind group"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scalar_buffer.as_entire_binding(),
                },
            ],
        });

        let (values, scalar_texture) = match call.source {
            ScalarSource::Attribute(buffer) => (buffer, None),
            ScalarSource::Texture { texture, texcoords } => (texcoords, Some(texture)),
        };
        let geometry_buffers = [
            self.buffer(geometry.positions, "positions")?,
            self.buffer(geometry.normals, "normals")?,
            self.buffer(geometry.barycentrics, "barycentrics")?,
            self.buffer(geometry.edge_is_real, "edge_is_real")?,
            self.buffer(values, "values")?,
        ];
        let geometry_entries: Vec<wgpu::BindGroupEntry> = geometry_buffers
            .iter()
            .zip(0u32..)
            .map(|(buffer, binding)| wgpu::BindGroupEntry {
                binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let geometry_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scalar geometry bind group"),
            layout: &self.geometry_layout,
            entries: &geometry_entries,
        });

        let color_map_view = &self
            .textures
            .get(&call.color_map.raw())
            .ok_or(RenderError::InvalidHandle("color map texture"))?
            .view;
        let scalar_view = match scalar_texture {
            Some(handle) => {
                &self
                    .textures
                    .get(&handle.raw())
                    .ok_or(RenderError::InvalidHandle("scalar texture"))?
                    .view
            }
            None => &self.empty_scalar_texture.view,
        };
        let texture_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scalar texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(color_map_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.colormap_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(scalar_view),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scalar draw encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scalar pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: target.depth.as_ref().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &frame_group, &[]);
            pass.set_bind_group(1, &geometry_group, &[]);
            pass.set_bind_group(2, &texture_group, &[]);
            pass.draw(0..geometry.vertex_count, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn upload_scalar_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    dim_x: u32,
    dim_y: u32,
    data: &[f32],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: dim_x,
        height: dim_y,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(data),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(dim_x * 4),
            rows_per_image: Some(dim_y),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}
