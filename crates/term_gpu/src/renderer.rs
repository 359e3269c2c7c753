//! GPU renderer: owns the wgpu device/queue and the three pipelines that
//! draw one terminal frame — background clear, cell backgrounds, cell
//! glyphs — plus the atlas textures the glyph pipeline samples from.

use std::sync::Arc;

use bytemuck::cast_slice;
use thiserror::Error;
use wgpu::util::DeviceExt;

use term_core::{AtlasDimensions, CellInstance, Uniforms};
use term_font::FontSystem;

use crate::frame_assembler::AssembledFrame;
use crate::shaders::{BG_CLEAR_SHADER, CELL_BG_SHADER, CELL_TEXT_SHADER, COMMON_UNIFORMS};

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,
    #[error("failed to request GPU device: {0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    SurfaceError(#[from] wgpu::CreateSurfaceError),
}

/// Tunable renderer limits, overridable via environment variables for the
/// same reason `term_font`'s `FontSystemConfig` is: letting an embedder
/// size buffers without a recompile.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub initial_text_capacity: u32,
    pub initial_bg_buffer_cells: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            initial_text_capacity: env_u32("TERM_GPU_INITIAL_TEXT_CAPACITY").unwrap_or(4096),
            initial_bg_buffer_cells: env_u32("TERM_GPU_INITIAL_BG_BUFFER_CELLS").unwrap_or(80 * 24),
        }
    }
}

struct Pipelines {
    bg_clear: wgpu::RenderPipeline,
    cell_bg: wgpu::RenderPipeline,
    cell_text: wgpu::RenderPipeline,
}

struct BindGroupLayouts {
    uniforms_only: wgpu::BindGroupLayout,
    cell_bg: wgpu::BindGroupLayout,
    text: wgpu::BindGroupLayout,
}

/// A growable GPU buffer, recreated (to the next power of two) whenever a
/// frame needs more room than it currently has.
struct GrowableBuffer {
    buffer: wgpu::Buffer,
    capacity: u32,
    label: &'static str,
    usage: wgpu::BufferUsages,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: u32, stride: u64, usage: wgpu::BufferUsages) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity as u64) * stride,
            usage,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            label,
            usage,
        }
    }

    /// Returns `true` if the buffer was recreated (caller must rebuild any
    /// bind group referencing it).
    fn upload<T: bytemuck::Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) -> bool {
        let stride = std::mem::size_of::<T>() as u64;
        let mut recreated = false;
        if data.len() as u32 > self.capacity {
            let new_capacity = (data.len() as u32).max(1).next_power_of_two();
            self.buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: (new_capacity as u64) * stride,
                usage: self.usage,
                mapped_at_creation: false,
            });
            self.capacity = new_capacity;
            recreated = true;
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, cast_slice(data));
        }
        recreated
    }
}

/// One atlas page mirrored onto the GPU: a texture plus the dimensions it
/// was last synced from. Recreated whenever the CPU-side page grows;
/// otherwise only the dirty sub-region is reuploaded.
struct AtlasTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl AtlasTexture {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    fn upload_full(&self, queue: &wgpu::Queue, pixels: &[u8], bytes_per_pixel: u32) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * bytes_per_pixel),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// A grayscale+color atlas page pair bound together under one `text` bind
/// group, plus the dims uniform buffer describing both textures' current
/// size. `CellInstance::atlas` (written by `term_font::AtlasSet::place`)
/// indexes into `GpuRenderer::atlas_pages` to pick which pair a draw call
/// samples from.
struct AtlasPage {
    grayscale: AtlasTexture,
    color: AtlasTexture,
    dims_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl AtlasPage {
    #[allow(clippy::too_many_arguments)]
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        bg_colors_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        grayscale: AtlasTexture,
        color: AtlasTexture,
    ) -> Self {
        let dims_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("atlas dimensions"),
            contents: bytemuck::bytes_of(&AtlasDimensions {
                grayscale_size: [grayscale.width as f32, grayscale.height as f32],
                color_size: [color.width as f32, color.height as f32],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = GpuRenderer::create_text_bind_group(
            device,
            layout,
            uniform_buffer,
            bg_colors_buffer,
            &dims_buffer,
            &grayscale.view,
            &color.view,
            sampler,
        );
        Self { grayscale, color, dims_buffer, bind_group }
    }

    fn update_dims(&self, queue: &wgpu::Queue) {
        let dims = AtlasDimensions {
            grayscale_size: [self.grayscale.width as f32, self.grayscale.height as f32],
            color_size: [self.color.width as f32, self.color.height as f32],
        };
        queue.write_buffer(&self.dims_buffer, 0, bytemuck::bytes_of(&dims));
    }

    fn rebuild_bind_group(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        bg_colors_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
    ) {
        self.bind_group = GpuRenderer::create_text_bind_group(
            device,
            layout,
            uniform_buffer,
            bg_colors_buffer,
            &self.dims_buffer,
            &self.grayscale.view,
            &self.color.view,
            sampler,
        );
    }
}

/// Owns the device, pipelines, and atlas textures. Renders one terminal
/// frame from an `AssembledFrame` produced by `frame_assembler`.
///
/// `term_font`'s `AtlasSet` grows a page in place before opening a new one
/// once it's capped at `atlas_max_size`; `atlas_pages` mirrors that same
/// page list, one `AtlasPage` (and bind group) per CPU-side page, so a
/// glyph placed on any page is both uploaded and sample-able.
pub struct GpuRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: Pipelines,
    bind_group_layouts: BindGroupLayouts,
    uniforms_bind_group: wgpu::BindGroup,
    cell_bg_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    atlas_pages: Vec<AtlasPage>,
    bg_colors_buffer: GrowableBuffer,
    cell_text_buffer: GrowableBuffer,
    texture_format: wgpu::TextureFormat,
    viewport_size: (u32, u32),
}

impl GpuRenderer {
    fn preferred_backends() -> wgpu::Backends {
        wgpu::Backends::PRIMARY
    }

    /// Creates a renderer for an existing surface (the Android activity's
    /// native window, wrapped by the platform extension before this is
    /// called).
    pub async fn with_instance_and_surface(
        instance: wgpu::Instance,
        surface: &wgpu::Surface<'_>,
        config: RendererConfig,
        viewport_size: (u32, u32),
    ) -> Result<Self, RendererError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("term_gpu device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        // Non-sRGB is preferred on Android: the driver's sRGB conversion
        // otherwise double-applies gamma on top of our own straight-alpha
        // color math, washing out text.
        let texture_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        Ok(Self::create(device, queue, texture_format, config, viewport_size))
    }

    /// Creates a headless renderer (no surface) rendering into an
    /// offscreen texture; used by tests and by any future screenshot path.
    pub async fn headless(config: RendererConfig, viewport_size: (u32, u32)) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);
        Ok(Self::create(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            config,
            viewport_size,
        ))
    }

    fn create(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        texture_format: wgpu::TextureFormat,
        config: RendererConfig,
        viewport_size: (u32, u32),
    ) -> Self {
        let bind_group_layouts = Self::create_bind_group_layouts(&device);

        let bg_clear_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bg clear shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{COMMON_UNIFORMS}\n{BG_CLEAR_SHADER}").into()),
        });
        let cell_bg_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cell bg shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{COMMON_UNIFORMS}\n{CELL_BG_SHADER}").into()),
        });
        let cell_text_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cell text shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{COMMON_UNIFORMS}\n{CELL_TEXT_SHADER}").into()),
        });

        let pipelines = Self::create_pipelines(
            &device,
            &bind_group_layouts,
            &bg_clear_shader,
            &cell_bg_shader,
            &cell_text_shader,
            texture_format,
        );

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniforms"),
            contents: bytemuck::bytes_of(&Uniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bg_colors_buffer = GrowableBuffer::new(
            &device,
            "cell bg colors",
            config.initial_bg_buffer_cells,
            std::mem::size_of::<u32>() as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let cell_text_buffer = GrowableBuffer::new(
            &device,
            "cell text instances",
            config.initial_text_capacity,
            std::mem::size_of::<CellInstance>() as u64,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );

        let uniforms_bind_group = Self::create_uniforms_bind_group(&device, &bind_group_layouts.uniforms_only, &uniform_buffer);
        let cell_bg_bind_group = Self::create_cell_bg_bind_group(
            &device,
            &bind_group_layouts.cell_bg,
            &uniform_buffer,
            &bg_colors_buffer.buffer,
        );

        let grayscale_atlas = AtlasTexture::new(&device, "grayscale atlas page 0", 1, 1, wgpu::TextureFormat::R8Unorm);
        let color_atlas = AtlasTexture::new(&device, "color atlas page 0", 1, 1, wgpu::TextureFormat::Rgba8Unorm);
        let atlas_pages = vec![AtlasPage::new(
            &device,
            &bind_group_layouts.text,
            &uniform_buffer,
            &bg_colors_buffer.buffer,
            &sampler,
            grayscale_atlas,
            color_atlas,
        )];

        Self {
            device,
            queue,
            pipelines,
            bind_group_layouts,
            uniforms_bind_group,
            cell_bg_bind_group,
            uniform_buffer,
            sampler,
            atlas_pages,
            bg_colors_buffer,
            cell_text_buffer,
            texture_format,
            viewport_size,
        }
    }

    fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let uniforms_only = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniforms-only bind group layout"),
            entries: &[uniform_entry(0)],
        });

        let cell_bg = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cell bg bind group layout"),
            entries: &[uniform_entry(0), storage_entry(1)],
        });

        let text = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text bind group layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1),
                uniform_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        BindGroupLayouts { uniforms_only, cell_bg, text }
    }

    fn create_uniforms_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, uniform_buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniforms-only bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        })
    }

    fn create_cell_bg_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        bg_colors_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cell bg bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bg_colors_buffer.as_entire_binding(),
                },
            ],
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_text_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        bg_colors_buffer: &wgpu::Buffer,
        atlas_dims_buffer: &wgpu::Buffer,
        grayscale_view: &wgpu::TextureView,
        color_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bg_colors_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: atlas_dims_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(grayscale_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_pipelines(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        bg_clear_shader: &wgpu::ShaderModule,
        cell_bg_shader: &wgpu::ShaderModule,
        cell_text_shader: &wgpu::ShaderModule,
        texture_format: wgpu::TextureFormat,
    ) -> Pipelines {
        let blend_state = wgpu::BlendState::ALPHA_BLENDING;
        let color_targets = [Some(wgpu::ColorTargetState {
            format: texture_format,
            blend: Some(blend_state),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let triangle_list = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        };
        let triangle_strip = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        };
        let multisample_state = wgpu::MultisampleState::default();

        let bg_clear_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bg clear pipeline layout"),
            bind_group_layouts: &[&layouts.uniforms_only],
            push_constant_ranges: &[],
        });
        let bg_clear = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("bg clear pipeline"),
            layout: Some(&bg_clear_layout),
            vertex: wgpu::VertexState {
                module: bg_clear_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: bg_clear_shader,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: triangle_list,
            depth_stencil: None,
            multisample: multisample_state,
            multiview: None,
            cache: None,
        });

        let cell_bg_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cell bg pipeline layout"),
            bind_group_layouts: &[&layouts.cell_bg],
            push_constant_ranges: &[],
        });
        let cell_bg = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cell bg pipeline"),
            layout: Some(&cell_bg_layout),
            vertex: wgpu::VertexState {
                module: cell_bg_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: cell_bg_shader,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: triangle_list,
            depth_stencil: None,
            multisample: multisample_state,
            multiview: None,
            cache: None,
        });

        let cell_text_vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CellInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32x2,
                    offset: 8,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Sint32x2,
                    offset: 16,
                    shader_location: 2,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32x2,
                    offset: 20,
                    shader_location: 3,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32,
                    offset: 24,
                    shader_location: 4,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32,
                    offset: 28,
                    shader_location: 5,
                },
            ],
        }];

        let cell_text_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cell text pipeline layout"),
            bind_group_layouts: &[&layouts.text],
            push_constant_ranges: &[],
        });
        let cell_text = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cell text pipeline"),
            layout: Some(&cell_text_layout),
            vertex: wgpu::VertexState {
                module: cell_text_shader,
                entry_point: Some("vs_main"),
                buffers: &cell_text_vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: cell_text_shader,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: triangle_strip,
            depth_stencil: None,
            multisample: multisample_state,
            multiview: None,
            cache: None,
        });

        Pipelines { bg_clear, cell_bg, cell_text }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport_size = (width, height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn device_arc(&self) -> Arc<wgpu::Device> {
        self.device.clone()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn queue_arc(&self) -> Arc<wgpu::Queue> {
        self.queue.clone()
    }

    pub fn texture_format(&self) -> wgpu::TextureFormat {
        self.texture_format
    }

    /// Writes the per-frame uniform block. `cell_size`/`grid_size` come
    /// from `term_core::FontMetrics::cell_metrics()`; `global_bg_color` is
    /// the palette's default background (drawn by the bg-clear pass behind
    /// everything else).
    pub fn update_uniforms(&mut self, uniforms: &Uniforms) {
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Mirrors whichever atlas pages changed since the last call onto the
    /// GPU. `term_font::AtlasSet::place` opens a new page once the current
    /// one is capped at `atlas_max_size` and still can't fit a glyph; this
    /// grows `atlas_pages` to match so every page stays sample-able, not
    /// just page 0. Recreates a page's texture (and bind group) when its
    /// CPU side has grown; otherwise only uploads the dirty sub-region.
    pub fn sync_atlases(&mut self, font_system: &mut FontSystem) {
        let page_count = font_system
            .grayscale_page_count()
            .max(font_system.color_page_count())
            .max(self.atlas_pages.len())
            .max(1);

        while self.atlas_pages.len() < page_count {
            let index = self.atlas_pages.len();
            tracing::info!(page = index, "opening additional atlas page");
            let grayscale = AtlasTexture::new(&self.device, "grayscale atlas page", 1, 1, wgpu::TextureFormat::R8Unorm);
            let color = AtlasTexture::new(&self.device, "color atlas page", 1, 1, wgpu::TextureFormat::Rgba8Unorm);
            self.atlas_pages.push(AtlasPage::new(
                &self.device,
                &self.bind_group_layouts.text,
                &self.uniform_buffer,
                &self.bg_colors_buffer.buffer,
                &self.sampler,
                grayscale,
                color,
            ));
        }

        for (index, atlas_page) in self.atlas_pages.iter_mut().enumerate() {
            let mut resized = false;

            if let Some(page) = font_system.grayscale_page_mut(index) {
                if page.width() != atlas_page.grayscale.width || page.height() != atlas_page.grayscale.height {
                    atlas_page.grayscale =
                        AtlasTexture::new(&self.device, "grayscale atlas page", page.width(), page.height(), wgpu::TextureFormat::R8Unorm);
                    atlas_page.grayscale.upload_full(&self.queue, page.pixels(), 1);
                    page.take_dirty_region();
                    resized = true;
                } else if page.take_dirty_region().is_some() {
                    atlas_page.grayscale.upload_full(&self.queue, page.pixels(), 1);
                }
            }

            if let Some(page) = font_system.color_page_mut(index) {
                if page.width() != atlas_page.color.width || page.height() != atlas_page.color.height {
                    atlas_page.color =
                        AtlasTexture::new(&self.device, "color atlas page", page.width(), page.height(), wgpu::TextureFormat::Rgba8Unorm);
                    atlas_page.color.upload_full(&self.queue, page.pixels(), 4);
                    page.take_dirty_region();
                    resized = true;
                } else if page.take_dirty_region().is_some() {
                    atlas_page.color.upload_full(&self.queue, page.pixels(), 4);
                }
            }

            if resized {
                atlas_page.update_dims(&self.queue);
                atlas_page.rebuild_bind_group(
                    &self.device,
                    &self.bind_group_layouts.text,
                    &self.uniform_buffer,
                    &self.bg_colors_buffer.buffer,
                    &self.sampler,
                );
            }
        }
    }

    /// Draws one frame: clear to background, per-cell backgrounds read from
    /// a storage buffer, then instanced glyph quads, in that order so
    /// glyphs always composite over their cell's background.
    pub fn render(&mut self, target: &wgpu::TextureView, frame: &AssembledFrame) {
        // Instances must be grouped contiguously by atlas page so each
        // page's draw call can pull a single instance range; stable so
        // same-page glyphs keep their original relative order.
        let mut sorted_instances = frame.text_instances.clone();
        sorted_instances.sort_by_key(|instance| instance.atlas);

        let bg_recreated = self.bg_colors_buffer.upload(&self.device, &self.queue, &frame.bg_colors);
        let text_recreated = self.cell_text_buffer.upload(&self.device, &self.queue, &sorted_instances);

        if bg_recreated {
            self.cell_bg_bind_group =
                Self::create_cell_bg_bind_group(&self.device, &self.bind_group_layouts.cell_bg, &self.uniform_buffer, &self.bg_colors_buffer.buffer);
            for atlas_page in self.atlas_pages.iter_mut() {
                atlas_page.rebuild_bind_group(
                    &self.device,
                    &self.bind_group_layouts.text,
                    &self.uniform_buffer,
                    &self.bg_colors_buffer.buffer,
                    &self.sampler,
                );
            }
        }
        let _ = text_recreated; // the vertex buffer itself is rebound every draw call below

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("term frame encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("term frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipelines.bg_clear);
            pass.set_bind_group(0, &self.uniforms_bind_group, &[]);
            pass.draw(0..3, 0..1);

            pass.set_pipeline(&self.pipelines.cell_bg);
            pass.set_bind_group(0, &self.cell_bg_bind_group, &[]);
            pass.draw(0..3, 0..1);

            if !sorted_instances.is_empty() {
                pass.set_pipeline(&self.pipelines.cell_text);
                pass.set_vertex_buffer(0, self.cell_text_buffer.buffer.slice(..));

                let mut start = 0usize;
                for end in 1..=sorted_instances.len() {
                    let run_ends = end == sorted_instances.len() || sorted_instances[end].atlas != sorted_instances[start].atlas;
                    if !run_ends {
                        continue;
                    }
                    let page = sorted_instances[start].atlas as usize;
                    let atlas_page = self.atlas_pages.get(page).unwrap_or_else(|| {
                        tracing::warn!(page, "glyph instance references an atlas page that was never synced; using last page");
                        self.atlas_pages.last().expect("atlas_pages always has at least one page")
                    });
                    pass.set_bind_group(0, &atlas_page.bind_group, &[]);
                    pass.draw(0..4, start as u32..end as u32);
                    start = end;
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growable_buffer_capacity_rounds_to_power_of_two() {
        let capacity: u32 = 4;
        let data_len: u32 = 10;
        assert!(data_len > capacity);
        assert_eq!(data_len.next_power_of_two(), 16);
    }
}
