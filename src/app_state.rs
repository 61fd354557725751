use std::sync::Arc;

use anyhow::Context;
use instant::Instant;
use rand::{rngs::StdRng, SeedableRng};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::color::Color;
use crate::config::BackdropConfig;
use crate::models::{CircleInstance, LineInstance, Vertex2D};
use crate::scene::field::NodeField;
use crate::scene::geometry::FrameGeometry;
use crate::theme::Palette;
use crate::timing::{FpsCounter, FrameClock};

const LINES_WGSL: &str = include_str!("./shaders/lines.wgsl");
const CIRCLES_WGSL: &str = include_str!("./shaders/circles.wgsl");

// Initial line buffer size in segments; grows on demand.
const INITIAL_LINE_INSTANCES: usize = 2048;

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,
    needs_srgb_output_conversion: bool,

    pub camera: Camera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    line_render_pipeline: wgpu::RenderPipeline,
    circle_render_pipeline: wgpu::RenderPipeline,

    circle_instance_buffer: wgpu::Buffer,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    line_instance_buffer: wgpu::Buffer,

    pub field: NodeField,
    node_count: usize,
    pub geometry: FrameGeometry,
    rng: StdRng,
    backdrop_config: BackdropConfig,
    palette: Palette,

    clock: FrameClock,
    fps: FpsCounter,
}

impl State {
    // Takes Arc<Window> for surface setup, doesn't store it.
    // `node_count` is fixed for the lifetime of the state.
    pub async fn new(
        window_arc: Arc<Window>,
        backdrop_config: BackdropConfig,
        palette: Palette,
        node_count: usize,
    ) -> anyhow::Result<State> {
        let size = window_arc.inner_size();
        let scale_factor = window_arc.scale_factor();

        let gpu = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        // Surface itself is !Send on WASM due to HtmlCanvasElement
        let surface = gpu
            .create_surface(window_arc)
            .context("failed to create drawing surface")?;

        let adapter = gpu
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Backdrop Device"),
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let fallback_format = *surface_caps
            .formats
            .first()
            .context("surface reports no supported formats")?;
        let texture_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or_else(|| {
                log::warn!("No sRGB surface format found, falling back to {:?}", fallback_format);
                fallback_format
            });
        let needs_srgb_output_conversion = !texture_format.is_srgb();

        // The backdrop sits over page content, so prefer a compositor that
        // honours premultiplied alpha.
        let alpha_mode = if surface_caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        log::info!(
            "Using {} ({:?}, format {:?}, alpha {:?}), shader sRGB conversion: {}",
            adapter_info.name,
            adapter_info.backend,
            texture_format,
            alpha_mode,
            needs_srgb_output_conversion
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: texture_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = Camera::new(config.width, config.height, scale_factor);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera.uniform(needs_srgb_output_conversion)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("Camera Bind Group Layout"),
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("Camera Bind Group"),
        });

        let lines_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(LINES_WGSL.into()),
        });
        let circles_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Circles Shader"),
            source: wgpu::ShaderSource::Wgsl(CIRCLES_WGSL.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let line_render_pipeline = create_pipeline(
            &device,
            &render_pipeline_layout,
            &lines_shader_module,
            texture_format,
            "Line Render Pipeline",
            &[Vertex2D::layout(), LineInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
        );
        let circle_render_pipeline = create_pipeline(
            &device,
            &render_pipeline_layout,
            &circles_shader_module,
            texture_format,
            "Circle Render Pipeline",
            &[Vertex2D::layout(), CircleInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
        );

        let circle_instance_buffer = vertex_buffer(
            &device,
            "Circle Instance Buffer",
            (backdrop_config.max_nodes.max(1) * std::mem::size_of::<CircleInstance>()) as u64,
        );
        let line_instance_buffer = vertex_buffer(
            &device,
            "Line Instance Buffer",
            (INITIAL_LINE_INSTANCES * std::mem::size_of::<LineInstance>()) as u64,
        );

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(Vertex2D::QUAD_VERTICES.as_slice()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(Vertex2D::QUAD_INDICES.as_slice()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let field = NodeField::new(&backdrop_config);
        let geometry = FrameGeometry::with_capacity(backdrop_config.max_nodes);

        Ok(Self {
            surface, device, queue, config, is_surface_configured: false,
            needs_srgb_output_conversion,
            camera, camera_buffer, camera_bind_group,
            line_render_pipeline, circle_render_pipeline,
            circle_instance_buffer, quad_vertex_buffer, quad_index_buffer, line_instance_buffer,
            field, node_count, geometry,
            rng: StdRng::from_entropy(),
            backdrop_config,
            palette,
            clock: FrameClock::new(),
            fps: FpsCounter::new(Instant::now()),
        })
    }

    /// Re-measures the surface and regenerates the node field.
    ///
    /// `width`/`height` are physical pixels at the device density; nodes
    /// live in CSS pixels and the backing store uses a density of at least 1.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to empty surface {}x{}", width, height);
            return;
        }

        let mut camera = self.camera.clone();
        camera.update_viewport(width, height, scale_factor);
        let backing = camera.physical_size().max(glam::Vec2::ONE);
        let (backing_width, backing_height) = (backing.x as u32, backing.y as u32);

        let unchanged = self.is_surface_configured
            && self.config.width == backing_width
            && self.config.height == backing_height
            && self.camera == camera;
        if unchanged {
            log::debug!("Surface already {}x{}, keeping nodes", backing_width, backing_height);
            return;
        }

        log::info!(
            "Resize {}x{} backing @ {}x density",
            backing_width,
            backing_height,
            camera.scale_factor
        );
        self.config.width = backing_width;
        self.config.height = backing_height;
        self.surface.configure(&self.device, &self.config);
        self.is_surface_configured = true;

        self.camera = camera;
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform(self.needs_srgb_output_conversion)]),
        );

        let logical = self.camera.logical_size;
        self.field
            .regenerate(&mut self.rng, logical.x, logical.y, self.node_count, &self.backdrop_config);
        self.clock.reset();
    }

    /// Restores the surface after it was lost or became outdated.
    pub fn reconfigure(&mut self) {
        if self.is_surface_configured {
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Advances the field to `now` and refreshes the draw lists.
    pub fn update(&mut self, now: Instant) {
        let dt = self.clock.tick(now);
        self.field.step(dt);
        self.geometry
            .rebuild(self.field.nodes(), self.palette.ink(), &self.backdrop_config);
        self.update_gpu_buffers();

        if let Some(fps) = self.fps.frame(now) {
            log::debug!(
                "FPS: {} ({} nodes, {} links)",
                fps,
                self.geometry.circle_instances.len(),
                self.geometry.line_count()
            );
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Color::TRANSPARENT.into_linear_wgpu_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            let quad_index_count = Vertex2D::QUAD_INDICES.len() as u32;

            // Lines first so nodes sit on top of them.
            let line_count = self.geometry.line_instances.len() as u32;
            if line_count > 0 {
                render_pass.set_pipeline(&self.line_render_pipeline);
                render_pass.set_vertex_buffer(1, self.line_instance_buffer.slice(..));
                render_pass.draw_indexed(0..quad_index_count, 0, 0..line_count);
            }

            let instance_count = self.geometry.circle_instances.len() as u32;
            if instance_count > 0 {
                render_pass.set_pipeline(&self.circle_render_pipeline);
                render_pass.set_vertex_buffer(1, self.circle_instance_buffer.slice(..));
                render_pass.draw_indexed(0..quad_index_count, 0, 0..instance_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    pub fn current_fps(&self) -> u32 {
        self.fps.current()
    }

    // Buffers only ever grow; steady-state frames just overwrite them.
    fn update_gpu_buffers(&mut self) {
        let circle_data: &[u8] = bytemuck::cast_slice(&self.geometry.circle_instances);
        let line_data: &[u8] = bytemuck::cast_slice(&self.geometry.line_instances);

        if self.circle_instance_buffer.size() < circle_data.len() as u64 {
            self.circle_instance_buffer = vertex_buffer(
                &self.device,
                "Circle Instance Buffer (Resized)",
                (circle_data.len() as u64).next_power_of_two(),
            );
        }
        if !circle_data.is_empty() {
            self.queue.write_buffer(&self.circle_instance_buffer, 0, circle_data);
        }

        if self.line_instance_buffer.size() < line_data.len() as u64 {
            self.line_instance_buffer = vertex_buffer(
                &self.device,
                "Line Instance Buffer (Resized)",
                (line_data.len() as u64).next_power_of_two(),
            );
        }
        if !line_data.is_empty() {
            self.queue.write_buffer(&self.line_instance_buffer, 0, line_data);
        }
    }
}

fn vertex_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                // Shaders emit premultiplied color.
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // The y-down projection flips winding, so nothing is culled.
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
