//! [`RenderDevice`] on top of wgpu, presenting to a winit window.
//!
//! The immediate-mode calls of [`RenderDevice`] are mapped onto wgpu objects:
//!
//! - A linked program owns its two shader modules, one uniform buffer per
//!   `var<uniform>` binding (with a CPU shadow for read-back), the bind groups
//!   over those buffers and a cache of render pipelines keyed by primitive mode
//!   and vertex layout.
//! - Attribute pointers are device state, as in GL. Each attribute gets its own
//!   vertex buffer slot at draw time.
//! - The surface texture is acquired lazily by the first `clear` or draw of a
//!   frame. `clear` only marks the frame: the next pass loads with clear ops.
//!   Every draw records its own render pass and [`present`](RenderDevice::present)
//!   submits the frame.
//!
//! Uniform writes go through `Queue::write_buffer`, so every draw in a frame
//! sees the last value written before submission.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::device::{
    BufferHandle, BufferUsage, Color, PrimitiveMode, ProgramHandle, RenderDevice, ShaderHandle,
    ShaderStage, UniformLocation, UniformValue, Viewport,
};
use super::error::{GpuError, GpuResult};
use super::shader::{self, CompiledShader, LinkedProgram, UniformShadow};
use crate::camera::DepthRange;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    mode: PrimitiveMode,
    /// `(shader location, components)` in slot order.
    layout: Vec<(u32, u32)>,
}

struct Program {
    linked: LinkedProgram,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniforms: UniformShadow,
    /// Parallel to the shadow's blocks.
    uniform_buffers: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

struct Buffer {
    raw: wgpu::Buffer,
    /// Length in floats.
    len: usize,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    pending_clear: bool,
}

/// A window-backed [`RenderDevice`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ripple::{RenderDevice, WgpuDevice};
/// # fn demo(window: Arc<winit::window::Window>) -> Result<(), ripple::GpuError> {
/// let mut device = WgpuDevice::new(window)?;
/// device.clear();
/// device.present();
/// # Ok(())
/// # }
/// ```
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    next_id: u32,
    shaders: HashMap<ShaderHandle, CompiledShader>,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, Buffer>,
    attributes: BTreeMap<u32, (BufferHandle, u32)>,
    current_program: Option<ProgramHandle>,
    viewport: Viewport,
    clear_color: Color,
    frame: Option<Frame>,
}

impl WgpuDevice {
    /// Create the wgpu instance, surface, adapter and device for `window`.
    pub fn new(window: Arc<Window>) -> GpuResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::ContextUnavailable(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError::ContextUnavailable(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Ripple Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|e| GpuError::ContextUnavailable(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or_else(|| GpuError::ContextUnavailable("surface supports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        log::info!(
            "using {} ({:?}), surface {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.width,
            config.height,
            format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            attributes: BTreeMap::new(),
            current_program: None,
            viewport: Viewport::default(),
            clear_color: Color::BLACK,
            frame: None,
        })
    }

    /// Reconfigure the surface and depth buffer. Zero sizes (minimized windows)
    /// are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Acquire the surface texture for this frame if not already held.
    fn begin_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return false;
            }
            Err(e) => {
                log::warn!("failed to acquire surface texture: {e}");
                return false;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Ripple Frame Encoder"),
        });
        self.frame = Some(Frame {
            output,
            view,
            encoder,
            pending_clear: false,
        });
        true
    }
}

impl RenderDevice for WgpuDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let compiled = shader::compile(stage, source)?;
        let handle = ShaderHandle(self.next_id());
        self.shaders.insert(handle, compiled);
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        let (Some(vs), Some(fs)) = (self.shaders.get(&vertex), self.shaders.get(&fragment)) else {
            return Err("unknown shader handle".to_owned());
        };
        let linked = shader::link(vs, fs)?;
        let program = create_program(&self.device, linked);
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if self.programs.contains_key(&program) {
            self.current_program = Some(program);
        } else {
            log::warn!("use of unknown program {program:?} ignored");
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(program) = self.programs.remove(&program) {
            for buffer in &program.uniform_buffers {
                buffer.destroy();
            }
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_buffer(&mut self) -> BufferHandle {
        let handle = BufferHandle(self.next_id());
        let raw = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ripple Vertex Buffer"),
            size: 0,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.buffers.insert(handle, Buffer { raw, len: 0 });
        handle
    }

    fn buffer_data(&mut self, buffer: BufferHandle, data: &[f32], usage: BufferUsage) {
        let Some(slot) = self.buffers.get_mut(&buffer) else {
            log::warn!("upload to unknown buffer {buffer:?} ignored");
            return;
        };
        let raw = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ripple Vertex Buffer"),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        log::trace!("buffer {buffer:?}: {} floats ({usage:?})", data.len());
        slot.raw.destroy();
        *slot = Buffer { raw, len: data.len() };
    }

    fn buffer_sub_data(&mut self, buffer: BufferHandle, offset: usize, data: &[f32]) -> bool {
        let Some(slot) = self.buffers.get(&buffer) else {
            return false;
        };
        if offset + data.len() > slot.len {
            return false;
        }
        self.queue
            .write_buffer(&slot.raw, (offset * 4) as u64, bytemuck::cast_slice(data));
        true
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(slot) = self.buffers.remove(&buffer) {
            slot.raw.destroy();
        }
        self.attributes.retain(|_, (bound, _)| *bound != buffer);
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        Some(self.programs.get(&program)?.linked.attribute(name)?.location)
    }

    fn vertex_attribute_pointer(&mut self, location: u32, buffer: BufferHandle, components: u32) {
        self.attributes.insert(location, (buffer, components));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let linked = &self.programs.get(&program)?.linked;
        let index = linked.uniform_index(name)?;
        Some(UniformLocation {
            program,
            index: index as u32,
            kind: linked.uniforms[index].kind,
        })
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let Some(program) = self.programs.get_mut(&location.program) else {
            return;
        };
        let Some(slot) = program.linked.uniforms.get(location.index as usize) else {
            return;
        };
        if let Some(block) = program.uniforms.write(slot, value) {
            self.queue.write_buffer(
                &program.uniform_buffers[block],
                slot.offset as u64,
                value.as_bytes(),
            );
        }
    }

    fn uniform_value(&self, location: UniformLocation) -> Option<UniformValue> {
        let program = self.programs.get(&location.program)?;
        let slot = program.linked.uniforms.get(location.index as usize)?;
        program.uniforms.read(slot)
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        let Some(handle) = self.current_program else {
            log::warn!("draw without a current program ignored");
            return;
        };
        if count == 0 || !self.begin_frame() {
            return;
        }
        let viewport = clamp_viewport(self.viewport, self.config.width, self.config.height);
        let clear_color = self.clear_color;

        let Some(program) = self.programs.get_mut(&handle) else {
            return;
        };

        let mut slots = Vec::with_capacity(program.linked.attributes.len());
        for attribute in &program.linked.attributes {
            let Some(&(buffer, components)) = self.attributes.get(&attribute.location) else {
                log::warn!("draw skipped: attribute `{}` has no buffer", attribute.name);
                return;
            };
            let Some(bound) = self.buffers.get(&buffer) else {
                log::warn!(
                    "draw skipped: attribute `{}` points at a deleted buffer",
                    attribute.name
                );
                return;
            };
            if components == 0 || bound.len / (components as usize) < (first + count) as usize {
                log::warn!(
                    "draw skipped: attribute `{}` holds fewer than {} vertices",
                    attribute.name,
                    first + count
                );
                return;
            }
            slots.push((attribute.location, components, &bound.raw));
        }

        let key = PipelineKey {
            mode,
            layout: slots.iter().map(|&(location, components, _)| (location, components)).collect(),
        };
        if !program.pipelines.contains_key(&key) {
            let pipeline = create_pipeline(&self.device, self.config.format, program, &key);
            program.pipelines.insert(key.clone(), pipeline);
        }
        let Some(pipeline) = program.pipelines.get(&key) else {
            return;
        };

        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let (color_load, depth_load) = if frame.pending_clear {
            (wgpu::LoadOp::Clear(clear_color.into()), wgpu::LoadOp::Clear(1.0))
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };
        frame.pending_clear = false;

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Ripple Draw Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let (x, y, w, h) = viewport;
        pass.set_viewport(x, y, w, h, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        for (group, bind_group) in program.bind_groups.iter().enumerate() {
            pass.set_bind_group(group as u32, bind_group, &[]);
        }
        for (slot, (_, _, raw)) in slots.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, raw.slice(..));
        }
        pass.draw(first..first + count, 0..1);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        if self.begin_frame() {
            if let Some(frame) = self.frame.as_mut() {
                frame.pending_clear = true;
            }
        }
    }

    fn present(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            return;
        };
        if frame.pending_clear {
            let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Ripple Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }

    fn depth_range(&self) -> DepthRange {
        DepthRange::ZeroToOne
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Ripple Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_program(device: &wgpu::Device, linked: LinkedProgram) -> Program {
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Ripple Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(linked.vertex.source.as_str().into()),
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Ripple Fragment Shader"),
        source: wgpu::ShaderSource::Wgsl(linked.fragment.source.as_str().into()),
    });

    let uniforms = UniformShadow::new(&linked);
    let uniform_buffers: Vec<wgpu::Buffer> = uniforms
        .blocks()
        .map(|(block, bytes)| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Ripple Uniforms {}:{}", block.group, block.binding)),
                contents: bytes,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })
        .collect();

    // Groups must be contiguous in the pipeline layout; unused ones get empty layouts.
    let group_count = linked.blocks.iter().map(|b| b.group + 1).max().unwrap_or(0);
    let mut bind_group_layouts = Vec::with_capacity(group_count as usize);
    let mut bind_groups = Vec::with_capacity(group_count as usize);
    for group in 0..group_count {
        let members: Vec<usize> = linked
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.group == group)
            .map(|(i, _)| i)
            .collect();

        let entries: Vec<wgpu::BindGroupLayoutEntry> = members
            .iter()
            .map(|&i| wgpu::BindGroupLayoutEntry {
                binding: linked.blocks[i].binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ripple Uniform Bind Group Layout"),
            entries: &entries,
        });

        let entries: Vec<wgpu::BindGroupEntry> = members
            .iter()
            .map(|&i| wgpu::BindGroupEntry {
                binding: linked.blocks[i].binding,
                resource: uniform_buffers[i].as_entire_binding(),
            })
            .collect();
        bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ripple Uniform Bind Group"),
            layout: &layout,
            entries: &entries,
        }));
        bind_group_layouts.push(layout);
    }

    let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Ripple Pipeline Layout"),
        bind_group_layouts: &layout_refs,
        push_constant_ranges: &[],
    });

    Program {
        linked,
        vertex_module,
        fragment_module,
        layout,
        uniforms,
        uniform_buffers,
        bind_groups,
        pipelines: HashMap::new(),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &Program,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
        .layout
        .iter()
        .map(|&(location, components)| {
            [wgpu::VertexAttribute {
                format: vertex_format(components),
                offset: 0,
                shader_location: location,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout> = key
        .layout
        .iter()
        .zip(&attributes)
        .map(|(&(_, components), attributes)| wgpu::VertexBufferLayout {
            array_stride: (components as u64) * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect();

    log::debug!("creating pipeline for {:?}", key);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Ripple Pipeline"),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.vertex_module,
            entry_point: Some(&program.linked.vertex.entry_point),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.fragment_module,
            entry_point: Some(&program.linked.fragment.entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: topology(key.mode),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn topology(mode: PrimitiveMode) -> wgpu::PrimitiveTopology {
    match mode {
        PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// `viewport` clamped to a `width` x `height` surface, as `(x, y, w, h)`.
/// An empty viewport covers the whole surface.
fn clamp_viewport(viewport: Viewport, width: u32, height: u32) -> (f32, f32, f32, f32) {
    if viewport.width == 0 || viewport.height == 0 {
        return (0.0, 0.0, width as f32, height as f32);
    }
    let x = viewport.x.min(width.saturating_sub(1));
    let y = viewport.y.min(height.saturating_sub(1));
    (
        x as f32,
        y as f32,
        viewport.width.min(width - x) as f32,
        viewport.height.min(height - y) as f32,
    )
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_has_a_topology() {
        assert_eq!(topology(PrimitiveMode::Triangles), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(topology(PrimitiveMode::LineStrip), wgpu::PrimitiveTopology::LineStrip);
        assert_eq!(topology(PrimitiveMode::Points), wgpu::PrimitiveTopology::PointList);
    }

    #[test]
    fn vertex_formats_follow_component_count() {
        assert_eq!(vertex_format(2), wgpu::VertexFormat::Float32x2);
        assert_eq!(vertex_format(3), wgpu::VertexFormat::Float32x3);
        assert_eq!(vertex_format(3).size(), 12);
    }

    #[test]
    fn empty_viewport_covers_the_surface() {
        let full = (0.0, 0.0, 800.0, 600.0);
        assert_eq!(clamp_viewport(Viewport::default(), 800, 600), full);
        assert_eq!(clamp_viewport(Viewport::new(10, 10, 0, 50), 800, 600), full);
    }

    #[test]
    fn overflowing_viewport_is_clipped_to_the_surface() {
        let clipped = clamp_viewport(Viewport::new(700, 500, 400, 400), 800, 600);
        assert_eq!(clipped, (700.0, 500.0, 100.0, 100.0));

        let outside = clamp_viewport(Viewport::new(900, 900, 50, 50), 800, 600);
        assert_eq!(outside, (799.0, 599.0, 1.0, 1.0));
    }

    #[test]
    fn viewport_inside_the_surface_is_kept() {
        let corner = clamp_viewport(Viewport::new(0, 0, 400, 300), 800, 600);
        assert_eq!(corner, (0.0, 0.0, 400.0, 300.0));

        let inset = clamp_viewport(Viewport::new(100, 50, 200, 100), 800, 600);
        assert_eq!(inset, (100.0, 50.0, 200.0, 100.0));
    }
}
