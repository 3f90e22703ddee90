use std::collections::HashMap;

use super::device::{
    BufferHandle, BufferUsage, Color, PrimitiveMode, ProgramHandle, RenderDevice, ShaderHandle,
    ShaderStage, UniformLocation, UniformValue, Viewport,
};
use super::shader::{self, CompiledShader, LinkedProgram, UniformShadow};

/// A draw recorded by [`HeadlessDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub mode: PrimitiveMode,
    pub first: u32,
    pub count: u32,
}

#[derive(Debug)]
struct Program {
    linked: LinkedProgram,
    uniforms: UniformShadow,
}

/// An in-memory [`RenderDevice`].
///
/// Shaders go through the same WGSL compile and link as on the GPU, buffers are
/// plain `Vec<f32>`s and draws are recorded instead of rasterized. Useful for
/// tests and for driving the render loop without a window.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: u32,
    shaders: HashMap<ShaderHandle, CompiledShader>,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, Vec<f32>>,
    attributes: HashMap<u32, (BufferHandle, u32)>,
    current_program: Option<ProgramHandle>,
    draw_calls: Vec<DrawCall>,
    clear_count: usize,
    present_count: usize,
    viewport: Viewport,
    clear_color: Color,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    pub fn present_count(&self) -> usize {
        self.present_count
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Buffer and component count currently feeding attribute `location`.
    pub fn bound_attribute(&self, location: u32) -> Option<(BufferHandle, u32)> {
        self.attributes.get(&location).copied()
    }

    /// Forget recorded draws and counters; resources are kept.
    pub fn reset_stats(&mut self) {
        self.draw_calls.clear();
        self.clear_count = 0;
        self.present_count = 0;
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderDevice for HeadlessDevice {
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
        let uniforms = UniformShadow::new(&linked);
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(handle, Program { linked, uniforms });
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
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_buffer(&mut self) -> BufferHandle {
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(handle, Vec::new());
        handle
    }

    fn buffer_data(&mut self, buffer: BufferHandle, data: &[f32], _usage: BufferUsage) {
        match self.buffers.get_mut(&buffer) {
            Some(storage) => *storage = data.to_vec(),
            None => log::warn!("upload to unknown buffer {buffer:?} ignored"),
        }
    }

    fn buffer_sub_data(&mut self, buffer: BufferHandle, offset: usize, data: &[f32]) -> bool {
        self.buffers
            .get_mut(&buffer)
            .and_then(|storage| storage.get_mut(offset..offset + data.len()))
            .map(|range| range.copy_from_slice(data))
            .is_some()
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
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
        if let Some(slot) = program.linked.uniforms.get(location.index as usize) {
            program.uniforms.write(slot, value);
        }
    }

    fn uniform_value(&self, location: UniformLocation) -> Option<UniformValue> {
        let program = self.programs.get(&location.program)?;
        let slot = program.linked.uniforms.get(location.index as usize)?;
        program.uniforms.read(slot)
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        let Some(program) = self.current_program else {
            log::warn!("draw without a current program ignored");
            return;
        };
        self.draw_calls.push(DrawCall {
            program,
            mode,
            first,
            count,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        self.clear_count += 1;
    }

    fn present(&mut self) {
        self.present_count += 1;
    }
}
