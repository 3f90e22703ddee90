//! A linked shader program together with the buffers and uniforms it owns.

use std::collections::HashMap;

use super::device::{
    BufferHandle, BufferUsage, ProgramHandle, RenderDevice, ShaderHandle, ShaderStage, UniformKind,
    UniformLocation, UniformValue,
};
use super::error::{GpuError, GpuResult};

/// An attribute buffer bound to the program.
#[derive(Debug)]
struct Attribute {
    buffer: BufferHandle,
    /// `None` when the program has no input by this name.
    location: Option<u32>,
    components: u32,
    /// Allocated length in floats.
    len: usize,
}

/// A uniform entry. Unresolved names stay in the table with no location.
#[derive(Debug)]
struct Uniform {
    location: Option<UniformLocation>,
    value: Option<UniformValue>,
}

/// One linked program plus the vertex buffers and uniform values set on it.
///
/// Attributes and uniforms are keyed by the names the shaders declare. Both
/// tables live exactly as long as the program and are released by
/// [`dispose`](Self::dispose), which consumes it.
///
/// Uniform names the shaders do not declare (or that the compiler dropped) are
/// accepted and kept inert: updating them does nothing, so a frame never stops
/// because a shader was edited.
///
/// # Example
///
/// ```
/// use ripple::{BufferUsage, GpuProgram, HeadlessDevice, UniformValue};
///
/// const VS: &str = "
///     @group(0) @binding(0) var<uniform> time: f32;
///     @vertex
///     fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
///         return vec4<f32>(position.x, position.y + sin(time), position.z, 1.0);
///     }";
/// const FS: &str = "
///     @fragment
///     fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
///
/// let mut device = HeadlessDevice::new();
/// let mut program = GpuProgram::new(&mut device, VS, FS)?;
/// program.set_attribute(&mut device, "position", &[0.0; 9], 3, BufferUsage::StaticDraw);
/// program.set_uniform(&mut device, "time", UniformValue::Float(0.0))?;
/// program.add_uniform_value(&mut device, "time", 0.5);
///
/// assert_eq!(program.vertex_count(), Some(3));
/// assert_eq!(program.uniform_value(&device, "time"), Some(UniformValue::Float(0.5)));
/// program.dispose(&mut device);
/// # Ok::<(), ripple::GpuError>(())
/// ```
#[derive(Debug)]
pub struct GpuProgram {
    handle: ProgramHandle,
    attributes: HashMap<String, Attribute>,
    uniforms: HashMap<String, Uniform>,
    vertex_count: Option<u32>,
}

impl GpuProgram {
    /// Compile both stages, link them and make the result current.
    ///
    /// Intermediate shader objects are released whether or not linking succeeds.
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        vertex_src: &str,
        fragment_src: &str,
    ) -> GpuResult<Self> {
        let vertex = compile(device, ShaderStage::Vertex, vertex_src)?;
        let fragment = match compile(device, ShaderStage::Fragment, fragment_src) {
            Ok(fragment) => fragment,
            Err(e) => {
                device.delete_shader(vertex);
                return Err(e);
            }
        };

        let linked = device.link_program(vertex, fragment);
        device.delete_shader(vertex);
        device.delete_shader(fragment);
        let handle = linked.map_err(|log| {
            log::error!("program failed to link:\n{log}");
            GpuError::ProgramLink { log }
        })?;

        device.use_program(handle);
        log::debug!("linked program {handle:?}");

        Ok(Self {
            handle,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
            vertex_count: None,
        })
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Vertex count recorded by the first attribute ever set.
    pub fn vertex_count(&self) -> Option<u32> {
        self.vertex_count
    }

    /// Make this program current and re-point its attributes at their buffers.
    pub fn bind<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        device.use_program(self.handle);
        for attribute in self.attributes.values() {
            if let Some(location) = attribute.location {
                device.vertex_attribute_pointer(location, attribute.buffer, attribute.components);
            }
        }
    }

    /// Upload `data` into a new buffer and bind it to the input called `name`.
    ///
    /// `components` is the number of floats per vertex. Setting a name again
    /// frees its previous buffer first.
    pub fn set_attribute<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        data: &[f32],
        components: u32,
        usage: BufferUsage,
    ) {
        if let Some(previous) = self.attributes.remove(name) {
            device.delete_buffer(previous.buffer);
        }

        let buffer = device.create_buffer();
        device.buffer_data(buffer, data, usage);

        let location = device.attribute_location(self.handle, name);
        match location {
            Some(location) => device.vertex_attribute_pointer(location, buffer, components),
            None => log::debug!("program has no vertex input `{name}`; buffer left unbound"),
        }

        if matches!(self.vertex_count, None | Some(0)) && components > 0 {
            self.vertex_count = Some((data.len() / components as usize) as u32);
        }

        self.attributes.insert(
            name.to_owned(),
            Attribute {
                buffer,
                location,
                components,
                len: data.len(),
            },
        );
    }

    /// Overwrite the start of an existing attribute buffer with `data`.
    ///
    /// Unknown names and data larger than the allocation are ignored.
    pub fn update_attribute<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        data: &[f32],
    ) {
        let Some(attribute) = self.attributes.get(name) else {
            log::warn!("update of unknown attribute `{name}` ignored");
            return;
        };
        if data.len() > attribute.len || !device.buffer_sub_data(attribute.buffer, 0, data) {
            log::warn!(
                "attribute `{name}` holds {} floats, cannot update with {}",
                attribute.len,
                data.len()
            );
        }
    }

    /// Free a single attribute buffer.
    pub fn delete_attribute<D: RenderDevice + ?Sized>(&mut self, device: &mut D, name: &str) {
        if let Some(attribute) = self.attributes.remove(name) {
            device.delete_buffer(attribute.buffer);
        }
    }

    /// Resolve `name` and upload its first value.
    ///
    /// Fails if the shader declares the uniform with a different type. A name
    /// the program does not declare is recorded inert and succeeds.
    pub fn set_uniform<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        value: UniformValue,
    ) -> GpuResult<()> {
        let location = self.resolve_uniform(device, name, value.kind())?;
        if let Some(location) = location {
            device.set_uniform(location, &value);
        }
        self.uniforms.insert(
            name.to_owned(),
            Uniform {
                location,
                value: location.map(|_| value),
            },
        );
        Ok(())
    }

    /// Resolve `name` as a uniform of `kind` without writing a value.
    pub fn declare_uniform<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        kind: UniformKind,
    ) -> GpuResult<()> {
        let location = self.resolve_uniform(device, name, kind)?;
        let value = location.and_then(|location| device.uniform_value(location));
        self.uniforms.insert(name.to_owned(), Uniform { location, value });
        Ok(())
    }

    /// Write a new value to a uniform set up with [`set_uniform`](Self::set_uniform).
    ///
    /// Inert names do nothing; a value of the wrong kind is logged and dropped.
    pub fn update_uniform<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        value: UniformValue,
    ) {
        let Some(uniform) = self.uniforms.get_mut(name) else {
            log::debug!("update of undeclared uniform `{name}` ignored");
            return;
        };
        let Some(location) = uniform.location else {
            return;
        };
        if location.kind() != value.kind() {
            log::warn!(
                "uniform `{name}` is {}, ignoring {} update",
                location.kind(),
                value.kind()
            );
            return;
        }
        device.set_uniform(location, &value);
        uniform.value = Some(value);
    }

    /// Read a uniform back from the device.
    pub fn uniform_value<D: RenderDevice + ?Sized>(
        &self,
        device: &D,
        name: &str,
    ) -> Option<UniformValue> {
        let location = self.uniforms.get(name)?.location?;
        device.uniform_value(location)
    }

    /// Add `delta` to a scalar uniform and return the new value.
    ///
    /// Works from the last value written through this program, not a device
    /// read-back. Non-scalar or inert uniforms are left alone.
    pub fn add_uniform_value<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        name: &str,
        delta: f32,
    ) -> Option<f32> {
        let current = self.uniforms.get(name)?.value?.as_float()?;
        let next = current + delta;
        self.update_uniform(device, name, UniformValue::Float(next));
        Some(next)
    }

    /// Release every attribute buffer, then the program.
    pub fn dispose<D: RenderDevice + ?Sized>(self, device: &mut D) {
        for (_, attribute) in self.attributes {
            device.delete_buffer(attribute.buffer);
        }
        device.delete_program(self.handle);
        log::debug!("disposed program {:?}", self.handle);
    }

    fn resolve_uniform<D: RenderDevice + ?Sized>(
        &self,
        device: &D,
        name: &str,
        kind: UniformKind,
    ) -> GpuResult<Option<UniformLocation>> {
        let Some(location) = device.uniform_location(self.handle, name) else {
            log::debug!("uniform `{name}` not found in program; keeping it inert");
            return Ok(None);
        };
        if location.kind() != kind {
            return Err(GpuError::UniformKindMismatch {
                name: name.to_owned(),
                expected: location.kind(),
                actual: kind,
            });
        }
        Ok(Some(location))
    }
}

fn compile<D: RenderDevice + ?Sized>(
    device: &mut D,
    stage: ShaderStage,
    source: &str,
) -> GpuResult<ShaderHandle> {
    device.compile_shader(stage, source).map_err(|log| {
        log::error!("{stage} shader failed to compile:\n{log}");
        GpuError::ShaderCompile { stage, log }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use crate::gpu::shader::tests::{FRAGMENT, VERTEX};
    use crate::math::Matrix4;

    fn program(device: &mut HeadlessDevice) -> GpuProgram {
        GpuProgram::new(device, VERTEX, FRAGMENT).unwrap()
    }

    #[test]
    fn uniforms_read_back_for_every_kind() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        let mut model = Matrix4::identity();
        model.translate([1.0, 0.0, -2.0]);
        let values = [
            ("time", UniformValue::Float(1.5)),
            ("center", UniformValue::Vec2([0.1, 0.1])),
            ("model_matrix", UniformValue::from(&model)),
        ];
        for (name, value) in values {
            program.set_uniform(&mut device, name, value).unwrap();
            assert_eq!(program.uniform_value(&device, name), Some(value), "{name}");
        }

        program.update_uniform(&mut device, "center", UniformValue::Vec2([0.0, 0.15]));
        assert_eq!(
            program.uniform_value(&device, "center"),
            Some(UniformValue::Vec2([0.0, 0.15]))
        );
    }

    #[test]
    fn mismatched_kind_fails_on_set_and_is_ignored_on_update() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        let err = program
            .set_uniform(&mut device, "time", UniformValue::Vec2([0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, GpuError::UniformKindMismatch { .. }));

        program.set_uniform(&mut device, "time", UniformValue::Float(2.0)).unwrap();
        program.update_uniform(&mut device, "time", UniformValue::Vec2([1.0, 1.0]));
        assert_eq!(program.uniform_value(&device, "time"), Some(UniformValue::Float(2.0)));
    }

    #[test]
    fn unknown_uniforms_are_inert() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        program.set_uniform(&mut device, "no_such_uniform", UniformValue::Float(1.0)).unwrap();
        program.update_uniform(&mut device, "no_such_uniform", UniformValue::Float(2.0));
        assert_eq!(program.uniform_value(&device, "no_such_uniform"), None);
        assert_eq!(program.add_uniform_value(&mut device, "no_such_uniform", 1.0), None);
    }

    #[test]
    fn add_uniform_value_accumulates_scalars_only() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        program.set_uniform(&mut device, "time", UniformValue::Float(0.0)).unwrap();
        for _ in 0..4 {
            program.add_uniform_value(&mut device, "time", 0.25);
        }
        assert_eq!(program.uniform_value(&device, "time"), Some(UniformValue::Float(1.0)));

        program.set_uniform(&mut device, "center", UniformValue::Vec2([0.1, 0.1])).unwrap();
        assert_eq!(program.add_uniform_value(&mut device, "center", 1.0), None);
    }

    #[test]
    fn declared_uniforms_start_from_the_device_value() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        program.declare_uniform(&mut device, "time", UniformKind::Float).unwrap();
        assert_eq!(program.add_uniform_value(&mut device, "time", 0.5), Some(0.5));
        assert!(program.declare_uniform(&mut device, "time", UniformKind::Mat4).is_err());
    }

    #[test]
    fn first_attribute_sets_vertex_count_and_replacing_frees_the_buffer() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);

        program.set_attribute(&mut device, "position", &[0.0; 18], 3, BufferUsage::StaticDraw);
        program.set_attribute(&mut device, "normal", &[0.0; 9], 3, BufferUsage::StaticDraw);
        assert_eq!(program.vertex_count(), Some(6));
        assert_eq!(device.live_buffers(), 2);

        program.set_attribute(&mut device, "position", &[1.0; 18], 3, BufferUsage::StaticDraw);
        assert_eq!(device.live_buffers(), 2);

        program.delete_attribute(&mut device, "normal");
        assert_eq!(device.live_buffers(), 1);
    }

    #[test]
    fn update_attribute_rejects_oversized_data() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);
        program.set_attribute(&mut device, "position", &[0.0; 6], 3, BufferUsage::DynamicDraw);

        program.update_attribute(&mut device, "position", &[1.0, 2.0, 3.0]);
        program.update_attribute(&mut device, "position", &[9.0; 9]);
        program.update_attribute(&mut device, "missing", &[9.0; 3]);

        let buffer = program.attributes["position"].buffer;
        assert_eq!(device.buffer_contents(buffer), Some(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn invalid_shader_reports_stage_and_leaves_nothing_behind() {
        let mut device = HeadlessDevice::new();
        let err = GpuProgram::new(&mut device, VERTEX, "@fragment fn fs_main( {").unwrap_err();
        match err {
            GpuError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.live_programs(), 0);
    }

    #[test]
    fn link_failure_releases_both_shaders() {
        let mut device = HeadlessDevice::new();
        let fs = r#"
            @fragment
            fn fs_main(@location(5) v: f32) -> @location(0) vec4<f32> {
                return vec4<f32>(v);
            }
        "#;
        let err = GpuProgram::new(&mut device, VERTEX, fs).unwrap_err();
        assert!(matches!(err, GpuError::ProgramLink { .. }));
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn dispose_releases_buffers_and_program() {
        let mut device = HeadlessDevice::new();
        let mut program = program(&mut device);
        program.set_attribute(&mut device, "position", &[0.0; 9], 3, BufferUsage::StaticDraw);
        program.set_attribute(&mut device, "normal", &[0.0; 9], 3, BufferUsage::StaticDraw);

        program.dispose(&mut device);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_programs(), 0);
    }
}
