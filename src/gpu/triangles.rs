use std::ops::{Deref, DerefMut};

use super::device::{PrimitiveMode, RenderDevice};
use super::error::GpuResult;
use super::program::GpuProgram;

/// A [`GpuProgram`] that knows how to draw itself.
///
/// Everything else (attributes, uniforms, disposal) goes straight through to
/// the wrapped program.
#[derive(Debug)]
pub struct Triangles {
    program: GpuProgram,
}

impl Triangles {
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        vertex_src: &str,
        fragment_src: &str,
    ) -> GpuResult<Self> {
        GpuProgram::new(device, vertex_src, fragment_src).map(Self::from)
    }

    /// Draw `vertex_count` vertices, or the count recorded by the first
    /// attribute when `None`. Does nothing if that count is unknown or zero.
    pub fn draw<D: RenderDevice + ?Sized>(
        &self,
        device: &mut D,
        mode: PrimitiveMode,
        vertex_count: Option<u32>,
    ) {
        let count = vertex_count.or(self.program.vertex_count()).unwrap_or(0);
        if count == 0 {
            log::debug!("draw skipped: no vertices to draw");
            return;
        }
        self.program.bind(device);
        device.draw_arrays(mode, 0, count);
    }

    pub fn program(&self) -> &GpuProgram {
        &self.program
    }

    pub fn into_program(self) -> GpuProgram {
        self.program
    }

    pub fn dispose<D: RenderDevice + ?Sized>(self, device: &mut D) {
        self.program.dispose(device);
    }
}

impl From<GpuProgram> for Triangles {
    fn from(program: GpuProgram) -> Self {
        Self { program }
    }
}

impl Deref for Triangles {
    type Target = GpuProgram;

    fn deref(&self) -> &GpuProgram {
        &self.program
    }
}

impl DerefMut for Triangles {
    fn deref_mut(&mut self) -> &mut GpuProgram {
        &mut self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::shader::tests::{FRAGMENT, VERTEX};
    use crate::gpu::{BufferUsage, DrawCall, HeadlessDevice};

    #[test]
    fn draws_the_inferred_vertex_count() {
        let mut device = HeadlessDevice::new();
        let mut triangles = Triangles::new(&mut device, VERTEX, FRAGMENT).unwrap();
        triangles.set_attribute(&mut device, "position", &[0.0; 36], 3, BufferUsage::StaticDraw);

        triangles.draw(&mut device, PrimitiveMode::Triangles, None);
        assert_eq!(
            device.draw_calls(),
            [DrawCall {
                program: triangles.handle(),
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 12,
            }]
        );
    }

    #[test]
    fn explicit_count_wins() {
        let mut device = HeadlessDevice::new();
        let mut triangles = Triangles::new(&mut device, VERTEX, FRAGMENT).unwrap();
        triangles.set_attribute(&mut device, "position", &[0.0; 36], 3, BufferUsage::StaticDraw);

        triangles.draw(&mut device, PrimitiveMode::Points, Some(3));
        assert_eq!(device.draw_calls()[0].count, 3);
        assert_eq!(device.draw_calls()[0].mode, PrimitiveMode::Points);
    }

    #[test]
    fn empty_first_attribute_does_not_fix_the_count() {
        let mut device = HeadlessDevice::new();
        let mut triangles = Triangles::new(&mut device, VERTEX, FRAGMENT).unwrap();
        triangles.set_attribute(&mut device, "normal", &[], 3, BufferUsage::StaticDraw);
        triangles.set_attribute(&mut device, "position", &[0.0; 18], 3, BufferUsage::StaticDraw);
        assert_eq!(triangles.vertex_count(), Some(6));

        triangles.draw(&mut device, PrimitiveMode::Triangles, None);
        assert_eq!(device.draw_calls().len(), 1);
        assert_eq!(device.draw_calls()[0].count, 6);
    }

    #[test]
    fn zero_vertices_are_never_drawn() {
        let mut device = HeadlessDevice::new();
        let mut triangles = Triangles::new(&mut device, VERTEX, FRAGMENT).unwrap();
        triangles.set_attribute(&mut device, "position", &[], 3, BufferUsage::StaticDraw);

        triangles.draw(&mut device, PrimitiveMode::Triangles, None);
        triangles.draw(&mut device, PrimitiveMode::Triangles, Some(0));
        assert!(device.draw_calls().is_empty());
    }

    #[test]
    fn nothing_is_drawn_without_attributes() {
        let mut device = HeadlessDevice::new();
        let triangles = Triangles::new(&mut device, VERTEX, FRAGMENT).unwrap();
        triangles.draw(&mut device, PrimitiveMode::Triangles, None);
        assert!(device.draw_calls().is_empty());
    }
}
