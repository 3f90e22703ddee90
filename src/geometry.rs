//! Tessellated plane geometry.
//!
//! [`PlaneGeometry`] lays a grid of square tiles on the XZ plane, centered on
//! the origin, two triangles per tile and no index buffer. Each vertex carries
//! a position and an up-facing normal, in separate flat `f32` arrays ready for
//! [`GpuProgram::set_attribute`](crate::GpuProgram::set_attribute).
//!
//! ```
//! use ripple::PlaneGeometry;
//!
//! let plane = PlaneGeometry::new().size(1.0, 1.0).segments(4, 4).build();
//! assert_eq!(plane.vertex_count(), 4 * 4 * 6);
//! assert_eq!(plane.positions.len(), plane.normals.len());
//! ```

/// Floats per position and per normal.
pub const COMPONENTS: u32 = 3;

const VERTICES_PER_TILE: usize = 6;

/// Parameters of a tessellated plane. Build the vertex data with
/// [`build`](Self::build).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneGeometry {
    /// Extent along X and Z.
    pub size: [f32; 2],
    /// Tile count along X and Z.
    pub segments: [u32; 2],
    /// Extra spacing between neighbouring tiles. Zero gives a closed surface.
    pub gap: f32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self {
            size: [0.5, 0.5],
            segments: [200, 200],
            gap: 0.0,
        }
    }
}

/// Vertex data of a built plane.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaneMesh {
    /// `x, y, z` per vertex.
    pub positions: Vec<f32>,
    /// `x, y, z` per vertex, always `(0, 1, 0)`.
    pub normals: Vec<f32>,
}

impl PlaneMesh {
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / COMPONENTS as usize) as u32
    }
}

impl PlaneGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: f32, depth: f32) -> Self {
        self.size = [width, depth];
        self
    }

    pub fn segments(mut self, width: u32, depth: u32) -> Self {
        self.segments = [width, depth];
        self
    }

    pub fn gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    /// Number of vertices [`build`](Self::build) produces.
    pub fn vertex_count(&self) -> u32 {
        self.segments[0] * self.segments[1] * VERTICES_PER_TILE as u32
    }

    /// Generate positions and normals.
    ///
    /// Tiles are emitted column by column (X outer, Z inner). Each tile is the
    /// triangles `(-x,+z) (-x,-z) (+x,+z)` and `(+x,-z) (+x,+z) (-x,-z)` around
    /// its center, all at `y = 0`.
    #[rustfmt::skip]
    pub fn build(&self) -> PlaneMesh {
        let [seg_w, seg_h] = self.segments;
        let tile_w = self.size[0] / seg_w.max(1) as f32;
        let tile_h = self.size[1] / seg_h.max(1) as f32;
        let (half_w, half_h) = (tile_w / 2.0, tile_h / 2.0);
        let offset_w = tile_w * (seg_w as f32 - 1.0) / 2.0;
        let offset_h = tile_h * (seg_h as f32 - 1.0) / 2.0;

        let floats = self.vertex_count() as usize * COMPONENTS as usize;
        let mut positions = Vec::with_capacity(floats);
        let mut normals = Vec::with_capacity(floats);

        for w in 0..seg_w {
            for h in 0..seg_h {
                let x = w as f32 * (tile_w + self.gap) - offset_w;
                let z = h as f32 * (tile_h + self.gap) - offset_h;

                positions.extend_from_slice(&[
                    x - half_w, 0.0, z + half_h,
                    x - half_w, 0.0, z - half_h,
                    x + half_w, 0.0, z + half_h,

                    x + half_w, 0.0, z - half_h,
                    x + half_w, 0.0, z + half_h,
                    x - half_w, 0.0, z - half_h,
                ]);
                for _ in 0..VERTICES_PER_TILE {
                    normals.extend_from_slice(&[0.0, 1.0, 0.0]);
                }
            }
        }

        PlaneMesh { positions, normals }
    }
}
