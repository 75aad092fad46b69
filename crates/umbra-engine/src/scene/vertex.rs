use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // tex_coord
    ];

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const fn v(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Vertex {
    Vertex::new(position, normal, tex_coord)
}

const QUAD_VERTICES: [Vertex; 4] = [
    v([-1.0, 1.0, 0.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
    v([1.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
    v([1.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
    v([-1.0, -1.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

const CUBE_VERTICES: [Vertex; 24] = [
    // front (-z)
    v([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
    v([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
    v([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
    v([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
    // back (+z)
    v([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
    v([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
    v([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
    v([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
    // right (+x)
    v([1.0, 1.0, -1.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
    v([1.0, 1.0, 1.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
    v([1.0, -1.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0]),
    v([1.0, -1.0, -1.0], [1.0, 0.0, 0.0], [0.0, 1.0]),
    // left (-x)
    v([-1.0, 1.0, 1.0], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    v([-1.0, 1.0, -1.0], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    v([-1.0, -1.0, -1.0], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    v([-1.0, -1.0, 1.0], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    // top (+y)
    v([-1.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
    v([1.0, 1.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
    v([1.0, 1.0, -1.0], [0.0, 1.0, 0.0], [1.0, 1.0]),
    v([-1.0, 1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
    // bottom (-y)
    v([1.0, -1.0, 1.0], [0.0, -1.0, 0.0], [0.0, 0.0]),
    v([-1.0, -1.0, 1.0], [0.0, -1.0, 0.0], [1.0, 0.0]),
    v([-1.0, -1.0, -1.0], [0.0, -1.0, 0.0], [1.0, 1.0]),
    v([1.0, -1.0, -1.0], [0.0, -1.0, 0.0], [0.0, 1.0]),
];

const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 0, 2, 3, // front
    4, 5, 6, 4, 6, 7, // back
    8, 9, 10, 8, 10, 11, // right
    12, 13, 14, 12, 14, 15, // left
    16, 17, 18, 16, 18, 19, // top
    20, 21, 22, 20, 22, 23, // bottom
];

/// Indexed triangle-list geometry. Triangles wind clockwise when viewed from
/// the front.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Cow<'static, [Vertex]>,
    pub indices: Cow<'static, [u32]>,
}

impl MeshData {
    /// Unit quad in the z = 0 plane facing -z, spanning NDC.
    pub fn quad() -> Self {
        Self { vertices: Cow::Borrowed(&QUAD_VERTICES), indices: Cow::Borrowed(&QUAD_INDICES) }
    }

    /// Cube spanning -1..1 with per-face normals and texture coordinates.
    pub fn cube() -> Self {
        Self { vertices: Cow::Borrowed(&CUBE_VERTICES), indices: Cow::Borrowed(&CUBE_INDICES) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn face_normal(data: &MeshData, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(data.vertices[i as usize].position);
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
    }

    #[test]
    fn indices_stay_in_range() {
        for data in [MeshData::quad(), MeshData::cube()] {
            assert_eq!(data.indices.len() % 3, 0);
            assert!(data.indices.iter().all(|&i| (i as usize) < data.vertices.len()));
        }
    }

    #[test]
    fn cube_winding_matches_stored_normals() {
        let cube = MeshData::cube();
        for tri in cube.indices.chunks(3) {
            let stored = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal(&cube, tri).abs_diff_eq(stored, 1e-6), "triangle {tri:?}");
        }
    }
}
