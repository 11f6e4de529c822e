use mikktspace::{generate_tangents, Geometry};

use crate::mesh::Vertex;

struct TriangleList<'a> {
    vertices: &'a mut [Vertex],
    indices: &'a [u32],
}

impl TriangleList<'_> {
    fn vertex(&self, face: usize, vert: usize) -> &Vertex {
        &self.vertices[self.indices[face * 3 + vert] as usize]
    }
}

impl Geometry for TriangleList<'_> {
    fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.vertex(face, vert).position
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.vertex(face, vert).normal
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.vertex(face, vert).uv
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        let idx = self.indices[face * 3 + vert] as usize;
        self.vertices[idx].tangent = tangent;
    }
}

/// Fills in MikkTSpace tangents for an indexed triangle list.
/// Indices must already be validated against `vertices`.
pub fn generate_vertex_tangents(vertices: &mut [Vertex], indices: &[u32]) -> Result<(), String> {
    if indices.len() % 3 != 0 {
        return Err("index buffer length must be a multiple of 3 (triangles)".to_string());
    }
    let mut geometry = TriangleList { vertices, indices };
    if !generate_tangents(&mut geometry) {
        return Err("mikktspace failed to generate tangents".to_string());
    }
    Ok(())
}
