//! The seam to whatever renderer consumes a `Model`.

use glam::{Mat4, Vec3, Vec4};

use crate::mesh::Mesh;
use crate::texture::{Sampler, Texture};

/// Uniform setting and draw submission, implemented by the renderer.
pub trait Shader {
    fn set_mat4(&mut self, name: &str, value: Mat4);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_vec4(&mut self, name: &str, value: Vec4);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);
    fn bind_texture(&mut self, unit: u32, texture: &Texture, sampler: &Sampler);
    fn draw_mesh(&mut self, mesh: &Mesh);
}
