#![allow(dead_code)]

use std::path::PathBuf;

use glam::{Mat4, Vec3, Vec4};
use model_import::document::{
    Accessor, BufferView, ComponentType, Document, ElementType, Image, ImageSource, PixelFormat,
};
use model_import::{Mesh, Sampler, Shader, Texture};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh scratch directory for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("model-import-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Appends `data` as its own buffer and view and returns a packed accessor over it.
pub fn push_accessor<T: bytemuck::Pod>(
    document: &mut Document,
    data: &[T],
    component_type: ComponentType,
    element_type: ElementType,
) -> usize {
    let bytes = bytemuck::cast_slice::<T, u8>(data).to_vec();
    let count = bytes.len() / (component_type.size() * element_type.components());
    document.buffer_views.push(BufferView {
        buffer: document.buffers.len(),
        byte_offset: 0,
        byte_length: bytes.len(),
        byte_stride: None,
    });
    document.buffers.push(bytes);
    document.accessors.push(Accessor::new(
        document.buffer_views.len() - 1,
        component_type,
        element_type,
        count,
    ));
    document.accessors.len() - 1
}

pub fn rgba_image(width: u32, height: u32, fill: [u8; 4]) -> Image {
    Image {
        name: None,
        uri: None,
        source: ImageSource::Pixels {
            pixels: fill.repeat((width * height) as usize),
            width,
            height,
            format: PixelFormat::R8G8B8A8,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Mat4(String, Mat4),
    Vec3(String, Vec3),
    Vec4(String, Vec4),
    Float(String, f32),
    Int(String, i32),
    Bind { unit: u32, image_index: usize },
    Draw { vertices: usize, indices: usize },
}

/// Shader that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingShader {
    pub calls: Vec<Call>,
}

impl RecordingShader {
    pub fn int(&self, name: &str) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Int(n, v) if n == name => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn vec4(&self, name: &str) -> Vec<Vec4> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Vec4(n, v) if n == name => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn binds(&self) -> Vec<(u32, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Bind { unit, image_index } => Some((*unit, *image_index)),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Draw { .. }))
            .count()
    }
}

impl Shader for RecordingShader {
    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.calls.push(Call::Mat4(name.to_string(), value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.calls.push(Call::Vec3(name.to_string(), value));
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.calls.push(Call::Vec4(name.to_string(), value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.calls.push(Call::Float(name.to_string(), value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.calls.push(Call::Int(name.to_string(), value));
    }

    fn bind_texture(&mut self, unit: u32, texture: &Texture, _sampler: &Sampler) {
        self.calls.push(Call::Bind {
            unit,
            image_index: texture.image_index,
        });
    }

    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.calls.push(Call::Draw {
            vertices: mesh.vertex_count(),
            indices: mesh.index_count(),
        });
    }
}
