//! In-memory form of a parsed scene file.
//!
//! This is what the container parser hands over: every table is kept in file
//! order and cross references are plain indices. Nothing here has been checked
//! against the other tables yet, the decoders do that as they go.

use glam::Mat4;

use crate::error::{ImportError, Result};
use crate::texture::Sampler;

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub buffers: Vec<Vec<u8>>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub samplers: Vec<Sampler>,
    pub images: Vec<Image>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub scenes: Vec<Scene>,
    pub default_scene: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

/// Numeric type of a single accessor component, keyed by the format's enum codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub const BYTE: u32 = 5120;
    pub const UNSIGNED_BYTE: u32 = 5121;
    pub const SHORT: u32 = 5122;
    pub const UNSIGNED_SHORT: u32 = 5123;
    pub const UNSIGNED_INT: u32 = 5125;
    pub const FLOAT: u32 = 5126;

    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            Self::BYTE => Ok(ComponentType::I8),
            Self::UNSIGNED_BYTE => Ok(ComponentType::U8),
            Self::SHORT => Ok(ComponentType::I16),
            Self::UNSIGNED_SHORT => Ok(ComponentType::U16),
            Self::UNSIGNED_INT => Ok(ComponentType::U32),
            Self::FLOAT => Ok(ComponentType::F32),
            other => Err(ImportError::format(format!(
                "unknown component type {}",
                other
            ))),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ComponentType::I8 => Self::BYTE,
            ComponentType::U8 => Self::UNSIGNED_BYTE,
            ComponentType::I16 => Self::SHORT,
            ComponentType::U16 => Self::UNSIGNED_SHORT,
            ComponentType::U32 => Self::UNSIGNED_INT,
            ComponentType::F32 => Self::FLOAT,
        }
    }

    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "SCALAR" => Ok(ElementType::Scalar),
            "VEC2" => Ok(ElementType::Vec2),
            "VEC3" => Ok(ElementType::Vec3),
            "VEC4" => Ok(ElementType::Vec4),
            "MAT2" => Ok(ElementType::Mat2),
            "MAT3" => Ok(ElementType::Mat3),
            "MAT4" => Ok(ElementType::Mat4),
            other => Err(ImportError::format(format!("unknown element type '{}'", other))),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ElementType::Scalar => "SCALAR",
            ElementType::Vec2 => "VEC2",
            ElementType::Vec3 => "VEC3",
            ElementType::Vec4 => "VEC4",
            ElementType::Mat2 => "MAT2",
            ElementType::Mat3 => "MAT3",
            ElementType::Mat4 => "MAT4",
        }
    }

    pub fn components(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 => 4,
            ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// None means the accessor is zero-filled (possibly patched by `sparse`).
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    /// Raw component type code as found in the file.
    pub component_type: u32,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    pub sparse: Option<Sparse>,
}

impl Accessor {
    /// Tightly packed, non-normalized accessor over `buffer_view`.
    pub fn new(
        buffer_view: usize,
        component_type: ComponentType,
        element_type: ElementType,
        count: usize,
    ) -> Self {
        Self {
            buffer_view: Some(buffer_view),
            byte_offset: 0,
            component_type: component_type.code(),
            element_type,
            count,
            normalized: false,
            sparse: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sparse {
    pub count: usize,
    pub indices_view: usize,
    pub indices_byte_offset: usize,
    pub indices_component_type: u32,
    pub values_view: usize,
    pub values_byte_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub index: usize,
    pub tex_coord: u32,
}

impl TextureInfo {
    pub fn new(index: usize) -> Self {
        Self { index, tex_coord: 0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_roughness_texture: Option<TextureInfo>,
    pub normal_texture: Option<TextureInfo>,
    pub normal_scale: f32,
    pub occlusion_texture: Option<TextureInfo>,
    pub occlusion_strength: f32,
    pub emissive_texture: Option<TextureInfo>,
    /// Kept as written in the file ("OPAQUE", "MASK", "BLEND").
    pub alpha_mode: String,
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0; 3],
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            emissive_texture: None,
            alpha_mode: "OPAQUE".to_string(),
            alpha_cutoff: None,
            double_sided: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub name: Option<String>,
    pub source: usize,
    pub sampler: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    R8,
    R8G8,
    R8G8B8,
    R8G8B8A8,
    R16,
    R16G16,
    R16G16B16,
    R16G16B16A16,
    R32G32B32Float,
    R32G32B32A32Float,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::R8 | PixelFormat::R16 => 1,
            PixelFormat::R8G8 | PixelFormat::R16G16 => 2,
            PixelFormat::R8G8B8 | PixelFormat::R16G16B16 | PixelFormat::R32G32B32Float => 3,
            PixelFormat::R8G8B8A8
            | PixelFormat::R16G16B16A16
            | PixelFormat::R32G32B32A32Float => 4,
        }
    }

    pub fn bytes_per_channel(self) -> usize {
        match self {
            PixelFormat::R8 | PixelFormat::R8G8 | PixelFormat::R8G8B8 | PixelFormat::R8G8B8A8 => 1,
            PixelFormat::R16
            | PixelFormat::R16G16
            | PixelFormat::R16G16B16
            | PixelFormat::R16G16B16A16 => 2,
            PixelFormat::R32G32B32Float | PixelFormat::R32G32B32A32Float => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Still encoded (png, jpeg, ...), decoded on first use.
    Encoded {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    /// Already decoded by the parser.
    Pixels {
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub source: ImageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Accessor indices of the vertex streams a primitive provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    pub position: Option<usize>,
    pub normal: Option<usize>,
    pub tangent: Option<usize>,
    pub tex_coord: Option<usize>,
    pub color: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Primitive {
    pub attributes: Attributes,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<String>,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
    /// Local transform. Not composed with ancestors during extraction.
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}
