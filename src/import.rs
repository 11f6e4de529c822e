//! The container boundary: glTF / GLB files are parsed and validated by the
//! `gltf` crate, then copied into a `Document`.

use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::document::{
    self, Accessor, Attributes, BufferView, ComponentType, Document, ElementType, Image,
    ImageSource, Mode, Node, Primitive, Scene, Sparse, TextureInfo,
};
use crate::error::{ImportError, Result};
use crate::texture::{FilterMode, MipmapFilterMode, Sampler, WrapMode};

/// Parses the file at `path` into a `Document`. Buffers are loaded eagerly;
/// images stay encoded until a material asks for them.
pub fn parse(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let base = path.parent();
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;
    log::debug!(
        "parsed {}: {} buffers, {} meshes, {} images",
        path.display(),
        buffers.len(),
        document.meshes().len(),
        document.images().len()
    );
    from_gltf(&document, buffers.into_iter().map(|b| b.0).collect(), base)
}

/// Copies a validated glTF document and its buffer contents into a `Document`.
pub fn from_gltf(
    asset: &gltf::Document,
    buffers: Vec<Vec<u8>>,
    base: Option<&Path>,
) -> Result<Document> {
    let images = convert_images(asset, &buffers, base)?;
    Ok(Document {
        buffer_views: asset.views().map(convert_view).collect(),
        accessors: asset.accessors().map(|a| convert_accessor(&a)).collect(),
        materials: asset.materials().map(|m| convert_material(&m)).collect(),
        textures: asset
            .textures()
            .map(|t| document::Texture {
                name: t.name().map(str::to_string),
                source: t.source().index(),
                sampler: t.sampler().index(),
            })
            .collect(),
        samplers: asset.samplers().map(|s| convert_sampler(&s)).collect(),
        images,
        meshes: asset
            .meshes()
            .map(|m| document::Mesh {
                name: m.name().map(str::to_string),
                primitives: m.primitives().map(|p| convert_primitive(&p)).collect(),
            })
            .collect(),
        nodes: asset
            .nodes()
            .map(|n| Node {
                name: n.name().map(str::to_string),
                mesh: n.mesh().map(|m| m.index()),
                children: n.children().map(|c| c.index()).collect(),
                transform: Mat4::from_cols_array_2d(&n.transform().matrix()),
            })
            .collect(),
        scenes: asset
            .scenes()
            .map(|s| Scene {
                name: s.name().map(str::to_string),
                nodes: s.nodes().map(|n| n.index()).collect(),
            })
            .collect(),
        default_scene: asset.default_scene().map(|s| s.index()),
        buffers,
    })
}

fn convert_view(view: gltf::buffer::View) -> BufferView {
    BufferView {
        buffer: view.buffer().index(),
        byte_offset: view.offset(),
        byte_length: view.length(),
        byte_stride: view.stride(),
    }
}

fn component_type(data_type: gltf::accessor::DataType) -> ComponentType {
    match data_type {
        gltf::accessor::DataType::I8 => ComponentType::I8,
        gltf::accessor::DataType::U8 => ComponentType::U8,
        gltf::accessor::DataType::I16 => ComponentType::I16,
        gltf::accessor::DataType::U16 => ComponentType::U16,
        gltf::accessor::DataType::U32 => ComponentType::U32,
        gltf::accessor::DataType::F32 => ComponentType::F32,
    }
}

fn element_type(dimensions: gltf::accessor::Dimensions) -> ElementType {
    match dimensions {
        gltf::accessor::Dimensions::Scalar => ElementType::Scalar,
        gltf::accessor::Dimensions::Vec2 => ElementType::Vec2,
        gltf::accessor::Dimensions::Vec3 => ElementType::Vec3,
        gltf::accessor::Dimensions::Vec4 => ElementType::Vec4,
        gltf::accessor::Dimensions::Mat2 => ElementType::Mat2,
        gltf::accessor::Dimensions::Mat3 => ElementType::Mat3,
        gltf::accessor::Dimensions::Mat4 => ElementType::Mat4,
    }
}

fn convert_accessor(accessor: &gltf::Accessor) -> Accessor {
    let sparse = accessor.sparse().map(|sparse| {
        let indices = sparse.indices();
        let values = sparse.values();
        let indices_component_type = match indices.index_type() {
            gltf::accessor::sparse::IndexType::U8 => ComponentType::U8,
            gltf::accessor::sparse::IndexType::U16 => ComponentType::U16,
            gltf::accessor::sparse::IndexType::U32 => ComponentType::U32,
        };
        Sparse {
            count: sparse.count(),
            indices_view: indices.view().index(),
            indices_byte_offset: indices.offset(),
            indices_component_type: indices_component_type.code(),
            values_view: values.view().index(),
            values_byte_offset: values.offset(),
        }
    });

    Accessor {
        buffer_view: accessor.view().map(|v| v.index()),
        byte_offset: accessor.offset(),
        component_type: component_type(accessor.data_type()).code(),
        element_type: element_type(accessor.dimensions()),
        count: accessor.count(),
        normalized: accessor.normalized(),
        sparse,
    }
}

fn texture_info(info: Option<gltf::texture::Info>) -> Option<TextureInfo> {
    info.map(|info| TextureInfo {
        index: info.texture().index(),
        tex_coord: info.tex_coord(),
    })
}

fn convert_material(material: &gltf::Material) -> document::Material {
    let pbr = material.pbr_metallic_roughness();
    let normal = material.normal_texture();
    let occlusion = material.occlusion_texture();
    document::Material {
        name: material.name().map(str::to_string),
        base_color_factor: pbr.base_color_factor(),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        emissive_factor: material.emissive_factor(),
        base_color_texture: texture_info(pbr.base_color_texture()),
        metallic_roughness_texture: texture_info(pbr.metallic_roughness_texture()),
        normal_texture: normal.as_ref().map(|n| TextureInfo {
            index: n.texture().index(),
            tex_coord: n.tex_coord(),
        }),
        normal_scale: normal.as_ref().map(|n| n.scale()).unwrap_or(1.0),
        occlusion_texture: occlusion.as_ref().map(|o| TextureInfo {
            index: o.texture().index(),
            tex_coord: o.tex_coord(),
        }),
        occlusion_strength: occlusion.as_ref().map(|o| o.strength()).unwrap_or(1.0),
        emissive_texture: texture_info(material.emissive_texture()),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => "OPAQUE",
            gltf::material::AlphaMode::Mask => "MASK",
            gltf::material::AlphaMode::Blend => "BLEND",
        }
        .to_string(),
        alpha_cutoff: material.alpha_cutoff(),
        double_sided: material.double_sided(),
    }
}

fn convert_sampler(sampler: &gltf::texture::Sampler) -> Sampler {
    let mag_filter = match sampler
        .mag_filter()
        .unwrap_or(gltf::texture::MagFilter::Linear)
    {
        gltf::texture::MagFilter::Linear => FilterMode::Linear,
        gltf::texture::MagFilter::Nearest => FilterMode::Nearest,
    };

    let (min_filter, mipmap_filter) = match sampler.min_filter() {
        Some(gltf::texture::MinFilter::Nearest) => (FilterMode::Nearest, MipmapFilterMode::None),
        Some(gltf::texture::MinFilter::Linear) => (FilterMode::Linear, MipmapFilterMode::None),
        Some(gltf::texture::MinFilter::NearestMipmapNearest) => {
            (FilterMode::Nearest, MipmapFilterMode::Nearest)
        }
        Some(gltf::texture::MinFilter::LinearMipmapNearest) => {
            (FilterMode::Linear, MipmapFilterMode::Nearest)
        }
        Some(gltf::texture::MinFilter::NearestMipmapLinear) => {
            (FilterMode::Nearest, MipmapFilterMode::Linear)
        }
        Some(gltf::texture::MinFilter::LinearMipmapLinear) | None => {
            (FilterMode::Linear, MipmapFilterMode::Linear)
        }
    };

    let wrap = |mode: gltf::texture::WrappingMode| match mode {
        gltf::texture::WrappingMode::Repeat => WrapMode::Repeat,
        gltf::texture::WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        gltf::texture::WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
    };

    Sampler {
        mag_filter,
        min_filter,
        mipmap_filter,
        wrap_u: wrap(sampler.wrap_s()),
        wrap_v: wrap(sampler.wrap_t()),
    }
}

fn convert_mode(mode: gltf::mesh::Mode) -> Mode {
    match mode {
        gltf::mesh::Mode::Points => Mode::Points,
        gltf::mesh::Mode::Lines => Mode::Lines,
        gltf::mesh::Mode::LineLoop => Mode::LineLoop,
        gltf::mesh::Mode::LineStrip => Mode::LineStrip,
        gltf::mesh::Mode::Triangles => Mode::Triangles,
        gltf::mesh::Mode::TriangleStrip => Mode::TriangleStrip,
        gltf::mesh::Mode::TriangleFan => Mode::TriangleFan,
    }
}

fn convert_primitive(primitive: &gltf::Primitive) -> Primitive {
    let mut attributes = Attributes::default();
    for (semantic, accessor) in primitive.attributes() {
        let slot = match semantic {
            gltf::Semantic::Positions => &mut attributes.position,
            gltf::Semantic::Normals => &mut attributes.normal,
            gltf::Semantic::Tangents => &mut attributes.tangent,
            gltf::Semantic::TexCoords(0) => &mut attributes.tex_coord,
            gltf::Semantic::Colors(0) => &mut attributes.color,
            _ => continue,
        };
        *slot = Some(accessor.index());
    }
    Primitive {
        attributes,
        indices: primitive.indices().map(|a| a.index()),
        material: primitive.material().index(),
        mode: convert_mode(primitive.mode()),
    }
}

fn convert_images(
    asset: &gltf::Document,
    buffers: &[Vec<u8>],
    base: Option<&Path>,
) -> Result<Vec<Image>> {
    let mut images = Vec::with_capacity(asset.images().len());
    for image in asset.images() {
        let (uri, bytes, mime_type) = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
                    ImportError::format(format!("image {} points at a missing buffer", image.index()))
                })?;
                let bytes = view
                    .offset()
                    .checked_add(view.length())
                    .and_then(|end| buffer.get(view.offset()..end))
                    .ok_or_else(|| {
                        ImportError::format(format!(
                            "image {} view ({} bytes at offset {}) exceeds its {} byte buffer",
                            image.index(),
                            view.length(),
                            view.offset(),
                            buffer.len()
                        ))
                    })?;
                (None, bytes.to_vec(), Some(mime_type.to_string()))
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let bytes = read_uri(base, uri)?;
                if uri.starts_with("data:") {
                    log::debug!("image {} is an embedded data uri", image.index());
                    (None, bytes, mime_type.map(str::to_string))
                } else {
                    (Some(uri.to_string()), bytes, mime_type.map(str::to_string))
                }
            }
        };
        images.push(Image {
            name: image.name().map(str::to_string),
            uri,
            source: ImageSource::Encoded { bytes, mime_type },
        });
    }
    Ok(images)
}

/// Reads the bytes behind an image URI, resolved the same way the `gltf`
/// crate resolves buffer URIs: `data:` payloads are base64, `file:` URIs
/// are plain paths, and scheme-less URIs are percent-encoded paths relative
/// to `base`.
fn read_uri(base: Option<&Path>, uri: &str) -> Result<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let payload = rest.split_once(";base64,").map_or(rest, |(_, data)| data);
        return base64::decode(payload)
            .map_err(|e| ImportError::format(format!("invalid base64 image data: {}", e)));
    }

    let path = if let Some(path) = uri
        .strip_prefix("file://")
        .or_else(|| uri.strip_prefix("file:"))
    {
        PathBuf::from(path)
    } else if uri.contains(':') {
        return Err(ImportError::format(format!(
            "unsupported uri scheme in '{}'",
            uri
        )));
    } else {
        let decoded = urlencoding::decode(uri)
            .map_err(|e| ImportError::format(format!("invalid image uri '{}': {}", uri, e)))?;
        match base {
            Some(base) => base.join(decoded.as_ref()),
            None => PathBuf::from(decoded.as_ref()),
        }
    };
    Ok(std::fs::read(path)?)
}
