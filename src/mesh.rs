use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::accessor::{read_colors, read_f32};
use crate::document::{Document, Mode, Primitive};
use crate::error::{ImportError, Result};
use crate::tangents::generate_vertex_tangents;

pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const DEFAULT_TANGENT: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub tangent: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            let p = Vec3::from_array(*p);
            Some(match acc {
                None => Aabb { min: p, max: p },
                Some(aabb) => Aabb {
                    min: aabb.min.min(p),
                    max: aabb.max.max(p),
                },
            })
        })
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Where a mesh came from in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshOrigin {
    pub node: usize,
    pub mesh: usize,
    pub primitive: usize,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Index into the owning model's material table.
    pub material: Option<usize>,
    pub mode: Mode,
    pub aabb: Aabb,
    pub origin: MeshOrigin,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Decoded vertex streams of one primitive. Empty streams get defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshAttributes {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub tangents: Vec<[f32; 4]>,
}

impl MeshAttributes {
    pub fn read(document: &Document, primitive: &Primitive) -> Result<Self> {
        let attributes = &primitive.attributes;
        let position = attributes
            .position
            .ok_or_else(|| ImportError::mesh("primitive is missing the POSITION attribute"))?;

        Ok(Self {
            positions: read_f32::<3>(document, position)?,
            normals: match attributes.normal {
                Some(i) => read_f32::<3>(document, i)?,
                None => vec![],
            },
            uvs: match attributes.tex_coord {
                Some(i) => read_f32::<2>(document, i)?,
                None => vec![],
            },
            colors: match attributes.color {
                Some(i) => read_colors(document, i)?,
                None => vec![],
            },
            tangents: match attributes.tangent {
                Some(i) => read_f32::<4>(document, i)?,
                None => vec![],
            },
        })
    }
}

fn check_len(name: &str, len: usize, vertex_count: usize) -> Result<()> {
    if len != 0 && len != vertex_count {
        return Err(ImportError::mesh(format!(
            "{} count {} does not match position count {}",
            name, len, vertex_count
        )));
    }
    Ok(())
}

/// Assembles a validated `Mesh` from decoded streams.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    attributes: MeshAttributes,
    indices: Option<Vec<u32>>,
    material: Option<usize>,
    mode: Mode,
    origin: MeshOrigin,
    generate_tangents: bool,
}

impl MeshBuilder {
    pub fn new(attributes: MeshAttributes) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    /// Index data of the primitive. Without it the identity sequence is used.
    pub fn indices(mut self, indices: Option<Vec<u32>>) -> Self {
        self.indices = indices;
        self
    }

    pub fn material(mut self, material: Option<usize>) -> Self {
        self.material = material;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn origin(mut self, origin: MeshOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn generate_tangents(mut self, generate: bool) -> Self {
        self.generate_tangents = generate;
        self
    }

    pub fn build(self) -> Result<Mesh> {
        let MeshAttributes {
            positions,
            normals,
            uvs,
            colors,
            tangents,
        } = self.attributes;

        let vertex_count = positions.len();
        if vertex_count == 0 {
            return Err(ImportError::mesh("primitive has no vertices"));
        }
        check_len("normal", normals.len(), vertex_count)?;
        check_len("uv", uvs.len(), vertex_count)?;
        check_len("color", colors.len(), vertex_count)?;
        check_len("tangent", tangents.len(), vertex_count)?;
        if vertex_count > u32::MAX as usize {
            return Err(ImportError::mesh(format!(
                "{} vertices cannot be addressed by 32-bit indices",
                vertex_count
            )));
        }

        let indices = match self.indices {
            Some(indices) => {
                if let Some(bad) = indices.iter().find(|i| **i as usize >= vertex_count) {
                    return Err(ImportError::mesh(format!(
                        "index {} out of range for {} vertices",
                        bad, vertex_count
                    )));
                }
                indices
            }
            None => (0..vertex_count as u32).collect(),
        };

        let aabb = Aabb::from_points(&positions)
            .ok_or_else(|| ImportError::mesh("primitive has no vertices"))?;

        let mut vertices: Vec<Vertex> = (0..vertex_count)
            .map(|i| Vertex {
                position: positions[i],
                normal: normals.get(i).copied().unwrap_or(DEFAULT_NORMAL),
                uv: uvs.get(i).copied().unwrap_or(DEFAULT_UV),
                color: colors.get(i).copied().unwrap_or(DEFAULT_COLOR),
                tangent: tangents.get(i).copied().unwrap_or(DEFAULT_TANGENT),
            })
            .collect();

        let can_generate = self.mode == Mode::Triangles && !normals.is_empty() && !uvs.is_empty();
        if self.generate_tangents && tangents.is_empty() && can_generate {
            if let Err(e) = generate_vertex_tangents(&mut vertices, &indices) {
                log::warn!(
                    "failed to generate tangents for primitive {} of mesh {}: {}",
                    self.origin.primitive,
                    self.origin.mesh,
                    e
                );
            }
        }

        Ok(Mesh {
            vertices,
            indices,
            material: self.material,
            mode: self.mode,
            aabb,
            origin: self.origin,
        })
    }
}
