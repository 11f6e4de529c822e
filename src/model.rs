use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::Mat4;

use crate::accessor::read_indices;
use crate::config::ImportConfig;
use crate::document::{Document, Mode};
use crate::error::{LoadError, Result};
use crate::import;
use crate::material::{Material, MaterialResolver, TextureSlot};
use crate::mesh::{Aabb, Mesh, MeshAttributes, MeshBuilder, MeshOrigin};
use crate::render::Shader;
use crate::scene_graph::{scene_roots, SceneGraphWalker};
use crate::texture::{ImageDecoder, Sampler, StandardDecoder, Texture, TextureCache};

/// Everything produced by one load. Meshes refer to materials by index into
/// `materials`; materials share decoded textures with `textures`.
#[derive(Debug, Clone)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    /// Decoded textures in first-use order.
    pub textures: Vec<Arc<Texture>>,
    pub transform: Mat4,
}

impl Model {
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Model, LoadError> {
        ModelAssembly::default().load(path)
    }

    pub fn load_with(
        path: impl AsRef<Path>,
        config: &ImportConfig,
    ) -> std::result::Result<Model, LoadError> {
        ModelAssembly::new(config.clone()).load(path)
    }

    /// Builds a model from an already parsed document.
    pub fn from_document(
        document: &Document,
        config: &ImportConfig,
        decoder: &dyn ImageDecoder,
    ) -> Result<Model> {
        let roots = scene_roots(document, config.scene)?;
        let resolver = MaterialResolver::new(document, decoder)
            .expand_rgb_to_rgba(config.expand_rgb_to_rgba);
        let mut cache = TextureCache::new();

        let mut meshes = Vec::new();
        let mut materials = Vec::new();
        // document material index -> index into `materials`
        let mut material_slots: HashMap<usize, usize> = HashMap::new();

        for item in SceneGraphWalker::new(document, &roots) {
            let item = item?;
            let primitive = item.primitive;
            if !matches!(
                primitive.mode,
                Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan
            ) {
                if config.triangles_only {
                    log::warn!(
                        "skipping {:?} primitive {} of mesh {}",
                        primitive.mode,
                        item.index,
                        item.mesh
                    );
                    continue;
                }
                log::warn!(
                    "keeping {:?} primitive {} of mesh {}",
                    primitive.mode,
                    item.index,
                    item.mesh
                );
            }

            let material = match primitive.material {
                Some(index) => Some(match material_slots.get(&index) {
                    Some(&slot) => slot,
                    None => {
                        materials.push(resolver.resolve(index, &mut cache)?);
                        material_slots.insert(index, materials.len() - 1);
                        materials.len() - 1
                    }
                }),
                None => None,
            };

            let attributes = MeshAttributes::read(document, primitive)?;
            let indices = match primitive.indices {
                Some(index) => Some(read_indices(document, index)?),
                None => None,
            };
            log::debug!(
                "node {} mesh {} primitive {}: {} vertices, {} indices",
                item.node,
                item.mesh,
                item.index,
                attributes.positions.len(),
                indices.as_ref().map_or(attributes.positions.len(), Vec::len)
            );

            let mesh = MeshBuilder::new(attributes)
                .indices(indices)
                .material(material)
                .mode(primitive.mode)
                .origin(MeshOrigin {
                    node: item.node,
                    mesh: item.mesh,
                    primitive: item.index,
                })
                .generate_tangents(config.generate_tangents)
                .build()?;
            meshes.push(mesh);
        }

        log::info!(
            "assembled model: {} meshes, {} materials, {} textures ({} cache hits)",
            meshes.len(),
            materials.len(),
            cache.len(),
            cache.hits()
        );

        Ok(Model {
            meshes,
            materials,
            textures: cache.into_textures(),
            transform: Mat4::IDENTITY,
        })
    }

    pub fn material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material.and_then(|i| self.materials.get(i))
    }

    /// Union of all mesh bounds, in node-local space.
    pub fn bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .map(|m| m.aabb)
            .reduce(|acc, aabb| acc.union(&aabb))
    }

    /// Material for meshes that have none: default factors with the model's
    /// first texture as base color.
    fn fallback_material(&self) -> Material {
        Material {
            base_color_texture: self.textures.first().map(|texture| TextureSlot {
                texture: Arc::clone(texture),
                tex_coord: 0,
                sampler: Sampler::default(),
            }),
            ..Default::default()
        }
    }

    pub fn draw<S: Shader + ?Sized>(&self, shader: &mut S) {
        shader.set_mat4("model", self.transform);
        let mut fallback: Option<Material> = None;
        for mesh in &self.meshes {
            match self.material(mesh) {
                Some(material) => material.apply(shader),
                None => fallback
                    .get_or_insert_with(|| self.fallback_material())
                    .apply(shader),
            }
            shader.draw_mesh(mesh);
        }
    }
}

/// Parses a file and turns it into a `Model`, wrapping every failure in a
/// `LoadError` that names the file.
pub struct ModelAssembly {
    config: ImportConfig,
    decoder: Box<dyn ImageDecoder>,
}

impl Default for ModelAssembly {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

impl ModelAssembly {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            decoder: Box::new(StandardDecoder),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn load(&self, path: impl AsRef<Path>) -> std::result::Result<Model, LoadError> {
        let path = path.as_ref();
        log::info!("loading model {}", path.display());
        let document = import::parse(path).map_err(|e| LoadError::new(path, e))?;
        self.assemble(path, &document)
    }

    /// Builds a model from a document that came from `path`.
    pub fn assemble(
        &self,
        path: impl AsRef<Path>,
        document: &Document,
    ) -> std::result::Result<Model, LoadError> {
        Model::from_document(document, &self.config, self.decoder.as_ref())
            .map_err(|e| LoadError::new(path.as_ref(), e))
    }
}
