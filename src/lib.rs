//! Loads glTF 2.0 scene files into renderer-ready meshes, materials and
//! textures.
//!
//! ```no_run
//! let model = model_import::Model::load("assets/DamagedHelmet.glb")?;
//! for mesh in &model.meshes {
//!     println!("{} vertices, {} indices", mesh.vertex_count(), mesh.index_count());
//! }
//! # Ok::<(), model_import::LoadError>(())
//! ```

pub mod accessor;
pub mod config;
pub mod document;
pub mod error;
pub mod import;
pub mod material;
pub mod mesh;
pub mod model;
pub mod render;
pub mod scene_graph;
mod tangents;
pub mod texture;

pub use config::ImportConfig;
pub use document::Document;
pub use error::{ImportError, LoadError, Result, TableKind};
pub use material::{AlphaMode, Material, MaterialResolver, TextureSlot};
pub use mesh::{Aabb, Mesh, MeshBuilder, Vertex};
pub use model::{Model, ModelAssembly};
pub use render::Shader;
pub use scene_graph::SceneGraphWalker;
pub use texture::{DecodedImage, ImageDecoder, Sampler, StandardDecoder, Texture, TextureCache};
