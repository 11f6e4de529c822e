use std::path::PathBuf;

use thiserror::Error;

/// Which document table an out-of-range index pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Buffer,
    BufferView,
    Accessor,
    Material,
    Texture,
    Sampler,
    Image,
    Mesh,
    Node,
    Scene,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TableKind::Buffer => "buffer",
            TableKind::BufferView => "buffer view",
            TableKind::Accessor => "accessor",
            TableKind::Material => "material",
            TableKind::Texture => "texture",
            TableKind::Sampler => "sampler",
            TableKind::Image => "image",
            TableKind::Mesh => "mesh",
            TableKind::Node => "node",
            TableKind::Scene => "scene",
        };
        f.write_str(name)
    }
}

/// Everything that can go wrong while turning a document into a model.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The container parser rejected the file before extraction started.
    #[error("gltf error: {0}")]
    Gltf(gltf::Error),

    #[error("invalid import config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("{kind} index {index} out of range ({len} entries)")]
    Reference {
        kind: TableKind,
        index: usize,
        len: usize,
    },

    #[error("invalid mesh: {0}")]
    MeshValidation(String),

    #[error("texture decode failed: {0}")]
    TextureDecode(String),
}

impl From<gltf::Error> for ImportError {
    fn from(err: gltf::Error) -> Self {
        match err {
            gltf::Error::Io(e) => ImportError::Io(e),
            other => ImportError::Gltf(other),
        }
    }
}

impl From<image::ImageError> for ImportError {
    fn from(err: image::ImageError) -> Self {
        ImportError::TextureDecode(err.to_string())
    }
}

impl ImportError {
    pub fn format(msg: impl Into<String>) -> Self {
        ImportError::Format(msg.into())
    }

    pub fn mesh(msg: impl Into<String>) -> Self {
        ImportError::MeshValidation(msg.into())
    }

    pub fn texture(msg: impl Into<String>) -> Self {
        ImportError::TextureDecode(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Looks up `index` in `table`, failing with a reference error instead of panicking.
pub(crate) fn lookup<T>(table: &[T], kind: TableKind, index: usize) -> Result<&T> {
    table.get(index).ok_or(ImportError::Reference {
        kind,
        index,
        len: table.len(),
    })
}

/// A failed model load. Always names the file that was being loaded.
#[derive(Error, Debug)]
#[error("failed to load model '{}': {source}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub source: ImportError,
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, source: ImportError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
