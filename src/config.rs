use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs for a single model load. Every field has a default, so a partial
/// JSON file is fine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ImportConfig {
    /// Scene to load instead of the document's default.
    pub scene: Option<usize>,
    pub expand_rgb_to_rgba: bool,
    /// Generate MikkTSpace tangents for triangle meshes that have normals and
    /// uvs but no TANGENT attribute.
    pub generate_tangents: bool,
    /// Skip point and line primitives instead of keeping them.
    pub triangles_only: bool,
}

impl ImportConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
