//! Depth-first enumeration of the primitives reachable from a scene.
//!
//! Node transforms are not composed here; meshes are collected in
//! node-local space and the caller decides what to do with the hierarchy.

use std::collections::HashSet;

use crate::document::{Document, Primitive};
use crate::error::{lookup, ImportError, Result, TableKind};

/// Root nodes of the scene to load: `preferred` if given, else the document's
/// default scene, else the first scene. A document without any scenes falls
/// back to its parentless nodes in index order.
pub fn scene_roots(document: &Document, preferred: Option<usize>) -> Result<Vec<usize>> {
    if let Some(index) = preferred.or(document.default_scene) {
        return Ok(lookup(&document.scenes, TableKind::Scene, index)?.nodes.clone());
    }
    if let Some(scene) = document.scenes.first() {
        return Ok(scene.nodes.clone());
    }

    log::warn!("document has no scenes, walking parentless nodes");
    let mut has_parent = vec![false; document.nodes.len()];
    for node in &document.nodes {
        for &child in &node.children {
            if let Some(flag) = has_parent.get_mut(child) {
                *flag = true;
            }
        }
    }
    Ok((0..document.nodes.len()).filter(|i| !has_parent[*i]).collect())
}

#[derive(Debug, Clone, Copy)]
pub struct ScenePrimitive<'a> {
    pub node: usize,
    pub mesh: usize,
    /// Position of the primitive within its mesh.
    pub index: usize,
    pub primitive: &'a Primitive,
}

/// Lazily walks the node hierarchy, yielding every primitive of every mesh
/// in node/child array order. A node reached twice is an error, so malformed
/// (cyclic) hierarchies terminate. Stops after the first error.
pub struct SceneGraphWalker<'a> {
    document: &'a Document,
    stack: Vec<usize>,
    visited: HashSet<usize>,
    // (node, mesh, next primitive)
    current: Option<(usize, usize, usize)>,
    failed: bool,
}

impl<'a> SceneGraphWalker<'a> {
    pub fn new(document: &'a Document, roots: &[usize]) -> Self {
        Self {
            document,
            stack: roots.iter().rev().copied().collect(),
            visited: HashSet::new(),
            current: None,
            failed: false,
        }
    }

    fn enter(&mut self, node_index: usize) -> Result<()> {
        let node = lookup(&self.document.nodes, TableKind::Node, node_index)?;
        if !self.visited.insert(node_index) {
            return Err(ImportError::format(format!(
                "node {} is reached more than once (cycle or shared child)",
                node_index
            )));
        }
        if let Some(mesh_index) = node.mesh {
            lookup(&self.document.meshes, TableKind::Mesh, mesh_index)?;
            self.current = Some((node_index, mesh_index, 0));
        }
        self.stack.extend(node.children.iter().rev());
        Ok(())
    }
}

impl<'a> Iterator for SceneGraphWalker<'a> {
    type Item = Result<ScenePrimitive<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let document: &'a Document = self.document;
        loop {
            if let Some((node, mesh, next)) = self.current {
                let primitives = document
                    .meshes
                    .get(mesh)
                    .map(|m| m.primitives.as_slice())
                    .unwrap_or_default();
                if let Some(primitive) = primitives.get(next) {
                    self.current = Some((node, mesh, next + 1));
                    return Some(Ok(ScenePrimitive {
                        node,
                        mesh,
                        index: next,
                        primitive,
                    }));
                }
                self.current = None;
            }

            let node_index = self.stack.pop()?;
            if let Err(e) = self.enter(node_index) {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}
