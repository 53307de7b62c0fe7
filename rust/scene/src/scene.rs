// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal scene-graph arena holding mesh and material nodes.
//!
//! Nodes are stored in a slot map and referenced through generational keys.
//! A mesh owns the edge to its material; the material keeps non-owning
//! back-references to every mesh that uses it.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::config::MeshConfig;
use crate::error::Result;
use crate::interop::ExternalMesh;
use crate::mesh::{Color4, MeshNode};
use crate::node::{ApiLevel, NodeHeader, NodeKind};

new_key_type! {
    /// Key for any node stored in a [`SceneArena`].
    pub struct NodeKey;
}

/// Surface appearance node referenced by meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialNode {
    pub header: NodeHeader,
    pub diffuse: Option<Color4>,
    /// Meshes that reference this material (non-owning).
    pub(crate) parents: Vec<NodeKey>,
}

impl MaterialNode {
    pub fn new(api: ApiLevel, name: Option<String>) -> Self {
        Self {
            header: NodeHeader::new(api, name),
            diffuse: None,
            parents: Vec::new(),
        }
    }

    pub fn with_diffuse(mut self, diffuse: Color4) -> Self {
        self.diffuse = Some(diffuse);
        self
    }

    /// Meshes referencing this material, in attachment order.
    pub fn parents(&self) -> &[NodeKey] {
        &self.parents
    }
}

/// Closed set of node kinds stored in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Material(MaterialNode),
}

impl SceneNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            SceneNode::Mesh(_) => NodeKind::Mesh,
            SceneNode::Material(_) => NodeKind::Material,
        }
    }

    pub fn header(&self) -> &NodeHeader {
        match self {
            SceneNode::Mesh(m) => m.header(),
            SceneNode::Material(m) => &m.header,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match self {
            SceneNode::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_material(&self) -> Option<&MaterialNode> {
        match self {
            SceneNode::Material(m) => Some(m),
            _ => None,
        }
    }
}

/// Arena of scene nodes.
#[derive(Debug, Default)]
pub struct SceneArena {
    nodes: SlotMap<NodeKey, SceneNode>,
    config: MeshConfig,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena that imports and hashes meshes with `config`.
    pub fn with_config(config: MeshConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: SlotMap::with_key(),
            config,
        })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Adds a material node.
    pub fn add_material(&mut self, material: MaterialNode) -> NodeKey {
        self.nodes.insert(SceneNode::Material(material))
    }

    /// Adds a mesh node as-is (e.g. one produced by a decoder).
    pub fn add_mesh(&mut self, mesh: MeshNode) -> NodeKey {
        self.nodes.insert(SceneNode::Mesh(mesh))
    }

    /// Imports an external mesh at the configured API level, attaching the
    /// material it selects.
    ///
    /// `materials` is the ordered material list the external mesh's material
    /// index refers to. An out-of-range index, or a key that is not a
    /// material of this arena, leaves the mesh without a material.
    pub fn import_mesh(&mut self, external: &ExternalMesh, materials: &[NodeKey]) -> NodeKey {
        let api = self.config.api_level;
        let material = materials
            .get(external.material_index as usize)
            .copied()
            .filter(|&key| self.material(key).is_some());

        if material.is_none() {
            tracing::debug!(
                material_index = external.material_index,
                materials = materials.len(),
                "Material index does not resolve, importing mesh without material"
            );
        }

        let mesh = MeshNode::from_external(api, external, material);
        let mesh_key = self.nodes.insert(SceneNode::Mesh(mesh));

        if let Some(SceneNode::Material(m)) = material.and_then(|k| self.nodes.get_mut(k)) {
            m.parents.push(mesh_key);
        }

        mesh_key
    }

    /// Exports a mesh node, resolving its material through `mapping`.
    pub fn export_mesh(
        &self,
        key: NodeKey,
        mapping: &FxHashMap<NodeKey, u32>,
    ) -> Option<ExternalMesh> {
        self.mesh(key).map(|mesh| mesh.to_external(mapping))
    }

    /// Content hashes of every mesh, computed in parallel with the arena's
    /// configuration where not already memoized.
    pub fn content_hashes(&self) -> Vec<(NodeKey, String)> {
        let meshes: Vec<(NodeKey, &MeshNode)> = self.meshes().collect();
        meshes
            .into_par_iter()
            .map(|(key, mesh)| (key, mesh.content_hash_with(&self.config).to_string()))
            .collect()
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn mesh(&self, key: NodeKey) -> Option<&MeshNode> {
        self.nodes.get(key).and_then(SceneNode::as_mesh)
    }

    pub fn material(&self, key: NodeKey) -> Option<&MaterialNode> {
        self.nodes.get(key).and_then(SceneNode::as_material)
    }

    /// Returns the material attached to a mesh, if any.
    pub fn mesh_material(&self, key: NodeKey) -> Option<NodeKey> {
        self.mesh(key)?
            .children()
            .iter()
            .copied()
            .find(|&child| self.material(child).is_some())
    }

    /// Iterates over all mesh nodes.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeKey, &MeshNode)> {
        self.nodes
            .iter()
            .filter_map(|(k, n)| n.as_mesh().map(|m| (k, m)))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes().count()
    }

    pub fn material_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.kind() == NodeKind::Material)
            .count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn triangle(material_index: u32) -> ExternalMesh {
        ExternalMesh {
            name: "tri".to_string(),
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            faces: vec![[0u32, 1, 2].into_iter().collect()],
            material_index,
            ..ExternalMesh::default()
        }
    }

    #[test]
    fn import_attaches_material_both_ways() {
        let mut arena = SceneArena::new();
        let m0 = arena.add_material(MaterialNode::new(ApiLevel::Level1, Some("steel".into())));
        let m1 = arena.add_material(MaterialNode::new(ApiLevel::Level1, Some("glass".into())));

        let mesh = arena.import_mesh(&triangle(1), &[m0, m1]);

        assert_eq!(arena.mesh(mesh).unwrap().children(), &[m1]);
        assert_eq!(arena.mesh_material(mesh), Some(m1));
        assert_eq!(arena.material(m1).unwrap().parents(), &[mesh]);
        assert!(arena.material(m0).unwrap().parents().is_empty());
    }

    #[test]
    fn material_shared_by_many_meshes() {
        let mut arena = SceneArena::new();
        let m = arena.add_material(MaterialNode::new(ApiLevel::Level1, None));

        let a = arena.import_mesh(&triangle(0), &[m]);
        let b = arena.import_mesh(&triangle(0), &[m]);

        assert_eq!(arena.material(m).unwrap().parents(), &[a, b]);
        assert_eq!(arena.mesh_count(), 2);
        assert_eq!(arena.material_count(), 1);
    }

    #[test]
    fn out_of_range_material_is_ignored() {
        let mut arena = SceneArena::new();
        let m = arena.add_material(MaterialNode::new(ApiLevel::Level1, None));

        let mesh = arena.import_mesh(&triangle(5), &[m]);

        assert!(arena.mesh(mesh).unwrap().children().is_empty());
        assert!(arena.material(m).unwrap().parents().is_empty());
    }

    #[test]
    fn non_material_key_is_ignored() {
        let mut arena = SceneArena::new();
        let other = arena.import_mesh(&triangle(0), &[]);

        let mesh = arena.import_mesh(&triangle(0), &[other]);

        assert!(arena.mesh(mesh).unwrap().children().is_empty());
        assert_eq!(arena.mesh_material(mesh), None);
    }

    #[test]
    fn node_kinds() {
        let mut arena = SceneArena::new();
        let m = arena.add_material(MaterialNode::new(ApiLevel::Level1, None));
        let mesh = arena.import_mesh(&triangle(0), &[m]);

        assert_eq!(arena.get(m).unwrap().kind(), NodeKind::Material);
        assert_eq!(arena.get(mesh).unwrap().kind(), NodeKind::Mesh);
        assert!(arena.get(m).unwrap().as_mesh().is_none());
        assert_eq!(arena.get(mesh).unwrap().header().name.as_deref(), Some("tri"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn configured_api_level_is_stamped() {
        let config = MeshConfig {
            api_level: ApiLevel::Level2,
            ..MeshConfig::default()
        };
        let mut arena = SceneArena::with_config(config).unwrap();
        let mesh = arena.import_mesh(&triangle(0), &[]);
        assert_eq!(arena.mesh(mesh).unwrap().api(), ApiLevel::Level2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MeshConfig::default().with_hash_density(0.0);
        assert!(matches!(
            SceneArena::with_config(config),
            Err(crate::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn content_hashes_cover_every_mesh() {
        let mut arena = SceneArena::new();
        let m = arena.add_material(MaterialNode::new(ApiLevel::Level1, None));
        let a = arena.import_mesh(&triangle(0), &[m]);
        let b = arena.import_mesh(&triangle(0), &[m]);

        let hashes = arena.content_hashes();
        assert_eq!(hashes.len(), 2);
        // Same geometry, same hash
        assert_eq!(hashes[0].1, hashes[1].1);
        assert!(hashes.iter().any(|(k, _)| *k == a));
        assert!(hashes.iter().any(|(k, _)| *k == b));
        assert_eq!(arena.mesh(a).unwrap().cached_content_hash(), Some(hashes[0].1.as_str()));
    }

    #[test]
    fn export_resolves_material_index() {
        let mut arena = SceneArena::new();
        let m = arena.add_material(MaterialNode::new(ApiLevel::Level1, None));
        let mesh = arena.import_mesh(&triangle(0), &[m]);

        let mut mapping = FxHashMap::default();
        mapping.insert(m, 7);

        let exported = arena.export_mesh(mesh, &mapping).unwrap();
        assert_eq!(exported.material_index, 7);
        assert!(arena.export_mesh(m, &mapping).is_none());
    }
}
