// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion between mesh nodes and the external importer's mesh layout.
//!
//! The external representation never shares storage with a node: every
//! buffer is deep-copied in both directions.

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

use crate::mesh::{Color4, Face, MeshNode};
use crate::node::{ApiLevel, NodeHeader};
use crate::scene::NodeKey;

/// Maximum number of UV channels the external representation carries.
pub const MAX_UV_CHANNELS: usize = 8;

/// Mesh as produced and consumed by the external mesh library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalMesh {
    pub name: String,
    pub vertices: Vec<Point3<f32>>,
    /// Variable-arity faces. Empty when the mesh has no faces.
    pub faces: Vec<Face>,
    pub normals: Option<Vec<Vector3<f32>>>,
    /// First color layer only.
    pub colors: Option<Vec<Color4>>,
    /// UV(W) channels, at most [`MAX_UV_CHANNELS`].
    pub uv_channels: Vec<Vec<Vector3<f32>>>,
    /// Components used per UV channel (2 for UV).
    pub uv_components: Vec<u32>,
    /// Index into the scene's material list.
    pub material_index: u32,
}

impl ExternalMesh {
    #[inline]
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        self.normals.as_ref().is_some_and(|n| !n.is_empty())
    }

    #[inline]
    pub fn has_vertex_colors(&self) -> bool {
        self.colors.as_ref().is_some_and(|c| !c.is_empty())
    }
}

impl MeshNode {
    /// Creates a node from an external mesh.
    ///
    /// `material` is the already-resolved material the node will own as its
    /// single child; the caller records the reciprocal back-reference.
    pub fn from_external(api: ApiLevel, external: &ExternalMesh, material: Option<NodeKey>) -> Self {
        let vertex_count = external.vertices.len();

        // Faces below arity 3 or indexing past the vertex buffer are dropped
        let faces: Vec<Face> = external
            .faces
            .iter()
            .filter(|face| face.len() >= 3 && face.iter().all(|&i| (i as usize) < vertex_count))
            .cloned()
            .collect();
        let skipped = external.faces.len() - faces.len();
        if skipped > 0 {
            tracing::debug!(
                mesh = %external.name,
                skipped,
                kept = faces.len(),
                "Skipping invalid faces on import"
            );
        }
        let faces = (!faces.is_empty()).then_some(faces);

        // Per-vertex buffers are copied for exactly one entry per vertex
        let normals = external
            .normals
            .as_ref()
            .filter(|n| n.len() >= vertex_count)
            .map(|n| n[..vertex_count].to_vec());

        let colors = external
            .colors
            .as_ref()
            .filter(|c| c.len() >= vertex_count)
            .map(|c| c[..vertex_count].to_vec());

        let uv_channels: Vec<Vec<Vector3<f32>>> = external
            .uv_channels
            .iter()
            .take(MAX_UV_CHANNELS)
            .take_while(|channel| channel.len() >= vertex_count)
            .map(|channel| channel[..vertex_count].to_vec())
            .collect();

        let name = (!external.name.is_empty()).then(|| external.name.clone());

        MeshNode::assemble(
            NodeHeader::new(api, name),
            external.vertices.clone(),
            faces,
            normals,
            colors,
            Some(uv_channels),
            material.into_iter().collect(),
        )
    }

    /// Creates a fresh external mesh from this node.
    ///
    /// The material index is the mapping of the first child found in
    /// `material_mapping`, scanning children in order; zero when none maps.
    pub fn to_external(&self, material_mapping: &FxHashMap<NodeKey, u32>) -> ExternalMesh {
        let uv_channels: Vec<Vec<Vector3<f32>>> = self
            .uv_channels()
            .unwrap_or_default()
            .iter()
            .take(MAX_UV_CHANNELS)
            .cloned()
            .collect();
        let uv_components = vec![2; uv_channels.len()];

        let material_index = self
            .children
            .iter()
            .find_map(|child| material_mapping.get(child).copied())
            .unwrap_or(0);

        ExternalMesh {
            name: self.name().unwrap_or_default().to_string(),
            vertices: self.vertices.clone(),
            faces: self.faces.clone().unwrap_or_default(),
            normals: self.normals.clone(),
            colors: self.colors.clone(),
            uv_channels,
            uv_components,
            material_index,
        }
    }
}
