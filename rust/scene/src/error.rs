// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh construction and configuration.

/// Result type alias for scene operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building mesh nodes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A per-vertex attribute does not have one entry per vertex.
    #[error("{attribute} has {actual} entries, expected one per vertex ({expected})")]
    VertexAttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A face has fewer than three indices.
    #[error("face {face} has {arity} indices, at least 3 are required")]
    DegenerateFace { face: usize, arity: usize },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
