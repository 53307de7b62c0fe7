// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Meshdoc Scene
//!
//! Mesh nodes for a versioned scene-graph document store.
//!
//! A [`MeshNode`] holds immutable geometry buffers (vertices, optional
//! faces, normals, colors and UV channels) with bounds computed once at
//! construction. On top of it this crate provides read-only face queries,
//! a canonical content hash that is stable under rigid transforms and vertex
//! reordering, and conversion to and from the external importer's mesh
//! layout through a minimal [`SceneArena`].

pub mod bounds;
pub mod config;
pub mod error;
pub mod hash;
pub mod interop;
pub mod mesh;
pub mod node;
pub mod query;
pub mod scene;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use bounds::BoundingBox;
pub use config::{MeshConfig, MAX_HASH_DENSITY};
pub use error::{Error, Result};
pub use hash::{canonical_hash, hash_all, CanonicalFrame, HASH_FORMAT_VERSION};
pub use interop::{ExternalMesh, MAX_UV_CHANNELS};
pub use mesh::{Color4, Face, MeshBuilder, MeshNode, MeshParts};
pub use node::{ApiLevel, NodeHeader, NodeKind};
pub use scene::{MaterialNode, NodeKey, SceneArena, SceneNode};
