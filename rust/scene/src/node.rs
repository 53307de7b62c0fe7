// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node header fields shared by every scene-graph node.

use uuid::Uuid;

/// Versioned face-encoding strategy a node was written with.
///
/// Only [`ApiLevel::Level1`] has an implemented face layout. The other
/// levels are reserved: meshes carrying them encode and decode without faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ApiLevel {
    /// Variable-arity faces stored as `[n, i0, i1, ..., n, i0, ...]`.
    #[default]
    Level1 = 1,
    /// Fixed-arity (triangle only) faces. Unimplemented.
    Level2 = 2,
    /// Compressed faces. Unimplemented.
    Level3 = 3,
}

impl ApiLevel {
    /// Returns the integer tag persisted in documents.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Parses a persisted integer tag.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(ApiLevel::Level1),
            2 => Some(ApiLevel::Level2),
            3 => Some(ApiLevel::Level3),
            _ => None,
        }
    }

    /// Whether faces can be encoded and decoded at this level.
    pub fn supports_faces(self) -> bool {
        matches!(self, ApiLevel::Level1)
    }
}

/// Discriminant for scene node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Mesh,
    Material,
}

impl NodeKind {
    /// Returns the type label as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "mesh",
            NodeKind::Material => "material",
        }
    }
}

/// Identity and versioning fields common to all nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub id: Uuid,
    pub api: ApiLevel,
    pub name: Option<String>,
}

impl NodeHeader {
    /// Creates a header with a fresh random id.
    pub fn new(api: ApiLevel, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            api,
            name,
        }
    }
}
