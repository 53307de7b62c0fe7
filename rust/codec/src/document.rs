// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted document model: a flat map of labels to typed values.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Field labels used by mesh documents.
pub mod labels {
    pub const ID: &str = "_id";
    pub const TYPE: &str = "type";
    pub const API: &str = "api";
    pub const NAME: &str = "name";

    pub const VERTICES: &str = "vertices";
    pub const VERTICES_COUNT: &str = "vertices_count";
    pub const VERTICES_BYTE_COUNT: &str = "vertices_byte_count";

    pub const FACES: &str = "faces";
    pub const FACES_COUNT: &str = "faces_count";
    pub const FACES_BYTE_COUNT: &str = "faces_byte_count";

    pub const NORMALS: &str = "normals";
    pub const COLORS: &str = "colors";

    pub const UV_CHANNELS: &str = "uv_channels";
    pub const UV_CHANNELS_COUNT: &str = "uv_channels_count";
    pub const UV_CHANNELS_BYTE_COUNT: &str = "uv_channels_byte_count";

    pub const BOUNDING_BOX: &str = "bounding_box";
    pub const SHA256: &str = "sha256";

    /// Reserved. Never written and ignored on read.
    pub const OUTLINE: &str = "outline";
}

/// A typed value stored in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocValue {
    Int(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Uuid(Uuid),
    Array(Vec<DocValue>),
}

impl DocValue {
    /// Numeric value as f64, accepting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Double(v) => Some(*v),
            DocValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// A persisted node document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: FxHashMap<String, DocValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any existing value.
    pub fn insert(&mut self, label: impl Into<String>, value: DocValue) {
        self.fields.insert(label.into(), value);
    }

    pub fn remove(&mut self, label: &str) -> Option<DocValue> {
        self.fields.remove(label)
    }

    pub fn get(&self, label: &str) -> Option<&DocValue> {
        self.fields.get(label)
    }

    pub fn has_field(&self, label: &str) -> bool {
        self.fields.contains_key(label)
    }

    pub fn get_int(&self, label: &str) -> Option<i64> {
        match self.fields.get(label)? {
            DocValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer field usable as a count or length (non-negative).
    pub fn get_count(&self, label: &str) -> Option<usize> {
        self.get_int(label).and_then(|v| usize::try_from(v).ok())
    }

    pub fn get_str(&self, label: &str) -> Option<&str> {
        match self.fields.get(label)? {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_binary(&self, label: &str) -> Option<&[u8]> {
        match self.fields.get(label)? {
            DocValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_uuid(&self, label: &str) -> Option<Uuid> {
        match self.fields.get(label)? {
            DocValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    pub fn get_array(&self, label: &str) -> Option<&[DocValue]> {
        match self.fields.get(label)? {
            DocValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serializes the document to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
