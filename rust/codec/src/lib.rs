// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Meshdoc Codec
//!
//! Converts mesh nodes to and from flat documents of typed fields.
//!
//! Geometry buffers are stored as little-endian binary blobs next to the
//! counts needed to read them back. Decoding is total: a document missing
//! a field group, or carrying one that is malformed, still yields a mesh
//! node with that group absent.
//!
//! ```rust,ignore
//! use meshdoc_codec::{decode, encode};
//!
//! let doc = encode(&mesh);
//! let restored = decode(&doc);
//! assert_eq!(restored, mesh);
//! ```

pub mod document;
pub mod error;
pub mod faces;
pub mod mesh;
pub mod transcoder;

pub use document::{labels, DocValue, Document};
pub use error::{Error, Result};
pub use mesh::{decode, decode_json, encode, encode_json};
