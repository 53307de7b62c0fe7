// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face buffer layouts selected by API level.
//!
//! Level 1 stores every face as its index count followed by its indices,
//! `[n1, i, i, ..., n2, i, i, ...]`, so mixed arities round-trip exactly.
//! Levels 2 (triangles only) and 3 (compressed) are reserved.

use meshdoc_scene::{ApiLevel, Face};

use crate::transcoder;

/// Flattens faces into the word layout of `api`.
///
/// Returns `None` for levels without an implemented layout.
pub fn flatten(api: ApiLevel, faces: &[Face]) -> Option<Vec<u32>> {
    match api {
        ApiLevel::Level1 => {
            let total: usize = faces.iter().map(|f| f.len() + 1).sum();
            let mut words = Vec::with_capacity(total);
            for face in faces {
                words.push(face.len() as u32);
                words.extend_from_slice(face);
            }
            Some(words)
        }
        ApiLevel::Level2 | ApiLevel::Level3 => None,
    }
}

/// Reads `face_count` faces from a face blob written at level `api`.
///
/// Returns `None` when the level has no layout or the data is malformed:
/// truncated, a face with fewer than three indices, or an index not below
/// `vertex_count`.
pub fn retrieve(
    api: ApiLevel,
    blob: &[u8],
    byte_count: usize,
    face_count: usize,
    vertex_count: usize,
) -> Option<Vec<Face>> {
    match api {
        ApiLevel::Level1 => {
            let words = transcoder::decode_u32s(blob, byte_count)?;
            retrieve_level1(&words, face_count, vertex_count)
        }
        ApiLevel::Level2 | ApiLevel::Level3 => None,
    }
}

fn retrieve_level1(words: &[u32], face_count: usize, vertex_count: usize) -> Option<Vec<Face>> {
    let mut faces = Vec::with_capacity(face_count.min(words.len()));
    let mut cursor = 0usize;

    for _ in 0..face_count {
        let arity = *words.get(cursor)? as usize;
        if arity < 3 {
            return None;
        }
        let indices = words.get(cursor + 1..cursor + 1 + arity)?;
        if indices.iter().any(|&i| i as usize >= vertex_count) {
            return None;
        }
        faces.push(Face::from_slice(indices));
        cursor += arity + 1;
    }

    Some(faces)
}
