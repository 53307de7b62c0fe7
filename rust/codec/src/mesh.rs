// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh node encoding and decoding.
//!
//! Both directions are total. Decoding reads every field group
//! independently: a group whose companion metadata is missing, or whose
//! blob does not hold the declared data, is skipped as a whole and logged.

use meshdoc_scene::{
    ApiLevel, BoundingBox, Color4, MeshNode, MeshParts, NodeHeader, NodeKind, Point3, Vector3,
};
use uuid::Uuid;

use crate::document::{labels, DocValue, Document};
use crate::error::Result;
use crate::{faces, transcoder};

/// Encodes a mesh node into a document.
///
/// The content hash is written only if it was already computed or decoded;
/// encoding never computes it. The outline is never written.
pub fn encode(mesh: &MeshNode) -> Document {
    let mut doc = Document::new();
    let header = mesh.header();

    doc.insert(labels::ID, DocValue::Uuid(header.id));
    doc.insert(labels::TYPE, DocValue::String(NodeKind::Mesh.as_str().to_string()));
    doc.insert(labels::API, DocValue::Int(header.api.as_i64()));
    if let Some(name) = &header.name {
        doc.insert(labels::NAME, DocValue::String(name.clone()));
    }

    // Vertices
    if !mesh.is_empty() {
        let blob = transcoder::encode_f32_tuples(mesh.vertices().iter().map(|v| [v.x, v.y, v.z]));
        doc.insert(labels::VERTICES_COUNT, DocValue::Int(mesh.vertex_count() as i64));
        doc.insert(labels::VERTICES_BYTE_COUNT, DocValue::Int(blob.len() as i64));
        doc.insert(labels::VERTICES, DocValue::Binary(blob));
    }

    // Faces
    if let Some(mesh_faces) = mesh.faces() {
        match faces::flatten(header.api, mesh_faces) {
            Some(words) => {
                let blob = transcoder::encode_u32s(&words);
                doc.insert(labels::FACES_COUNT, DocValue::Int(mesh_faces.len() as i64));
                doc.insert(labels::FACES_BYTE_COUNT, DocValue::Int(blob.len() as i64));
                doc.insert(labels::FACES, DocValue::Binary(blob));
            }
            None => {
                tracing::warn!(
                    mesh = %header.id,
                    api = header.api.as_i64(),
                    faces = mesh_faces.len(),
                    "Face encoding not implemented for API level, faces not written"
                );
            }
        }
    }

    // Normals
    if let Some(normals) = mesh.normals() {
        let blob = transcoder::encode_f32_tuples(normals.iter().map(|n| [n.x, n.y, n.z]));
        doc.insert(labels::NORMALS, DocValue::Binary(blob));
    }

    // Vertex colors
    if let Some(colors) = mesh.colors() {
        let blob = transcoder::encode_f32_tuples(colors.iter().map(|c| [c.r, c.g, c.b, c.a]));
        doc.insert(labels::COLORS, DocValue::Binary(blob));
    }

    // UV channels, concatenated channel by channel
    if let Some(channels) = mesh.uv_channels() {
        let blob = transcoder::encode_f32_tuples(channels.iter().flatten().map(|uv| [uv.x, uv.y]));
        doc.insert(labels::UV_CHANNELS_COUNT, DocValue::Int(channels.len() as i64));
        doc.insert(labels::UV_CHANNELS_BYTE_COUNT, DocValue::Int(blob.len() as i64));
        doc.insert(labels::UV_CHANNELS, DocValue::Binary(blob));
    }

    // Bounding box
    let bbox = mesh.bounding_box();
    doc.insert(
        labels::BOUNDING_BOX,
        DocValue::Array(vec![corner_value(&bbox.min), corner_value(&bbox.max)]),
    );

    // SHA-256 content hash
    if let Some(hash) = mesh.cached_content_hash() {
        doc.insert(labels::SHA256, DocValue::String(hash.to_string()));
    }

    tracing::debug!(
        mesh = %header.id,
        fields = doc.len(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Encoded mesh document"
    );

    doc
}

/// Decodes a mesh node from a document.
///
/// Missing identity fields are replaced: a fresh id, API level 1. A document
/// carrying an unknown API level decodes without faces.
pub fn decode(doc: &Document) -> MeshNode {
    let api_tag = doc.get_int(labels::API);
    let api = match api_tag {
        None => Some(ApiLevel::default()),
        Some(tag) => {
            let level = ApiLevel::from_i64(tag);
            if level.is_none() {
                tracing::warn!(api = tag, "Unknown API level in mesh document");
            }
            level
        }
    };

    let header = NodeHeader {
        id: doc.get_uuid(labels::ID).unwrap_or_else(Uuid::new_v4),
        api: api.unwrap_or_default(),
        name: doc.get_str(labels::NAME).map(str::to_string),
    };

    // Per-vertex groups are only read against vertices that decoded
    let decoded_vertices = decode_vertices(doc, doc.get_count(labels::VERTICES_COUNT));
    let vertex_count = decoded_vertices.as_ref().map(Vec::len);
    let vertices = decoded_vertices.unwrap_or_default();

    let faces = api.and_then(|level| decode_faces(doc, level, vertices.len()));

    let normals = decode_per_vertex::<3>(doc, labels::NORMALS, vertex_count)
        .map(|items| items.into_iter().map(|[x, y, z]| Vector3::new(x, y, z)).collect());

    let colors = decode_per_vertex::<4>(doc, labels::COLORS, vertex_count)
        .map(|items| items.into_iter().map(|[r, g, b, a]| Color4::new(r, g, b, a)).collect());

    let uv_channels = decode_uv_channels(doc, vertex_count);

    let bounding_box = decode_bounding_box(doc);

    let content_hash = doc.get_str(labels::SHA256).map(str::to_string);

    MeshNode::from_parts(MeshParts {
        header: Some(header),
        vertices,
        faces,
        normals,
        colors,
        uv_channels,
        bounding_box,
        content_hash,
    })
}

/// Encodes a mesh node straight to JSON.
pub fn encode_json(mesh: &MeshNode) -> Result<String> {
    encode(mesh).to_json()
}

/// Decodes a mesh node from a JSON document.
pub fn decode_json(json: &str) -> Result<MeshNode> {
    Ok(decode(&Document::from_json(json)?))
}

fn corner_value(p: &Point3<f32>) -> DocValue {
    DocValue::Array(vec![
        DocValue::Double(p.x as f64),
        DocValue::Double(p.y as f64),
        DocValue::Double(p.z as f64),
    ])
}

fn skip_group(group: &'static str, reason: &'static str) {
    tracing::warn!(group, reason, "Skipping mesh document field group");
}

fn decode_vertices(doc: &Document, vertex_count: Option<usize>) -> Option<Vec<Point3<f32>>> {
    let blob = doc.get_binary(labels::VERTICES)?;
    let Some(count) = vertex_count else {
        skip_group(labels::VERTICES, "missing vertex count");
        return None;
    };
    let Some(items) = transcoder::decode_f32_tuples::<3>(blob, count) else {
        skip_group(labels::VERTICES, "blob shorter than vertex count");
        return None;
    };
    Some(items.into_iter().map(|[x, y, z]| Point3::new(x, y, z)).collect())
}

fn decode_faces(
    doc: &Document,
    api: ApiLevel,
    vertex_count: usize,
) -> Option<Vec<meshdoc_scene::Face>> {
    let blob = doc.get_binary(labels::FACES)?;
    let (Some(face_count), Some(byte_count)) = (
        doc.get_count(labels::FACES_COUNT),
        doc.get_count(labels::FACES_BYTE_COUNT),
    ) else {
        skip_group(labels::FACES, "missing face count or byte count");
        return None;
    };

    if !api.supports_faces() {
        tracing::warn!(
            api = api.as_i64(),
            faces = face_count,
            "Face decoding not implemented for API level, faces dropped"
        );
        return None;
    }

    let decoded = faces::retrieve(api, blob, byte_count, face_count, vertex_count);
    if decoded.is_none() {
        skip_group(labels::FACES, "malformed face data");
    }
    decoded
}

fn decode_per_vertex<const N: usize>(
    doc: &Document,
    label: &'static str,
    vertex_count: Option<usize>,
) -> Option<Vec<[f32; N]>> {
    let blob = doc.get_binary(label)?;
    let Some(count) = vertex_count else {
        skip_group(label, "vertices missing or malformed");
        return None;
    };
    let items = transcoder::decode_f32_tuples::<N>(blob, count);
    if items.is_none() {
        skip_group(label, "blob shorter than vertex count");
    }
    items
}

fn decode_uv_channels(
    doc: &Document,
    vertex_count: Option<usize>,
) -> Option<Vec<Vec<Vector3<f32>>>> {
    let blob = doc.get_binary(labels::UV_CHANNELS)?;
    let (Some(channel_count), Some(byte_count), Some(vertex_count)) = (
        doc.get_count(labels::UV_CHANNELS_COUNT),
        doc.get_count(labels::UV_CHANNELS_BYTE_COUNT),
        vertex_count,
    ) else {
        skip_group(labels::UV_CHANNELS, "missing channel counts or vertices");
        return None;
    };

    if channel_count == 0 || vertex_count == 0 {
        return None;
    }

    let Some(data) = blob.get(..byte_count) else {
        skip_group(labels::UV_CHANNELS, "byte count past end of blob");
        return None;
    };
    let Some(concatenated) = channel_count
        .checked_mul(vertex_count)
        .and_then(|total| transcoder::decode_f32_tuples::<2>(data, total))
    else {
        skip_group(labels::UV_CHANNELS, "blob shorter than channels x vertices");
        return None;
    };

    Some(
        concatenated
            .chunks_exact(vertex_count)
            .map(|channel| {
                channel
                    .iter()
                    .map(|&[u, v]| Vector3::new(u, v, 0.0))
                    .collect()
            })
            .collect(),
    )
}

fn decode_bounding_box(doc: &Document) -> Option<BoundingBox> {
    let corners = doc.get_array(labels::BOUNDING_BOX)?;
    let parsed = match corners {
        [min, max] => corner_point(min).zip(corner_point(max)),
        _ => None,
    };
    if parsed.is_none() {
        skip_group(labels::BOUNDING_BOX, "malformed corners, recomputing from vertices");
    }
    parsed.map(|(min, max)| BoundingBox::new(min, max))
}

fn corner_point(value: &DocValue) -> Option<Point3<f32>> {
    let DocValue::Array(coords) = value else {
        return None;
    };
    match coords.as_slice() {
        [x, y, z] => Some(Point3::new(
            x.as_f64()? as f32,
            y.as_f64()? as f32,
            z.as_f64()? as f32,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshdoc_scene::Point2;

    fn sample() -> MeshNode {
        MeshNode::builder(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ])
        .name("pyramid")
        .faces([vec![0u32, 3, 2, 1], vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]])
        .normals(vec![Vector3::new(0.0, 0.0, 1.0); 5])
        .colors(vec![Color4::new(0.2, 0.4, 0.6, 1.0); 5])
        .uv_channel(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0), Point2::new(0.5, 0.5)])
        .uv_channel(vec![Point2::new(0.25, 0.75); 5])
        .build()
        .unwrap()
    }

    #[test]
    fn writes_expected_fields() {
        let doc = encode(&sample());

        assert_eq!(doc.get_str(labels::TYPE), Some("mesh"));
        assert_eq!(doc.get_int(labels::API), Some(1));
        assert_eq!(doc.get_str(labels::NAME), Some("pyramid"));
        assert_eq!(doc.get_int(labels::VERTICES_COUNT), Some(5));
        assert_eq!(doc.get_int(labels::VERTICES_BYTE_COUNT), Some(60));
        assert_eq!(doc.get_int(labels::FACES_COUNT), Some(5));
        // 4 + 1 words for the quad, 3 + 1 for each of 4 triangles
        assert_eq!(doc.get_int(labels::FACES_BYTE_COUNT), Some((5 + 4 * 4) * 4));
        assert_eq!(doc.get_binary(labels::NORMALS).map(<[u8]>::len), Some(60));
        assert_eq!(doc.get_binary(labels::COLORS).map(<[u8]>::len), Some(80));
        assert_eq!(doc.get_int(labels::UV_CHANNELS_COUNT), Some(2));
        assert_eq!(doc.get_int(labels::UV_CHANNELS_BYTE_COUNT), Some(2 * 5 * 8));
        assert!(doc.has_field(labels::BOUNDING_BOX));
        assert!(!doc.has_field(labels::OUTLINE));
        assert!(!doc.has_field(labels::SHA256));
    }

    #[test]
    fn roundtrip_all_fields() {
        let mesh = sample();
        let decoded = decode(&encode(&mesh));
        assert_eq!(decoded, mesh);
        assert!(decoded.outline().is_none());
    }

    #[test]
    fn uv_channels_are_channel_major() {
        let doc = encode(&sample());
        let blob = doc.get_binary(labels::UV_CHANNELS).unwrap();
        let flat: Vec<[f32; 2]> = transcoder::decode_f32_tuples(blob, 10).unwrap();
        assert_eq!(flat[1], [1.0, 0.0]);
        assert_eq!(flat[5], [0.25, 0.75]);
    }

    #[test]
    fn encode_does_not_compute_hash() {
        let mesh = sample();
        let doc = encode(&mesh);
        assert!(!doc.has_field(labels::SHA256));
        assert!(mesh.cached_content_hash().is_none());
    }

    #[test]
    fn computed_hash_survives_roundtrip() {
        let mesh = sample();
        let hash = mesh.content_hash().to_string();
        let decoded = decode(&encode(&mesh));
        assert_eq!(decoded.cached_content_hash(), Some(hash.as_str()));
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn missing_normals_decode_as_absent() {
        let mut doc = encode(&sample());
        doc.remove(labels::NORMALS);
        let decoded = decode(&doc);
        assert!(decoded.normals().is_none());
        assert_eq!(decoded.vertex_count(), 5);
    }

    #[test]
    fn missing_vertex_count_skips_dependent_groups() {
        let mut doc = encode(&sample());
        doc.remove(labels::VERTICES_COUNT);
        let decoded = decode(&doc);
        assert!(decoded.is_empty());
        assert!(decoded.normals().is_none());
        assert!(decoded.colors().is_none());
        assert!(decoded.uv_channels().is_none());
        // Faces reference vertices that no longer exist
        assert!(decoded.faces().is_none());
    }

    #[test]
    fn missing_face_byte_count_skips_faces() {
        let mut doc = encode(&sample());
        doc.remove(labels::FACES_BYTE_COUNT);
        let decoded = decode(&doc);
        assert!(decoded.faces().is_none());
        assert_eq!(decoded.vertex_count(), 5);
    }

    #[test]
    fn missing_uv_counts_skip_uv_group() {
        for label in [labels::UV_CHANNELS_COUNT, labels::UV_CHANNELS_BYTE_COUNT] {
            let mut doc = encode(&sample());
            doc.remove(label);
            let decoded = decode(&doc);
            assert!(decoded.uv_channels().is_none());
            assert_eq!(decoded.uv_channel_count(), 0);
            assert_eq!(decoded.vertex_count(), 5);
            assert!(decoded.normals().is_some());
        }
    }

    #[test]
    fn reserved_levels_decode_without_faces() {
        for level in [ApiLevel::Level2, ApiLevel::Level3] {
            let mut doc = encode(&sample());
            doc.insert(labels::API, DocValue::Int(level.as_i64()));
            let decoded = decode(&doc);
            assert_eq!(decoded.api(), level);
            assert!(decoded.faces().is_none());
            assert_eq!(decoded.vertex_count(), 5);
        }
    }

    #[test]
    fn reserved_levels_encode_without_faces() {
        let mesh = MeshNode::builder(vec![Point3::origin(); 3])
            .api(ApiLevel::Level2)
            .faces([[0u32, 1, 2]])
            .build()
            .unwrap();
        let doc = encode(&mesh);
        assert!(!doc.has_field(labels::FACES));
        assert!(!doc.has_field(labels::FACES_COUNT));
        assert_eq!(doc.get_int(labels::API), Some(2));
    }

    #[test]
    fn unknown_level_decodes_without_faces() {
        let mut doc = encode(&sample());
        doc.insert(labels::API, DocValue::Int(9));
        let decoded = decode(&doc);
        assert!(decoded.faces().is_none());
    }

    #[test]
    fn outline_is_ignored() {
        let mut doc = encode(&sample());
        doc.insert(labels::OUTLINE, DocValue::Binary(vec![0; 32]));
        assert!(decode(&doc).outline().is_none());
    }

    #[test]
    fn bounding_box_falls_back_to_vertices() {
        let mesh = sample();
        let mut doc = encode(&mesh);
        doc.insert(labels::BOUNDING_BOX, DocValue::String("bogus".into()));
        let decoded = decode(&doc);
        assert_eq!(decoded.bounding_box(), mesh.bounding_box());

        doc.remove(labels::BOUNDING_BOX);
        assert_eq!(decode(&doc).bounding_box(), mesh.bounding_box());
    }

    #[test]
    fn empty_document_decodes() {
        let decoded = decode(&Document::new());
        assert!(decoded.is_empty());
        assert!(decoded.faces().is_none());
        assert_eq!(decoded.api(), ApiLevel::Level1);
    }

    #[test]
    fn json_roundtrip() {
        let mesh = sample();
        let json = encode_json(&mesh).unwrap();
        assert_eq!(decode_json(&json).unwrap(), mesh);
    }
}
