// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh node data structures

use std::sync::OnceLock;

use nalgebra::{Point2, Point3, Vector3};
use smallvec::SmallVec;

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::node::{ApiLevel, NodeHeader};
use crate::scene::NodeKey;

/// Polygon as an ordered list of vertex indices (arity >= 3).
pub type Face = SmallVec<[u32; 4]>;

/// RGBA vertex color
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Raw buffers a mesh node is reassembled from.
///
/// Used by decoders that must never fail: [`MeshNode::from_parts`] performs
/// no validation beyond normalising empty optional buffers to absent.
#[derive(Debug, Clone, Default)]
pub struct MeshParts {
    pub header: Option<NodeHeader>,
    pub vertices: Vec<Point3<f32>>,
    pub faces: Option<Vec<Face>>,
    pub normals: Option<Vec<Vector3<f32>>>,
    pub colors: Option<Vec<Color4>>,
    pub uv_channels: Option<Vec<Vec<Vector3<f32>>>>,
    /// Stored bounds. Computed from `vertices` when absent.
    pub bounding_box: Option<BoundingBox>,
    pub content_hash: Option<String>,
}

/// A single mesh node in the scene graph.
///
/// Immutable after construction except for the memoized content hash.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub(crate) header: NodeHeader,
    pub(crate) vertices: Vec<Point3<f32>>,
    pub(crate) faces: Option<Vec<Face>>,
    pub(crate) normals: Option<Vec<Vector3<f32>>>,
    pub(crate) colors: Option<Vec<Color4>>,
    pub(crate) uv_channels: Option<Vec<Vec<Vector3<f32>>>>,
    pub(crate) bounding_box: BoundingBox,
    pub(crate) outline: Option<Vec<Point2<f32>>>,
    pub(crate) content_hash: OnceLock<String>,
    pub(crate) children: Vec<NodeKey>,
}

impl MeshNode {
    /// Start building a mesh from its vertex positions.
    pub fn builder(vertices: Vec<Point3<f32>>) -> MeshBuilder {
        MeshBuilder::new(vertices)
    }

    /// Reassemble a node from decoded buffers.
    ///
    /// The outline is transient and is never restored here.
    pub fn from_parts(parts: MeshParts) -> Self {
        let bounding_box = parts
            .bounding_box
            .unwrap_or_else(|| BoundingBox::from_points(&parts.vertices));

        let content_hash = OnceLock::new();
        if let Some(hash) = parts.content_hash {
            let _ = content_hash.set(hash);
        }

        Self {
            header: parts
                .header
                .unwrap_or_else(|| NodeHeader::new(ApiLevel::default(), None)),
            vertices: parts.vertices,
            faces: non_empty(parts.faces),
            normals: non_empty(parts.normals),
            colors: non_empty(parts.colors),
            uv_channels: non_empty(parts.uv_channels.map(pin_uv_channels)),
            bounding_box,
            outline: None,
            content_hash,
            children: Vec::new(),
        }
    }

    /// Build a node with bounds and outline derived from the vertices.
    pub(crate) fn assemble(
        header: NodeHeader,
        vertices: Vec<Point3<f32>>,
        faces: Option<Vec<Face>>,
        normals: Option<Vec<Vector3<f32>>>,
        colors: Option<Vec<Color4>>,
        uv_channels: Option<Vec<Vec<Vector3<f32>>>>,
        children: Vec<NodeKey>,
    ) -> Self {
        let bounding_box = BoundingBox::from_points(&vertices);
        let outline = Some(bounding_box.to_outline());
        Self {
            header,
            vertices,
            faces: non_empty(faces),
            normals: non_empty(normals),
            colors: non_empty(colors),
            uv_channels: non_empty(uv_channels.map(pin_uv_channels)),
            bounding_box,
            outline,
            content_hash: OnceLock::new(),
            children,
        }
    }

    #[inline]
    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    #[inline]
    pub fn id(&self) -> uuid::Uuid {
        self.header.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.header.name.as_deref()
    }

    #[inline]
    pub fn api(&self) -> ApiLevel {
        self.header.api
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn faces(&self) -> Option<&[Face]> {
        self.faces.as_deref()
    }

    /// Get face count (zero when faces are absent)
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn normals(&self) -> Option<&[Vector3<f32>]> {
        self.normals.as_deref()
    }

    #[inline]
    pub fn colors(&self) -> Option<&[Color4]> {
        self.colors.as_deref()
    }

    #[inline]
    pub fn uv_channels(&self) -> Option<&[Vec<Vector3<f32>>]> {
        self.uv_channels.as_deref()
    }

    /// Returns one UV channel, if present.
    pub fn uv_channel(&self, channel: usize) -> Option<&[Vector3<f32>]> {
        self.uv_channels
            .as_ref()
            .and_then(|channels| channels.get(channel))
            .map(Vec::as_slice)
    }

    /// Number of UV channels (zero when absent)
    #[inline]
    pub fn uv_channel_count(&self) -> usize {
        self.uv_channels.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// XY outline derived from the bounding box. Absent on decoded nodes.
    #[inline]
    pub fn outline(&self) -> Option<&[Point2<f32>]> {
        self.outline.as_deref()
    }

    /// Child nodes in insertion order (at most one material).
    #[inline]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Returns the content hash if it has been computed or decoded.
    #[inline]
    pub fn cached_content_hash(&self) -> Option<&str> {
        self.content_hash.get().map(String::as_str)
    }

    /// Forget the memoized content hash so the next request recomputes it.
    pub fn reset_content_hash(&mut self) {
        self.content_hash.take();
    }

    /// Check if mesh has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Field-wise equality over identity, geometry, bounds and content hash.
///
/// The outline and graph relations are excluded: neither is persisted.
impl PartialEq for MeshNode {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.vertices == other.vertices
            && self.faces == other.faces
            && self.normals == other.normals
            && self.colors == other.colors
            && self.uv_channels == other.uv_channels
            && self.bounding_box == other.bounding_box
            && self.content_hash.get() == other.content_hash.get()
    }
}

/// Validating constructor for meshes held as raw buffers.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    name: Option<String>,
    api: ApiLevel,
    vertices: Vec<Point3<f32>>,
    faces: Option<Vec<Face>>,
    normals: Option<Vec<Vector3<f32>>>,
    colors: Option<Vec<Color4>>,
    uv_channels: Vec<Vec<Vector3<f32>>>,
}

impl MeshBuilder {
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        Self {
            name: None,
            api: ApiLevel::default(),
            vertices,
            faces: None,
            normals: None,
            colors: None,
            uv_channels: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn api(mut self, api: ApiLevel) -> Self {
        self.api = api;
        self
    }

    /// Set faces from any iterable of index lists.
    pub fn faces<I, F>(mut self, faces: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u32]>,
    {
        self.faces = Some(
            faces
                .into_iter()
                .map(|f| Face::from_slice(f.as_ref()))
                .collect(),
        );
        self
    }

    pub fn normals(mut self, normals: Vec<Vector3<f32>>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn colors(mut self, colors: Vec<Color4>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Append a UV channel given as 2D coordinates.
    pub fn uv_channel(mut self, uvs: Vec<Point2<f32>>) -> Self {
        self.uv_channels
            .push(uvs.into_iter().map(|uv| Vector3::new(uv.x, uv.y, 0.0)).collect());
        self
    }

    /// Validate the buffers and build the node.
    pub fn build(self) -> Result<MeshNode> {
        let vertex_count = self.vertices.len();

        check_per_vertex("normals", self.normals.as_ref().map(Vec::len), vertex_count)?;
        check_per_vertex("colors", self.colors.as_ref().map(Vec::len), vertex_count)?;
        for channel in &self.uv_channels {
            check_per_vertex("uv channel", Some(channel.len()), vertex_count)?;
        }

        if let Some(faces) = &self.faces {
            for (face_idx, face) in faces.iter().enumerate() {
                if face.len() < 3 {
                    return Err(Error::DegenerateFace {
                        face: face_idx,
                        arity: face.len(),
                    });
                }
                if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(Error::FaceIndexOutOfRange {
                        face: face_idx,
                        index,
                        vertex_count,
                    });
                }
            }
        }

        Ok(MeshNode::assemble(
            NodeHeader::new(self.api, self.name),
            self.vertices,
            self.faces,
            self.normals,
            self.colors,
            Some(self.uv_channels),
            Vec::new(),
        ))
    }
}

fn check_per_vertex(attribute: &'static str, len: Option<usize>, expected: usize) -> Result<()> {
    match len {
        Some(actual) if actual != expected => Err(Error::VertexAttributeLength {
            attribute,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Empty optional buffers are stored as absent.
fn non_empty<T>(buffer: Option<Vec<T>>) -> Option<Vec<T>> {
    buffer.filter(|b| !b.is_empty())
}

/// UV coordinates are 2D; the third component is always zero.
fn pin_uv_channels(mut channels: Vec<Vec<Vector3<f32>>>) -> Vec<Vec<Vector3<f32>>> {
    for uv in channels.iter_mut().flatten() {
        uv.z = 0.0;
    }
    channels
}
