// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical content hashing of mesh geometry.
//!
//! The hash identifies geometrically identical meshes regardless of the
//! rigid transform they were imported with and of the order of their
//! vertices:
//!
//! 1. Vertices are deduplicated by exact value.
//! 2. The unique points are re-expressed in their principal-component frame.
//! 3. Each canonical coordinate is normalized to `[0, 1]` by the canonical
//!    bounding box and quantized onto an integer lattice of `density` cells.
//! 4. Lattice coordinates are combined into one scalar per vertex, sorted,
//!    serialized together with the rounded canonical spans and digested with
//!    SHA-256.
//!
//! The lattice combination `x + round(d * y) + round(d^2 * z)` is not
//! injective. It is frozen as format version [`HASH_FORMAT_VERSION`]; any
//! change to it must bump that version since hashes are compared across
//! stored documents.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::config::MeshConfig;
use crate::mesh::MeshNode;

/// Version of the lattice combination and buffer layout.
pub const HASH_FORMAT_VERSION: u32 = 1;

impl MeshNode {
    /// Returns the content hash, computing it with the default configuration
    /// on first use.
    pub fn content_hash(&self) -> &str {
        self.content_hash_with(&MeshConfig::default())
    }

    /// Returns the content hash, computing it with `config` on first use.
    ///
    /// The result is memoized: once set (computed or decoded) it is returned
    /// unchanged until [`MeshNode::reset_content_hash`] is called, whatever
    /// configuration later callers pass. Concurrent first calls are
    /// serialized and all observe the same value.
    pub fn content_hash_with(&self, config: &MeshConfig) -> &str {
        self.content_hash.get_or_init(|| {
            let hash = canonical_hash(&self.vertices, config.hash_density, config.span_digits);
            tracing::debug!(
                mesh = %self.header.id,
                vertices = self.vertices.len(),
                density = config.hash_density,
                hash = %hash,
                "Computed canonical content hash"
            );
            hash
        })
    }
}

/// Hashes a collection of meshes in parallel.
///
/// Each mesh memoizes its own hash, so meshes that already carry one are not
/// recomputed.
pub fn hash_all(meshes: &[MeshNode], config: &MeshConfig) -> Vec<String> {
    meshes
        .par_iter()
        .map(|mesh| mesh.content_hash_with(config).to_string())
        .collect()
}

/// Principal-component frame of a point set.
#[derive(Debug, Clone)]
pub struct CanonicalFrame {
    /// Mean of the points.
    pub centroid: Vector3<f64>,
    /// Unit axes sorted by descending variance.
    pub axes: [Vector3<f64>; 3],
}

impl CanonicalFrame {
    /// Computes the frame of a point set.
    ///
    /// Each axis is oriented so that the third central moment of the
    /// projections onto it is non-negative, which makes the frame a function
    /// of the point set alone. An empty set yields the identity frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        if points.is_empty() {
            return Self {
                centroid: Vector3::zeros(),
                axes: [Vector3::x(), Vector3::y(), Vector3::z()],
            };
        }

        let count = points.len() as f64;
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords)
            / count;

        let mut covariance = Matrix3::zeros();
        for p in points {
            let d = p.coords - centroid;
            covariance += d * d.transpose();
        }
        covariance /= count;

        let eigen = SymmetricEigen::new(covariance);
        let eigenvalues = eigen.eigenvalues;

        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let axes = order.map(|i| {
            let axis: Vector3<f64> = eigen.eigenvectors.column(i).into_owned();
            let skew: f64 = points
                .iter()
                .map(|p| axis.dot(&(p.coords - centroid)).powi(3))
                .sum();
            if skew < 0.0 {
                -axis
            } else {
                axis
            }
        });

        Self { centroid, axes }
    }

    /// Re-expresses a point in this frame.
    #[inline]
    pub fn to_local(&self, point: &Point3<f64>) -> Vector3<f64> {
        let d = point.coords - self.centroid;
        Vector3::new(self.axes[0].dot(&d), self.axes[1].dot(&d), self.axes[2].dot(&d))
    }
}

/// Computes the canonical content hash of a vertex buffer.
///
/// Returns the lowercase hex SHA-256 digest.
pub fn canonical_hash(vertices: &[Point3<f32>], density: f64, span_digits: u32) -> String {
    let points = unique_points(vertices);
    let frame = CanonicalFrame::from_points(&points);
    let local: Vec<Vector3<f64>> = points.iter().map(|p| frame.to_local(p)).collect();

    let (min, span) = local_bounds(&local);

    let mut lattice: Vec<i64> = local
        .iter()
        .map(|v| {
            let x = quantize(v.x, min.x, span.x, density);
            let y = quantize(v.y, min.y, span.y, density);
            let z = quantize(v.z, min.z, span.z, density);
            combine_lattice(x, y, z, density)
        })
        .collect();
    lattice.sort_unstable();

    let mut buf = Vec::with_capacity(lattice.len() * 8 + 12);
    for value in &lattice {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    for s in [span.x, span.y, span.z] {
        buf.extend_from_slice(&round_significant(s, span_digits).to_le_bytes());
    }

    hex::encode(Sha256::digest(&buf))
}

/// Deduplicates vertices by exact value, in a deterministic order.
///
/// Negative zero is folded into positive zero so that the two compare equal
/// as they do numerically.
fn unique_points(vertices: &[Point3<f32>]) -> Vec<Point3<f64>> {
    let mut keys: Vec<[u32; 3]> = vertices
        .iter()
        .map(|v| [bits(v.x), bits(v.y), bits(v.z)])
        .collect();
    keys.sort_unstable();
    keys.dedup();

    keys.into_iter()
        .map(|[x, y, z]| {
            Point3::new(
                f32::from_bits(x) as f64,
                f32::from_bits(y) as f64,
                f32::from_bits(z) as f64,
            )
        })
        .collect()
}

#[inline]
fn bits(value: f32) -> u32 {
    if value == 0.0 {
        0.0f32.to_bits()
    } else {
        value.to_bits()
    }
}

/// Minimum corner and per-axis span of canonical coordinates.
fn local_bounds(local: &[Vector3<f64>]) -> (Vector3<f64>, Vector3<f64>) {
    if local.is_empty() {
        return (Vector3::zeros(), Vector3::zeros());
    }

    let mut min = Vector3::repeat(f64::MAX);
    let mut max = Vector3::repeat(f64::MIN);
    for v in local {
        min = min.inf(v);
        max = max.sup(v);
    }
    (min, max - min)
}

/// Maps a coordinate to its lattice cell. A flat axis maps to cell zero.
#[inline]
fn quantize(value: f64, min: f64, span: f64, density: f64) -> i64 {
    if span <= 0.0 {
        return 0;
    }
    (density * ((value - min) / span)).round() as i64
}

/// Format version 1 lattice combination.
///
/// Terms saturate on conversion and are summed with wrapping arithmetic.
/// Below [`MAX_HASH_DENSITY`](crate::config::MAX_HASH_DENSITY) neither
/// ever happens.
#[inline]
fn combine_lattice(x: i64, y: i64, z: i64, density: f64) -> i64 {
    x.wrapping_add((density * y as f64).round() as i64)
        .wrapping_add((density * density * z as f64).round() as i64)
}

/// Rounds to a number of significant digits, absorbing float noise.
fn round_significant(value: f64, digits: u32) -> f32 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits as i32 - 1 - magnitude);
    ((value * scale).round() / scale) as f32
}
