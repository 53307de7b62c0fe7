// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on mesh faces.
//!
//! Every query is read-only and indexed by face number. A face or vertex
//! index that is out of range yields `None`.

use nalgebra::{Point3, Vector3};

use crate::mesh::{Face, MeshNode};

impl MeshNode {
    /// Returns a face by index.
    pub fn face(&self, index: usize) -> Option<&Face> {
        self.faces.as_ref()?.get(index)
    }

    /// Returns a vertex position in f64 precision.
    #[inline]
    pub fn vertex_point(&self, index: u32) -> Option<Point3<f64>> {
        self.vertices.get(index as usize).map(|v| v.cast::<f64>())
    }

    /// Resolves all vertex positions of a face.
    fn face_points(&self, index: usize) -> Option<Vec<Point3<f64>>> {
        self.face(index)?
            .iter()
            .map(|&vi| self.vertex_point(vi))
            .collect()
    }

    /// Computes the area of a triangle or quadrilateral face.
    ///
    /// Quadrilaterals are split along the 0-2 diagonal. Any other arity has
    /// zero area.
    pub fn face_area(&self, index: usize) -> Option<f64> {
        let points = self.face_points(index)?;
        let area = match points.len() {
            3 => triangle_area(&points[0], &points[1], &points[2]),
            4 => {
                triangle_area(&points[0], &points[1], &points[2])
                    + triangle_area(&points[0], &points[2], &points[3])
            }
            _ => 0.0,
        };
        Some(area)
    }

    /// Sum of edge lengths, including the closing edge back to the first vertex.
    pub fn face_perimeter(&self, index: usize) -> Option<f64> {
        let points = self.face_points(index)?;
        let n = points.len();
        let perimeter = (0..n)
            .map(|i| (points[(i + 1) % n] - points[i]).norm())
            .sum();
        Some(perimeter)
    }

    /// Arithmetic mean of the face's vertex positions.
    pub fn face_centroid(&self, index: usize) -> Option<Point3<f64>> {
        let points = self.face_points(index)?;
        if points.is_empty() {
            return None;
        }

        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
        Some(Point3::from(sum / points.len() as f64))
    }

    /// Approximate length of the boundary shared by two faces.
    ///
    /// Collects, in the order of face `a`, every vertex of `a` that is equal
    /// by value to a vertex of `b`, then sums the distances between
    /// consecutive collected vertices. Adjacency is not verified.
    pub fn faces_boundary_length(&self, a: usize, b: usize) -> Option<f64> {
        let points_a = self.face_points(a)?;
        let points_b = self.face_points(b)?;

        let common: Vec<Point3<f64>> = points_a
            .iter()
            .flat_map(|pa| points_b.iter().filter(move |pb| *pb == pa).map(move |_| *pa))
            .collect();

        let length = common
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .sum();
        Some(length)
    }
}

/// Area = 1/2 * |AB x AC|
#[inline]
fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}
