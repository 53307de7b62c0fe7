// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Importing the same part placed at different positions in a scene.

use approx::assert_relative_eq;
use meshdoc_scene::{
    ApiLevel, Color4, ExternalMesh, Face, MaterialNode, MeshConfig, Point3, SceneArena,
};
use nalgebra::{Rotation3, Vector3};
use rustc_hash::FxHashMap;

/// A 4 x 2 x 1 slab with an extra vertex at the centre of its top face.
fn slab(placement: impl Fn(Point3<f64>) -> Point3<f64>, material_index: u32) -> ExternalMesh {
    let mut vertices = Vec::new();
    for &x in &[-2.0, 2.0] {
        for &y in &[-1.0, 1.0] {
            for &z in &[-0.5, 0.5] {
                vertices.push(placement(Point3::new(x, y, z)).cast::<f32>());
            }
        }
    }
    vertices.push(placement(Point3::new(0.0, 0.0, 0.5)).cast::<f32>());

    // Bottom quad plus the four triangles of the top face
    let faces = [
        vec![0u32, 2, 6, 4],
        vec![1, 5, 8],
        vec![5, 7, 8],
        vec![7, 3, 8],
        vec![3, 1, 8],
    ]
    .iter()
    .map(|f| Face::from_slice(f))
    .collect();

    ExternalMesh {
        name: "slab".to_string(),
        vertices,
        faces,
        colors: Some(vec![Color4::new(0.5, 0.5, 0.5, 1.0); 9]),
        material_index,
        ..ExternalMesh::default()
    }
}

fn arena() -> SceneArena {
    SceneArena::with_config(MeshConfig::default().with_hash_density(10.0)).unwrap()
}

#[test]
fn placed_copies_share_a_content_hash() {
    let mut arena = arena();
    let rotation = Rotation3::from_euler_angles(0.2, 0.9, -1.3);

    let original = arena.import_mesh(&slab(|p| p, 0), &[]);
    let placed = arena.import_mesh(
        &slab(|p| rotation * p + Vector3::new(15.0, -4.0, 2.5), 0),
        &[],
    );
    let scaled = arena.import_mesh(&slab(|p| Point3::from(p.coords * 3.0), 0), &[]);

    let hashes: FxHashMap<_, _> = arena.content_hashes().into_iter().collect();
    assert_eq!(hashes[&original], hashes[&placed]);
    assert_ne!(hashes[&original], hashes[&scaled]);
}

#[test]
fn queries_on_imported_mesh() {
    let mut arena = arena();
    let key = arena.import_mesh(&slab(|p| p, 0), &[]);
    let mesh = arena.mesh(key).unwrap();

    // Bottom face spans 4 x 2
    assert_relative_eq!(mesh.face_area(0).unwrap(), 8.0, epsilon = 1e-6);
    assert_relative_eq!(mesh.face_perimeter(0).unwrap(), 12.0, epsilon = 1e-6);

    let top = mesh.face_centroid(1).unwrap();
    assert_relative_eq!(top.z, 0.5, epsilon = 1e-6);

    // Neighbouring top triangles share the edge from (2,-1,0.5) to the centre
    let shared = (2.0f64 * 2.0 + 1.0).sqrt();
    assert_relative_eq!(mesh.faces_boundary_length(1, 2).unwrap(), shared, epsilon = 1e-6);
}

#[test]
fn bounds_and_outline_follow_placement() {
    let mut arena = arena();
    let key = arena.import_mesh(&slab(|p| p + Vector3::new(10.0, 0.0, 0.0), 0), &[]);
    let mesh = arena.mesh(key).unwrap();

    let bbox = mesh.bounding_box();
    assert_relative_eq!(bbox.min.x, 8.0);
    assert_relative_eq!(bbox.max.x, 12.0);
    assert_eq!(bbox.size(), [4.0, 2.0, 1.0]);

    let outline = mesh.outline().unwrap();
    assert_eq!(outline.len(), 4);
    assert!(outline.iter().all(|p| p.x == 8.0 || p.x == 12.0));
}

#[test]
fn material_assignment_round_trips_through_export() {
    let mut arena = arena();
    let materials = [
        arena.add_material(MaterialNode::new(ApiLevel::Level1, Some("concrete".into()))),
        arena.add_material(
            MaterialNode::new(ApiLevel::Level1, Some("paint".into()))
                .with_diffuse(Color4::new(0.9, 0.1, 0.1, 1.0)),
        ),
    ];
    let key = arena.import_mesh(&slab(|p| p, 1), &materials);

    assert_eq!(arena.mesh_material(key), Some(materials[1]));
    assert_eq!(arena.material(materials[1]).unwrap().parents(), &[key]);

    // The exporter orders materials differently
    let mapping: FxHashMap<_, _> = [(materials[0], 1), (materials[1], 0)].into_iter().collect();
    let exported = arena.export_mesh(key, &mapping).unwrap();
    assert_eq!(exported.material_index, 0);
    assert_eq!(exported.faces.len(), 5);
    assert!(exported.has_vertex_colors());
    assert!(!exported.has_normals());
}
