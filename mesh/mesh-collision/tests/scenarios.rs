//! End-to-end detector scenarios.
//!
//! Run with: cargo test -p mesh-collision --test scenarios

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use mesh_collision::{
    BodyRelation, CollisionConfig, CollisionDetector, CollisionError, IndexedMesh, Isometry3,
    Point3, RelationKind, TranslationDetector, Translation3, Vector3, cuboid, unit_cube,
};

fn cube(center: [f64; 3], half: f64) -> IndexedMesh {
    cuboid(Point3::new(center[0], center[1], center[2]), Vector3::repeat(half))
}

fn pairs(relations: &[BodyRelation]) -> Vec<(usize, bool)> {
    relations.iter().map(BodyRelation::as_pair).collect()
}

// =============================================================================
// Basic scenarios
// =============================================================================

#[test]
fn offset_unit_cubes_overlap() {
    let a_mesh = unit_cube();
    let b_mesh = unit_cube();
    let mut detector = CollisionDetector::new();
    let a = detector.register(&a_mesh, false).unwrap();
    let b = detector.register(&b_mesh, false).unwrap();
    detector.set_transform(b, Isometry3::translation(0.5, 0.0, 0.0));

    assert_eq!(detector.intersections(a).unwrap(), vec![b]);
    assert_eq!(pairs(&detector.intersections_and_inclusions(a).unwrap()), vec![(b, false)]);
    assert_eq!(detector.intersections(b).unwrap(), vec![a]);
}

#[test]
fn nested_cubes_are_contained_not_intersecting() {
    let outer = cube([0.0; 3], 5.0);
    let inner = cube([0.0; 3], 0.5);
    let mut detector = CollisionDetector::new();
    let a = detector.register(&outer, false).unwrap();
    let b = detector.register(&inner, false).unwrap();

    assert!(detector.intersections(a).unwrap().is_empty());
    assert_eq!(pairs(&detector.intersections_and_inclusions(a).unwrap()), vec![(b, true)]);
    assert_eq!(pairs(&detector.intersections_and_inclusions(b).unwrap()), vec![(a, true)]);
}

#[test]
fn two_shell_body_partially_enclosed() {
    let mut split = cube([0.0; 3], 0.5);
    split.merge(&cube([50.0, 0.0, 0.0], 0.5));
    let outer = cube([0.0; 3], 5.0);

    let mut detector = CollisionDetector::new();
    let s = detector.register(&split, false).unwrap();
    let o = detector.register(&outer, false).unwrap();

    assert_eq!(detector.shell_representatives(s).unwrap().len(), 2);
    assert_eq!(pairs(&detector.intersections_and_inclusions(o).unwrap()), vec![(s, true)]);
    assert_eq!(
        detector.intersections_and_inclusions(s).unwrap(),
        vec![BodyRelation {
            id: o,
            kind: RelationKind::EnclosedBy
        }]
    );
}

#[test]
fn open_bodies_never_contain() {
    let mut bowl = cube([0.0; 3], 5.0);
    bowl.faces.truncate(10);
    let mut lid = cube([0.0; 3], 0.5);
    lid.faces.truncate(10);

    let mut detector = CollisionDetector::new();
    let a = detector.register(&bowl, false).unwrap();
    detector.register(&lid, false).unwrap();

    assert!(detector.intersections_and_inclusions(a).unwrap().is_empty());
}

#[test]
fn faceless_body_is_accepted() {
    let mut points = IndexedMesh::new();
    points.vertices.push(mesh_collision::Vertex::from_coords(0.1, 0.2, 0.3));
    let outer = cube([0.0; 3], 5.0);

    let mut detector = CollisionDetector::new();
    let p = detector.register(&points, false).unwrap();
    let o = detector.register(&outer, false).unwrap();

    assert_eq!(detector.is_closed(p), Some(false));
    assert!(detector.intersections(p).unwrap().is_empty());
    assert_eq!(pairs(&detector.intersections_and_inclusions(o).unwrap()), vec![(p, true)]);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn remove_renumbers_and_keeps_relations() {
    let meshes = [
        cube([0.0; 3], 1.0),
        cube([10.0, 0.0, 0.0], 1.0),
        cube([1.5, 0.0, 0.0], 1.0),
        cube([3.0, 0.0, 0.0], 1.0),
    ];
    let mut detector =
        TranslationDetector::translation_only_with_config(CollisionConfig::interactive());
    for mesh in &meshes {
        detector.register(mesh, false).unwrap();
    }

    assert_eq!(detector.intersections(2).unwrap(), vec![0, 3]);
    assert_eq!(detector.intersections(3).unwrap(), vec![2]);

    assert!(std::ptr::eq(detector.remove(1).unwrap(), &meshes[1]));
    assert_eq!(detector.len(), 3);
    assert_eq!(detector.intersections(1).unwrap(), vec![0, 2]);
    assert_eq!(detector.intersections(2).unwrap(), vec![1]);
    assert_eq!(detector.intersections(0).unwrap(), vec![1]);
}

#[test]
fn set_transform_and_query_matches_separate_calls() {
    let mesh = unit_cube();
    let mut combined = TranslationDetector::translation_only();
    let mut separate = TranslationDetector::translation_only();
    for _ in 0..3 {
        combined.register(&mesh, true).unwrap();
        separate.register(&mesh, true).unwrap();
    }
    let placements = [
        Translation3::new(0.9, 0.0, 0.0),
        Translation3::new(1.0, 1.0, 1.0),
        Translation3::new(-2.0, 0.0, 0.0),
    ];

    for placement in placements {
        let got = combined.set_transform_and_intersections(2, placement).unwrap();
        separate.set_transform(2, placement);
        assert_eq!(got, separate.intersections(2).unwrap());

        let got = combined
            .set_transform_and_intersections_and_inclusions(2, placement)
            .unwrap();
        assert_eq!(got, separate.intersections_and_inclusions(2).unwrap());
    }
}

#[test]
fn queries_on_unknown_ids_fail() {
    let mesh = unit_cube();
    let mut detector = CollisionDetector::new();
    detector.register(&mesh, false).unwrap();

    assert_eq!(
        detector.intersections(1),
        Err(CollisionError::InvalidId { id: 1, count: 1 })
    );
    assert_eq!(
        detector.intersections_among(0, [0, 4]),
        Err(CollisionError::InvalidId { id: 4, count: 1 })
    );

    let error = detector.intersections_and_inclusions(9).unwrap_err();
    assert!(error.to_string().contains('9'));
}

// =============================================================================
// Cache behaviour
// =============================================================================

#[test]
fn moving_far_away_empties_results_with_and_without_cache() {
    let mesh = unit_cube();
    for config in [CollisionConfig::default(), CollisionConfig::interactive()] {
        let mut detector = CollisionDetector::with_config(config);
        let a = detector.register(&mesh, false).unwrap();
        let b = detector.register(&mesh, false).unwrap();

        assert_eq!(detector.intersections(a).unwrap(), vec![b]);
        detector.set_transform(b, Isometry3::translation(1e3, -1e3, 0.0));
        assert!(detector.intersections(a).unwrap().is_empty());
        assert!(detector.intersections_and_inclusions(b).unwrap().is_empty());
    }
}

#[test]
fn cached_boxes_follow_transforms() {
    let mesh = unit_cube();
    let mut detector = CollisionDetector::with_config(CollisionConfig::interactive());
    let a = detector.register(&mesh, false).unwrap();
    let b = detector.register(&mesh, false).unwrap();

    assert!(detector.cached_bbox(a).is_none());
    detector.intersections(a).unwrap();

    let rotation = Isometry3::new(
        Vector3::new(3.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
    );
    detector.set_transform(b, rotation);
    assert!(detector.cached_bbox(b).is_none());
    detector.intersections(a).unwrap();

    let cached = *detector.cached_bbox(b).unwrap();
    assert_relative_eq!(cached.min.x, 2.0, epsilon = 1e-9);
    assert_relative_eq!(cached.max.x, 3.0, epsilon = 1e-9);
    assert_relative_eq!(cached.max.y, 1.0, epsilon = 1e-9);
    assert_eq!(Some(cached), detector.world_bbox(b));
}

#[test]
fn cache_keeps_contact_between_translated_cubes() {
    // The world boxes of these two cubes round apart by one ulp, while the
    // relative offset between them is exactly one unit.
    let mesh = unit_cube();
    let left = Translation3::new(-0.173_470_793_008_759_12, 0.0, 0.0);
    let right = Translation3::new(0.826_529_206_991_241, 0.0, 0.0);

    let mut answers = Vec::new();
    for config in [CollisionConfig::default(), CollisionConfig::interactive()] {
        let mut detector = TranslationDetector::translation_only_with_config(config);
        let a = detector.register(&mesh, true).unwrap();
        let b = detector.register(&mesh, true).unwrap();
        detector.set_transform(a, left);
        detector.set_transform(b, right);
        answers.push((
            detector.intersections(a).unwrap(),
            detector.intersections(b).unwrap(),
            detector.intersections_and_inclusions(a).unwrap(),
        ));
    }
    assert_eq!(answers[0], answers[1]);
    assert_eq!(answers[1].0, vec![1]);
    assert_eq!(answers[1].1, vec![0]);
}

#[test]
fn cache_keeps_contact_between_rigidly_placed_cubes() {
    let mesh = unit_cube();
    let left = Isometry3::translation(-0.173_470_793_008_759_12, 0.0, 0.0);
    let right = Isometry3::translation(0.826_529_206_991_241, 0.0, 0.0);

    for config in [CollisionConfig::default(), CollisionConfig::interactive()] {
        let mut detector = CollisionDetector::with_config(config);
        let a = detector.register(&mesh, true).unwrap();
        let b = detector.register(&mesh, true).unwrap();
        detector.set_transform(a, left);
        assert_eq!(detector.set_transform_and_intersections(b, right).unwrap(), vec![a]);
    }
}

// =============================================================================
// Consistency
// =============================================================================

#[test]
fn relations_never_report_both_overlap_and_inclusion() {
    let meshes = [
        cube([0.0; 3], 4.0),
        cube([0.0; 3], 1.0),
        cube([3.5, 0.0, 0.0], 1.0),
        cube([0.0, 0.0, 20.0], 1.0),
        cube([0.0, 0.0, 0.0], 0.25),
    ];
    let mut detector: CollisionDetector<'_> =
        CollisionDetector::from_meshes(&meshes, false, CollisionConfig::default()).unwrap();

    for id in 0..meshes.len() {
        let relations = detector.intersections_and_inclusions(id).unwrap();
        let mut ids: Vec<_> = relations.iter().map(|r| r.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), relations.len(), "body {id}: {relations:?}");
    }

    assert_eq!(
        pairs(&detector.intersections_and_inclusions(0).unwrap()),
        vec![(1, true), (2, false), (4, true)]
    );
    assert_eq!(detector.relation(1, 4).unwrap(), Some(RelationKind::Encloses));
}

#[test]
fn repeated_queries_are_identical() {
    let meshes = [cube([0.0; 3], 1.0), cube([1.0, 1.0, 0.0], 1.0), cube([0.0; 3], 0.2)];
    let mut detector: CollisionDetector<'_> =
        CollisionDetector::from_meshes(&meshes, false, CollisionConfig::interactive()).unwrap();

    let first = detector.intersections_and_inclusions(0).unwrap();
    for _ in 0..5 {
        assert_eq!(detector.intersections_and_inclusions(0).unwrap(), first);
    }
}
