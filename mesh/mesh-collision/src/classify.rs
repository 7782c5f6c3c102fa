//! Point-in-solid classification for closed meshes.
//!
//! A point is classified by ray parity: a probe segment runs from the point
//! to a target beyond the mesh's bounding box, and every face it crosses
//! flips inside/outside. Crossings are decided with exact predicates, so a
//! probe either crosses a face cleanly or is known to be degenerate (it
//! grazes an edge or vertex, or runs in a face's plane). Degenerate probes
//! are discarded and the next direction of a fixed sequence is tried.

use crate::bounds::Aabb;
use crate::bvh::MeshTree;
use crate::intersect::{Crossing, point_on_triangle, probe_crossing};
use nalgebra::{Point3, Vector3};
use tracing::warn;

/// Location of a point relative to a closed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside the enclosed solid.
    Inside,
    /// Strictly outside.
    Outside,
    /// On the surface.
    OnBoundary,
}

/// Classify `point` (in the mesh's local frame) against a closed mesh.
///
/// At most `max_ray_attempts` probe directions are tried. If every probe is
/// degenerate the result is a majority vote over the parities of their
/// clean crossings, and a warning is logged.
///
/// The result is meaningless for open meshes.
///
/// # Example
///
/// ```
/// use mesh_collision::bvh::MeshTree;
/// use mesh_collision::classify::{classify_point, Location};
/// use mesh_collision::predicates::PredicateScope;
/// use mesh_collision::{unit_cube, CollisionConfig, Point3};
///
/// let cube = unit_cube();
/// let tree = MeshTree::build(&cube, &CollisionConfig::default());
///
/// let _scope = PredicateScope::enter();
/// assert_eq!(classify_point(&Point3::new(0.3, 0.6, 0.2), &tree, 8), Location::Inside);
/// assert_eq!(classify_point(&Point3::new(1.0, 0.5, 0.5), &tree, 8), Location::OnBoundary);
/// assert_eq!(classify_point(&Point3::new(2.0, 0.5, 0.5), &tree, 8), Location::Outside);
/// ```
#[must_use]
pub fn classify_point(
    point: &Point3<f64>,
    tree: &MeshTree<'_>,
    max_ray_attempts: usize,
) -> Location {
    let Some(bounds) = tree.bvh().root_bbox() else {
        return Location::Outside;
    };
    if !bounds.contains(point) {
        return Location::Outside;
    }

    let mesh = tree.mesh();
    let at_point = Aabb::new(*point, *point);
    if tree
        .bvh()
        .query(&at_point)
        .into_iter()
        .any(|f| point_on_triangle(point, &mesh.triangle(f as usize)))
    {
        return Location::OnBoundary;
    }

    let reach = (point - bounds.center()).norm() + bounds.diagonal() + 1.0;
    let attempts = max_ray_attempts.max(1);
    let mut inside_votes = 0usize;

    for attempt in 0..attempts {
        let target = point + ray_direction(attempt) * reach;
        match cast(point, &target, tree) {
            Probe::Clean { crossings } => {
                return if crossings % 2 == 1 {
                    Location::Inside
                } else {
                    Location::Outside
                };
            }
            Probe::Degenerate { crossings } => {
                if crossings % 2 == 1 {
                    inside_votes += 1;
                }
            }
        }
    }

    let inside = inside_votes * 2 > attempts;
    warn!(
        x = point.x,
        y = point.y,
        z = point.z,
        attempts,
        inside_votes,
        "every probe direction was degenerate; using majority vote"
    );
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

enum Probe {
    Clean { crossings: usize },
    Degenerate { crossings: usize },
}

fn cast(origin: &Point3<f64>, target: &Point3<f64>, tree: &MeshTree<'_>) -> Probe {
    let mesh = tree.mesh();
    let mut crossings = 0;
    let mut degenerate = false;

    for face in tree.bvh().query(&Aabb::new(*origin, *target)) {
        match probe_crossing(origin, target, &mesh.triangle(face as usize)) {
            Crossing::Proper => crossings += 1,
            Crossing::Degenerate => degenerate = true,
            Crossing::Miss => {}
        }
    }

    if degenerate {
        Probe::Degenerate { crossings }
    } else {
        Probe::Clean { crossings }
    }
}

/// Probe direction for attempt `i`: `+Z` first, then points of a golden-angle
/// spiral on the unit sphere, none of them axis-aligned.
#[allow(clippy::cast_precision_loss)]
fn ray_direction(i: usize) -> Vector3<f64> {
    if i == 0 {
        return Vector3::z();
    }
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let t = i as f64;
    let z = 1.0 - 2.0 * ((t * 0.618_033_988_749_895 + 0.137).fract());
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = golden_angle * t + 0.291;
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::mesh::{IndexedMesh, cuboid, unit_cube};
    use crate::predicates::PredicateScope;

    fn classify(mesh: &IndexedMesh, p: Point3<f64>) -> Location {
        let tree = MeshTree::build(mesh, &CollisionConfig::default());
        let _scope = PredicateScope::enter();
        classify_point(&p, &tree, 8)
    }

    #[test]
    fn test_inside_and_outside() {
        let cube = unit_cube();
        assert_eq!(classify(&cube, Point3::new(0.2, 0.7, 0.4)), Location::Inside);
        assert_eq!(classify(&cube, Point3::new(0.2, 0.7, 1.4)), Location::Outside);
        assert_eq!(classify(&cube, Point3::new(0.2, 0.7, -0.4)), Location::Outside);
        assert_eq!(classify(&cube, Point3::new(9.0, 9.0, 9.0)), Location::Outside);
    }

    #[test]
    fn test_on_boundary() {
        let cube = unit_cube();
        assert_eq!(classify(&cube, Point3::new(0.5, 0.5, 0.0)), Location::OnBoundary);
        assert_eq!(classify(&cube, Point3::new(1.0, 1.0, 1.0)), Location::OnBoundary);
        assert_eq!(classify(&cube, Point3::new(0.0, 0.3, 0.7)), Location::OnBoundary);
    }

    #[test]
    fn test_center_probe_hits_face_diagonal() {
        // The +Z probe from the center runs through the diagonal splitting
        // the top face, so classification must fall through to a later
        // direction.
        let cube = unit_cube();
        assert_eq!(classify(&cube, Point3::new(0.5, 0.5, 0.5)), Location::Inside);
        assert_eq!(classify(&cube, Point3::new(0.5, 0.5, -3.0)), Location::Outside);
    }

    #[test]
    fn test_second_shell() {
        let mut mesh = unit_cube();
        mesh.merge(&cuboid(Point3::new(5.0, 0.5, 0.5), nalgebra::Vector3::new(0.5, 0.5, 0.5)));
        assert_eq!(classify(&mesh, Point3::new(5.1, 0.4, 0.3)), Location::Inside);
        assert_eq!(classify(&mesh, Point3::new(3.0, 0.4, 0.3)), Location::Outside);
    }

    #[test]
    fn test_nested_shells_cancel() {
        // A hollow shell: outer box with an inward-facing inner box.
        let mut mesh = cuboid(Point3::origin(), nalgebra::Vector3::new(4.0, 4.0, 4.0));
        let mut cavity = cuboid(Point3::origin(), nalgebra::Vector3::new(1.0, 1.0, 1.0));
        for face in &mut cavity.faces {
            face.swap(1, 2);
        }
        mesh.merge(&cavity);
        assert_eq!(classify(&mesh, Point3::new(0.1, 0.2, 0.3)), Location::Outside);
        assert_eq!(classify(&mesh, Point3::new(2.5, 0.2, 0.3)), Location::Inside);
    }

    #[test]
    fn test_ray_directions_are_unit_and_distinct() {
        let dirs: Vec<_> = (0..16).map(ray_direction).collect();
        for (i, d) in dirs.iter().enumerate() {
            assert!((d.norm() - 1.0).abs() < 1e-12);
            for e in &dirs[..i] {
                assert!((d - e).norm() > 1e-3);
            }
        }
    }
}
