//! Exact triangle-triangle and segment-triangle intersection tests.
//!
//! All tests treat triangles and segments as closed sets: touching at a
//! single vertex or along an edge counts as intersecting. Decisions are made
//! purely from [`orient2d`]/[`orient3d`] signs, so results are exact for the
//! given coordinates and no tolerance is involved.
//!
//! Degenerate inputs are supported. A zero-area triangle is treated as the
//! union of its edges and a zero-length segment as a point.
//!
//! Coplanar configurations are resolved in 2D. Rather than choosing a
//! projection plane from a (possibly zero) normal, a coplanar configuration
//! is tested in all three axis-aligned projections: at least one of them is
//! injective on the common plane, so the sets intersect in 3D exactly when
//! every projection reports an intersection.

use crate::predicates::{Orientation, orient2d, orient3d};
use nalgebra::{Point2, Point3};

/// A triangle as three vertex positions.
pub type Triangle = [Point3<f64>; 3];

/// Result of crossing a probe segment with a triangle, used by ray parity
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// The segment does not meet the triangle.
    Miss,
    /// The segment passes through the triangle's interior transversally,
    /// away from its edges and away from the segment's endpoints.
    Proper,
    /// The segment meets the triangle in a way parity counting cannot
    /// resolve: through an edge or vertex, in the triangle's plane, or at
    /// the segment's far endpoint.
    Degenerate,
}

const AXIS_DROPS: [usize; 3] = [0, 1, 2];

fn project(p: &Point3<f64>, drop: usize) -> Point2<f64> {
    match drop {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    }
}

fn same_strict_sign(a: Orientation, b: Orientation) -> bool {
    a == b && !a.is_zero()
}

/// Whether the three points are collinear (or coincident).
#[must_use]
pub fn is_degenerate(tri: &Triangle) -> bool {
    AXIS_DROPS.iter().all(|&drop| {
        orient2d(
            &project(&tri[0], drop),
            &project(&tri[1], drop),
            &project(&tri[2], drop),
        )
        .is_zero()
    })
}

/// Closed 2D segment-segment intersection.
fn segments_intersect_2d(
    p: &Point2<f64>,
    q: &Point2<f64>,
    r: &Point2<f64>,
    s: &Point2<f64>,
) -> bool {
    let o1 = orient2d(p, q, r);
    let o2 = orient2d(p, q, s);
    let o3 = orient2d(r, s, p);
    let o4 = orient2d(r, s, q);

    if same_strict_sign(o1, o2) || same_strict_sign(o3, o4) {
        return false;
    }

    if o1.is_zero() && o2.is_zero() && o3.is_zero() && o4.is_zero() {
        // Collinear: overlap of the coordinate intervals.
        let overlap = |a0: f64, a1: f64, b0: f64, b1: f64| {
            a0.min(a1) <= b0.max(b1) && b0.min(b1) <= a0.max(a1)
        };
        return overlap(p.x, q.x, r.x, s.x) && overlap(p.y, q.y, r.y, s.y);
    }

    true
}

/// Closed 2D point-in-triangle test (degenerate triangles allowed).
fn point_in_triangle_2d(
    p: &Point2<f64>,
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
) -> bool {
    if orient2d(a, b, c).is_zero() {
        return segments_intersect_2d(p, p, a, b)
            || segments_intersect_2d(p, p, b, c)
            || segments_intersect_2d(p, p, c, a);
    }

    let o1 = orient2d(a, b, p);
    let o2 = orient2d(b, c, p);
    let o3 = orient2d(c, a, p);
    let has_neg = [o1, o2, o3].contains(&Orientation::Negative);
    let has_pos = [o1, o2, o3].contains(&Orientation::Positive);
    !(has_neg && has_pos)
}

fn segment_triangle_2d(p: &Point2<f64>, q: &Point2<f64>, tri: &[Point2<f64>; 3]) -> bool {
    let [a, b, c] = tri;
    point_in_triangle_2d(p, a, b, c)
        || point_in_triangle_2d(q, a, b, c)
        || segments_intersect_2d(p, q, a, b)
        || segments_intersect_2d(p, q, b, c)
        || segments_intersect_2d(p, q, c, a)
}

fn coplanar_segment_triangle(p: &Point3<f64>, q: &Point3<f64>, tri: &Triangle) -> bool {
    AXIS_DROPS.iter().all(|&drop| {
        segment_triangle_2d(
            &project(p, drop),
            &project(q, drop),
            &[project(&tri[0], drop), project(&tri[1], drop), project(&tri[2], drop)],
        )
    })
}

/// Closed 3D segment-segment intersection.
#[must_use]
pub fn segments_intersect(
    p: &Point3<f64>,
    q: &Point3<f64>,
    r: &Point3<f64>,
    s: &Point3<f64>,
) -> bool {
    if !orient3d(p, q, r, s).is_zero() {
        return false;
    }
    AXIS_DROPS.iter().all(|&drop| {
        segments_intersect_2d(
            &project(p, drop),
            &project(q, drop),
            &project(r, drop),
            &project(s, drop),
        )
    })
}

/// Whether the closed segment `p → q` meets the closed triangle.
///
/// # Example
///
/// ```
/// use mesh_collision::intersect::segment_triangle_intersect;
/// use mesh_collision::predicates::PredicateScope;
/// use mesh_collision::Point3;
///
/// let _scope = PredicateScope::enter();
/// let tri = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let through = segment_triangle_intersect(
///     &Point3::new(0.2, 0.2, -1.0),
///     &Point3::new(0.2, 0.2, 1.0),
///     &tri,
/// );
/// assert!(through);
/// ```
#[must_use]
pub fn segment_triangle_intersect(p: &Point3<f64>, q: &Point3<f64>, tri: &Triangle) -> bool {
    let [a, b, c] = tri;

    if is_degenerate(tri) {
        return segments_intersect(p, q, a, b)
            || segments_intersect(p, q, b, c)
            || segments_intersect(p, q, c, a);
    }

    let sp = orient3d(a, b, c, p);
    let sq = orient3d(a, b, c, q);

    if same_strict_sign(sp, sq) {
        return false;
    }
    if sp.is_zero() && sq.is_zero() {
        return coplanar_segment_triangle(p, q, tri);
    }

    // The segment meets the plane in exactly one point; it lies in the
    // triangle iff the line p→q passes on the same side of all three edges.
    let o1 = orient3d(p, q, a, b);
    let o2 = orient3d(p, q, b, c);
    let o3 = orient3d(p, q, c, a);
    let has_neg = [o1, o2, o3].contains(&Orientation::Negative);
    let has_pos = [o1, o2, o3].contains(&Orientation::Positive);
    !(has_neg && has_pos)
}

/// Whether `point` lies on the closed triangle.
#[must_use]
pub fn point_on_triangle(point: &Point3<f64>, tri: &Triangle) -> bool {
    segment_triangle_intersect(point, point, tri)
}

/// Whether two closed triangles share at least one point.
///
/// Two triangles intersect exactly when an edge of one meets the other.
///
/// # Example
///
/// ```
/// use mesh_collision::intersect::triangles_intersect;
/// use mesh_collision::predicates::PredicateScope;
/// use mesh_collision::Point3;
///
/// let _scope = PredicateScope::enter();
/// let a = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(1.0, 2.0, 0.0),
/// ];
/// // Shares only the vertex (2, 0, 0).
/// let b = [
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(3.0, 0.0, 1.0),
///     Point3::new(3.0, 1.0, 1.0),
/// ];
/// assert!(triangles_intersect(&a, &b));
/// ```
#[must_use]
pub fn triangles_intersect(a: &Triangle, b: &Triangle) -> bool {
    // Plane rejection: all of one triangle strictly on one side of the other.
    if separated_by_plane(a, b) || separated_by_plane(b, a) {
        return false;
    }

    let edges_a = [(0, 1), (1, 2), (2, 0)];
    edges_a
        .iter()
        .any(|&(i, j)| segment_triangle_intersect(&a[i], &a[j], b))
        || edges_a
            .iter()
            .any(|&(i, j)| segment_triangle_intersect(&b[i], &b[j], a))
}

fn separated_by_plane(plane: &Triangle, other: &Triangle) -> bool {
    let [a, b, c] = plane;
    let s0 = orient3d(a, b, c, &other[0]);
    same_strict_sign(s0, orient3d(a, b, c, &other[1]))
        && same_strict_sign(s0, orient3d(a, b, c, &other[2]))
}

/// Classify how the probe segment `origin → target` crosses a triangle.
///
/// The caller is expected to have already checked whether `origin` lies on
/// the triangle; an origin on the triangle's plane but outside it is a miss.
#[must_use]
pub fn probe_crossing(origin: &Point3<f64>, target: &Point3<f64>, tri: &Triangle) -> Crossing {
    let [a, b, c] = tri;
    let so = orient3d(a, b, c, origin);
    let st = orient3d(a, b, c, target);

    if same_strict_sign(so, st) {
        return Crossing::Miss;
    }
    if so.is_zero() && st.is_zero() {
        // In-plane probe or zero-area triangle.
        return if segment_triangle_intersect(origin, target, tri) {
            Crossing::Degenerate
        } else {
            Crossing::Miss
        };
    }
    if so.is_zero() {
        // Touches the plane only at the origin, which is off the triangle.
        return Crossing::Miss;
    }

    let o1 = orient3d(origin, target, a, b);
    let o2 = orient3d(origin, target, b, c);
    let o3 = orient3d(origin, target, c, a);
    let has_neg = [o1, o2, o3].contains(&Orientation::Negative);
    let has_pos = [o1, o2, o3].contains(&Orientation::Positive);

    if has_neg && has_pos {
        Crossing::Miss
    } else if st.is_zero() || o1.is_zero() || o2.is_zero() || o3.is_zero() {
        Crossing::Degenerate
    } else {
        Crossing::Proper
    }
}
