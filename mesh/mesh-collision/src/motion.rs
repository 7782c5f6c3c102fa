//! Rigid placements of registered bodies.
//!
//! A detector is generic over its [`RigidMotion`] type, so the rotation
//! capability is fixed when the detector is built:
//!
//! - [`Isometry3<f64>`] - rotation and translation (the default)
//! - [`Translation3<f64>`] - translation only; relative placements never
//!   accumulate rotation round-off
//!
//! World boxes are padded outward by a few ulps of the coordinates
//! involved. Pair traversal places one body in the other's frame, which
//! rounds differently from placing both in world space, and the padded
//! boxes still overlap whenever that traversal can report contact.

use crate::bounds::Aabb;
use nalgebra::{Isometry3, Point3, Translation3, Vector3};
use std::fmt::Debug;

/// A rigid map from a body's local frame to world space.
pub trait RigidMotion: Copy + Debug + PartialEq + 'static {
    /// The identity placement.
    fn identity() -> Self;

    /// Map a local point to world space.
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64>;

    /// Map a world point into the local frame.
    fn inverse_transform_point(&self, point: &Point3<f64>) -> Point3<f64>;

    /// World-space box enclosing a local-space box.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// The placement that maps `self`'s local frame into `frame`'s local
    /// frame, i.e. `frame⁻¹ ∘ self`.
    #[must_use]
    fn relative_to(&self, frame: &Self) -> Self;
}

impl RigidMotion for Isometry3<f64> {
    fn identity() -> Self {
        Self::identity()
    }

    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self * point
    }

    fn inverse_transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Self::inverse_transform_point(self, point)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::empty();
        }
        let mut out = Aabb::empty();
        for corner in aabb.corners() {
            out.expand_point(&(self * corner));
        }
        // A rotated vertex may round a few ulps past the rotated corners.
        out.dilated(rounding_pad(aabb, &self.translation.vector, 16.0))
    }

    fn relative_to(&self, frame: &Self) -> Self {
        frame.inv_mul(self)
    }
}

impl RigidMotion for Translation3<f64> {
    fn identity() -> Self {
        Self::identity()
    }

    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Self::transform_point(self, point)
    }

    fn inverse_transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Self::inverse_transform_point(self, point)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::empty();
        }
        let moved = Aabb {
            min: aabb.min + self.vector,
            max: aabb.max + self.vector,
        };
        moved.dilated(rounding_pad(aabb, &self.vector, 8.0))
    }

    fn relative_to(&self, frame: &Self) -> Self {
        Self::from(self.vector - frame.vector)
    }
}

/// Pad bounding the round-off of moving `aabb` by `offset` and of the same
/// placement taken relative to another body's frame.
fn rounding_pad(aabb: &Aabb, offset: &Vector3<f64>, ulps: f64) -> f64 {
    let local = aabb.min.coords.amax().max(aabb.max.coords.amax());
    (local + offset.amax()) * ulps * f64::EPSILON
}
