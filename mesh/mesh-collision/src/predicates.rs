//! Filtered orientation predicates with exact fallback.
//!
//! Every boundary-overlap and containment decision in this crate reduces to
//! the sign of an [`orient2d`] or [`orient3d`] determinant. Each predicate
//! first evaluates the determinant in plain floating point together with a
//! static forward error bound. When the result is within the bound (the
//! filter is inconclusive), the determinant is re-evaluated exactly as a
//! floating-point expansion, so the returned sign is always the sign of the
//! exact determinant of the input coordinates.
//!
//! Predicates must run inside a [`PredicateScope`]. The scope is an RAII
//! guard: it is entered at the top of every batch entry point and released
//! on every exit path, including early returns and `?` propagation.
//!
//! # Example
//!
//! ```
//! use mesh_collision::predicates::{orient3d, Orientation, PredicateScope};
//! use mesh_collision::Point3;
//!
//! let _scope = PredicateScope::enter();
//! let a = Point3::new(0.0, 0.0, 1.0);
//! let b = Point3::new(1.0, 0.0, 1.0);
//! let c = Point3::new(0.0, 1.0, 1.0);
//!
//! assert_eq!(orient3d(&a, &b, &c, &Point3::origin()), Orientation::Positive);
//! assert_eq!(orient3d(&a, &b, &c, &Point3::new(0.3, 0.3, 1.0)), Orientation::Zero);
//! ```

use nalgebra::{Point2, Point3};
use std::cell::Cell;
use std::marker::PhantomData;
use tracing::trace;

/// Half an ulp of 1.0: the relative rounding error of one operation.
const EPSILON: f64 = f64::EPSILON * 0.5;

const ORIENT2D_BOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const ORIENT3D_BOUND: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;

thread_local! {
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static EXACT_FALLBACKS: Cell<u64> = const { Cell::new(0) };
}

/// Sign of an orientation determinant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Negative determinant.
    Negative,
    /// The points are degenerate (collinear / coplanar).
    Zero,
    /// Positive determinant.
    Positive,
}

impl Orientation {
    fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    /// The opposite orientation.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Zero => Self::Zero,
            Self::Positive => Self::Negative,
        }
    }

    /// Whether this is [`Orientation::Zero`].
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::Zero
    }
}

/// Guard marking a batch of predicate evaluations.
///
/// Scopes nest. The outermost scope resets the exact-fallback counter on
/// entry and reports it on release. The guard is neither `Send` nor `Sync`:
/// it must be released on the thread that entered it.
#[derive(Debug)]
#[must_use = "predicates are only guarded while the scope is alive"]
pub struct PredicateScope {
    _not_send: PhantomData<*const ()>,
}

impl PredicateScope {
    /// Enter a predicate scope on the current thread.
    pub fn enter() -> Self {
        let depth = SCOPE_DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });
        if depth == 1 {
            EXACT_FALLBACKS.with(|f| f.set(0));
        }
        Self {
            _not_send: PhantomData,
        }
    }

    /// Whether a scope is active on the current thread.
    #[must_use]
    pub fn is_active() -> bool {
        SCOPE_DEPTH.with(Cell::get) > 0
    }

    /// Number of evaluations in the current outermost scope that needed
    /// exact arithmetic.
    #[must_use]
    pub fn exact_fallbacks() -> u64 {
        EXACT_FALLBACKS.with(Cell::get)
    }
}

impl Drop for PredicateScope {
    fn drop(&mut self) {
        let depth = SCOPE_DEPTH.with(|d| {
            let depth = d.get().saturating_sub(1);
            d.set(depth);
            depth
        });
        if depth == 0 {
            let fallbacks = EXACT_FALLBACKS.with(Cell::get);
            if fallbacks > 0 {
                trace!(exact_fallbacks = fallbacks, "predicate scope released");
            }
        }
    }
}

fn record_fallback() {
    EXACT_FALLBACKS.with(|f| f.set(f.get() + 1));
}

/// Orientation of `c` relative to the directed line `a → b`.
///
/// [`Orientation::Positive`] when `a, b, c` turn counter-clockwise.
#[must_use]
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Orientation {
    debug_assert!(
        PredicateScope::is_active(),
        "orient2d evaluated outside a PredicateScope"
    );

    let det_left = (a.x - c.x) * (b.y - c.y);
    let det_right = (a.y - c.y) * (b.x - c.x);
    let det = det_left - det_right;
    let bound = ORIENT2D_BOUND * (det_left.abs() + det_right.abs());

    if det > bound || -det > bound {
        return Orientation::from_sign(det);
    }

    record_fallback();
    let left = expansion::mul(&expansion::diff(a.x, c.x), &expansion::diff(b.y, c.y));
    let right = expansion::mul(&expansion::diff(a.y, c.y), &expansion::diff(b.x, c.x));
    Orientation::from_sign(expansion::sign(&expansion::sub(&left, &right)))
}

/// Orientation of `d` relative to the plane through `a, b, c`.
///
/// [`Orientation::Positive`] when `d` lies on the side opposite to the
/// normal `(b - a) × (c - a)`, [`Orientation::Zero`] when the four points
/// are coplanar.
#[must_use]
pub fn orient3d(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Orientation {
    debug_assert!(
        PredicateScope::is_active(),
        "orient3d evaluated outside a PredicateScope"
    );

    let (adx, ady, adz) = (a.x - d.x, a.y - d.y, a.z - d.z);
    let (bdx, bdy, bdz) = (b.x - d.x, b.y - d.y, b.z - d.z);
    let (cdx, cdy, cdz) = (c.x - d.x, c.y - d.y, c.z - d.z);

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;

    let det = adz * (bdxcdy - cdxbdy) + bdz * (cdxady - adxcdy) + cdz * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * adz.abs()
        + (cdxady.abs() + adxcdy.abs()) * bdz.abs()
        + (adxbdy.abs() + bdxady.abs()) * cdz.abs();
    let bound = ORIENT3D_BOUND * permanent;

    if det > bound || -det > bound {
        return Orientation::from_sign(det);
    }

    record_fallback();
    Orientation::from_sign(orient3d_exact(a, b, c, d))
}

fn orient3d_exact(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    use expansion::{add, diff, mul, sign, sub};

    let (adx, ady, adz) = (diff(a.x, d.x), diff(a.y, d.y), diff(a.z, d.z));
    let (bdx, bdy, bdz) = (diff(b.x, d.x), diff(b.y, d.y), diff(b.z, d.z));
    let (cdx, cdy, cdz) = (diff(c.x, d.x), diff(c.y, d.y), diff(c.z, d.z));

    let bc = sub(&mul(&bdx, &cdy), &mul(&cdx, &bdy));
    let ca = sub(&mul(&cdx, &ady), &mul(&adx, &cdy));
    let ab = sub(&mul(&adx, &bdy), &mul(&bdx, &ady));

    let det = add(&add(&mul(&adz, &bc), &mul(&bdz, &ca)), &mul(&cdz, &ab));
    sign(&det)
}

/// Floating-point expansion arithmetic.
///
/// An expansion is a sum of non-overlapping doubles stored in increasing
/// order of magnitude (zeros removed); its value is represented exactly.
mod expansion {
    pub(super) type Expansion = Vec<f64>;

    fn two_sum(a: f64, b: f64) -> (f64, f64) {
        let s = a + b;
        let bv = s - a;
        let av = s - bv;
        (s, (a - av) + (b - bv))
    }

    fn two_product(a: f64, b: f64) -> (f64, f64) {
        let p = a * b;
        (p, a.mul_add(b, -p))
    }

    fn grow(e: &[f64], b: f64) -> Expansion {
        let mut out = Vec::with_capacity(e.len() + 1);
        let mut q = b;
        for &component in e {
            let (sum, err) = two_sum(q, component);
            if err != 0.0 {
                out.push(err);
            }
            q = sum;
        }
        if q != 0.0 {
            out.push(q);
        }
        out
    }

    /// Exact `a - b`.
    pub(super) fn diff(a: f64, b: f64) -> Expansion {
        grow(&grow(&[], -b), a)
    }

    pub(super) fn add(e: &[f64], f: &[f64]) -> Expansion {
        f.iter().fold(e.to_vec(), |acc, &x| grow(&acc, x))
    }

    pub(super) fn sub(e: &[f64], f: &[f64]) -> Expansion {
        f.iter().fold(e.to_vec(), |acc, &x| grow(&acc, -x))
    }

    fn scale(e: &[f64], b: f64) -> Expansion {
        e.iter().fold(Vec::new(), |acc, &x| {
            let (p, err) = two_product(x, b);
            grow(&grow(&acc, err), p)
        })
    }

    pub(super) fn mul(e: &[f64], f: &[f64]) -> Expansion {
        f.iter().fold(Vec::new(), |acc, &x| add(&acc, &scale(e, x)))
    }

    /// Sign carried by the largest component (0.0 for a zero expansion).
    pub(super) fn sign(e: &[f64]) -> f64 {
        e.last().copied().unwrap_or(0.0)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn value(e: &[f64]) -> f64 {
            e.iter().sum()
        }

        #[test]
        fn diff_is_exact() {
            let e = diff(1.0, 1e-20);
            assert_eq!(e.len(), 2);
            assert!(sign(&e) > 0.0);
        }

        #[test]
        fn cancellation_to_zero() {
            let big = 1e16;
            let e = sub(&diff(big, 1.0), &diff(big, 1.0));
            assert!(e.is_empty());
            assert!(sign(&e) == 0.0);
        }

        #[test]
        fn product_of_sums() {
            let e = mul(&diff(3.0, 1.0), &diff(5.0, 1.0));
            assert!((value(&e) - 8.0).abs() < f64::EPSILON);
        }

        #[test]
        fn tiny_residual_survives() {
            // (1 + 2^-52)^2 - 1 - 2^-51 = 2^-104, invisible in plain arithmetic.
            let x = 1.0 + f64::EPSILON;
            let sq = mul(&[x], &[x]);
            let rest = sub(&sub(&sq, &[1.0]), &[2.0 * f64::EPSILON]);
            assert!(sign(&rest) > 0.0);
        }
    }
}
