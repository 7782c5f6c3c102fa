//! Batch overlap and containment queries.
//!
//! Every query runs in three stages per candidate body:
//!
//! 1. Cached world boxes (when [`CollisionConfig::bbox_cache`] is on) reject
//!    candidates that cannot touch the query body.
//! 2. The two face hierarchies are traversed together to decide whether the
//!    surfaces share a point. A pair is always traversed in the frame of its
//!    lower id, so asking from either side gives the same answer.
//! 3. For inclusion queries only, and only when the surfaces are disjoint,
//!    shell representatives are classified against whichever body is closed.
//!
//! [`CollisionConfig::bbox_cache`]: crate::CollisionConfig::bbox_cache

use crate::body::RigidBody;
use crate::classify::{Location, classify_point};
use crate::error::{CollisionError, CollisionResult};
use crate::motion::RigidMotion;
use crate::predicates::PredicateScope;
use crate::registry::CollisionDetector;
use tracing::trace;

/// How a candidate body relates to the query body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationKind {
    /// The two surfaces share at least one point.
    BoundaryOverlap,
    /// The query body is closed and encloses a shell of the candidate.
    Encloses,
    /// The candidate is closed and encloses a shell of the query body.
    EnclosedBy,
}

/// A candidate body reported by an inclusion query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyRelation {
    /// Id of the candidate body.
    pub id: usize,
    /// How it relates to the query body.
    pub kind: RelationKind,
}

impl BodyRelation {
    /// Whether this is a containment (in either direction) rather than a
    /// surface overlap.
    #[must_use]
    pub fn is_inclusion(&self) -> bool {
        !matches!(self.kind, RelationKind::BoundaryOverlap)
    }

    /// The `(id, is_inclusion)` pair form.
    #[must_use]
    pub fn as_pair(&self) -> (usize, bool) {
        (self.id, self.is_inclusion())
    }
}

#[derive(Debug, Default)]
struct QueryStats {
    candidates: usize,
    bbox_rejects: usize,
    overlap_tests: usize,
    hits: usize,
}

impl QueryStats {
    fn log(&self, id: usize, kind: &'static str) {
        trace!(
            id,
            kind,
            candidates = self.candidates,
            bbox_rejects = self.bbox_rejects,
            overlap_tests = self.overlap_tests,
            hits = self.hits,
            "query finished"
        );
    }
}

impl<M: RigidMotion> CollisionDetector<'_, M> {
    /// Ids of every other body whose surface touches body `id`, in id order.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` is not registered.
    pub fn intersections(&mut self, id: usize) -> CollisionResult<Vec<usize>> {
        let all = 0..self.len();
        self.intersections_among(id, all)
    }

    /// Ids among `candidates` whose surface touches body `id`.
    ///
    /// Results keep candidate order. `id` itself is skipped if listed, and
    /// duplicated candidates are reported once per occurrence.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` or any candidate is not
    /// registered. Nothing is evaluated in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::{unit_cube, TranslationDetector, Translation3};
    ///
    /// let cube = unit_cube();
    /// let mut detector = TranslationDetector::translation_only();
    /// for _ in 0..3 {
    ///     detector.register(&cube, true)?;
    /// }
    /// detector.set_transform(1, Translation3::new(4.0, 0.0, 0.0));
    /// detector.set_transform(2, Translation3::new(0.0, 0.9, 0.0));
    ///
    /// assert_eq!(detector.intersections_among(0, [2, 1])?, vec![2]);
    /// # Ok::<(), mesh_collision::CollisionError>(())
    /// ```
    pub fn intersections_among<I>(
        &mut self,
        id: usize,
        candidates: I,
    ) -> CollisionResult<Vec<usize>>
    where
        I: IntoIterator<Item = usize>,
    {
        let _scope = PredicateScope::enter();
        let candidates = self.checked_candidates(id, candidates)?;
        self.prepare_cache();

        let bodies = self.bodies();
        let query = &bodies[id];
        let mut stats = QueryStats {
            candidates: candidates.len(),
            ..QueryStats::default()
        };
        let mut hits = Vec::new();

        for k in candidates {
            if k == id {
                continue;
            }
            let other = &bodies[k];
            if cached_boxes_disjoint(query, other) {
                stats.bbox_rejects += 1;
                continue;
            }
            stats.overlap_tests += 1;
            if boundaries_overlap((id, query), (k, other)) {
                hits.push(k);
            }
        }

        stats.hits = hits.len();
        stats.log(id, "intersections");
        Ok(hits)
    }

    /// Overlaps and containments between body `id` and every other body.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` is not registered.
    pub fn intersections_and_inclusions(
        &mut self,
        id: usize,
    ) -> CollisionResult<Vec<BodyRelation>> {
        let all = 0..self.len();
        self.intersections_and_inclusions_among(id, all)
    }

    /// Overlaps and containments between body `id` and `candidates`.
    ///
    /// Each candidate yields at most one relation:
    ///
    /// - [`RelationKind::BoundaryOverlap`] if the surfaces touch;
    /// - otherwise [`RelationKind::Encloses`] if body `id` is closed and
    ///   any shell of the candidate lies inside it;
    /// - otherwise [`RelationKind::EnclosedBy`] if the candidate is closed
    ///   and any shell of body `id` lies inside it.
    ///
    /// A single shell inside is enough: a multi-shell body with one shell
    /// enclosed and another far away is still reported as contained.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` or any candidate is not
    /// registered.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::{cuboid, CollisionDetector, Point3, RelationKind, Vector3};
    ///
    /// let outer = cuboid(Point3::origin(), Vector3::new(5.0, 5.0, 5.0));
    /// let inner = cuboid(Point3::origin(), Vector3::new(0.5, 0.5, 0.5));
    /// let mut detector = CollisionDetector::new();
    /// let a = detector.register(&outer, true)?;
    /// let b = detector.register(&inner, true)?;
    ///
    /// let relations = detector.intersections_and_inclusions_among(b, [a])?;
    /// assert_eq!(relations[0].kind, RelationKind::EnclosedBy);
    /// assert_eq!(relations[0].as_pair(), (a, true));
    /// # Ok::<(), mesh_collision::CollisionError>(())
    /// ```
    pub fn intersections_and_inclusions_among<I>(
        &mut self,
        id: usize,
        candidates: I,
    ) -> CollisionResult<Vec<BodyRelation>>
    where
        I: IntoIterator<Item = usize>,
    {
        let _scope = PredicateScope::enter();
        let candidates = self.checked_candidates(id, candidates)?;
        self.prepare_cache();

        let max_ray_attempts = self.config().max_ray_attempts;
        let bodies = self.bodies();
        let query = &bodies[id];
        let mut stats = QueryStats {
            candidates: candidates.len(),
            ..QueryStats::default()
        };
        let mut relations = Vec::new();

        for k in candidates {
            if k == id {
                continue;
            }
            let other = &bodies[k];
            if cached_boxes_disjoint(query, other) {
                stats.bbox_rejects += 1;
                continue;
            }
            stats.overlap_tests += 1;
            if let Some(kind) = relate((id, query), (k, other), max_ray_attempts) {
                relations.push(BodyRelation { id: k, kind });
            }
        }

        stats.hits = relations.len();
        stats.log(id, "intersections_and_inclusions");
        Ok(relations)
    }

    /// Move body `id`, then run [`intersections`](Self::intersections).
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` is not registered; the
    /// transform is ignored in that case.
    pub fn set_transform_and_intersections(
        &mut self,
        id: usize,
        transform: M,
    ) -> CollisionResult<Vec<usize>> {
        self.set_transform(id, transform);
        self.intersections(id)
    }

    /// Move body `id`, then run
    /// [`intersections_and_inclusions`](Self::intersections_and_inclusions).
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` is not registered.
    pub fn set_transform_and_intersections_and_inclusions(
        &mut self,
        id: usize,
        transform: M,
    ) -> CollisionResult<Vec<BodyRelation>> {
        self.set_transform(id, transform);
        self.intersections_and_inclusions(id)
    }

    /// Move body `id`, then run
    /// [`intersections_among`](Self::intersections_among) over `candidates`.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` or any candidate is not
    /// registered. A valid `id` is still moved in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::{unit_cube, TranslationDetector, Translation3};
    ///
    /// let cube = unit_cube();
    /// let mut detector = TranslationDetector::translation_only();
    /// for _ in 0..3 {
    ///     detector.register(&cube, true)?;
    /// }
    /// let hits = detector.set_transform_and_intersections_among(
    ///     0,
    ///     Translation3::new(0.5, 0.0, 0.0),
    ///     [2],
    /// )?;
    /// assert_eq!(hits, vec![2]);
    /// # Ok::<(), mesh_collision::CollisionError>(())
    /// ```
    pub fn set_transform_and_intersections_among<I>(
        &mut self,
        id: usize,
        transform: M,
        candidates: I,
    ) -> CollisionResult<Vec<usize>>
    where
        I: IntoIterator<Item = usize>,
    {
        self.set_transform(id, transform);
        self.intersections_among(id, candidates)
    }

    /// Move body `id`, then run
    /// [`intersections_and_inclusions_among`](Self::intersections_and_inclusions_among)
    /// over `candidates`.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if `id` or any candidate is not
    /// registered.
    pub fn set_transform_and_intersections_and_inclusions_among<I>(
        &mut self,
        id: usize,
        transform: M,
        candidates: I,
    ) -> CollisionResult<Vec<BodyRelation>>
    where
        I: IntoIterator<Item = usize>,
    {
        self.set_transform(id, transform);
        self.intersections_and_inclusions_among(id, candidates)
    }

    /// Whether the surfaces of bodies `a` and `b` touch.
    ///
    /// Does not consult or refresh the box cache. A body is never reported
    /// against itself, so `intersects(a, a)` is `false`.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if either id is not registered.
    pub fn intersects(&self, a: usize, b: usize) -> CollisionResult<bool> {
        let _scope = PredicateScope::enter();
        let (first, second) = (self.body(a)?, self.body(b)?);
        Ok(a != b && boundaries_overlap((a, first), (b, second)))
    }

    /// How body `b` relates to body `a`, by the rules of
    /// [`intersections_and_inclusions_among`](Self::intersections_and_inclusions_among).
    ///
    /// Does not consult or refresh the box cache.
    ///
    /// # Errors
    ///
    /// [`CollisionError::InvalidId`] if either id is not registered.
    pub fn relation(&self, a: usize, b: usize) -> CollisionResult<Option<RelationKind>> {
        let _scope = PredicateScope::enter();
        let (first, second) = (self.body(a)?, self.body(b)?);
        if a == b {
            return Ok(None);
        }
        Ok(relate((a, first), (b, second), self.config().max_ray_attempts))
    }

    fn checked_candidates<I>(&self, id: usize, candidates: I) -> CollisionResult<Vec<usize>>
    where
        I: IntoIterator<Item = usize>,
    {
        self.body(id)?;
        let count = self.len();
        candidates
            .into_iter()
            .map(|k| {
                if k < count {
                    Ok(k)
                } else {
                    Err(CollisionError::InvalidId { id: k, count })
                }
            })
            .collect()
    }

    fn prepare_cache(&mut self) {
        if self.config().bbox_cache {
            self.refresh_bboxes();
        }
    }
}

/// Both cached boxes are valid and disjoint. Stale or disabled caches
/// never reject.
fn cached_boxes_disjoint<M: RigidMotion>(a: &RigidBody<'_, M>, b: &RigidBody<'_, M>) -> bool {
    match (a.cached_bbox(), b.cached_bbox()) {
        (Some(box_a), Some(box_b)) => !box_a.overlaps(box_b),
        _ => false,
    }
}

/// Surface overlap between two bodies tagged with their ids. The lower id
/// supplies the traversal frame.
fn boundaries_overlap<M: RigidMotion>(
    a: (usize, &RigidBody<'_, M>),
    b: (usize, &RigidBody<'_, M>),
) -> bool {
    let ((_, low), (_, high)) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    low.tree().overlaps(low.transform(), high.tree(), high.transform())
}

fn relate<M: RigidMotion>(
    query_entry: (usize, &RigidBody<'_, M>),
    other_entry: (usize, &RigidBody<'_, M>),
    max_ray_attempts: usize,
) -> Option<RelationKind> {
    let (query, other) = (query_entry.1, other_entry.1);
    if boundaries_overlap(query_entry, other_entry) {
        return Some(RelationKind::BoundaryOverlap);
    }
    if query.is_closed() && encloses(query, other, max_ray_attempts) {
        return Some(RelationKind::Encloses);
    }
    if other.is_closed() && encloses(other, query, max_ray_attempts) {
        return Some(RelationKind::EnclosedBy);
    }
    None
}

/// Whether any shell representative of `inner` lies strictly inside the
/// closed body `outer`.
fn encloses<M: RigidMotion>(
    outer: &RigidBody<'_, M>,
    inner: &RigidBody<'_, M>,
    max_ray_attempts: usize,
) -> bool {
    let inner_to_outer = inner.transform().relative_to(outer.transform());
    inner.shells().iter().any(|rep| {
        let local = inner_to_outer.transform_point(rep);
        classify_point(&local, outer.tree(), max_ray_attempts) == Location::Inside
    })
}
