//! Body registry: registration, removal, and placement of rigid meshes.
//!
//! Body ids are positions in the registry. They are not stable handles:
//! removing a body shifts every later body down by one.

use crate::body::RigidBody;
use crate::bounds::Aabb;
use crate::config::CollisionConfig;
use crate::error::{CollisionError, CollisionResult};
use crate::mesh::IndexedMesh;
use crate::motion::RigidMotion;
use nalgebra::{Isometry3, Point3, Translation3};
use tracing::{debug, trace};

/// Detector restricted to translations.
pub type TranslationDetector<'m> = CollisionDetector<'m, Translation3<f64>>;

/// Tracks placed meshes and answers overlap and containment queries.
///
/// The detector borrows every registered mesh for `'m`; it owns only the
/// derived state (face hierarchy, closedness, shell representatives,
/// placement, cached world box). The motion type `M` fixes at construction
/// whether bodies may rotate.
///
/// The detector is meant for single-threaded, sequential use. Queries take
/// `&mut self` because they may refresh the bounding-box cache.
///
/// # Example
///
/// ```
/// use mesh_collision::{unit_cube, CollisionDetector, Isometry3, Vector3};
///
/// let cube = unit_cube();
/// let mut detector = CollisionDetector::new();
/// let a = detector.register(&cube, false)?;
/// let b = detector.register(&cube, false)?;
///
/// detector.set_transform(b, Isometry3::translation(0.5, 0.0, 0.0));
/// assert_eq!(detector.intersections(a)?, vec![b]);
///
/// detector.set_transform(b, Isometry3::new(Vector3::new(5.0, 0.0, 0.0), Vector3::zeros()));
/// assert!(detector.intersections(a)?.is_empty());
/// # Ok::<(), mesh_collision::CollisionError>(())
/// ```
#[derive(Debug)]
pub struct CollisionDetector<'m, M = Isometry3<f64>> {
    bodies: Vec<RigidBody<'m, M>>,
    config: CollisionConfig,
}

impl<'m> CollisionDetector<'m> {
    /// Create an empty detector for rotating bodies with the default
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CollisionConfig::default())
    }

    /// Create an empty detector for rotating bodies.
    #[must_use]
    pub fn with_config(config: CollisionConfig) -> Self {
        Self::empty(config)
    }
}

impl<'m> CollisionDetector<'m, Translation3<f64>> {
    /// Create an empty detector whose bodies can only be translated.
    #[must_use]
    pub fn translation_only() -> Self {
        Self::translation_only_with_config(CollisionConfig::default())
    }

    /// Create an empty translation-only detector.
    #[must_use]
    pub fn translation_only_with_config(config: CollisionConfig) -> Self {
        Self::empty(config)
    }
}

impl<M: RigidMotion> Default for CollisionDetector<'_, M> {
    fn default() -> Self {
        Self::empty(CollisionConfig::default())
    }
}

impl<'m, M: RigidMotion> CollisionDetector<'m, M> {
    fn empty(config: CollisionConfig) -> Self {
        Self {
            bodies: Vec::new(),
            config,
        }
    }

    /// Create a detector and register `meshes` in order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error; see [`register`](Self::register).
    pub fn from_meshes<I>(
        meshes: I,
        assume_single_shell: bool,
        config: CollisionConfig,
    ) -> CollisionResult<Self>
    where
        I: IntoIterator<Item = &'m IndexedMesh>,
    {
        let mut detector = Self::empty(config);
        detector.reinit(meshes, assume_single_shell)?;
        Ok(detector)
    }

    /// Register a mesh at the identity placement and return its id.
    ///
    /// With `assume_single_shell` the caller asserts the mesh is one
    /// connected shell, and a single vertex seeds containment tests
    /// instead of one point per shell.
    ///
    /// # Errors
    ///
    /// - [`CollisionError::EmptyMesh`] if the mesh has no vertices
    /// - [`CollisionError::InvalidFace`] if a face references a missing vertex
    pub fn register(
        &mut self,
        mesh: &'m IndexedMesh,
        assume_single_shell: bool,
    ) -> CollisionResult<usize> {
        let body = RigidBody::new(mesh, assume_single_shell, &self.config)?;
        let id = self.bodies.len();
        debug!(
            id,
            faces = mesh.face_count(),
            closed = body.is_closed(),
            shells = body.shells().len(),
            "registered body"
        );
        self.bodies.push(body);
        Ok(id)
    }

    /// Replace every body with `meshes`, registered in order.
    ///
    /// All meshes are validated before anything is replaced, so on error
    /// the detector is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first registration error; see [`register`](Self::register).
    pub fn reinit<I>(&mut self, meshes: I, assume_single_shell: bool) -> CollisionResult<()>
    where
        I: IntoIterator<Item = &'m IndexedMesh>,
    {
        let bodies = meshes
            .into_iter()
            .map(|mesh| RigidBody::new(mesh, assume_single_shell, &self.config))
            .collect::<CollisionResult<Vec<_>>>()?;
        debug!(bodies = bodies.len(), "reinitialized detector");
        self.bodies = bodies;
        Ok(())
    }

    /// Remove body `id`; later bodies shift down by one.
    ///
    /// Out-of-range ids are ignored. Every cached bounding box is
    /// invalidated.
    pub fn remove(&mut self, id: usize) -> Option<&'m IndexedMesh> {
        if id >= self.bodies.len() {
            return None;
        }
        let body = self.bodies.remove(id);
        for survivor in &mut self.bodies {
            survivor.invalidate_bbox();
        }
        debug!(id, remaining = self.bodies.len(), "removed body");
        Some(body.tree().mesh())
    }

    /// Replace the placement of body `id`.
    ///
    /// Out-of-range ids are ignored. The face hierarchy is never rebuilt.
    pub fn set_transform(&mut self, id: usize, transform: M) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.set_transform(transform);
        }
    }

    /// Remove every body.
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether no bodies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// The detector's configuration.
    #[must_use]
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Current placement of body `id`.
    #[must_use]
    pub fn transform(&self, id: usize) -> Option<&M> {
        self.bodies.get(id).map(RigidBody::transform)
    }

    /// Whether body `id` is a closed surface.
    #[must_use]
    pub fn is_closed(&self, id: usize) -> Option<bool> {
        self.bodies.get(id).map(RigidBody::is_closed)
    }

    /// Local-frame points seeding containment tests for body `id`, one
    /// per shell.
    #[must_use]
    pub fn shell_representatives(&self, id: usize) -> Option<&[Point3<f64>]> {
        self.bodies.get(id).map(RigidBody::shells)
    }

    /// The mesh registered as body `id`.
    #[must_use]
    pub fn mesh(&self, id: usize) -> Option<&'m IndexedMesh> {
        self.bodies.get(id).map(|body| body.tree().mesh())
    }

    /// World box of body `id` at its current placement, computed fresh.
    #[must_use]
    pub fn world_bbox(&self, id: usize) -> Option<Aabb> {
        self.bodies.get(id).map(RigidBody::world_bbox)
    }

    /// Cached world box of body `id`, or `None` if it is stale (or was
    /// never computed because the cache is disabled).
    #[must_use]
    pub fn cached_bbox(&self, id: usize) -> Option<&Aabb> {
        self.bodies.get(id).and_then(RigidBody::cached_bbox)
    }

    pub(crate) fn body(&self, id: usize) -> CollisionResult<&RigidBody<'m, M>> {
        self.bodies.get(id).ok_or(CollisionError::InvalidId {
            id,
            count: self.bodies.len(),
        })
    }

    pub(crate) fn bodies(&self) -> &[RigidBody<'m, M>] {
        &self.bodies
    }

    /// Recompute every stale cached box. Returns the number recomputed.
    pub(crate) fn refresh_bboxes(&mut self) -> usize {
        let refreshed = self
            .bodies
            .iter_mut()
            .map(RigidBody::refresh_bbox)
            .filter(|&stale| stale)
            .count();
        if refreshed > 0 {
            trace!(refreshed, "refreshed cached bounding boxes");
        }
        refreshed
    }
}
