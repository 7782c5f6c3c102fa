//! Per-body state held by the detector.

use crate::bounds::Aabb;
use crate::bvh::MeshTree;
use crate::config::CollisionConfig;
use crate::error::CollisionResult;
use crate::mesh::IndexedMesh;
use crate::motion::RigidMotion;
use crate::topology::{is_closed, shell_representatives};
use nalgebra::Point3;

/// A registered mesh and its placement.
///
/// Everything except the transform and the cached world box is fixed at
/// registration.
#[derive(Debug)]
pub(crate) struct RigidBody<'m, M> {
    tree: MeshTree<'m>,
    transform: M,
    closed: bool,
    shells: Vec<Point3<f64>>,
    bbox: Aabb,
    bbox_valid: bool,
}

impl<'m, M: RigidMotion> RigidBody<'m, M> {
    /// Validate `mesh` and derive its static state.
    ///
    /// With `assume_single_shell` the first vertex stands in for the whole
    /// mesh instead of one representative per connected shell.
    pub(crate) fn new(
        mesh: &'m IndexedMesh,
        assume_single_shell: bool,
        config: &CollisionConfig,
    ) -> CollisionResult<Self> {
        mesh.validate()?;

        let shells = if assume_single_shell {
            vec![mesh.vertices[0].position]
        } else {
            shell_representatives(mesh)
        };

        Ok(Self {
            tree: MeshTree::build(mesh, config),
            transform: M::identity(),
            closed: is_closed(mesh),
            shells,
            bbox: Aabb::empty(),
            bbox_valid: false,
        })
    }

    pub(crate) fn tree(&self) -> &MeshTree<'m> {
        &self.tree
    }

    pub(crate) fn transform(&self) -> &M {
        &self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: M) {
        self.transform = transform;
        self.bbox_valid = false;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn shells(&self) -> &[Point3<f64>] {
        &self.shells
    }

    /// World box at the current transform, computed fresh.
    pub(crate) fn world_bbox(&self) -> Aabb {
        self.tree.world_bbox(&self.transform)
    }

    pub(crate) fn invalidate_bbox(&mut self) {
        self.bbox_valid = false;
    }

    /// Recompute the cached box if it is stale. Returns whether it was.
    pub(crate) fn refresh_bbox(&mut self) -> bool {
        if self.bbox_valid {
            return false;
        }
        self.bbox = self.world_bbox();
        self.bbox_valid = true;
        true
    }

    /// The cached box, if valid.
    pub(crate) fn cached_bbox(&self) -> Option<&Aabb> {
        self.bbox_valid.then_some(&self.bbox)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CollisionError;
    use approx::assert_relative_eq;
    use crate::mesh::{cuboid, unit_cube};
    use nalgebra::{Isometry3, Translation3, Vector3};

    #[test]
    fn new_body_has_stale_cache() {
        let cube = unit_cube();
        let body: RigidBody<'_, Isometry3<f64>> =
            RigidBody::new(&cube, false, &CollisionConfig::default()).unwrap();
        assert!(body.is_closed());
        assert_eq!(body.shells().len(), 1);
        assert!(body.cached_bbox().is_none());
    }

    #[test]
    fn set_transform_invalidates_cache() {
        let cube = unit_cube();
        let mut body: RigidBody<'_, Translation3<f64>> =
            RigidBody::new(&cube, false, &CollisionConfig::default()).unwrap();

        assert!(body.refresh_bbox());
        assert!(!body.refresh_bbox());
        assert_relative_eq!(
            body.cached_bbox().unwrap().max,
            Point3::new(1.0, 1.0, 1.0),
            epsilon = 1e-12
        );

        body.set_transform(Translation3::new(5.0, 0.0, 0.0));
        assert!(body.cached_bbox().is_none());
        assert!(body.refresh_bbox());
        assert_relative_eq!(
            body.cached_bbox().unwrap().max,
            Point3::new(6.0, 1.0, 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn single_shell_assumption_uses_first_vertex() {
        let mut mesh = unit_cube();
        mesh.merge(&cuboid(Point3::new(4.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5)));
        let config = CollisionConfig::default();

        let split: RigidBody<'_, Translation3<f64>> =
            RigidBody::new(&mesh, false, &config).unwrap();
        assert_eq!(split.shells().len(), 2);

        let single: RigidBody<'_, Translation3<f64>> =
            RigidBody::new(&mesh, true, &config).unwrap();
        assert_eq!(single.shells(), &[mesh.vertices[0].position]);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let empty = IndexedMesh::new();
        let body: CollisionResult<RigidBody<'_, Translation3<f64>>> =
            RigidBody::new(&empty, false, &CollisionConfig::default());
        assert_eq!(body.err(), Some(CollisionError::EmptyMesh));
    }
}
