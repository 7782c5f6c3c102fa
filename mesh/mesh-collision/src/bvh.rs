//! Bounding volume hierarchies over mesh faces.
//!
//! [`Bvh`] is a static binary tree of face bounding boxes, built once per
//! registered mesh. [`MeshTree`] pairs a BVH with the mesh it was built
//! from and answers the questions the detector asks: where is the mesh in
//! world space, and do two placed meshes share a point.
//!
//! Two-tree traversal works in the first tree's local frame. The second
//! tree's boxes and triangles are mapped through the relative motion, so
//! one side of every triangle test uses untouched mesh coordinates.

use crate::bounds::Aabb;
use crate::config::CollisionConfig;
use crate::intersect::{Triangle, triangles_intersect};
use crate::mesh::IndexedMesh;
use crate::motion::RigidMotion;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::ops::ControlFlow;

/// BVH node containing either leaf faces or two children.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf node.
    Leaf {
        /// Bounding box of all faces in this leaf.
        bbox: Aabb,
        /// Face indices stored in this leaf.
        triangles: SmallVec<[u32; 8]>,
    },
    /// Internal node.
    Internal {
        /// Bounding box of the subtree.
        bbox: Aabb,
        /// Left child.
        left: Box<Self>,
        /// Right child.
        right: Box<Self>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Bounding volume hierarchy over the faces of one mesh.
///
/// The tree stores face indices only; geometry stays in the mesh.
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangle_count: usize,
}

impl Bvh {
    /// Build a BVH from a mesh.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::bvh::Bvh;
    /// use mesh_collision::unit_cube;
    ///
    /// let bvh = Bvh::build(&unit_cube(), 4);
    /// assert_eq!(bvh.triangle_count(), 12);
    /// ```
    #[must_use]
    pub fn build(mesh: &IndexedMesh, max_leaf_size: usize) -> Self {
        let boxes: Vec<Aabb> = (0..mesh.face_count())
            .map(|f| Aabb::from_triangle(&mesh.triangle(f)))
            .collect();
        Self::from_boxes(&boxes, max_leaf_size, usize::MAX)
    }

    /// Build a BVH, splitting subtrees of at least `parallel_threshold`
    /// faces across the rayon thread pool.
    #[must_use]
    pub fn build_parallel(
        mesh: &IndexedMesh,
        max_leaf_size: usize,
        parallel_threshold: usize,
    ) -> Self {
        let boxes: Vec<Aabb> = (0..mesh.face_count())
            .into_par_iter()
            .map(|f| Aabb::from_triangle(&mesh.triangle(f)))
            .collect();
        Self::from_boxes(&boxes, max_leaf_size, parallel_threshold.max(2))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_boxes(boxes: &[Aabb], max_leaf_size: usize, parallel_threshold: usize) -> Self {
        if boxes.is_empty() {
            return Self {
                root: None,
                triangle_count: 0,
            };
        }

        let mut indices: Vec<u32> = (0..boxes.len() as u32).collect();
        let root = build_node(boxes, &mut indices, max_leaf_size.max(1), parallel_threshold);

        Self {
            root: Some(root),
            triangle_count: boxes.len(),
        }
    }

    /// Faces whose bounding boxes overlap `query_bbox` (closed test).
    #[must_use]
    pub fn query(&self, query_bbox: &Aabb) -> Vec<u32> {
        let mut result = Vec::new();
        if let Some(root) = &self.root {
            query_node(root, query_bbox, &mut result);
        }
        result
    }

    /// Number of faces indexed.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Whether the tree indexes no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Bounding box of all indexed faces.
    #[must_use]
    pub fn root_bbox(&self) -> Option<&Aabb> {
        self.root.as_ref().map(BvhNode::bbox)
    }

    /// Structural statistics.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if let Some(root) = &self.root {
            collect_stats(root, 0, &mut stats);
        }
        stats
    }
}

fn build_node(
    boxes: &[Aabb],
    indices: &mut [u32],
    max_leaf_size: usize,
    parallel_threshold: usize,
) -> BvhNode {
    let bbox = indices
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&boxes[i as usize]));

    if indices.len() <= max_leaf_size {
        return BvhNode::Leaf {
            bbox,
            triangles: indices.iter().copied().collect(),
        };
    }

    // Median split on the longest axis.
    let axis = bbox.longest_axis();
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        let ca = boxes[a as usize].center()[axis];
        let cb = boxes[b as usize].center()[axis];
        ca.total_cmp(&cb)
    });

    let parallel = indices.len() >= parallel_threshold;
    let (left_indices, right_indices) = indices.split_at_mut(mid);
    let (left, right) = if parallel {
        rayon::join(
            || build_node(boxes, left_indices, max_leaf_size, parallel_threshold),
            || build_node(boxes, right_indices, max_leaf_size, parallel_threshold),
        )
    } else {
        (
            build_node(boxes, left_indices, max_leaf_size, parallel_threshold),
            build_node(boxes, right_indices, max_leaf_size, parallel_threshold),
        )
    };

    BvhNode::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn query_node(node: &BvhNode, query_bbox: &Aabb, result: &mut Vec<u32>) {
    if !node.bbox().overlaps(query_bbox) {
        return;
    }
    match node {
        BvhNode::Leaf { triangles, .. } => result.extend(triangles.iter().copied()),
        BvhNode::Internal { left, right, .. } => {
            query_node(left, query_bbox, result);
            query_node(right, query_bbox, result);
        }
    }
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    stats.max_depth = stats.max_depth.max(depth);
    match node {
        BvhNode::Leaf { triangles, .. } => {
            stats.leaf_count += 1;
            stats.total_triangles_in_leaves += triangles.len();
            stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
        }
        BvhNode::Internal { left, right, .. } => {
            stats.internal_count += 1;
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}

/// Statistics about BVH structure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BvhStats {
    /// Number of internal nodes.
    pub internal_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Maximum depth of the tree.
    pub max_depth: usize,
    /// Maximum number of faces in any leaf.
    pub max_leaf_size: usize,
    /// Total faces stored across all leaves.
    pub total_triangles_in_leaves: usize,
}

/// A mesh together with its face hierarchy.
///
/// The tree borrows the mesh; it is the spatial index handle a registered
/// body owns.
#[derive(Debug)]
pub struct MeshTree<'m> {
    mesh: &'m IndexedMesh,
    bvh: Bvh,
    local_bounds: Aabb,
}

impl<'m> MeshTree<'m> {
    /// Build the hierarchy for `mesh` using the construction settings in
    /// `config`.
    #[must_use]
    pub fn build(mesh: &'m IndexedMesh, config: &CollisionConfig) -> Self {
        let bvh = if mesh.face_count() >= config.parallel_build_threshold {
            Bvh::build_parallel(mesh, config.bvh_leaf_size, config.parallel_build_threshold)
        } else {
            Bvh::build(mesh, config.bvh_leaf_size)
        };
        Self {
            mesh,
            bvh,
            local_bounds: mesh.bounds(),
        }
    }

    /// The indexed mesh.
    #[must_use]
    pub fn mesh(&self) -> &'m IndexedMesh {
        self.mesh
    }

    /// The face hierarchy.
    #[must_use]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Box around every vertex in the mesh's local frame.
    #[must_use]
    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    /// World-space box enclosing the mesh placed at `motion`.
    #[must_use]
    pub fn world_bbox<M: RigidMotion>(&self, motion: &M) -> Aabb {
        motion.transform_aabb(&self.local_bounds)
    }

    /// Whether the surfaces of the two placed meshes share a point.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::bvh::MeshTree;
    /// use mesh_collision::predicates::PredicateScope;
    /// use mesh_collision::{unit_cube, CollisionConfig, Translation3};
    ///
    /// let cube = unit_cube();
    /// let config = CollisionConfig::default();
    /// let a = MeshTree::build(&cube, &config);
    /// let b = MeshTree::build(&cube, &config);
    ///
    /// let _scope = PredicateScope::enter();
    /// let here = Translation3::identity();
    /// assert!(a.overlaps(&here, &b, &Translation3::new(0.5, 0.0, 0.0)));
    /// assert!(!a.overlaps(&here, &b, &Translation3::new(3.0, 0.0, 0.0)));
    /// ```
    #[must_use]
    pub fn overlaps<M: RigidMotion>(
        &self,
        motion: &M,
        other: &MeshTree<'_>,
        other_motion: &M,
    ) -> bool {
        self.traverse_overlaps(motion, other, other_motion, |_, _| ControlFlow::Break(()))
            .is_break()
    }

    /// Every intersecting face pair `(self_face, other_face)`.
    #[must_use]
    pub fn intersecting_faces<M: RigidMotion>(
        &self,
        motion: &M,
        other: &MeshTree<'_>,
        other_motion: &M,
    ) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        let _ = self.traverse_overlaps(motion, other, other_motion, |a, b| {
            pairs.push((a, b));
            ControlFlow::<()>::Continue(())
        });
        pairs
    }

    /// Visit intersecting face pairs of the two placed meshes.
    ///
    /// Both trees are descended together; node pairs whose boxes are
    /// disjoint are pruned and leaf face pairs are tested exactly. The
    /// traversal stops as soon as `visit` returns [`ControlFlow::Break`].
    pub fn traverse_overlaps<M, F>(
        &self,
        motion: &M,
        other: &MeshTree<'_>,
        other_motion: &M,
        mut visit: F,
    ) -> ControlFlow<()>
    where
        M: RigidMotion,
        F: FnMut(u32, u32) -> ControlFlow<()>,
    {
        let (Some(a), Some(b)) = (self.bvh.root(), other.bvh.root()) else {
            return ControlFlow::Continue(());
        };
        let pair = TreePair {
            a: self.mesh,
            b: other.mesh,
            b_to_a: other_motion.relative_to(motion),
        };
        pair.descend(a, b, &mut visit)
    }
}

struct TreePair<'a, M> {
    a: &'a IndexedMesh,
    b: &'a IndexedMesh,
    b_to_a: M,
}

impl<M: RigidMotion> TreePair<'_, M> {
    fn descend<F>(&self, a: &BvhNode, b: &BvhNode, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(u32, u32) -> ControlFlow<()>,
    {
        let b_box = self.b_to_a.transform_aabb(b.bbox());
        if !a.bbox().overlaps(&b_box) {
            return ControlFlow::Continue(());
        }

        match (a, b) {
            (BvhNode::Leaf { triangles: ta, .. }, BvhNode::Leaf { triangles: tb, .. }) => {
                self.leaf_pairs(a.bbox(), ta, tb, visit)
            }
            (BvhNode::Internal { left, right, .. }, BvhNode::Leaf { .. }) => {
                self.descend(left, b, visit)?;
                self.descend(right, b, visit)
            }
            (BvhNode::Leaf { .. }, BvhNode::Internal { left, right, .. }) => {
                self.descend(a, left, visit)?;
                self.descend(a, right, visit)
            }
            (
                BvhNode::Internal {
                    bbox: a_box,
                    left: al,
                    right: ar,
                },
                BvhNode::Internal {
                    left: bl,
                    right: br,
                    ..
                },
            ) => {
                // Split the larger volume first.
                if a_box.diagonal() >= b_box.diagonal() {
                    self.descend(al, b, visit)?;
                    self.descend(ar, b, visit)
                } else {
                    self.descend(a, bl, visit)?;
                    self.descend(a, br, visit)
                }
            }
        }
    }

    fn leaf_pairs<F>(&self, a_box: &Aabb, ta: &[u32], tb: &[u32], visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(u32, u32) -> ControlFlow<()>,
    {
        for &fb in tb {
            let tri_b: Triangle = self
                .b
                .triangle(fb as usize)
                .map(|p| self.b_to_a.transform_point(&p));
            let box_b = Aabb::from_triangle(&tri_b);
            if !a_box.overlaps(&box_b) {
                continue;
            }
            for &fa in ta {
                let tri_a = self.a.triangle(fa as usize);
                if Aabb::from_triangle(&tri_a).overlaps(&box_b)
                    && triangles_intersect(&tri_a, &tri_b)
                {
                    visit(fa, fb)?;
                }
            }
        }
        ControlFlow::Continue(())
    }
}
