//! Indexed triangle meshes registered with the detector.
//!
//! The detector never owns mesh geometry: bodies borrow an [`IndexedMesh`]
//! for as long as they stay registered, so a mesh cannot be dropped or
//! edited while a detector still refers to it.

use crate::bounds::Aabb;
use crate::error::{CollisionError, CollisionResult};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in the mesh's local frame.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a vertex at `position`.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

/// An indexed triangle mesh.
///
/// Faces reference vertices by index and use counter-clockwise winding
/// when viewed from outside. Closed meshes enclose a solid; open meshes
/// are treated as surfaces only.
///
/// # Example
///
/// ```
/// use mesh_collision::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.face_count(), 1);
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from flat coordinate and index arrays.
    ///
    /// Trailing values that do not form a full vertex or face are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::IndexedMesh;
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let mesh = IndexedMesh::from_raw(&positions, &[0, 1, 2]);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();
        let faces = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Position of vertex `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. Registered meshes have been
    /// validated, so every face index resolves.
    #[inline]
    #[must_use]
    pub fn position(&self, index: u32) -> Point3<f64> {
        self.vertices[index as usize].position
    }

    /// Resolve face `face` to its three vertex positions.
    #[inline]
    #[must_use]
    pub fn triangle(&self, face: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[face];
        [self.position(a), self.position(b), self.position(c)]
    }

    /// Bounding box of all vertices (empty box for a mesh without vertices).
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Check that the mesh can be registered.
    ///
    /// # Errors
    ///
    /// - [`CollisionError::EmptyMesh`] if the mesh has no vertices
    /// - [`CollisionError::InvalidFace`] if a face references a missing vertex
    pub fn validate(&self) -> CollisionResult<()> {
        if self.vertices.is_empty() {
            return Err(CollisionError::EmptyMesh);
        }
        let vertex_count = self.vertices.len();
        for (face_idx, face) in self.faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(CollisionError::InvalidFace {
                    face: face_idx,
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Append another mesh, offsetting its face indices.
    ///
    /// The result has (at least) one shell per input shell, which makes
    /// this the easiest way to build multi-shell bodies.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &Self) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }
}

/// Build a closed axis-aligned box mesh.
///
/// Faces wind counter-clockwise when viewed from outside.
///
/// # Example
///
/// ```
/// use mesh_collision::{cuboid, Point3, Vector3};
///
/// let block = cuboid(Point3::origin(), Vector3::new(5.0, 5.0, 5.0));
/// assert_eq!(block.face_count(), 12);
/// ```
#[must_use]
pub fn cuboid(center: Point3<f64>, half_extents: Vector3<f64>) -> IndexedMesh {
    let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);
    let mut mesh = IndexedMesh::with_capacity(8, 12);

    for (sx, sy, sz) in [
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (-1.0, 1.0, -1.0),
        (-1.0, -1.0, 1.0),
        (1.0, -1.0, 1.0),
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
    ] {
        mesh.vertices.push(Vertex::from_coords(
            center.x + sx * hx,
            center.y + sy * hy,
            center.z + sz * hz,
        ));
    }

    mesh.faces.extend_from_slice(&[
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [3, 7, 6],
        [3, 6, 2],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
    ]);

    mesh
}

/// A closed cube from (0,0,0) to (1,1,1).
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    cuboid(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.5, 0.5, 0.5))
}
