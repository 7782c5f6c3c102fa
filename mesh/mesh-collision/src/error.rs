//! Error types for collision queries.

use thiserror::Error;

/// Errors that can occur while registering meshes or querying bodies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollisionError {
    /// A query referenced a body id that is not registered.
    #[error("invalid body id {id}: {count} bodies registered")]
    InvalidId {
        /// The offending id.
        id: usize,
        /// Number of registered bodies at the time of the query.
        count: usize,
    },

    /// The mesh has no vertices and cannot seed any containment test.
    #[error("empty mesh: no vertices")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    InvalidFace {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Result type for collision operations.
pub type CollisionResult<T> = Result<T, CollisionError>;
