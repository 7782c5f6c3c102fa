//! Collision and containment queries between rigidly placed triangle meshes.
//!
//! Register static meshes once, move them with rigid transforms, and ask
//! which bodies touch a given body or enclose it.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Meshes are
//! borrowed, never copied, so the detector slots in next to whatever owns
//! the geometry.
//!
//! # Features
//!
//! - **BVH per mesh**, built once at registration (in parallel for large
//!   meshes); moving a body never rebuilds it
//! - **Exact predicates** with a floating-point filter: touching at a vertex
//!   or along an edge is always reported
//! - **Containment** by ray parity against closed bodies, one probe point per
//!   connected shell
//! - **Lazy bounding-box cache** (opt-in) that prunes distant candidates
//! - **Translation-only detectors** when bodies never rotate
//!
//! # Quick Start
//!
//! ```
//! use mesh_collision::{unit_cube, CollisionDetector, Isometry3};
//!
//! let cube = unit_cube();
//! let mut detector = CollisionDetector::new();
//! let a = detector.register(&cube, false)?;
//! let b = detector.register(&cube, false)?;
//!
//! detector.set_transform(b, Isometry3::translation(0.5, 0.0, 0.0));
//! assert_eq!(detector.intersections(a)?, vec![b]);
//!
//! let relations = detector.intersections_and_inclusions(a)?;
//! assert_eq!(relations[0].as_pair(), (b, false));
//! # Ok::<(), mesh_collision::CollisionError>(())
//! ```
//!
//! # Containment
//!
//! Surfaces that do not touch may still be nested. For a pair that does not
//! overlap, the query body is tested as the enclosing one first and the
//! candidate second; only closed bodies can enclose. A body with several
//! shells counts as enclosed as soon as one shell is.
//!
//! ```
//! use mesh_collision::{cuboid, CollisionDetector, Point3, Vector3};
//!
//! let outer = cuboid(Point3::origin(), Vector3::new(5.0, 5.0, 5.0));
//! let inner = cuboid(Point3::origin(), Vector3::new(0.5, 0.5, 0.5));
//! let mut detector = CollisionDetector::new();
//! let a = detector.register(&outer, false)?;
//! let b = detector.register(&inner, false)?;
//!
//! assert!(detector.intersections(a)?.is_empty());
//! let pairs: Vec<_> = detector
//!     .intersections_and_inclusions(a)?
//!     .iter()
//!     .map(|r| r.as_pair())
//!     .collect();
//! assert_eq!(pairs, vec![(b, true)]);
//! # Ok::<(), mesh_collision::CollisionError>(())
//! ```
//!
//! # Presets
//!
//! | Preset | Use Case | Box cache |
//! |--------|----------|-----------|
//! | `default()` | Few bodies, occasional queries | Off |
//! | `interactive()` | Many moves and queries per frame | On |
//! | `for_large_assemblies()` | Many bodies, large meshes | On |

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
// Single-letter names are standard in geometry predicates.
#![allow(clippy::many_single_char_names)]
// Face indices are u32 and validated at registration.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::missing_panics_doc)]

pub mod bounds;
pub mod bvh;
pub mod classify;
pub mod config;
pub mod error;
pub mod intersect;
pub mod mesh;
pub mod motion;
pub mod predicates;
pub mod topology;

mod body;
mod query;
mod registry;

pub use bounds::Aabb;
pub use classify::Location;
pub use config::CollisionConfig;
pub use error::{CollisionError, CollisionResult};
pub use mesh::{IndexedMesh, Vertex, cuboid, unit_cube};
pub use motion::RigidMotion;
pub use query::{BodyRelation, RelationKind};
pub use registry::{CollisionDetector, TranslationDetector};

pub use nalgebra::{Isometry3, Point3, Translation3, Vector3};

/// Prelude module for convenient imports.
///
/// ```
/// use mesh_collision::prelude::*;
///
/// let cube = unit_cube();
/// let mut detector = TranslationDetector::translation_only();
/// detector.register(&cube, true)?;
/// # Ok::<(), CollisionError>(())
/// ```
pub mod prelude {
    pub use crate::config::CollisionConfig;
    pub use crate::error::{CollisionError, CollisionResult};
    pub use crate::mesh::{IndexedMesh, cuboid, unit_cube};
    pub use crate::motion::RigidMotion;
    pub use crate::query::{BodyRelation, RelationKind};
    pub use crate::registry::{CollisionDetector, TranslationDetector};
    pub use nalgebra::{Isometry3, Point3, Translation3, Vector3};
}
