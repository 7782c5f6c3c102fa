//! Configuration and presets for collision detection.
//!
//! [`CollisionConfig`] controls the optional bounding-box cache, BVH
//! construction, and the ray-casting budget used for containment tests.
//!
//! # Presets
//!
//! - [`CollisionConfig::default()`] - Cache off, balanced BVH settings
//! - [`CollisionConfig::interactive()`] - Cache on, for move-and-query loops
//! - [`CollisionConfig::for_large_assemblies()`] - Cache on, parallel index builds
//!
//! # Example
//!
//! ```
//! use mesh_collision::CollisionConfig;
//!
//! let config = CollisionConfig::default()
//!     .with_bbox_cache(true)
//!     .with_bvh_leaf_size(4);
//! assert!(config.bbox_cache);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`CollisionDetector`](crate::CollisionDetector).
///
/// None of these settings change query results; they only trade memory
/// and setup time against query cost.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionConfig {
    /// Cache each body's world-space bounding box and reject candidate
    /// pairs whose boxes are disjoint before any tree traversal.
    pub bbox_cache: bool,

    /// Maximum triangles per BVH leaf.
    /// Smaller values create deeper trees with tighter boxes.
    pub bvh_leaf_size: usize,

    /// Meshes with at least this many faces build their BVH in parallel.
    pub parallel_build_threshold: usize,

    /// Number of ray directions tried before point classification falls
    /// back to a majority vote.
    pub max_ray_attempts: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            bbox_cache: false,
            bvh_leaf_size: 8,
            parallel_build_threshold: 4096,
            max_ray_attempts: 8,
        }
    }
}

impl CollisionConfig {
    /// Configuration for interactive placement: bounding-box cache enabled.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collision::CollisionConfig;
    ///
    /// assert!(CollisionConfig::interactive().bbox_cache);
    /// assert!(!CollisionConfig::default().bbox_cache);
    /// ```
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            bbox_cache: true,
            ..Self::default()
        }
    }

    /// Configuration for assemblies of many large meshes.
    ///
    /// Enables the cache, uses larger leaves, and builds indices in
    /// parallel from a lower face count.
    #[must_use]
    pub fn for_large_assemblies() -> Self {
        Self {
            bbox_cache: true,
            bvh_leaf_size: 16,
            parallel_build_threshold: 1024,
            max_ray_attempts: 8,
        }
    }

    /// Enable or disable the bounding-box cache.
    #[must_use]
    pub fn with_bbox_cache(mut self, enabled: bool) -> Self {
        self.bbox_cache = enabled;
        self
    }

    /// Set the maximum number of triangles per BVH leaf (clamped to at least 1).
    #[must_use]
    pub fn with_bvh_leaf_size(mut self, size: usize) -> Self {
        self.bvh_leaf_size = size.max(1);
        self
    }

    /// Set the face count above which BVH construction runs in parallel.
    #[must_use]
    pub fn with_parallel_build_threshold(mut self, threshold: usize) -> Self {
        self.parallel_build_threshold = threshold;
        self
    }

    /// Set the number of ray directions tried per point classification
    /// (clamped to at least 1).
    #[must_use]
    pub fn with_max_ray_attempts(mut self, attempts: usize) -> Self {
        self.max_ray_attempts = attempts.max(1);
        self
    }
}
