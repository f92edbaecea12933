//! Configuration for range merging and chunk population.
//!
//! - [`ReadConfig`] - Merge distance, waste threshold and buffer reuse
//!
//! # Example
//!
//! ```
//! use stripeio::ReadConfig;
//!
//! let config = ReadConfig::default()
//!     .with_max_merge_distance(64 * 1024)
//!     .with_extra_bytes_fraction_threshold(0.1);
//! config.validate()?;
//! # Ok::<(), stripeio::ReadError>(())
//! ```

use crate::error::ReadError;

/// Default gap, in bytes, bridged between two requested ranges (none).
pub const DEFAULT_MAX_MERGE_DISTANCE: u64 = 0;

/// Default waste fraction below which windows are shared in place.
pub const DEFAULT_EXTRA_BYTES_FRACTION_THRESHOLD: f64 = 0.0;

/// Configuration consumed by the read path.
///
/// # Fields
///
/// - `max_merge_distance` - Largest gap between two requested ranges that a
///   single physical read may bridge. Overlapping and abutting ranges are
///   always merged.
/// - `extra_bytes_fraction_threshold` - Windows whose waste fraction is below
///   this value keep the raw read buffer and share it between chunks; others
///   are compacted down to the requested bytes. Must lie in `[0, 1]`.
/// - `allow_buffer_reuse` - Draw read and compaction buffers from the
///   [`BufferPool`](crate::BufferPool) instead of allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadConfig {
    max_merge_distance: u64,
    extra_bytes_fraction_threshold: f64,
    allow_buffer_reuse: bool,
}

impl ReadConfig {
    /// Creates a new configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidConfig`] if the threshold is NaN or outside `[0, 1]`.
    pub fn new(
        max_merge_distance: u64,
        extra_bytes_fraction_threshold: f64,
        allow_buffer_reuse: bool,
    ) -> Result<Self, ReadError> {
        let config = Self {
            max_merge_distance,
            extra_bytes_fraction_threshold,
            allow_buffer_reuse,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the maximum merge distance.
    pub fn with_max_merge_distance(mut self, bytes: u64) -> Self {
        self.max_merge_distance = bytes;
        self
    }

    /// Sets the extra-bytes fraction threshold.
    pub fn with_extra_bytes_fraction_threshold(mut self, fraction: f64) -> Self {
        self.extra_bytes_fraction_threshold = fraction;
        self
    }

    /// Enables or disables buffer reuse.
    pub fn with_buffer_reuse(mut self, allow: bool) -> Self {
        self.allow_buffer_reuse = allow;
        self
    }

    /// Returns the maximum merge distance.
    pub fn max_merge_distance(&self) -> u64 {
        self.max_merge_distance
    }

    /// Returns the extra-bytes fraction threshold.
    pub fn extra_bytes_fraction_threshold(&self) -> f64 {
        self.extra_bytes_fraction_threshold
    }

    /// Returns whether pooled buffers are used.
    pub fn allow_buffer_reuse(&self) -> bool {
        self.allow_buffer_reuse
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), ReadError> {
        if !(0.0..=1.0).contains(&self.extra_bytes_fraction_threshold) {
            return Err(ReadError::InvalidConfig {
                message: "extra_bytes_fraction_threshold must be within [0, 1]",
            });
        }
        Ok(())
    }
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_merge_distance: DEFAULT_MAX_MERGE_DISTANCE,
            extra_bytes_fraction_threshold: DEFAULT_EXTRA_BYTES_FRACTION_THRESHOLD,
            allow_buffer_reuse: true,
        }
    }
}
