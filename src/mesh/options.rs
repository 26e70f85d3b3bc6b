//! Topology build options.

use crate::algo::DEFAULT_BLOCK_SIZE;
use crate::error::{Result, SubdivError};

/// Default global tessellation rate.
pub const DEFAULT_TESSELLATION_RATE: f32 = 2.0;

/// How mesh boundaries are sharpened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryMode {
    /// Boundary edges are infinitely sharp; corners stay smooth.
    #[default]
    EdgeOnly,
    /// Boundary edges and corner vertices are infinitely sharp.
    EdgeAndCorner,
}

impl BoundaryMode {
    /// Whether corner vertices get an infinite crease weight.
    #[inline]
    pub fn sharpens_corners(self) -> bool {
        self == BoundaryMode::EdgeAndCorner
    }
}

/// Options controlling topology construction.
#[derive(Debug, Clone)]
pub struct TopologyOptions {
    /// Boundary sharpening rule.
    pub boundary: BoundaryMode,

    /// Global tessellation rate, used as edge level when no level buffer is
    /// set.
    pub tessellation_rate: f32,

    /// Number of faces or half-edges handed to one task.
    pub block_size: usize,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            boundary: BoundaryMode::EdgeOnly,
            tessellation_rate: DEFAULT_TESSELLATION_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            parallel: true,
        }
    }
}

impl TopologyOptions {
    /// Set the boundary mode.
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the tessellation rate.
    pub fn with_tessellation_rate(mut self, rate: f32) -> Self {
        self.tessellation_rate = rate;
        self
    }

    /// Set the task block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        validate_tessellation_rate(self.tessellation_rate)?;
        if self.block_size == 0 {
            return Err(SubdivError::invalid_param(
                "block_size",
                self.block_size,
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_tessellation_rate(rate: f32) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(SubdivError::invalid_param(
            "tessellation_rate",
            rate,
            "must be finite and positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TopologyOptions::default();
        assert_eq!(options.boundary, BoundaryMode::EdgeOnly);
        assert_eq!(options.tessellation_rate, 2.0);
        assert_eq!(options.block_size, 4096);
        assert!(options.parallel);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let options = TopologyOptions::default()
            .with_boundary(BoundaryMode::EdgeAndCorner)
            .with_tessellation_rate(8.0)
            .with_block_size(0)
            .sequential();
        assert!(options.boundary.sharpens_corners());
        assert_eq!(options.block_size, 1);
        assert!(!options.parallel);
    }

    #[test]
    fn test_rejects_bad_rate() {
        let options = TopologyOptions::default().with_tessellation_rate(f32::NAN);
        assert!(options.validate().is_err());
        assert!(validate_tessellation_rate(0.0).is_err());
        assert!(validate_tessellation_rate(f32::INFINITY).is_err());
    }
}
