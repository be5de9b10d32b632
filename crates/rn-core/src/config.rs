//! Analysis configuration.

use crate::CoreError;

/// Tunables shared by graph construction, street lookup, and centrality.
///
/// Typically filled from command-line flags by the application crate and
/// passed to the builders.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Speed (m/s) assumed for edges that carry neither a speed nor a travel
    /// time.  Default: 8.9 m/s (~20 mph, urban residential).
    pub fallback_speed_mps: f64,

    /// Maximum number of sample street names attached to a failed street
    /// lookup.  Default: 20.
    pub street_suggestion_limit: usize,

    /// Sources processed per parallel batch by the centrality estimator.
    /// Bounds peak memory at `parallel_chunk × node_count` floats.  Default: 64.
    pub parallel_chunk: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fallback_speed_mps:      8.9,
            street_suggestion_limit: 20,
            parallel_chunk:          64,
        }
    }
}

impl NetworkConfig {
    /// Reject values the builders cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.fallback_speed_mps.is_finite() && self.fallback_speed_mps > 0.0) {
            return Err(CoreError::Config(format!(
                "fallback_speed_mps must be a positive number, got {}",
                self.fallback_speed_mps
            )));
        }
        if self.parallel_chunk == 0 {
            return Err(CoreError::Config("parallel_chunk must be at least 1".into()));
        }
        Ok(())
    }
}
