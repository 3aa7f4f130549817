//! Detector configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use vigil_timeline::TimelineOptions;

// ── DetectorConfig ─────────────────────────────────────────────────

/// Configuration for constructing a [`HazardDetector`](crate::HazardDetector).
///
/// [`validate()`](DetectorConfig::validate) runs once in the detector
/// constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Upper bound on reads kept per piece before the oldest same-queue
    /// reads are collapsed. Default: 16. Minimum: 1.
    pub max_reads_per_range: usize,
    /// Merge equal neighbouring pieces after each access. Default: true.
    pub merge_adjacent: bool,
    /// Report `QueueOwnershipMismatch`. Default: true.
    pub check_queue_ownership: bool,
    /// Upper bound on tags expanded by one happens-before query. A query
    /// that exceeds it answers "not ordered". Default: 4096. Minimum: 1.
    pub max_link_walk: usize,
}

impl DetectorConfig {
    /// Default for [`max_reads_per_range`](Self::max_reads_per_range).
    pub const DEFAULT_MAX_READS_PER_RANGE: usize = 16;
    /// Default for [`max_link_walk`](Self::max_link_walk).
    pub const DEFAULT_MAX_LINK_WALK: usize = 4096;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_reads_per_range == 0 {
            return Err(ConfigError::ReadBoundZero);
        }
        if self.max_link_walk == 0 {
            return Err(ConfigError::LinkWalkZero);
        }
        Ok(())
    }

    /// The subset of options each timeline operation needs.
    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            max_reads_per_range: self.max_reads_per_range,
            merge_adjacent: self.merge_adjacent,
            check_queue_ownership: self.check_queue_ownership,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_reads_per_range: Self::DEFAULT_MAX_READS_PER_RANGE,
            merge_adjacent: true,
            check_queue_ownership: true,
            max_link_walk: Self::DEFAULT_MAX_LINK_WALK,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`DetectorConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_reads_per_range` is zero.
    ReadBoundZero,
    /// `max_link_walk` is zero.
    LinkWalkZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadBoundZero => write!(f, "max_reads_per_range must be at least 1"),
            Self::LinkWalkZero => write!(f, "max_link_walk must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_read_bound_rejected() {
        let cfg = DetectorConfig {
            max_reads_per_range: 0,
            ..DetectorConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::ReadBoundZero) => {}
            other => panic!("expected ReadBoundZero, got {other:?}"),
        }
    }

    #[test]
    fn zero_link_walk_rejected() {
        let cfg = DetectorConfig {
            max_link_walk: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::LinkWalkZero));
    }

    #[test]
    fn timeline_options_mirror_config() {
        let cfg = DetectorConfig {
            max_reads_per_range: 3,
            merge_adjacent: false,
            check_queue_ownership: false,
            ..DetectorConfig::default()
        };
        let opts = cfg.timeline_options();
        assert_eq!(opts.max_reads_per_range, 3);
        assert!(!opts.merge_adjacent);
        assert!(!opts.check_queue_ownership);
    }
}
