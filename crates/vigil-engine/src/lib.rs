//! Hazard detection engine for explicitly synchronized command streams.
//!
//! Command lists are recorded with an [`AccessContext`] and handed to a
//! [`HazardDetector`] inside a [`Submission`]. The detector assigns
//! execution tags, links queues through semaphores and fences, replays
//! each recorded access against its resource's timeline, and reports
//! every RAW, WAW, WAR, ordered-but-not-visible, and queue ownership
//! hazard it finds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod detector;
pub mod metrics;
pub mod sink;
pub mod submission;
pub mod tracker;

pub use config::{ConfigError, DetectorConfig};
pub use context::{AccessContext, ContextError, ContextState, RecordedCommands, RecordedEvent};
pub use detector::HazardDetector;
pub use metrics::{DetectorMetrics, DetectorTotals, SubmitMetrics};
pub use sink::{ChannelSink, CollectingSink, LogSink};
pub use submission::{SemaphoreSignal, SemaphoreWait, SubmitBatch, SubmitOutcome, Submission};
pub use tracker::SubmissionOrderTracker;
