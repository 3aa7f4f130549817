//! Vigil: synchronization hazard detection for explicitly synchronized
//! command streams.
//!
//! This is the facade crate that re-exports the public API of every Vigil
//! sub-crate. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use vigil::prelude::*;
//!
//! let detector = HazardDetector::new(DetectorConfig::default()).unwrap();
//! let buf = detector.create_resource(&ResourceInfo::buffer(1024));
//!
//! // A copy writes the buffer, then a compute shader reads it with no
//! // barrier in between.
//! let mut ctx = AccessContext::new();
//! ctx.begin();
//! ctx.record_access(buf, Subrange::new(0, 1024), AccessKind::Write, Usage::TRANSFER_WRITE)
//!     .unwrap();
//! ctx.record_access(buf, Subrange::new(0, 1024), AccessKind::Read, Usage::COMPUTE_READ)
//!     .unwrap();
//! let cmds = ctx.end().unwrap();
//!
//! let outcome = detector.submit(
//!     Submission::new(QueueId(0)).batch(SubmitBatch::new().commands(cmds)),
//! );
//! assert_eq!(outcome.reports.len(), 1);
//! assert_eq!(outcome.reports[0].kind, HazardKind::ReadAfterWrite);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vigil-core` | IDs, ranges, stage/access sets, scopes, reports, traits |
//! | [`range`] | `vigil-range` | Interval map keyed by linear subrange |
//! | [`scope`] | `vigil-scope` | Scope matching and dependency state |
//! | [`timeline`] | `vigil-timeline` | Per-resource access history |
//! | [`engine`] | `vigil-engine` | Recording, submission ordering, the detector |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`vigil-core`).
///
/// Identifiers, [`types::Subrange`], [`types::StageSet`] and
/// [`types::AccessSet`], [`types::SyncScope`], and
/// [`types::HazardReport`].
pub use vigil_core as types;

/// Interval map over a linear address space (`vigil-range`).
pub use vigil_range as range;

/// Scope matching (`vigil-scope`).
///
/// Decides whether a sync op captures an access and whether a later
/// access is covered by what was applied.
pub use vigil_scope as scope;

/// Resource access timelines (`vigil-timeline`).
pub use vigil_timeline as timeline;

/// The hazard detector (`vigil-engine`).
///
/// [`engine::HazardDetector`] replays [`engine::Submission`]s recorded
/// with [`engine::AccessContext`].
pub use vigil_engine as engine;

/// Common imports for typical Vigil usage.
///
/// ```rust
/// use vigil::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and ranges
    pub use vigil_core::{
        EventId, ExecutionTag, FenceId, ImageLayout, ImageSubresourceRange, QueueFamilyId,
        QueueId, ResourceHandle, SemaphoreId, Subrange,
    };

    // Access classification and scopes
    pub use vigil_core::{
        AccessKind, AccessSet, AffectedRanges, ExecScope, OwnershipTransfer, StageSet, SyncScope,
        Usage,
    };

    // Reports and errors
    pub use vigil_core::{HazardKind, HazardReport, InputError};

    // Collaborator traits
    pub use vigil_core::{
        CommandObserver, ReportSink, ResourceInfo, ResourceMetadata, SharingMode,
    };

    // Engine
    pub use vigil_engine::{
        AccessContext, ChannelSink, CollectingSink, ConfigError, DetectorConfig, HazardDetector,
        LogSink, RecordedCommands, SemaphoreSignal, SemaphoreWait, SubmitBatch, SubmitOutcome,
        Submission,
    };
}
