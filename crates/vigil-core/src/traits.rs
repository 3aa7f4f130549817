//! Collaborator seams: ordering queries, resource metadata, the inbound
//! command stream, and the outbound report sink.

use crate::access::{AccessKind, Usage};
use crate::hazard::HazardReport;
use crate::id::{EventId, ExecutionTag, ResourceHandle};
use crate::range::{ImageLayout, Subrange};
use crate::sync::{AffectedRanges, ExecScope, SyncScope};

/// Answers happens-before queries over execution tags.
///
/// Implemented by the submission order tracker. Absence of an ordering is
/// reported as `false`, never as "unordered therefore safe".
pub trait HappensBefore {
    /// Whether `a` is ordered before `b` by queue program order or by a
    /// chain of recorded semaphore/fence links.
    fn precedes(&self, a: &ExecutionTag, b: &ExecutionTag) -> bool;
}

/// How a resource may be shared between queue families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharingMode {
    /// One family owns the resource at a time; crossing families requires
    /// an ownership transfer.
    Exclusive,
    /// Any family may access the resource without a transfer.
    Concurrent,
}

/// Supplies the facts the detector needs when a resource is created.
pub trait ResourceMetadata {
    /// Total addressable linear extent.
    fn extent(&self) -> u64;

    /// Queue-family sharing mode.
    fn sharing(&self) -> SharingMode;
}

/// A plain metadata record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Linear extent.
    pub extent: u64,
    /// Sharing mode.
    pub sharing: SharingMode,
}

impl ResourceInfo {
    /// An exclusive-mode buffer of `size` bytes.
    pub fn buffer(size: u64) -> Self {
        Self {
            extent: size,
            sharing: SharingMode::Exclusive,
        }
    }

    /// A concurrent-mode buffer of `size` bytes.
    pub fn concurrent_buffer(size: u64) -> Self {
        Self {
            extent: size,
            sharing: SharingMode::Concurrent,
        }
    }

    /// An exclusive-mode image with the given linearisation.
    pub fn image(layout: &ImageLayout) -> Self {
        Self {
            extent: layout.extent(),
            sharing: SharingMode::Exclusive,
        }
    }
}

impl ResourceMetadata for ResourceInfo {
    fn extent(&self) -> u64 {
        self.extent
    }

    fn sharing(&self) -> SharingMode {
        self.sharing
    }
}

/// Inbound event stream from the command recorder.
///
/// One observer per recording unit; calls arrive in recording order and
/// are already validated for self-consistency.
pub trait CommandObserver {
    /// A command touched `subrange` of `resource`.
    fn access(&mut self, resource: ResourceHandle, subrange: Subrange, kind: AccessKind, usage: Usage);

    /// A pipeline barrier.
    fn barrier(&mut self, scope: SyncScope);

    /// First half of a split barrier.
    fn set_event(&mut self, event: EventId, src: ExecScope);

    /// Second half of a split barrier.
    fn wait_event(&mut self, event: EventId, dst: ExecScope, affected: AffectedRanges);
}

/// Downstream consumer of hazard reports.
///
/// Receives every report of one submission call in a single ordered batch.
/// Makes no promise about display, aggregation, or de-duplication across
/// repeated runs.
pub trait ReportSink: Send + Sync {
    /// Deliver the reports produced by one submission.
    fn deliver(&self, reports: &[HazardReport]);
}
