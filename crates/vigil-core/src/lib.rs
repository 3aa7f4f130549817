//! Core types and traits for the Vigil synchronization hazard detector.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! data model shared by every other crate: identifiers and execution tags,
//! linear subranges, stage/access sets, access records, declared sync
//! scopes, the hazard taxonomy, and the collaborator traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod hazard;
pub mod id;
pub mod range;
pub mod stage;
pub mod sync;
pub mod traits;

pub use access::{AccessKind, AccessRecord, Usage};
pub use error::InputError;
pub use hazard::{HazardKind, HazardReport};
pub use id::{
    EventId, ExecutionTag, FenceId, QueueFamilyId, QueueId, ResourceHandle, SemaphoreId,
};
pub use range::{ImageLayout, ImageSubresourceRange, Subrange};
pub use stage::{AccessSet, StageSet};
pub use sync::{AffectedRanges, ExecScope, OwnershipTransfer, SyncOpKind, SyncScope};
pub use traits::{
    CommandObserver, HappensBefore, ReportSink, ResourceInfo, ResourceMetadata, SharingMode,
};
