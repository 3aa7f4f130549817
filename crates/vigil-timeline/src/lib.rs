//! Resource access timelines for the Vigil hazard detector.
//!
//! One [`ResourceTimeline`] per tracked resource holds, for every piece of
//! its address space, the last write and the reads since, each with the
//! dependencies applied to it. The [`TimelineRegistry`] maps resource
//! handles to timelines with per-timeline locking.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod registry;
pub mod state;
pub mod timeline;

pub use registry::{TimelineRef, TimelineRegistry};
pub use state::{ReadEntry, Retained, SubrangeState};
pub use timeline::{ResourceTimeline, TimelineOptions};
