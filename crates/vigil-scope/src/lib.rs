//! Synchronization scope resolution.
//!
//! Decides whether declared barriers, events, semaphores and fences cover a
//! pair of conflicting accesses. Order and visibility are tracked
//! separately: a dependency can execution-order two accesses without making
//! the first one's writes visible to the second, and the two outcomes map
//! to different hazard kinds.
//!
//! The crate is stateless apart from [`DependencyState`], the per-access
//! record of which sync ops captured it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod resolver;
pub mod state;

pub use resolver::{
    classify, dst_matches, ordered, ownership_ok, src_matches, Coverage,
};
pub use state::{AppliedScope, DependencyState, FirstScope};
