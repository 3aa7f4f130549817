//! Interval-keyed storage for per-byte synchronization state.
//!
//! A [`RangeMap`] maps disjoint half-open subranges of a resource's linear
//! address space to values. Queries and updates split stored entries at the
//! requested boundaries so callers always see pieces that lie wholly inside
//! the request; [`RangeMap::consolidate`] merges equal neighbours back.
//!
//! ```
//! use vigil_core::Subrange;
//! use vigil_range::RangeMap;
//!
//! let mut map: RangeMap<u32> = RangeMap::new(1024);
//! map.upsert(Subrange::new(0, 1024), |_, v| *v = 1).unwrap();
//! map.upsert(Subrange::new(256, 512), |_, v| *v = 2).unwrap();
//! assert_eq!(map.len(), 3);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod map;

pub use error::RangeError;
pub use map::RangeMap;
