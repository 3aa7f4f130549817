//! Test utilities and fixtures for Vigil development.
//!
//! Provides a standalone [`TestOrder`] implementation of
//! [`HappensBefore`] and record/scope builders in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use vigil_core::{ExecutionTag, HappensBefore};

pub use fixtures::*;

/// Program order plus an explicit list of cross-queue links.
///
/// Mirrors the tracker's reachability rule without any of its
/// bookkeeping: `a` precedes `b` if they share a queue with `a` first, or
/// a chain of links leads from at-or-after `a` to at-or-before `b`.
#[derive(Clone, Debug, Default)]
pub struct TestOrder {
    links: Vec<(ExecutionTag, ExecutionTag)>,
}

impl TestOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `from → to` link.
    pub fn link(mut self, from: ExecutionTag, to: ExecutionTag) -> Self {
        self.links.push((from, to));
        self
    }
}

impl HappensBefore for TestOrder {
    fn precedes(&self, a: &ExecutionTag, b: &ExecutionTag) -> bool {
        if a.same_queue_before(b) {
            return true;
        }
        let mut frontier = vec![*a];
        let mut seen: Vec<ExecutionTag> = Vec::new();
        while let Some(x) = frontier.pop() {
            for (from, to) in &self.links {
                if (*from == x || x.same_queue_before(from)) && !seen.contains(to) {
                    if to == b || to.same_queue_before(b) {
                        return true;
                    }
                    seen.push(*to);
                    frontier.push(*to);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::QueueId;

    fn t(q: u32, seq: u32) -> ExecutionTag {
        ExecutionTag::new(QueueId(q), 0, seq)
    }

    #[test]
    fn program_order_only_within_queue() {
        let order = TestOrder::new();
        assert!(order.precedes(&t(0, 0), &t(0, 1)));
        assert!(!order.precedes(&t(0, 1), &t(0, 1)));
        assert!(!order.precedes(&t(0, 0), &t(1, 5)));
    }

    #[test]
    fn links_chain_transitively() {
        let order = TestOrder::new().link(t(0, 2), t(1, 0)).link(t(1, 3), t(2, 0));
        assert!(order.precedes(&t(0, 1), &t(1, 1)));
        assert!(order.precedes(&t(0, 1), &t(2, 4)));
        assert!(!order.precedes(&t(0, 3), &t(1, 1)));
        assert!(!order.precedes(&t(1, 4), &t(2, 4)));
    }
}
