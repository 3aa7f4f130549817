//! Submission order tracking: tag allocation and happens-before queries.
//!
//! Each queue hands out strictly increasing tags. Semaphore and fence
//! links are the only cross-queue edges; [`precedes`](SubmissionOrderTracker::precedes)
//! follows them breadth-first. Links are keyed by source tag in a
//! `BTreeMap`, so every link leaving "at or after" a tag on its queue is a
//! single range scan.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use smallvec::SmallVec;
use vigil_core::{ExecutionTag, HappensBefore, InputError, QueueId};

#[derive(Clone, Debug, Default)]
struct QueueCursor {
    submission: u64,
    sequence: u32,
    started: bool,
    /// Host fence waits already linked into this queue.
    host_epoch_seen: u64,
}

/// Assigns execution tags and answers happens-before queries.
#[derive(Debug)]
pub struct SubmissionOrderTracker {
    queues: IndexMap<QueueId, QueueCursor>,
    links: BTreeMap<ExecutionTag, SmallVec<[ExecutionTag; 2]>>,
    host: QueueCursor,
    host_epoch: u64,
    last_host: Option<ExecutionTag>,
    max_walk: usize,
}

impl SubmissionOrderTracker {
    /// A tracker whose queries expand at most `max_walk` tags.
    pub fn new(max_walk: usize) -> Self {
        Self {
            queues: IndexMap::new(),
            links: BTreeMap::new(),
            host: QueueCursor::default(),
            host_epoch: 0,
            last_host: None,
            max_walk,
        }
    }

    /// Open the next submission on `queue`, resetting its sequence counter.
    /// Returns the submission index.
    pub fn begin_submission(&mut self, queue: QueueId) -> u64 {
        let cursor = self.queues.entry(queue).or_default();
        if cursor.started {
            cursor.submission += 1;
            cursor.sequence = 0;
        } else {
            cursor.started = true;
        }
        cursor.submission
    }

    /// Allocate the next tag on `queue`.
    ///
    /// The first tag a queue allocates after a host fence wait is linked
    /// from that wait, so work submitted after the host observed a fence
    /// is ordered after everything the fence covered.
    pub fn next_tag(&mut self, queue: QueueId) -> ExecutionTag {
        let cursor = self.queues.entry(queue).or_default();
        cursor.started = true;
        let tag = ExecutionTag::new(queue, cursor.submission, cursor.sequence);
        cursor.sequence += 1;
        let pending_host = (cursor.host_epoch_seen < self.host_epoch)
            .then_some(self.last_host)
            .flatten();
        cursor.host_epoch_seen = self.host_epoch;
        if let Some(host) = pending_host {
            self.links.entry(host).or_default().push(tag);
        }
        tag
    }

    fn link(&mut self, from: ExecutionTag, to: ExecutionTag) -> Result<(), InputError> {
        if from == to || self.precedes(&to, &from) {
            return Err(InputError::DependencyCycle { from, to });
        }
        self.links.entry(from).or_default().push(to);
        Ok(())
    }

    /// Record that the semaphore signaled at `signal` was waited on at `wait`.
    pub fn link_via_semaphore(
        &mut self,
        signal: ExecutionTag,
        wait: ExecutionTag,
    ) -> Result<(), InputError> {
        self.link(signal, wait)
    }

    /// Record a host wait on the fence signaled at `signal`. Returns the
    /// host-queue tag of the wait.
    pub fn link_via_fence(&mut self, signal: ExecutionTag) -> Result<ExecutionTag, InputError> {
        let host = ExecutionTag::new(QueueId::HOST, self.host.submission, self.host.sequence);
        self.host.sequence += 1;
        self.link(signal, host)?;
        self.last_host = Some(host);
        self.host_epoch += 1;
        Ok(host)
    }

    /// Whether `a` happens-before `b`.
    ///
    /// True on one queue when `a` comes first, or when a chain of links
    /// leads from `a` (or later on its queue) to `b` (or earlier on its
    /// queue). A query that expands more than the configured number of
    /// tags gives up and answers `false`.
    pub fn precedes(&self, a: &ExecutionTag, b: &ExecutionTag) -> bool {
        if a == b {
            return false;
        }
        if a.same_queue_before(b) {
            return true;
        }
        // Earliest tag reached per queue; anything later on that queue is
        // already covered.
        let mut reached: IndexMap<QueueId, ExecutionTag> = IndexMap::new();
        reached.insert(a.queue, *a);
        let mut frontier = vec![*a];
        let mut walked = 0usize;
        while let Some(x) = frontier.pop() {
            walked += 1;
            if walked > self.max_walk {
                log::debug!("happens-before walk from {a} to {b} exceeded {} tags", self.max_walk);
                return false;
            }
            let end = ExecutionTag::new(x.queue, u64::MAX, u32::MAX);
            for targets in self.links.range(x..=end).map(|(_, t)| t) {
                for to in targets {
                    if to == b || to.same_queue_before(b) {
                        return true;
                    }
                    if let Some(seen) = reached.get(&to.queue) {
                        if seen == to || seen.same_queue_before(to) {
                            continue;
                        }
                    }
                    reached.insert(to.queue, *to);
                    frontier.push(*to);
                }
            }
        }
        false
    }

    /// Number of recorded cross-queue links.
    pub fn link_count(&self) -> usize {
        self.links.values().map(|t| t.len()).sum()
    }
}

impl HappensBefore for SubmissionOrderTracker {
    fn precedes(&self, a: &ExecutionTag, b: &ExecutionTag) -> bool {
        SubmissionOrderTracker::precedes(self, a, b)
    }
}
