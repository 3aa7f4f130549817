//! [`ResourceTimeline`]: the durable access history of one resource.
//!
//! Recording an access evaluates it against every overlapping piece's
//! history and then updates that history, hazard or not. Sync ops are
//! applied eagerly: each one walks the retained accesses and stamps its
//! second scope onto those its first scope captures.

use indexmap::IndexMap;
use vigil_core::{
    AccessKind, AccessRecord, ExecutionTag, HappensBefore, HazardKind, HazardReport, InputError,
    QueueFamilyId, QueueId, ResourceHandle, ResourceMetadata, SharingMode, Subrange, SyncScope,
};
use vigil_range::RangeMap;
use vigil_scope::{classify, ordered, ownership_ok, Coverage, FirstScope};

use crate::state::{ReadEntry, Retained, SubrangeState};

/// Knobs the detector passes down to each timeline operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineOptions {
    /// Upper bound on reads kept per piece.
    pub max_reads_per_range: usize,
    /// Merge equal neighbouring pieces after each access.
    pub merge_adjacent: bool,
    /// Report queue-family ownership violations.
    pub check_queue_ownership: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            max_reads_per_range: 16,
            merge_adjacent: true,
            check_queue_ownership: true,
        }
    }
}

/// Access history of one resource.
#[derive(Clone, Debug)]
pub struct ResourceTimeline {
    handle: ResourceHandle,
    sharing: SharingMode,
    map: RangeMap<SubrangeState>,
    /// First tag ever recorded per queue; a sync op whose first scope ends
    /// before all of these cannot capture anything here.
    first_seen: IndexMap<QueueId, ExecutionTag>,
}

/// Hazards of one access, folded per (kind, prior access).
#[derive(Default)]
struct Findings {
    by_pair: IndexMap<(HazardKind, Option<AccessRecord>), HazardReport>,
}

impl Findings {
    fn push(&mut self, kind: HazardKind, piece: Subrange, prior: Option<&AccessRecord>, access: &AccessRecord) {
        let key = (kind, prior.copied());
        match self.by_pair.get_mut(&key) {
            Some(existing) => existing.subrange = existing.subrange.hull(&piece),
            None => {
                let report = HazardReport {
                    kind,
                    resource: access.resource,
                    subrange: piece,
                    prior: prior.copied(),
                    access: Some(*access),
                    input_error: None,
                };
                self.by_pair.insert(key, report);
            }
        }
    }

    fn into_reports(self) -> Vec<HazardReport> {
        self.by_pair.into_values().collect()
    }
}

impl ResourceTimeline {
    /// An empty timeline for `handle`.
    pub fn new(handle: ResourceHandle, metadata: &dyn ResourceMetadata) -> Self {
        Self {
            handle,
            sharing: metadata.sharing(),
            map: RangeMap::new(metadata.extent()),
            first_seen: IndexMap::new(),
        }
    }

    /// The resource this timeline belongs to.
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// Declared extent.
    pub fn extent(&self) -> u64 {
        self.map.extent()
    }

    /// Sharing mode.
    pub fn sharing(&self) -> SharingMode {
        self.sharing
    }

    /// Number of stored pieces.
    pub fn piece_count(&self) -> usize {
        self.map.len()
    }

    /// Evaluate `record` against the history of every piece it overlaps,
    /// then update that history.
    ///
    /// A malformed subrange is rejected before anything is touched. Every
    /// other access is recorded, whether or not it produced hazards.
    pub fn record_access<O: HappensBefore + ?Sized>(
        &mut self,
        record: AccessRecord,
        family: Option<QueueFamilyId>,
        options: &TimelineOptions,
        order: &O,
    ) -> Result<Vec<HazardReport>, InputError> {
        self.map.check(&record.subrange)?;
        let check_ownership = options.check_queue_ownership;
        let sharing = self.sharing;
        let mut findings = Findings::default();

        self.map.upsert(record.subrange, |piece, state| match record.kind {
            AccessKind::Read => {
                let mut saw_write = false;
                if let Some(w) = &state.last_write {
                    let coverage = classify(&w.record, &w.deps, &record, order);
                    saw_write = coverage == Coverage::Visible;
                    if let Some(kind) = coverage.hazard(AccessKind::Write, AccessKind::Read) {
                        findings.push(kind, piece, Some(&w.record), &record);
                    }
                    if check_ownership && !ownership_ok(w.family, &w.deps, family, sharing) {
                        findings.push(HazardKind::QueueOwnershipMismatch, piece, Some(&w.record), &record);
                    }
                }
                state.add_read(
                    ReadEntry {
                        access: Retained::new(record, family),
                        saw_write,
                    },
                    options.max_reads_per_range,
                );
            }
            AccessKind::Write => {
                for r in &state.reads {
                    let prior = &r.access;
                    let coverage = classify(&prior.record, &prior.deps, &record, order);
                    if let Some(kind) = coverage.hazard(AccessKind::Read, AccessKind::Write) {
                        findings.push(kind, piece, Some(&prior.record), &record);
                    }
                    if check_ownership && !ownership_ok(prior.family, &prior.deps, family, sharing) {
                        findings.push(HazardKind::QueueOwnershipMismatch, piece, Some(&prior.record), &record);
                    }
                }
                if let Some(w) = &state.last_write {
                    let mut coverage = classify(&w.record, &w.deps, &record, order);
                    // A read that saw the write and is itself ordered before
                    // this one carries the dependency forward.
                    if coverage != Coverage::Visible
                        && state.reads.iter().any(|r| {
                            r.saw_write && ordered(&r.access.record, &r.access.deps, &record, order)
                        })
                    {
                        coverage = Coverage::Visible;
                    }
                    if let Some(kind) = coverage.hazard(AccessKind::Write, AccessKind::Write) {
                        findings.push(kind, piece, Some(&w.record), &record);
                    }
                    if check_ownership && !ownership_ok(w.family, &w.deps, family, sharing) {
                        findings.push(HazardKind::QueueOwnershipMismatch, piece, Some(&w.record), &record);
                    }
                }
                state.set_write(Retained::new(record, family));
            }
        })?;

        if options.merge_adjacent {
            self.map.consolidate(record.subrange);
        }
        self.first_seen.entry(record.tag.queue).or_insert(record.tag);
        Ok(findings.into_reports())
    }

    /// Whether any access recorded here could precede `bound`.
    fn may_capture<O: HappensBefore + ?Sized>(&self, bound: &ExecutionTag, order: &O) -> bool {
        self.first_seen
            .values()
            .any(|first| first == bound || order.precedes(first, bound))
    }

    /// Apply a sync op to every retained access.
    ///
    /// The execution dependency reaches every piece; the memory dependency
    /// and any ownership transfer reach only the pieces inside the op's
    /// affected regions for this resource. Returns the number of retained
    /// accesses the op captured.
    pub fn apply_scope<O: HappensBefore + ?Sized>(
        &mut self,
        scope: &SyncScope,
        bound: &ExecutionTag,
        stamp: &ExecutionTag,
        order: &O,
    ) -> usize {
        if self.map.is_empty() || !self.may_capture(bound, order) {
            return 0;
        }
        let regions = scope.affected.regions_of(self.handle).map(|list| {
            let whole = Subrange::new(0, self.map.extent());
            list.iter()
                .filter_map(|r| r.intersection(&whole))
                .collect::<Vec<_>>()
        });
        if let Some(list) = &regions {
            for region in list {
                self.map.split(*region);
            }
        }

        let mut captured = 0;
        for (piece, state) in self.map.iter_mut() {
            let affected = regions
                .as_ref()
                .map_or(true, |list| list.iter().any(|r| r.intersects(&piece)));
            let retained = state
                .last_write
                .iter_mut()
                .chain(state.reads.iter_mut().map(|r| &mut r.access));
            for access in retained {
                let got = access
                    .deps
                    .apply(&access.record, scope, bound, stamp, affected, order);
                if got != FirstScope::Outside {
                    captured += 1;
                }
            }
        }
        captured
    }

    /// Copy of every stored piece, in address order.
    pub fn snapshot(&self) -> Vec<(Subrange, SubrangeState)> {
        self.map.iter().map(|(r, s)| (r, s.clone())).collect()
    }
}
