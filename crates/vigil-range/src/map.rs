//! [`RangeMap`]: disjoint interval-keyed storage over `[0, extent)`.
//!
//! Entries are keyed by start address in a `BTreeMap`, each carrying its
//! end address and value. Every mutation first splits the entries that
//! straddle the requested boundaries, so stored entries never overlap and
//! a returned piece is always wholly inside or wholly outside the request.

use std::collections::BTreeMap;

use vigil_core::Subrange;

use crate::error::RangeError;

/// Interval map over a linear address space.
///
/// The union of stored entries equals the union of every range ever
/// passed to [`upsert`](RangeMap::upsert). Splitting never changes that
/// union; [`consolidate`](RangeMap::consolidate) only merges entries that
/// abut and hold equal values.
#[derive(Clone, Debug)]
pub struct RangeMap<V> {
    extent: u64,
    /// `start → (end, value)`.
    entries: BTreeMap<u64, (u64, V)>,
}

impl<V: Clone> RangeMap<V> {
    /// Create an empty map covering `[0, extent)`.
    pub fn new(extent: u64) -> Self {
        Self {
            extent,
            entries: BTreeMap::new(),
        }
    }

    /// The declared extent.
    pub fn extent(&self) -> u64 {
        self.extent
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, keeping the extent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reject empty ranges and ranges past the extent.
    pub fn check(&self, range: &Subrange) -> Result<(), RangeError> {
        if range.is_empty() {
            return Err(RangeError::Empty { range: *range });
        }
        if range.end > self.extent {
            return Err(RangeError::OutOfExtent {
                range: *range,
                extent: self.extent,
            });
        }
        Ok(())
    }

    /// Split the entry straddling `at`, if any, into `[start, at)` and
    /// `[at, end)` carrying clones of the same value.
    fn split_at(&mut self, at: u64) {
        let Some((&start, (end, value))) = self.entries.range(..at).next_back() else {
            return;
        };
        let end = *end;
        if end <= at {
            return;
        }
        let tail = value.clone();
        if let Some(head) = self.entries.get_mut(&start) {
            head.0 = at;
        }
        self.entries.insert(at, (end, tail));
    }

    /// Split stored entries at both boundaries of `range`, so that no
    /// entry straddles either end. Addresses outside the map are ignored.
    pub fn split(&mut self, range: Subrange) {
        self.split_at(range.start);
        self.split_at(range.end);
    }

    /// Every stored piece overlapping `range`, in address order.
    ///
    /// Boundary entries are split first, so each returned piece lies
    /// entirely inside `range`. Gaps (never-touched addresses) are not
    /// returned.
    pub fn query(&mut self, range: Subrange) -> Result<Vec<(Subrange, &V)>, RangeError> {
        self.check(&range)?;
        self.split(range);
        Ok(self
            .entries
            .range(range.start..range.end)
            .map(|(&s, (e, v))| (Subrange::new(s, *e), v))
            .collect())
    }

    /// Read-only view of the pieces overlapping `range`, clipped to it.
    ///
    /// Unlike [`query`](RangeMap::query) this never splits stored entries.
    pub fn overlapping(&self, range: Subrange) -> Vec<(Subrange, &V)> {
        let first = self
            .entries
            .range(..range.start)
            .next_back()
            .filter(|(_, (end, _))| *end > range.start)
            .map(|(&s, _)| s)
            .unwrap_or(range.start);
        self.entries
            .range(first..range.end)
            .filter_map(|(&s, (e, v))| {
                Subrange::new(s, *e)
                    .intersection(&range)
                    .map(|clipped| (clipped, v))
            })
            .collect()
    }

    /// Iterate every stored entry in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Subrange, &V)> {
        self.entries
            .iter()
            .map(|(&s, (e, v))| (Subrange::new(s, *e), v))
    }

    /// Mutable iteration over every stored entry in address order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Subrange, &mut V)> {
        self.entries
            .iter_mut()
            .map(|(&s, (e, v))| (Subrange::new(s, *e), v))
    }

    /// Merge abutting entries with equal values among those touching
    /// `range` (and the neighbour on each side). Returns the number of
    /// merges performed.
    pub fn consolidate(&mut self, range: Subrange) -> usize
    where
        V: PartialEq,
    {
        if range.is_empty() {
            return 0;
        }
        let lo = self
            .entries
            .range(..range.start)
            .next_back()
            .map(|(&s, _)| s)
            .unwrap_or(range.start);
        let keys: Vec<u64> = self
            .entries
            .range(lo..=range.end)
            .map(|(&s, _)| s)
            .collect();

        let mut merges = 0;
        let mut current = match keys.first() {
            Some(&k) => k,
            None => return 0,
        };
        for &next in &keys[1..] {
            let mergeable = match (self.entries.get(&current), self.entries.get(&next)) {
                (Some((end, a)), Some((_, b))) => *end == next && a == b,
                _ => false,
            };
            if mergeable {
                if let Some((next_end, _)) = self.entries.remove(&next) {
                    if let Some(head) = self.entries.get_mut(&current) {
                        head.0 = next_end;
                    }
                    merges += 1;
                }
            } else {
                current = next;
            }
        }
        merges
    }
}

impl<V: Clone + Default> RangeMap<V> {
    /// Apply `f` to every piece of `range`, creating default-initialised
    /// pieces for addresses never touched before.
    ///
    /// Boundary entries are split before `f` runs, so `f` only ever sees
    /// pieces wholly inside `range`. Returns the number of pieces visited.
    pub fn upsert<F>(&mut self, range: Subrange, mut f: F) -> Result<usize, RangeError>
    where
        F: FnMut(Subrange, &mut V),
    {
        self.check(&range)?;
        self.split(range);

        let mut gaps: Vec<Subrange> = Vec::new();
        let mut cursor = range.start;
        for (&s, &(e, _)) in self.entries.range(range.start..range.end) {
            if cursor < s {
                gaps.push(Subrange::new(cursor, s));
            }
            cursor = e;
        }
        if cursor < range.end {
            gaps.push(Subrange::new(cursor, range.end));
        }
        for gap in gaps {
            self.entries.insert(gap.start, (gap.end, V::default()));
        }

        let mut visited = 0;
        for (&s, (e, v)) in self.entries.range_mut(range.start..range.end) {
            f(Subrange::new(s, *e), v);
            visited += 1;
        }
        Ok(visited)
    }
}
