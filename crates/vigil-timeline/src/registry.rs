//! Generation-checked slot table of resource timelines.
//!
//! A [`ResourceHandle`] is a slot index plus a generation. Destroying a
//! resource bumps the slot's generation, so stale handles resolve to
//! `None` instead of aliasing whatever reuses the slot. Double-destroy is
//! a no-op.
//!
//! Timelines are stored as `Arc<Mutex<_>>`: the table lock is held only
//! long enough to clone the `Arc`, and each timeline is then locked on its
//! own, so work on disjoint resources never contends.

use std::sync::{Arc, Mutex};

use vigil_core::{ResourceHandle, ResourceMetadata};

use crate::timeline::ResourceTimeline;

/// Shared handle to one timeline.
pub type TimelineRef = Arc<Mutex<ResourceTimeline>>;

struct Slot {
    generation: u32,
    timeline: Option<TimelineRef>,
}

/// Slot table of live timelines.
#[derive(Default)]
pub struct TimelineRegistry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
}

impl TimelineRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a timeline for a newly created resource.
    pub fn create(&mut self, metadata: &dyn ResourceMetadata) -> ResourceHandle {
        self.live += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            let handle = ResourceHandle::from_parts(slot_idx, slot.generation);
            slot.timeline = Some(Arc::new(Mutex::new(ResourceTimeline::new(handle, metadata))));
            handle
        } else {
            let slot_idx = self.slots.len() as u32;
            let handle = ResourceHandle::from_parts(slot_idx, 0);
            self.slots.push(Slot {
                generation: 0,
                timeline: Some(Arc::new(Mutex::new(ResourceTimeline::new(handle, metadata)))),
            });
            handle
        }
    }

    /// The timeline behind `handle`, or `None` if it is stale or unknown.
    pub fn get(&self, handle: ResourceHandle) -> Option<TimelineRef> {
        let slot = self.slots.get(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.timeline.clone()
    }

    /// Free the timeline behind `handle`, returning it.
    ///
    /// A slot whose generation wraps is retired instead of recycled, so a
    /// handle from its first epoch can never resolve again.
    pub fn destroy(&mut self, handle: ResourceHandle) -> Option<TimelineRef> {
        let slot_idx = handle.slot();
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let timeline = slot.timeline.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        self.live -= 1;
        Some(timeline)
    }

    /// Number of live timelines.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no timeline is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Visit every live timeline in slot order.
    pub fn for_each<F: FnMut(ResourceHandle, &TimelineRef)>(&self, mut f: F) {
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(t) = &slot.timeline {
                f(ResourceHandle::from_parts(idx as u32, slot.generation), t);
            }
        }
    }

    /// Clones of every live timeline handle, for walking without holding
    /// the table lock.
    pub fn live(&self) -> Vec<TimelineRef> {
        let mut out = Vec::with_capacity(self.live);
        self.for_each(|_, t| out.push(Arc::clone(t)));
        out
    }

    #[cfg(test)]
    fn force_generation(&mut self, slot_idx: u32, generation: u32) {
        self.slots[slot_idx as usize].generation = generation;
    }
}
