//! Benchmark workloads for the Vigil hazard detector.
//!
//! Provides pre-built [`WorkloadProfile`]s and deterministic command
//! stream generation:
//!
//! - [`reference_profile`]: 64 buffers, 4 queues, a barrier every 8 accesses
//! - [`stress_profile`]: 1024 buffers, 8 queues, sparse barriers
//! - [`record_stream`]: seeded random command lists over a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vigil_core::{AccessKind, ResourceHandle, ResourceInfo, Subrange, SyncScope, Usage};
use vigil_engine::{AccessContext, DetectorConfig, HazardDetector, RecordedCommands};

/// Shape of a generated workload.
#[derive(Clone, Debug)]
pub struct WorkloadProfile {
    /// Buffers created up front.
    pub resources: usize,
    /// Size of every buffer in bytes.
    pub buffer_size: u64,
    /// Queues the submissions rotate over.
    pub queues: u32,
    /// Command lists generated per stream.
    pub lists: usize,
    /// Accesses per command list.
    pub accesses_per_list: usize,
    /// A full barrier is recorded after this many accesses. Zero disables
    /// barriers.
    pub barrier_every: usize,
}

/// 64 buffers of 64 KiB over 4 queues.
pub fn reference_profile() -> WorkloadProfile {
    WorkloadProfile {
        resources: 64,
        buffer_size: 64 * 1024,
        queues: 4,
        lists: 16,
        accesses_per_list: 64,
        barrier_every: 8,
    }
}

/// 1024 buffers of 1 MiB over 8 queues with sparse barriers.
pub fn stress_profile() -> WorkloadProfile {
    WorkloadProfile {
        resources: 1024,
        buffer_size: 1024 * 1024,
        queues: 8,
        lists: 32,
        accesses_per_list: 256,
        barrier_every: 64,
    }
}

/// A detector with the profile's buffers already created.
pub fn build_detector(profile: &WorkloadProfile) -> (HazardDetector, Vec<ResourceHandle>) {
    let detector = HazardDetector::new(DetectorConfig::default()).unwrap();
    let info = ResourceInfo::buffer(profile.buffer_size);
    let handles = (0..profile.resources)
        .map(|_| detector.create_resource(&info))
        .collect();
    (detector, handles)
}

/// Random aligned subrange of a `size`-byte buffer, 1/64 to 1/4 of it.
fn random_range(rng: &mut ChaCha8Rng, size: u64) -> Subrange {
    let granule = (size / 64).max(1);
    let len = granule * (1 + rng.next_u64() % 16);
    let slots = (size - len.min(size)) / granule + 1;
    let start = granule * (rng.next_u64() % slots);
    Subrange::new(start, (start + len).min(size))
}

/// Generate `profile.lists` command lists from `seed`.
///
/// Roughly one access in four is a write. The same seed always yields the
/// same lists.
pub fn record_stream(
    profile: &WorkloadProfile,
    resources: &[ResourceHandle],
    seed: u64,
) -> Vec<RecordedCommands> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut lists = Vec::with_capacity(profile.lists);
    for _ in 0..profile.lists {
        let mut ctx = AccessContext::new();
        ctx.begin();
        for i in 0..profile.accesses_per_list {
            if profile.barrier_every > 0 && i > 0 && i % profile.barrier_every == 0 {
                ctx.record_barrier(SyncScope::full()).unwrap();
            }
            let resource = resources[(rng.next_u64() as usize) % resources.len()];
            let range = random_range(&mut rng, profile.buffer_size);
            let (kind, usage) = if rng.next_u64() % 4 == 0 {
                (AccessKind::Write, Usage::COMPUTE_WRITE)
            } else {
                (AccessKind::Read, Usage::COMPUTE_READ)
            };
            ctx.record_access(resource, range, kind, usage).unwrap();
        }
        lists.push(ctx.end().unwrap());
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_deterministic() {
        let profile = WorkloadProfile {
            resources: 4,
            lists: 2,
            accesses_per_list: 16,
            ..reference_profile()
        };
        let (_d, handles) = build_detector(&profile);
        let a = record_stream(&profile, &handles, 7);
        let b = record_stream(&profile, &handles, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        // 16 accesses plus a barrier after every 8th.
        assert_eq!(a[0].len(), 17);
    }

    #[test]
    fn generated_ranges_stay_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let r = random_range(&mut rng, 4096);
            assert!(!r.is_empty());
            assert!(r.end <= 4096);
        }
    }
}
