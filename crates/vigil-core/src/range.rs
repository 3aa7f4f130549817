//! Linear subranges and the image subresource decomposition.
//!
//! Every resource is addressed as a linear `[0, extent)` space. Buffers use
//! byte offsets directly; images are flattened by [`ImageLayout`] so that
//! both share one range-indexing structure.

use smallvec::SmallVec;
use std::fmt;

use crate::error::InputError;

/// A half-open region `[start, end)` of a resource's linear address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subrange {
    /// First address covered.
    pub start: u64,
    /// One past the last address covered.
    pub end: u64,
}

impl Subrange {
    /// Create `[start, end)`. An `end <= start` yields an empty range,
    /// which every consumer rejects as an input error.
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Create `[start, start + len)`, saturating at `u64::MAX`.
    pub const fn with_len(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    /// Number of addresses covered.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range covers nothing.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the two ranges share at least one address.
    pub fn intersects(&self, other: &Subrange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlap of two ranges, if any.
    pub fn intersection(&self, other: &Subrange) -> Option<Subrange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Subrange { start, end })
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Subrange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest range covering both.
    pub fn hull(&self, other: &Subrange) -> Subrange {
        Subrange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `other` starts exactly where `self` ends.
    pub fn abuts(&self, other: &Subrange) -> bool {
        self.end == other.start
    }
}

impl fmt::Display for Subrange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ── Image subresources ─────────────────────────────────────────────

/// A multi-dimensional selection of image subresources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSubresourceRange {
    /// First aspect plane (color, depth, stencil...) selected.
    pub base_aspect: u32,
    /// Number of aspect planes selected.
    pub aspect_count: u32,
    /// First mip level selected.
    pub base_mip: u32,
    /// Number of mip levels selected.
    pub mip_count: u32,
    /// First array layer selected.
    pub base_layer: u32,
    /// Number of array layers selected.
    pub layer_count: u32,
}

/// Linearisation of an image's subresources.
///
/// Subresources are laid out aspect-major, then mip, then layer; each
/// `(aspect, mip, layer)` occupies `mip_bytes[mip]` addresses. The order
/// is stable, so decomposed subranges are ordered keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    aspect_count: u32,
    array_layers: u32,
    mip_bytes: SmallVec<[u64; 16]>,
}

impl ImageLayout {
    /// Describe an image with `aspect_count` planes, `array_layers` layers,
    /// and one layer-slice size per mip level.
    ///
    /// Fails with [`InputError::ImageTooLarge`] when the flattened extent
    /// does not fit in 64 bits; every offset computed later is bounded by
    /// that extent.
    pub fn new(aspect_count: u32, array_layers: u32, mip_bytes: &[u64]) -> Result<Self, InputError> {
        let extent = mip_bytes
            .iter()
            .try_fold(0u64, |acc, &b| b.checked_mul(array_layers as u64)?.checked_add(acc))
            .and_then(|stride| stride.checked_mul(aspect_count as u64));
        if extent.is_none() {
            return Err(InputError::ImageTooLarge {
                aspects: aspect_count,
                mips: mip_bytes.len() as u32,
                layers: array_layers,
            });
        }
        Ok(Self {
            aspect_count,
            array_layers,
            mip_bytes: mip_bytes.iter().copied().collect(),
        })
    }

    /// Number of mip levels.
    pub fn mip_levels(&self) -> u32 {
        self.mip_bytes.len() as u32
    }

    fn aspect_stride(&self) -> u64 {
        self.mip_bytes
            .iter()
            .map(|b| b * self.array_layers as u64)
            .sum()
    }

    fn mip_base(&self, mip: u32) -> u64 {
        self.mip_bytes[..mip as usize]
            .iter()
            .map(|b| b * self.array_layers as u64)
            .sum()
    }

    /// Total linear extent of the image.
    pub fn extent(&self) -> u64 {
        self.aspect_stride() * self.aspect_count as u64
    }

    /// The whole image as one selection.
    pub fn full_range(&self) -> ImageSubresourceRange {
        ImageSubresourceRange {
            base_aspect: 0,
            aspect_count: self.aspect_count,
            base_mip: 0,
            mip_count: self.mip_levels(),
            base_layer: 0,
            layer_count: self.array_layers,
        }
    }

    /// Decompose a subresource selection into ordered, non-overlapping
    /// linear subranges. Contiguous pieces are coalesced.
    pub fn decompose(&self, range: &ImageSubresourceRange) -> Result<Vec<Subrange>, InputError> {
        let aspects_end = range.base_aspect.checked_add(range.aspect_count);
        let mips_end = range.base_mip.checked_add(range.mip_count);
        let layers_end = range.base_layer.checked_add(range.layer_count);
        let in_bounds = matches!(aspects_end, Some(e) if e <= self.aspect_count)
            && matches!(mips_end, Some(e) if e <= self.mip_levels())
            && matches!(layers_end, Some(e) if e <= self.array_layers);
        if range.aspect_count == 0 || range.mip_count == 0 || range.layer_count == 0 || !in_bounds
        {
            return Err(InputError::SubresourceOutOfRange {
                requested: *range,
                aspects: self.aspect_count,
                mips: self.mip_levels(),
                layers: self.array_layers,
            });
        }

        let stride = self.aspect_stride();
        let mut out: Vec<Subrange> = Vec::new();
        for aspect in range.base_aspect..range.base_aspect + range.aspect_count {
            for mip in range.base_mip..range.base_mip + range.mip_count {
                let slice = self.mip_bytes[mip as usize];
                let base = aspect as u64 * stride + self.mip_base(mip);
                let piece = Subrange::new(
                    base + range.base_layer as u64 * slice,
                    base + (range.base_layer + range.layer_count) as u64 * slice,
                );
                if piece.is_empty() {
                    continue;
                }
                match out.last_mut() {
                    Some(last) if last.abuts(&piece) => last.end = piece.end,
                    _ => out.push(piece),
                }
            }
        }
        Ok(out)
    }
}
