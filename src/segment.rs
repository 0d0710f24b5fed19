//! Splits the mapped file into line-aligned byte ranges, one per worker.

use std::ops::Range;

use memchr::memchr;

/// Below this many bytes per worker the split overhead outweighs the
/// parallelism and the whole file goes to a single segment.
pub const MIN_SEGMENT_SIZE: usize = 1 << 20;

/// Plans `workers` contiguous, non-overlapping ranges covering all of
/// `data`. Every boundary except 0 and `data.len()` sits just past a `\n`,
/// so no worker starts mid-record. A missing terminator near the end folds
/// the tail into the previous range.
pub fn plan(data: &[u8], workers: usize) -> Vec<Range<usize>> {
    let len = data.len();
    if len == 0 {
        return Vec::new();
    }
    let segment_size = len / workers.max(1);
    if workers <= 1 || segment_size < MIN_SEGMENT_SIZE {
        return vec![0..len];
    }

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 1..=workers {
        let end = if i == workers {
            len
        } else {
            let cut = i * segment_size;
            match memchr(b'\n', &data[cut..]) {
                Some(newline) => cut + newline + 1,
                None => len,
            }
        };
        // A record longer than segment_size can push a boundary past the
        // next naive cut; the shorter range simply disappears.
        if start < end {
            ranges.push(start..end);
            start = end;
        }
    }
    ranges
}
