use std::num::NonZeroUsize;

/// Maps a hash value onto one of `buckets` worker queues.
pub(crate) fn route_index(hash: u64, buckets: NonZeroUsize) -> usize {
    let buckets = buckets.get() as u64;

    // The remainder is below `buckets`, which came from a `usize`.
    (hash % buckets) as usize
}
