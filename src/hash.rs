//! Bucket sizing and the key hash.

/// Bucket counts the hash engine steps through as it grows, smallest first.
pub const BUCKET_COUNTS: [usize; 8] = [509, 1021, 2039, 4093, 8191, 16381, 32749, 65521];

const HASH_MULTIPLIER: usize = 65599;

/// Bucket for `key` in a table of `bucket_count` buckets.
///
/// Polynomial rolling hash over the key bytes, wrapping on overflow, then
/// reduced by the bucket count. Callers must recompute it whenever the
/// bucket count changes.
#[inline]
pub(crate) fn bucket_index(key: &str, bucket_count: usize) -> usize {
    let hash = key.bytes().fold(0usize, |h, b| {
        h.wrapping_mul(HASH_MULTIPLIER).wrapping_add(b as usize)
    });
    hash % bucket_count
}

/// Next step of the size sequence, or `None` once `current` is the largest.
pub(crate) fn next_bucket_count(current: usize) -> Option<usize> {
    BUCKET_COUNTS.iter().copied().find(|&n| n > current)
}

/// Smallest step holding at least `min` buckets, clamped to the largest step.
pub(crate) fn bucket_count_for(min: usize) -> usize {
    BUCKET_COUNTS
        .iter()
        .copied()
        .find(|&n| n >= min)
        .unwrap_or(BUCKET_COUNTS[BUCKET_COUNTS.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_hand_computation() {
        // "ab" = 'a' * 65599 + 'b'
        let expected = (97 * 65599 + 98) % 509;
        assert_eq!(bucket_index("ab", 509), expected);
        assert_eq!(bucket_index("", 509), 0);
    }

    #[test]
    fn hash_depends_on_bucket_count() {
        let k = "some-longer-key";
        let a = bucket_index(k, 509);
        let b = bucket_index(k, 1021);
        assert!(a < 509);
        assert!(b < 1021);
        // Same raw hash, different modulus.
        let raw = k.bytes().fold(0usize, |h, c| {
            h.wrapping_mul(HASH_MULTIPLIER).wrapping_add(c as usize)
        });
        assert_eq!(a, raw % 509);
        assert_eq!(b, raw % 1021);
    }

    #[test]
    fn size_sequence_steps() {
        assert_eq!(next_bucket_count(509), Some(1021));
        assert_eq!(next_bucket_count(32749), Some(65521));
        assert_eq!(next_bucket_count(65521), None);
        for w in BUCKET_COUNTS.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn bucket_count_for_rounds_up_and_clamps() {
        assert_eq!(bucket_count_for(0), 509);
        assert_eq!(bucket_count_for(509), 509);
        assert_eq!(bucket_count_for(510), 1021);
        assert_eq!(bucket_count_for(10_000), 16381);
        assert_eq!(bucket_count_for(usize::MAX), 65521);
    }
}
