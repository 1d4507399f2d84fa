//! Per-file bloom accumulator
//!
//! Created empty at the start of a file's decode pass and exclusively owned
//! by the decode task for that file.

use serde::{Deserialize, Serialize};

use super::logs_bloom::LogsBloom;

/// Logical OR of every bloom contributed within one stream file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomAccumulator {
    bloom: LogsBloom,
    contributions: u64,
}

impl Default for BloomAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            bloom: LogsBloom::zeroed(),
            contributions: 0,
        }
    }

    /// OR a record's bloom into the accumulator. Absent blooms are skipped.
    pub fn accumulate(&mut self, filter: Option<&LogsBloom>) {
        if let Some(filter) = filter {
            self.bloom.or_assign(filter);
            self.contributions += 1;
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &BloomAccumulator) {
        self.bloom.or_assign(&other.bloom);
        self.contributions += other.contributions;
    }

    /// Sound membership test.
    ///
    /// - `None` always matches.
    /// - `Some(f)` matches when every bit of `f` is set in the accumulator.
    pub fn could_contain(&self, filter: Option<&LogsBloom>) -> bool {
        match filter {
            None => true,
            Some(f) => f.is_subset_of(&self.bloom),
        }
    }

    /// The accumulated bloom.
    pub fn bloom(&self) -> &LogsBloom {
        &self.bloom
    }

    /// Number of present blooms accumulated so far.
    pub fn contributions(&self) -> u64 {
        self.contributions
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.contributions == 0
    }

    /// Consume and return the accumulated bloom, or `None` if no record
    /// carried one.
    pub fn into_bloom(self) -> Option<LogsBloom> {
        if self.is_empty() {
            None
        } else {
            Some(self.bloom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::logs_bloom::BLOOM_BYTES;
    use proptest::prelude::*;

    fn bloom_with(bits: &[usize]) -> LogsBloom {
        let mut bloom = LogsBloom::zeroed();
        for &b in bits {
            bloom.set_bit(b);
        }
        bloom
    }

    fn arb_bloom() -> impl Strategy<Value = LogsBloom> {
        proptest::collection::vec(any::<u8>(), BLOOM_BYTES).prop_map(|bytes| {
            let mut data = [0u8; BLOOM_BYTES];
            data.copy_from_slice(&bytes);
            LogsBloom::new(data)
        })
    }

    #[test]
    fn test_null_candidate_always_matches() {
        let acc = BloomAccumulator::new();
        assert!(acc.could_contain(None));
    }

    #[test]
    fn test_accumulated_filter_matches() {
        let mut acc = BloomAccumulator::new();
        let f = bloom_with(&[1, 77, 2000]);
        acc.accumulate(Some(&f));
        assert!(acc.could_contain(Some(&f)));
        assert!(!acc.could_contain(Some(&bloom_with(&[5]))));
    }

    #[test]
    fn test_absent_filters_are_skipped() {
        let mut acc = BloomAccumulator::new();
        acc.accumulate(None);
        assert!(acc.is_empty());
        assert_eq!(acc.into_bloom(), None);
    }

    #[test]
    fn test_zero_filter_counts_as_contribution() {
        let mut acc = BloomAccumulator::new();
        acc.accumulate(Some(&LogsBloom::zeroed()));
        assert_eq!(acc.contributions(), 1);
        assert_eq!(acc.into_bloom(), Some(LogsBloom::zeroed()));
    }

    #[test]
    fn test_merge_combines_accumulators() {
        let mut a = BloomAccumulator::new();
        a.accumulate(Some(&bloom_with(&[3])));
        let mut b = BloomAccumulator::new();
        b.accumulate(Some(&bloom_with(&[4])));
        a.merge(&b);
        assert!(a.could_contain(Some(&bloom_with(&[3, 4]))));
        assert_eq!(a.contributions(), 2);
    }

    proptest! {
        #[test]
        fn prop_accumulate_is_commutative(x in arb_bloom(), y in arb_bloom()) {
            let mut left = BloomAccumulator::new();
            left.accumulate(Some(&x));
            left.accumulate(Some(&y));

            let mut right = BloomAccumulator::new();
            right.accumulate(Some(&y));
            right.accumulate(Some(&x));

            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_accumulate_is_associative(x in arb_bloom(), y in arb_bloom(), z in arb_bloom()) {
            let mut xy = BloomAccumulator::new();
            xy.accumulate(Some(&x));
            xy.accumulate(Some(&y));
            let mut left = xy.clone();
            left.accumulate(Some(&z));

            let mut yz = BloomAccumulator::new();
            yz.accumulate(Some(&y));
            yz.accumulate(Some(&z));
            let mut right = BloomAccumulator::new();
            right.accumulate(Some(&x));
            right.merge(&yz);

            prop_assert_eq!(left.bloom(), right.bloom());
        }

        #[test]
        fn prop_no_false_negatives(filters in proptest::collection::vec(arb_bloom(), 1..8)) {
            let mut acc = BloomAccumulator::new();
            for f in &filters {
                acc.accumulate(Some(f));
            }
            for f in &filters {
                prop_assert!(acc.could_contain(Some(f)));
            }
        }

        #[test]
        fn prop_bits_never_decrease(x in arb_bloom(), y in arb_bloom()) {
            let mut acc = BloomAccumulator::new();
            acc.accumulate(Some(&x));
            let before = acc.bloom().bits_set();
            acc.accumulate(Some(&y));
            prop_assert!(acc.bloom().bits_set() >= before);
        }
    }
}
