//! # SM-02 Bloom Accumulator
//!
//! Commutative, associative accumulator of fixed-width (256-byte) bloom
//! filters. One accumulator is created per stream file decode pass and
//! OR-accumulates every record's optional bloom.
//!
//! ## Invariants
//!
//! - OR is monotonic: accumulated bits never decrease.
//! - `could_contain` is one-sided: false positives are possible, false
//!   negatives are not.
//! - An absent candidate filter matches everything.
//!
//! ## Usage Example
//!
//! ```
//! use sm_02_bloom_accumulator::{BloomAccumulator, LogsBloom};
//!
//! let mut acc = BloomAccumulator::new();
//! let mut bytes = [0u8; 256];
//! bytes[3] = 0b0000_0101;
//! let bloom = LogsBloom::new(bytes);
//!
//! acc.accumulate(Some(&bloom));
//! acc.accumulate(None);
//! assert!(acc.could_contain(Some(&bloom)));
//! assert!(acc.could_contain(None));
//! ```

pub mod domain;
pub mod error;

pub use domain::accumulator::BloomAccumulator;
pub use domain::logs_bloom::{LogsBloom, BLOOM_BYTES};
pub use error::BloomError;
