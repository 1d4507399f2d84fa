//! Bloom domain: the fixed-width filter and its accumulator.

pub mod accumulator;
pub mod logs_bloom;
