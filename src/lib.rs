//! Primer Library Builder
//!
//! Builds maximal sets of short DNA primers that are mutually compatible under
//! GC content, homopolymer, self-complementarity, Hamming distance and
//! inter-primer complementarity constraints.

pub mod design;

pub use design::*;
