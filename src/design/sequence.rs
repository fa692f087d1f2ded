//! DNA primer sequences and the pure predicates over them

use std::collections::HashMap;
use std::fmt;

use bio::alignment::distance::hamming;
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{PrimerError, Result};

/// Standard DNA bases, in enumeration order
pub const STANDARD_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Symbol-wise complement (order preserved)
pub static COMPLEMENT: Lazy<HashMap<u8, u8>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(b'A', b'T');
    map.insert(b'T', b'A');
    map.insert(b'C', b'G');
    map.insert(b'G', b'C');
    map
});

/// Check if a byte is a standard DNA base
#[inline]
pub fn is_standard_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

fn validate(seq: &[u8]) -> Result<()> {
    match seq.iter().position(|&b| !is_standard_base(b)) {
        Some(position) => Err(PrimerError::InvalidSymbol {
            symbol: seq[position] as char,
            position,
        }),
        None => Ok(()),
    }
}

/// Complement every base of `seq`. Fails on the first non-ACGT byte.
pub fn complement(seq: &[u8]) -> Result<Vec<u8>> {
    seq.iter()
        .enumerate()
        .map(|(position, b)| {
            COMPLEMENT
                .get(b)
                .copied()
                .ok_or(PrimerError::InvalidSymbol {
                    symbol: *b as char,
                    position,
                })
        })
        .collect()
}

/// Fraction of G and C bases.
pub fn gc_fraction(seq: &[u8]) -> Result<f64> {
    if seq.is_empty() {
        return Err(PrimerError::InvalidInput(
            "GC fraction of an empty sequence is undefined".to_string(),
        ));
    }
    let gc = seq.iter().filter(|&&b| b == b'G' || b == b'C').count();
    Ok(gc as f64 / seq.len() as f64)
}

/// Length of the longest run of identical adjacent bases (0 for empty input)
pub fn max_homopolymer_run(seq: &[u8]) -> usize {
    if seq.is_empty() {
        return 0;
    }
    let mut max_run = 1;
    let mut current = 1;
    for pair in seq.windows(2) {
        if pair[0] == pair[1] {
            current += 1;
            max_run = max_run.max(current);
        } else {
            current = 1;
        }
    }
    max_run
}

/// True if any `window`-long substring of `complement(a)` occurs anywhere in `b`.
///
/// A window longer than either sequence has no placements and yields `false`.
pub fn contains_complement_overlap(a: &[u8], b: &[u8], window: usize) -> Result<bool> {
    let comp = complement(a)?;
    shares_window(&comp, b, window)
}

/// True if any `window`-long substring of `a` occurs anywhere in `b`, with no complementing.
pub fn shares_window(a: &[u8], b: &[u8], window: usize) -> Result<bool> {
    if window == 0 {
        return Err(PrimerError::InvalidInput(
            "complement window must be at least 1 bp".to_string(),
        ));
    }
    if window > a.len() || window > b.len() {
        return Ok(false);
    }
    Ok(a.windows(window)
        .any(|w| b.windows(window).any(|other| other == w)))
}

/// Number of mismatched positions between two equal-length sequences
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Result<usize> {
    if a.len() != b.len() {
        return Err(PrimerError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(hamming(a, b) as usize)
}

/// An immutable primer over {A, C, G, T}. Equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence(Box<[u8]>);

impl Sequence {
    /// Parse a primer from text. Only upper-case A, C, G, T are accepted.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_bytes(text.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate(bytes)?;
        Ok(Self(bytes.into()))
    }

    /// The `index`-th sequence of `length` bp in lexicographic (A < C < G < T) order.
    /// Only the low `2 * length` bits of `index` are used.
    pub fn from_index(mut index: u64, length: usize) -> Self {
        let mut bytes = vec![b'A'; length];
        for slot in bytes.iter_mut().rev() {
            *slot = STANDARD_BASES[(index & 0b11) as usize];
            index >>= 2;
        }
        Self(bytes.into_boxed_slice())
    }

    /// A uniformly random sequence of `length` bp
    pub fn random<R: Rng>(length: usize, rng: &mut R) -> Self {
        Self(
            (0..length)
                .map(|_| STANDARD_BASES[rng.gen_range(0..STANDARD_BASES.len())])
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn complement(&self) -> Sequence {
        Self(
            self.0
                .iter()
                .map(|b| COMPLEMENT.get(b).copied().unwrap_or(*b))
                .collect(),
        )
    }

    pub fn gc_fraction(&self) -> Result<f64> {
        gc_fraction(&self.0)
    }

    pub fn max_homopolymer_run(&self) -> usize {
        max_homopolymer_run(&self.0)
    }

    pub fn hamming_distance(&self, other: &Sequence) -> Result<usize> {
        hamming_distance(&self.0, &other.0)
    }

    /// See [`contains_complement_overlap`]; `self` is the complemented side.
    pub fn complement_overlaps(&self, other: &Sequence, window: usize) -> Result<bool> {
        contains_complement_overlap(&self.0, &other.0, window)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl From<Sequence> for String {
    fn from(seq: Sequence) -> Self {
        seq.to_string()
    }
}

impl TryFrom<String> for Sequence {
    type Error = PrimerError;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl std::str::FromStr for Sequence {
    type Err = PrimerError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement_preserves_order() {
        assert_eq!(complement(b"ACGT").unwrap(), b"TGCA".to_vec());
        let seq = Sequence::parse("AACG").unwrap();
        assert_eq!(seq.complement().to_string(), "TTGC");
    }

    #[test]
    fn test_complement_rejects_unknown_symbol() {
        match complement(b"ACNT") {
            Err(PrimerError::InvalidSymbol { symbol, position }) => {
                assert_eq!(symbol, 'N');
                assert_eq!(position, 2);
            }
            other => panic!("expected InvalidSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_gc_fraction() {
        assert_eq!(gc_fraction(b"ACGT").unwrap(), 0.5);
        assert_eq!(gc_fraction(b"GGCC").unwrap(), 1.0);
        assert_eq!(gc_fraction(b"ATAT").unwrap(), 0.0);
    }

    #[test]
    fn test_gc_fraction_empty_is_invalid_input() {
        assert!(matches!(gc_fraction(b""), Err(PrimerError::InvalidInput(_))));
    }

    #[test]
    fn test_max_homopolymer_run() {
        assert_eq!(max_homopolymer_run(b"AACCGT"), 2);
        assert_eq!(max_homopolymer_run(b"A"), 1);
        assert_eq!(max_homopolymer_run(b"ACGT"), 1);
        assert_eq!(max_homopolymer_run(b"ATTTTG"), 4);
        assert_eq!(max_homopolymer_run(b"GGGG"), 4);
    }

    #[test]
    fn test_complement_overlap_finds_substring_anywhere() {
        // complement("AAC") = "TTG", which occurs at offset 2 of "CATTGA"
        assert!(contains_complement_overlap(b"AAC", b"CATTGA", 3).unwrap());
        assert!(!contains_complement_overlap(b"AAC", b"CATTCA", 3).unwrap());
        // Final window position is checked too
        assert!(contains_complement_overlap(b"CGAA", b"AATTA", 2).unwrap());
    }

    #[test]
    fn test_complement_overlap_window_longer_than_sequence() {
        assert!(!contains_complement_overlap(b"ACGT", b"TGCATGCA", 5).unwrap());
        assert!(!contains_complement_overlap(b"ACGTACGT", b"TGC", 4).unwrap());
    }

    #[test]
    fn test_complement_overlap_zero_window_is_error() {
        assert!(contains_complement_overlap(b"ACGT", b"ACGT", 0).is_err());
        assert!(shares_window(b"ACGT", b"ACGT", 0).is_err());
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(b"ACGT", b"ACGA").unwrap(), 1);
        assert_eq!(hamming_distance(b"ACGT", b"ACGT").unwrap(), 0);
        assert_eq!(hamming_distance(b"AAAA", b"TTTT").unwrap(), 4);
    }

    #[test]
    fn test_hamming_distance_rejects_unequal_lengths() {
        match hamming_distance(b"ACGT", b"ACG") {
            Err(PrimerError::LengthMismatch { left, right }) => {
                assert_eq!((left, right), (4, 3));
            }
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_sequence_from_index_is_lexicographic() {
        assert_eq!(Sequence::from_index(0, 3).to_string(), "AAA");
        assert_eq!(Sequence::from_index(1, 3).to_string(), "AAC");
        assert_eq!(Sequence::from_index(4, 3).to_string(), "ACA");
        assert_eq!(Sequence::from_index(63, 3).to_string(), "TTT");
    }

    #[test]
    fn test_sequence_parse_rejects_lowercase() {
        assert!(Sequence::parse("ACGT").is_ok());
        assert!(Sequence::parse("acgt").is_err());
    }

    #[test]
    fn test_sequence_serde_as_string() {
        let seq = Sequence::parse("GATTACA").unwrap();
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, "\"GATTACA\"");
        let back: Sequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
        assert!(serde_json::from_str::<Sequence>("\"GATXACA\"").is_err());
    }
}
