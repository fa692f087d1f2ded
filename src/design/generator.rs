//! Candidate generation: bounded rejection sampling or exhaustive enumeration

use std::collections::HashSet;
use std::ops::Range;

use log::debug;
use rand::Rng;

use super::admission::{check_against_library, Library};
use super::error::{PrimerError, Result};
use super::filter::is_self_valid;
use super::sequence::Sequence;
use super::types::{Constraints, WorkerReport};

/// Duplicate-free candidates produced by one worker, in discovery order
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    sequences: Vec<Sequence>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    pub fn into_vec(self) -> Vec<Sequence> {
        self.sequences
    }
}

/// What one worker produced, plus what it cost
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub worker: usize,
    pub requested: usize,
    pub candidates: CandidateSet,
    pub attempts: u64,
    /// Set when the attempt budget ran out before `requested` was reached
    pub exhausted: bool,
}

impl CandidateBatch {
    pub fn shortfall(&self) -> Option<PrimerError> {
        self.exhausted.then(|| PrimerError::GenerationExhausted {
            worker: self.worker,
            requested: self.requested,
            found: self.candidates.len(),
            attempts: self.attempts,
        })
    }

    pub fn report(&self) -> WorkerReport {
        WorkerReport {
            worker: self.worker,
            requested: self.requested,
            produced: self.candidates.len(),
            attempts: self.attempts,
            shortfall: self.shortfall().map(|e| e.to_string()),
        }
    }

    /// The candidates, or `GenerationExhausted` if the worker fell short
    pub fn into_result(self) -> Result<CandidateSet> {
        match self.shortfall() {
            Some(e) => Err(e),
            None => Ok(self.candidates),
        }
    }
}

/// One worker's share of generation work
#[derive(Debug, Clone)]
pub enum CandidateGenerator<'a> {
    /// Draw random primers until `count` distinct ones pass the self-validity
    /// filter and are compatible with `snapshot`
    RejectionSampling {
        count: usize,
        max_attempts: u64,
        snapshot: &'a Library,
    },
    /// Keep every self-valid primer whose lexicographic index lies in `range`
    ExhaustiveEnumeration { range: Range<u64> },
}

impl CandidateGenerator<'_> {
    pub fn generate<R: Rng>(
        &self,
        worker: usize,
        constraints: &Constraints,
        rng: &mut R,
    ) -> CandidateBatch {
        match self {
            Self::RejectionSampling {
                count,
                max_attempts,
                snapshot,
            } => sample_candidates(worker, *count, *max_attempts, snapshot, constraints, rng),
            Self::ExhaustiveEnumeration { range } => {
                let candidates = enumerate_candidates(worker, range.clone(), constraints);
                CandidateBatch {
                    worker,
                    requested: candidates.len(),
                    attempts: range.end - range.start,
                    candidates,
                    exhausted: false,
                }
            }
        }
    }
}

/// Rejection sampling with an explicit attempt budget
pub fn sample_candidates<R: Rng>(
    worker: usize,
    count: usize,
    max_attempts: u64,
    snapshot: &Library,
    constraints: &Constraints,
    rng: &mut R,
) -> CandidateBatch {
    let mut seen: HashSet<Sequence> = HashSet::with_capacity(count);
    let mut sequences = Vec::with_capacity(count);
    let mut attempts = 0u64;

    while sequences.len() < count && attempts < max_attempts {
        attempts += 1;
        let primer = Sequence::random(constraints.primer_length, rng);
        if seen.contains(&primer) || !is_self_valid(&primer, constraints) {
            continue;
        }
        if !check_against_library(&primer, snapshot, constraints).unwrap_or(false) {
            continue;
        }
        seen.insert(primer.clone());
        sequences.push(primer);
    }

    CandidateBatch {
        worker,
        requested: count,
        exhausted: sequences.len() < count,
        candidates: CandidateSet { sequences },
        attempts,
    }
}

/// Evaluate every index in `range` against the self-validity filter
pub fn enumerate_candidates(worker: usize, range: Range<u64>, constraints: &Constraints) -> CandidateSet {
    let total = range.end - range.start;
    let quarter = (total / 4).max(1);
    let mut sequences = Vec::new();

    for (i, index) in range.enumerate() {
        let primer = Sequence::from_index(index, constraints.primer_length);
        if is_self_valid(&primer, constraints) {
            sequences.push(primer);
        }
        if (i as u64 + 1) % quarter == 0 {
            debug!(
                "Worker {} has processed {:.0}% of its sequences",
                worker,
                (i as u64 + 1) as f64 / total as f64 * 100.0
            );
        }
    }

    CandidateSet { sequences }
}

/// Split `total` into `parts` shares; the first `total % parts` shares get one extra.
pub fn split_volume(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let remainder = total % parts;
    (0..parts)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// Contiguous index ranges covering all 4^`length` sequences exactly once
pub fn partition_index_space(length: usize, parts: usize) -> Vec<Range<u64>> {
    let total = 1u64 << (2 * length as u32);
    let base = total / parts as u64;
    let remainder = total % parts as u64;
    let mut start = 0u64;
    (0..parts as u64)
        .map(|i| {
            let end = start + base + u64::from(i < remainder);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}
