//! Data types for primer library construction

use serde::{Deserialize, Serialize};

use super::error::PrimerError;
use super::sequence::Sequence;

/// How candidate sequences are supplied to the admission phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Draw random sequences until each worker has its share of self-valid candidates
    RejectionSampling,
    /// Evaluate every sequence of the configured length, then admit in shuffled order
    ExhaustiveEnumeration,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::RejectionSampling
    }
}

impl Strategy {
    pub fn description(&self) -> String {
        match self {
            Self::RejectionSampling => "Rejection sampling (random candidates)".to_string(),
            Self::ExhaustiveEnumeration => "Exhaustive enumeration (all 4^L sequences)".to_string(),
        }
    }
}

/// Thread count configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadCount {
    /// Use all available CPU cores
    Auto,
    /// Use a specific number of threads
    Fixed(usize),
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::Auto
    }
}

impl ThreadCount {
    /// Get the actual number of threads to use
    pub fn get_count(&self) -> usize {
        match self {
            Self::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Self::Fixed(n) => *n,
        }
    }
}

/// Per-sequence and pairwise compatibility constraints, fixed for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub primer_length: usize,
    pub gc_min: f64,
    pub gc_max: f64,
    pub max_homopolymer: usize,
    /// Longest complementary stretch a primer may share with itself
    pub max_self_complement: usize,
    /// Longest complementary stretch two library members may share
    pub max_inter_complement: usize,
    pub min_hamming: usize,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            primer_length: 14,
            gc_min: 0.45,
            gc_max: 0.55,
            max_homopolymer: 2,
            max_self_complement: 4,
            max_inter_complement: 10,
            min_hamming: 6,
        }
    }
}

impl Constraints {
    /// Window length whose presence counts as self-complementarity
    pub fn self_complement_window(&self) -> usize {
        self.max_self_complement + 1
    }

    /// Window length whose presence counts as inter-primer complementarity
    pub fn inter_complement_window(&self) -> usize {
        self.max_inter_complement + 1
    }
}

/// Global run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryParams {
    pub strategy: Strategy,
    /// Total candidates requested across all workers (rejection sampling only)
    pub target_volume: usize,
    /// Number of independent generation partitions
    pub workers: usize,
    pub thread_count: ThreadCount,
    /// Sampling attempts a single worker may spend before reporting a shortfall
    pub max_attempts_per_worker: u64,
    /// Shuffle the enumerated pool before admission
    pub shuffle_candidates: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub constraints: Constraints,
}

impl Default for LibraryParams {
    fn default() -> Self {
        Self {
            strategy: Strategy::RejectionSampling,
            target_volume: 100_000,
            workers: 8,
            thread_count: ThreadCount::Auto,
            max_attempts_per_worker: 50_000_000,
            shuffle_candidates: true,
            seed: None,
            constraints: Constraints::default(),
        }
    }
}

/// Outcome of one generation worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub requested: usize,
    pub produced: usize,
    pub attempts: u64,
    /// Reason the worker stopped short of `requested`, if it did
    pub shortfall: Option<String>,
}

/// Complete result of a library build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryReport {
    pub params: LibraryParams,
    pub primers: Vec<Sequence>,
    pub library_size: usize,
    /// Seed primers that entered the library before generation
    pub seeded: usize,
    pub candidates_generated: usize,
    pub candidates_processed: usize,
    pub rejected: usize,
    pub workers: Vec<WorkerReport>,
    pub elapsed_ms: u64,
}

impl LibraryReport {
    /// Shortfalls as errors, one per worker that ran out of attempts
    pub fn shortfalls(&self) -> Vec<PrimerError> {
        self.workers
            .iter()
            .filter(|w| w.shortfall.is_some())
            .map(|w| PrimerError::GenerationExhausted {
                worker: w.worker,
                requested: w.requested,
                found: w.produced,
                attempts: w.attempts,
            })
            .collect()
    }
}

/// Which part of the run a progress update refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Generating,
    Admitting,
    Finished,
}

/// Progress update during a build
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub phase: Phase,
    pub workers_completed: usize,
    pub total_workers: usize,
    pub candidates_processed: usize,
    pub total_candidates: usize,
    pub library_size: usize,
    pub message: String,
}

impl ProgressUpdate {
    /// Completed fraction of the current phase, in [0, 1]
    pub fn fraction(&self) -> f32 {
        match self.phase {
            Phase::Seeding => 0.0,
            Phase::Generating if self.total_workers > 0 => {
                self.workers_completed as f32 / self.total_workers as f32
            }
            Phase::Admitting if self.total_candidates > 0 => {
                self.candidates_processed as f32 / self.total_candidates as f32
            }
            Phase::Finished => 1.0,
            _ => 0.0,
        }
    }
}
