//! Library build orchestration
//!
//! Generation runs on independent rayon workers that share nothing but a
//! read-only snapshot of the library. Once every worker has finished, their
//! candidates are fed one at a time through the admission engine on the
//! calling thread, which is the only place the library grows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use super::admission::{AdmissionEngine, Library};
use super::error::{PrimerError, Result};
use super::filter::is_self_valid;
use super::generator::{partition_index_space, split_volume, CandidateBatch, CandidateGenerator};
use super::sequence::Sequence;
use super::types::{LibraryParams, LibraryReport, Phase, ProgressUpdate, Strategy};

/// Admissions between progress log lines
const ADMITTED_LOG_INTERVAL: usize = 50;

/// Candidates between progress messages during the merge
const MERGE_PROGRESS_INTERVAL: usize = 1000;

/// Offset separating the merge shuffle's RNG stream from the workers' streams
const SHUFFLE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

fn send_progress(progress_tx: &Option<Sender<ProgressUpdate>>, update: ProgressUpdate) {
    if let Some(tx) = progress_tx {
        let _ = tx.send(update);
    }
}

/// Run a complete build: seed, generate in parallel, then merge sequentially.
///
/// `seeds` are admitted before generation and form the workers' snapshot.
/// Seeds that fail the self-validity filter are skipped with a warning.
pub fn build_library(
    params: &LibraryParams,
    seeds: &[Sequence],
    progress_tx: Option<Sender<ProgressUpdate>>,
) -> Result<LibraryReport> {
    params.validate()?;
    let started = Instant::now();
    let constraints = &params.constraints;

    let num_threads = params.thread_count.get_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| {
            PrimerError::InvalidConfiguration(format!("failed to build thread pool: {}", e))
        })?;

    info!(
        "Building primer library: {}, {} workers on {} threads, {} bp primers",
        params.strategy.description(),
        params.workers,
        num_threads,
        constraints.primer_length
    );

    let mut engine = AdmissionEngine::new(constraints.clone());
    let seeded = admit_seeds(&mut engine, seeds, &progress_tx);
    let snapshot = engine.snapshot();

    let batches = pool.install(|| generate_candidates(params, &snapshot, &progress_tx));

    let workers: Vec<_> = batches.iter().map(CandidateBatch::report).collect();
    for batch in &batches {
        if let Some(shortfall) = batch.shortfall() {
            warn!("{}", shortfall);
        }
    }

    let mut candidates: Vec<Sequence> = batches
        .into_iter()
        .flat_map(|batch| batch.candidates.into_vec())
        .collect();
    let candidates_generated = candidates.len();
    info!(
        "Generation finished: {} candidates from {} workers",
        candidates_generated,
        workers.len()
    );

    if params.strategy == Strategy::ExhaustiveEnumeration && params.shuffle_candidates {
        let mut rng = rng_for(params.seed, SHUFFLE_STREAM);
        candidates.shuffle(&mut rng);
    }

    let rejected = admit_candidates(&mut engine, candidates, &progress_tx);

    let library = engine.into_library();
    info!("Number of primers: {}", library.len());

    send_progress(
        &progress_tx,
        ProgressUpdate {
            phase: Phase::Finished,
            workers_completed: workers.len(),
            total_workers: workers.len(),
            candidates_processed: candidates_generated,
            total_candidates: candidates_generated,
            library_size: library.len(),
            message: format!("Library complete: {} primers", library.len()),
        },
    );

    let library_size = library.len();
    Ok(LibraryReport {
        params: params.clone(),
        primers: library.into_members(),
        library_size,
        seeded,
        candidates_generated,
        candidates_processed: candidates_generated,
        rejected,
        workers,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

fn admit_seeds(
    engine: &mut AdmissionEngine,
    seeds: &[Sequence],
    progress_tx: &Option<Sender<ProgressUpdate>>,
) -> usize {
    if seeds.is_empty() {
        return 0;
    }
    send_progress(
        progress_tx,
        ProgressUpdate {
            phase: Phase::Seeding,
            workers_completed: 0,
            total_workers: 0,
            candidates_processed: 0,
            total_candidates: seeds.len(),
            library_size: 0,
            message: format!("Admitting {} seed primers...", seeds.len()),
        },
    );

    for seed in seeds {
        if let Some(reason) = seed_skip_reason(engine, seed) {
            warn!("Seed primer {} {}; skipped", seed, reason);
            continue;
        }
        if !engine.try_admit(seed.clone()) {
            warn!("Seed primer {} conflicts with the library; skipped", seed);
        }
    }
    let seeded = engine.library().len();
    info!("Admitted {} of {} seed primers", seeded, seeds.len());
    seeded
}

/// Why `seed` cannot enter the library, short of a pairwise conflict
fn seed_skip_reason(engine: &AdmissionEngine, seed: &Sequence) -> Option<String> {
    let primer_length = engine.constraints().primer_length;
    if seed.len() != primer_length {
        return Some(format!("is {} bp, expected {} bp", seed.len(), primer_length));
    }
    if engine.library().contains(seed) {
        return Some("is a duplicate".to_string());
    }
    if !is_self_valid(seed, engine.constraints()) {
        return Some("fails the self-validity filter".to_string());
    }
    None
}

/// Run every worker to completion. Must be called inside the build's thread pool.
fn generate_candidates(
    params: &LibraryParams,
    snapshot: &Library,
    progress_tx: &Option<Sender<ProgressUpdate>>,
) -> Vec<CandidateBatch> {
    let constraints = &params.constraints;
    let generators: Vec<CandidateGenerator<'_>> = match params.strategy {
        Strategy::RejectionSampling => split_volume(params.target_volume, params.workers)
            .into_iter()
            .map(|count| CandidateGenerator::RejectionSampling {
                count,
                max_attempts: params.max_attempts_per_worker,
                snapshot,
            })
            .collect(),
        Strategy::ExhaustiveEnumeration => {
            partition_index_space(constraints.primer_length, params.workers)
                .into_iter()
                .map(|range| CandidateGenerator::ExhaustiveEnumeration { range })
                .collect()
        }
    };

    let total_workers = generators.len();
    let completed_count = AtomicUsize::new(0);

    generators
        .par_iter()
        .enumerate()
        .map(|(worker, generator)| {
            let mut rng = rng_for(params.seed, worker as u64);
            let batch = generator.generate(worker, constraints, &mut rng);

            let completed = completed_count.fetch_add(1, Ordering::Relaxed) + 1;
            send_progress(
                progress_tx,
                ProgressUpdate {
                    phase: Phase::Generating,
                    workers_completed: completed,
                    total_workers,
                    candidates_processed: 0,
                    total_candidates: 0,
                    library_size: snapshot.len(),
                    message: format!(
                        "Generating: worker {}/{} finished with {} candidates",
                        completed,
                        total_workers,
                        batch.candidates.len()
                    ),
                },
            );
            batch
        })
        .collect()
}

/// Feed candidates through the engine in order; returns how many were rejected.
fn admit_candidates(
    engine: &mut AdmissionEngine,
    candidates: Vec<Sequence>,
    progress_tx: &Option<Sender<ProgressUpdate>>,
) -> usize {
    let total = candidates.len();
    let mut admitted = 0usize;
    let mut rejected = 0usize;

    for (i, candidate) in candidates.into_iter().enumerate() {
        if engine.try_admit(candidate) {
            admitted += 1;
            if admitted % ADMITTED_LOG_INTERVAL == 0 {
                info!("{} primers so far", engine.library().len());
            }
        } else {
            rejected += 1;
        }

        let processed = i + 1;
        if processed % MERGE_PROGRESS_INTERVAL == 0 || processed == total {
            send_progress(
                progress_tx,
                ProgressUpdate {
                    phase: Phase::Admitting,
                    workers_completed: 0,
                    total_workers: 0,
                    candidates_processed: processed,
                    total_candidates: total,
                    library_size: engine.library().len(),
                    message: format!(
                        "Admitting: {}/{} candidates, {} primers",
                        processed,
                        total,
                        engine.library().len()
                    ),
                },
            );
        }
    }
    rejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::filter::check_pair_compatible;
    use crate::design::types::{Constraints, ThreadCount};
    use std::sync::mpsc::channel;

    fn small_params(strategy: Strategy) -> LibraryParams {
        LibraryParams {
            strategy,
            target_volume: 100,
            workers: 4,
            thread_count: ThreadCount::Fixed(2),
            max_attempts_per_worker: 200_000,
            shuffle_candidates: true,
            seed: Some(1234),
            constraints: Constraints {
                primer_length: 6,
                gc_min: 0.3,
                gc_max: 0.7,
                max_homopolymer: 2,
                max_self_complement: 2,
                max_inter_complement: 3,
                min_hamming: 3,
            },
        }
    }

    fn assert_library_invariant(report: &LibraryReport) {
        let constraints = &report.params.constraints;
        for (i, a) in report.primers.iter().enumerate() {
            assert!(is_self_valid(a, constraints));
            for b in &report.primers[i + 1..] {
                assert!(check_pair_compatible(a, b, constraints).unwrap());
            }
        }
    }

    #[test]
    fn test_sampling_processes_at_most_target_volume() {
        let params = small_params(Strategy::RejectionSampling);
        let report = build_library(&params, &[], None).unwrap();
        assert_eq!(report.workers.len(), 4);
        assert!(report.workers.iter().all(|w| w.requested == 25));
        assert!(report.candidates_processed <= 100);
        assert!(report.library_size <= 100);
        assert_eq!(report.library_size, report.primers.len());
        assert_eq!(
            report.library_size + report.rejected,
            report.candidates_processed
        );
        assert_library_invariant(&report);
    }

    #[test]
    fn test_exhaustive_build_is_reproducible_with_seed() {
        let params = small_params(Strategy::ExhaustiveEnumeration);
        let first = build_library(&params, &[], None).unwrap();
        let second = build_library(&params, &[], None).unwrap();
        assert_eq!(first.primers, second.primers);
        assert_eq!(first.candidates_generated, second.candidates_generated);
        assert!(first.library_size > 0);
        assert_library_invariant(&first);
    }

    #[test]
    fn test_seeds_enter_library_first() {
        let params = small_params(Strategy::RejectionSampling);
        let seed = Sequence::parse("ACGTCA").unwrap();
        assert!(is_self_valid(&seed, &params.constraints));
        let report = build_library(&params, &[seed.clone()], None).unwrap();
        assert_eq!(report.seeded, 1);
        assert_eq!(report.primers[0], seed);
        assert_library_invariant(&report);
    }

    #[test]
    fn test_seed_skip_reasons_name_the_cause() {
        let params = small_params(Strategy::RejectionSampling);
        let mut engine = AdmissionEngine::new(params.constraints.clone());
        let seed = Sequence::parse("ACGTCA").unwrap();
        assert_eq!(seed_skip_reason(&engine, &seed), None);
        assert!(engine.try_admit(seed.clone()));

        assert_eq!(
            seed_skip_reason(&engine, &seed).as_deref(),
            Some("is a duplicate")
        );
        let long = Sequence::parse("ACGTCAGT").unwrap();
        assert_eq!(
            seed_skip_reason(&engine, &long).as_deref(),
            Some("is 8 bp, expected 6 bp")
        );
        let low_gc = Sequence::parse("ATATAT").unwrap();
        assert_eq!(
            seed_skip_reason(&engine, &low_gc).as_deref(),
            Some("fails the self-validity filter")
        );

        let report = build_library(&params, &[long, seed.clone(), seed.clone()], None).unwrap();
        assert_eq!(report.seeded, 1);
        assert_eq!(report.primers[0], seed);
    }

    #[test]
    fn test_invalid_configuration_aborts_before_work() {
        let mut params = small_params(Strategy::RejectionSampling);
        params.constraints.gc_min = 0.9;
        assert!(matches!(
            build_library(&params, &[], None),
            Err(PrimerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_progress_reaches_finished() {
        let params = small_params(Strategy::RejectionSampling);
        let (tx, rx) = channel();
        let report = build_library(&params, &[], Some(tx)).unwrap();
        let updates: Vec<ProgressUpdate> = rx.try_iter().collect();
        let generating = updates.iter().filter(|u| u.phase == Phase::Generating).count();
        assert_eq!(generating, 4);
        let last = updates.last().unwrap();
        assert_eq!(last.phase, Phase::Finished);
        assert_eq!(last.library_size, report.library_size);
    }
}
