//! Self-validity filter shared by both generation strategies

use super::error::Result;
use super::sequence::{shares_window, Sequence};
use super::types::Constraints;

/// Check GC content, homopolymer run and self-complementarity of a single primer.
///
/// Depends only on the primer itself, so workers evaluate it without shared state.
pub fn check_self_valid(seq: &Sequence, constraints: &Constraints) -> Result<bool> {
    let gc = seq.gc_fraction()?;
    if gc < constraints.gc_min || gc > constraints.gc_max {
        return Ok(false);
    }
    if seq.max_homopolymer_run() > constraints.max_homopolymer {
        return Ok(false);
    }
    Ok(!seq.complement_overlaps(seq, constraints.self_complement_window())?)
}

/// [`check_self_valid`] with predicate errors treated as rejection
pub fn is_self_valid(seq: &Sequence, constraints: &Constraints) -> bool {
    check_self_valid(seq, constraints).unwrap_or(false)
}

/// Pairwise compatibility of a candidate with one library member.
///
/// Requires Hamming distance >= `min_hamming` and no complementary stretch longer
/// than `max_inter_complement` in either direction.
pub fn check_pair_compatible(
    candidate: &Sequence,
    member: &Sequence,
    constraints: &Constraints,
) -> Result<bool> {
    let candidate_complement = candidate.complement();
    check_pair_against_complement(candidate, &candidate_complement, member, constraints)
}

/// [`check_pair_compatible`] with the candidate's complement computed by the caller,
/// so one complement serves a whole pass over the library.
pub fn check_pair_against_complement(
    candidate: &Sequence,
    candidate_complement: &Sequence,
    member: &Sequence,
    constraints: &Constraints,
) -> Result<bool> {
    if candidate.hamming_distance(member)? < constraints.min_hamming {
        return Ok(false);
    }
    let window = constraints.inter_complement_window();
    let comp = candidate_complement.as_bytes();
    let member = member.as_bytes();
    // A window of comp(member) lies in the candidate iff that window of member lies in comp(candidate)
    Ok(!shares_window(member, comp, window)? && !shares_window(comp, member, window)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text).unwrap()
    }

    #[test]
    fn test_self_valid_reference_primer() {
        let constraints = Constraints::default();
        // 7 of 14 GC, runs of at most 2, no 5 bp self-complement
        let primer = seq("GCAACTCATCGACT");
        assert_eq!(primer.gc_fraction().unwrap(), 0.5);
        assert!(is_self_valid(&primer, &constraints));
    }

    #[test]
    fn test_self_valid_rejects_gc_out_of_bounds() {
        let constraints = Constraints::default();
        assert!(!is_self_valid(&seq("ATATATATATATAT"), &constraints));
        assert!(!is_self_valid(&seq("GCGCGCGCGCGCGC"), &constraints));
    }

    #[test]
    fn test_self_valid_rejects_long_homopolymer() {
        let constraints = Constraints::default();
        let primer = seq("GCAAACTCATCGCT");
        assert_eq!(primer.gc_fraction().unwrap(), 0.5);
        assert_eq!(primer.max_homopolymer_run(), 3);
        assert!(!is_self_valid(&primer, &constraints));
    }

    #[test]
    fn test_self_valid_rejects_self_complement() {
        let constraints = Constraints::default();
        // complement of "ACAGT" is "TGTCA", which the primer also contains
        let primer = seq("ACAGTCTGTCAGAC");
        assert!(primer.complement_overlaps(&primer, 5).unwrap());
        assert!(!is_self_valid(&primer, &constraints));
    }

    #[test]
    fn test_pair_rejects_close_hamming() {
        let constraints = Constraints {
            primer_length: 4,
            gc_min: 0.0,
            gc_max: 1.0,
            max_homopolymer: 4,
            max_self_complement: 3,
            max_inter_complement: 3,
            min_hamming: 2,
        };
        assert!(!check_pair_compatible(&seq("ACGA"), &seq("ACGT"), &constraints).unwrap());
        assert!(check_pair_compatible(&seq("AGGA"), &seq("ACGT"), &constraints).unwrap());
    }

    #[test]
    fn test_pair_checks_complement_both_ways() {
        let constraints = Constraints {
            primer_length: 6,
            gc_min: 0.0,
            gc_max: 1.0,
            max_homopolymer: 6,
            max_self_complement: 5,
            max_inter_complement: 2,
            min_hamming: 0,
        };
        // complement("AACCTT") = "TTGGAA"; "TTG" occurs in the candidate
        let member = seq("AACCTT");
        let candidate = seq("CTTGCA");
        assert!(!check_pair_compatible(&candidate, &member, &constraints).unwrap());
        assert!(!check_pair_compatible(&member, &candidate, &constraints).unwrap());
    }

    #[test]
    fn test_precomputed_complement_matches_direct_check() {
        let constraints = Constraints {
            primer_length: 6,
            gc_min: 0.0,
            gc_max: 1.0,
            max_homopolymer: 6,
            max_self_complement: 5,
            max_inter_complement: 2,
            min_hamming: 2,
        };
        let candidate = seq("CTTGCA");
        let comp = candidate.complement();
        for member in ["AACCTT", "GGATCC", "CTTGCA", "ACGTAC", "TTTCCC"] {
            let member = seq(member);
            let direct = !member.complement_overlaps(&candidate, 3).unwrap()
                && !candidate.complement_overlaps(&member, 3).unwrap()
                && candidate.hamming_distance(&member).unwrap() >= 2;
            assert_eq!(
                check_pair_against_complement(&candidate, &comp, &member, &constraints).unwrap(),
                direct
            );
        }
    }

    #[test]
    fn test_pair_length_mismatch_is_error() {
        let constraints = Constraints::default();
        assert!(check_pair_compatible(&seq("ACGT"), &seq("ACG"), &constraints).is_err());
    }
}
