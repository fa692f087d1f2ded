//! The primer library and the single authority allowed to grow it

use std::collections::HashSet;

use log::debug;

use super::error::{PrimerError, Result};
use super::filter::check_pair_against_complement;
use super::sequence::Sequence;
use super::types::Constraints;

/// Accepted primers in insertion order. Only grows.
#[derive(Debug, Clone, Default)]
pub struct Library {
    members: Vec<Sequence>,
    index: HashSet<Sequence>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, seq: &Sequence) -> bool {
        self.index.contains(seq)
    }

    pub fn members(&self) -> &[Sequence] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<Sequence> {
        self.members
    }

    fn insert(&mut self, seq: Sequence) {
        self.index.insert(seq.clone());
        self.members.push(seq);
    }
}

/// Check a candidate against every member of `library`.
///
/// Fails if the candidate's length differs from the configured primer length.
pub fn check_against_library(
    candidate: &Sequence,
    library: &Library,
    constraints: &Constraints,
) -> Result<bool> {
    if candidate.len() != constraints.primer_length {
        return Err(PrimerError::LengthMismatch {
            left: candidate.len(),
            right: constraints.primer_length,
        });
    }
    let candidate_complement = candidate.complement();
    for member in library.iter() {
        if !check_pair_against_complement(candidate, &candidate_complement, member, constraints)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Owns the library; every mutation goes through [`AdmissionEngine::try_admit`].
///
/// `try_admit` takes `&mut self`, so admissions on one engine are serialized.
#[derive(Debug, Clone)]
pub struct AdmissionEngine {
    constraints: Constraints,
    library: Library,
}

impl AdmissionEngine {
    pub fn new(constraints: Constraints) -> Self {
        Self {
            constraints,
            library: Library::new(),
        }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Read-only copy of the current library, handed to generation workers
    pub fn snapshot(&self) -> Library {
        self.library.clone()
    }

    /// Insert `candidate` if it is new and compatible with every member.
    ///
    /// Returns false, leaving the library untouched, for duplicates, incompatible
    /// candidates and candidates a predicate fails on.
    pub fn try_admit(&mut self, candidate: Sequence) -> bool {
        if self.library.contains(&candidate) {
            return false;
        }
        match check_against_library(&candidate, &self.library, &self.constraints) {
            Ok(true) => {
                self.library.insert(candidate);
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!("Rejected {}: {}", candidate, e);
                false
            }
        }
    }

    pub fn into_library(self) -> Library {
        self.library
    }
}
