//! Parameter validation and TOML persistence

use std::path::Path;

use log::info;

use super::error::{PrimerError, Result};
use super::types::{Constraints, LibraryParams, Strategy, ThreadCount};

/// Longest primer whose 4^L index still fits a `u64`
pub const MAX_ENUMERABLE_LENGTH: usize = 31;

/// Largest integer a TOML file can hold
pub const MAX_TOML_INTEGER: u64 = i64::MAX as u64;

fn invalid(message: impl Into<String>) -> PrimerError {
    PrimerError::InvalidConfiguration(message.into())
}

impl Constraints {
    pub fn validate(&self) -> Result<()> {
        let length = self.primer_length;
        if length == 0 {
            return Err(invalid("primer length must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.gc_min) || !(0.0..=1.0).contains(&self.gc_max) {
            return Err(invalid(format!(
                "GC bounds must lie in [0, 1], got [{}, {}]",
                self.gc_min, self.gc_max
            )));
        }
        if self.gc_min > self.gc_max {
            return Err(invalid(format!(
                "GC bounds are inverted: min {} > max {}",
                self.gc_min, self.gc_max
            )));
        }
        if self.max_homopolymer == 0 {
            return Err(invalid("max homopolymer run must be at least 1"));
        }
        if self.self_complement_window() > length {
            return Err(invalid(format!(
                "max self-complement {} leaves no window in a {} bp primer",
                self.max_self_complement, length
            )));
        }
        if self.inter_complement_window() > length {
            return Err(invalid(format!(
                "max inter-complement {} leaves no window in a {} bp primer",
                self.max_inter_complement, length
            )));
        }
        if self.min_hamming > length {
            return Err(invalid(format!(
                "min Hamming distance {} exceeds primer length {}",
                self.min_hamming, length
            )));
        }
        Ok(())
    }
}

impl LibraryParams {
    pub fn validate(&self) -> Result<()> {
        self.constraints.validate()?;
        if self.workers == 0 {
            return Err(invalid("worker count must be at least 1"));
        }
        if let ThreadCount::Fixed(0) = self.thread_count {
            return Err(invalid("thread count must be at least 1"));
        }
        if self.max_attempts_per_worker > MAX_TOML_INTEGER {
            return Err(invalid(format!(
                "attempt budget must be at most {}, got {}",
                MAX_TOML_INTEGER, self.max_attempts_per_worker
            )));
        }
        if let Some(seed) = self.seed.filter(|&seed| seed > MAX_TOML_INTEGER) {
            return Err(invalid(format!(
                "random seed must be at most {}, got {}",
                MAX_TOML_INTEGER, seed
            )));
        }
        match self.strategy {
            Strategy::RejectionSampling => {
                if self.target_volume == 0 {
                    return Err(invalid("target volume must be at least 1"));
                }
                if self.max_attempts_per_worker == 0 {
                    return Err(invalid("attempt budget must be at least 1"));
                }
            }
            Strategy::ExhaustiveEnumeration => {
                if self.constraints.primer_length > MAX_ENUMERABLE_LENGTH {
                    return Err(invalid(format!(
                        "exhaustive enumeration supports at most {} bp, got {}",
                        MAX_ENUMERABLE_LENGTH, self.constraints.primer_length
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate parameters from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: LibraryParams = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Validates first, so only values that can be read back are written.
    pub fn to_toml_string(&self) -> Result<String> {
        self.validate()?;
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let params = Self::from_toml_str(&contents)?;
        info!("Loaded parameters from {}", path.as_ref().display());
        Ok(params)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_toml_string()?)?;
        info!("Saved parameters to {}", path.as_ref().display());
        Ok(())
    }
}
