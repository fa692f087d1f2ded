//! Reading seed primers and writing finished libraries

use std::path::Path;

use log::info;

use super::error::{PrimerError, Result};
use super::sequence::Sequence;
use super::types::LibraryReport;

/// Parse primers from FASTA text, or from one primer per line when no headers are present.
///
/// Input is folded to upper case and whitespace is ignored. Any other symbol is an error
/// naming the offending record.
pub fn parse_primer_list(text: &str) -> Result<Vec<Sequence>> {
    let mut records: Vec<(String, String)> = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_seq = String::new();
    let has_headers = text.lines().any(|l| l.trim_start().starts_with('>'));

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if has_headers {
            if let Some(name) = line.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    records.push((name, std::mem::take(&mut current_seq)));
                }
                current_name = Some(name.trim().to_string());
            } else {
                if current_name.is_none() {
                    current_name = Some(format!("Primer_{}", records.len() + 1));
                }
                current_seq.extend(line.chars().filter(|c| !c.is_whitespace()));
            }
        } else {
            let seq: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            records.push((format!("line {}", i + 1), seq));
        }
    }

    if let Some(name) = current_name {
        records.push((name, current_seq));
    }

    records
        .into_iter()
        .filter(|(_, seq)| !seq.is_empty())
        .map(|(name, seq)| {
            Sequence::parse(&seq.to_ascii_uppercase())
                .map_err(|e| PrimerError::InvalidInput(format!("{}: {}", name, e)))
        })
        .collect()
}

pub fn load_primer_file<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let primers = parse_primer_list(&contents)?;
    info!("Loaded {} primers from {}", primers.len(), path.as_ref().display());
    Ok(primers)
}

/// FASTA with one record per primer, named `primer_1`, `primer_2`, ...
pub fn library_to_fasta(primers: &[Sequence]) -> String {
    let mut out = String::with_capacity(primers.len() * 32);
    for (i, primer) in primers.iter().enumerate() {
        out.push_str(&format!(">primer_{}\n{}\n", i + 1, primer));
    }
    out
}

/// One primer per line
pub fn library_to_text(primers: &[Sequence]) -> String {
    let mut out = String::with_capacity(primers.len() * 16);
    for primer in primers {
        out.push_str(&primer.to_string());
        out.push('\n');
    }
    out
}

pub fn save_report<P: AsRef<Path>>(report: &LibraryReport, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path.as_ref(), json)?;
    info!(
        "Saved library of {} primers to {}",
        report.library_size,
        path.as_ref().display()
    );
    Ok(())
}

pub fn load_report<P: AsRef<Path>>(path: P) -> Result<LibraryReport> {
    let json = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fasta_records() {
        let text = ">p1\nACGT\nAC\n>p2\ngatt\n";
        let primers = parse_primer_list(text).unwrap();
        assert_eq!(primers.len(), 2);
        assert_eq!(primers[0].to_string(), "ACGTAC");
        assert_eq!(primers[1].to_string(), "GATT");
    }

    #[test]
    fn test_parse_plain_lines() {
        let text = "ACGT\n\n  TTGA  \n";
        let primers = parse_primer_list(text).unwrap();
        assert_eq!(primers.len(), 2);
        assert_eq!(primers[1].to_string(), "TTGA");
    }

    #[test]
    fn test_parse_rejects_ambiguity_codes() {
        let err = parse_primer_list(">bad\nACNT\n").unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_fasta_export_parses_back() {
        let primers = vec![
            Sequence::parse("ACGTCA").unwrap(),
            Sequence::parse("TTGACC").unwrap(),
        ];
        let fasta = library_to_fasta(&primers);
        assert!(fasta.starts_with(">primer_1\nACGTCA\n"));
        assert_eq!(parse_primer_list(&fasta).unwrap(), primers);
        assert_eq!(library_to_text(&primers), "ACGTCA\nTTGACC\n");
    }

    #[test]
    fn test_load_primer_file_reads_fasta() {
        let path = std::env::temp_dir().join(format!("primer_seeds_{}.fasta", std::process::id()));
        std::fs::write(&path, ">s1\nACGTCA\n>s2\nttgacc\n").unwrap();
        let primers = load_primer_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(primers.len(), 2);
        assert_eq!(primers[1].to_string(), "TTGACC");
        assert!(matches!(
            load_primer_file(&path),
            Err(PrimerError::Io(_))
        ));
    }
}
