//! K-mer spectrum read correction.
//!
//! High-multiplicity k-mers are trusted. For every window of a read that is
//! not trusted, single-base substitutions are tried until one yields a
//! trusted k-mer, and that base is written back into the read.

use crate::kmers::{count_kmers, is_base, KmerCounts};
use log::{debug, info};
use std::collections::HashSet;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// K-mer length used for error-rate estimation
pub const ERROR_ESTIMATE_K: usize = 17;

/// Parameters for one correction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionParams {
    pub k: usize,
    pub min_count: u64,
    pub rounds: usize,
}

impl CorrectionParams {
    /// Pick correction parameters from an estimated per-base error rate.
    pub fn for_error_rate(error_rate: f64) -> Self {
        if error_rate < 0.02 {
            CorrectionParams { k: 21, min_count: 2, rounds: 1 }
        } else if error_rate < 0.04 {
            CorrectionParams { k: 17, min_count: 3, rounds: 2 }
        } else {
            CorrectionParams { k: 15, min_count: 4, rounds: 2 }
        }
    }
}

/// K-mers seen at least `min_count` times.
pub fn trusted_kmers(counts: &KmerCounts, min_count: u64) -> HashSet<Vec<u8>> {
    counts
        .iter()
        .filter(|(_, count)| **count >= min_count)
        .map(|(kmer, _)| kmer.as_bytes().to_vec())
        .collect()
}

/// Find a trusted single-substitution neighbour of an untrusted k-mer.
///
/// Positions are tried left to right and bases in A, C, G, T order.
/// Returns `None` when the k-mer is already trusted or has no trusted
/// neighbour.
pub fn correct_kmer(kmer: &[u8], trusted: &HashSet<Vec<u8>>) -> Option<Vec<u8>> {
    if trusted.contains(kmer) {
        return None;
    }
    let mut candidate = kmer.to_vec();
    for i in 0..kmer.len() {
        let original = kmer[i];
        for &base in &BASES {
            if base == original {
                continue;
            }
            candidate[i] = base;
            if trusted.contains(candidate.as_slice()) {
                return Some(candidate);
            }
        }
        candidate[i] = original;
    }
    None
}

/// Correct a single read against a trusted k-mer set.
pub fn correct_read(read: &str, k: usize, trusted: &HashSet<Vec<u8>>) -> String {
    let bytes = read.as_bytes();
    if k == 0 || bytes.len() < k {
        return read.to_string();
    }
    let mut corrected = bytes.to_vec();
    for (i, kmer) in bytes.windows(k).enumerate() {
        if !kmer.iter().all(|&b| is_base(b)) {
            continue;
        }
        if let Some(fixed) = correct_kmer(kmer, trusted) {
            if let Some(j) = (0..k).find(|&j| kmer[j] != fixed[j]) {
                corrected[i + j] = fixed[j];
            }
        }
    }
    // Only ASCII bases were substituted, so the bytes are still valid UTF-8
    String::from_utf8(corrected).unwrap_or_else(|_| read.to_string())
}

/// Estimate the per-base error rate from the fraction of singleton k-mers.
pub fn estimate_error_rate<S: AsRef<[u8]>>(reads: &[S], k: usize) -> f64 {
    let counts = match count_kmers(reads, k) {
        Ok(counts) => counts,
        Err(_) => return 0.0,
    };
    let singletons = counts.values().filter(|&&count| count == 1).count();
    let total: u64 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let rate = (singletons as f64 / total as f64) / k as f64;
    rate.min(0.2)
}

/// Run `rounds` of correction with fixed parameters.
pub fn correct_reads(reads: &[String], params: CorrectionParams) -> Vec<String> {
    let mut current = reads.to_vec();
    for round in 0..params.rounds {
        let counts = match count_kmers(&current, params.k) {
            Ok(counts) => counts,
            Err(_) => break,
        };
        let trusted = trusted_kmers(&counts, params.min_count);
        let mut changed = 0;
        current = current
            .iter()
            .map(|read| {
                let fixed = correct_read(read, params.k, &trusted);
                if fixed != *read {
                    changed += 1;
                }
                fixed
            })
            .collect();
        debug!(
            "Correction round {}: {} trusted {}-mers, {} reads changed",
            round + 1,
            trusted.len(),
            params.k,
            changed
        );
    }
    current
}

/// Estimate the error rate, choose parameters and correct all reads.
pub fn adaptive_correction(reads: &[String]) -> Vec<String> {
    let error_rate = estimate_error_rate(reads, ERROR_ESTIMATE_K);
    let params = CorrectionParams::for_error_rate(error_rate);
    info!(
        "Estimated error rate {:.4}, correcting with k={} min_count={} rounds={}",
        error_rate, params.k, params.min_count, params.rounds
    );
    correct_reads(reads, params)
}
