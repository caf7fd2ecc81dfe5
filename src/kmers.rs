//! K-mer counting and count histograms.

use crate::error::{AssemblyError, Result};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Occurrence count of every distinct k-mer.
pub type KmerCounts = HashMap<String, u64>;

/// Whether a byte is one of the four unambiguous nucleotides
pub fn is_base(byte: u8) -> bool {
    matches!(byte, b'A' | b'C' | b'G' | b'T')
}

/// All k-mer windows of a read that consist only of A/C/G/T.
pub fn iter_kmers(read: &[u8], k: usize) -> impl Iterator<Item = &[u8]> {
    read.windows(k.max(1))
        .filter(move |window| k > 0 && window.iter().all(|&b| is_base(b)))
}

/// Count every k-mer across all reads.
///
/// Reads shorter than `k` contribute nothing.
pub fn count_kmers<S: AsRef<[u8]>>(reads: &[S], k: usize) -> Result<KmerCounts> {
    if reads.is_empty() {
        return Err(AssemblyError::empty_input("no reads to count k-mers from"));
    }
    if k == 0 {
        return Err(AssemblyError::invalid_parameter("k-mer length must be positive"));
    }

    let mut counts = KmerCounts::new();
    for read in reads {
        for kmer in iter_kmers(read.as_ref(), k) {
            // Windows are pure ACGT so the conversion cannot fail
            if let Ok(kmer) = std::str::from_utf8(kmer) {
                match counts.get_mut(kmer) {
                    Some(count) => *count += 1,
                    None => {
                        counts.insert(kmer.to_string(), 1);
                    }
                }
            }
        }
    }
    debug!("Counted {} distinct {}-mers over {} reads", counts.len(), k, reads.len());
    Ok(counts)
}

/// Map of occurrence count -> number of distinct k-mers with that count.
pub fn kmer_histogram(counts: &KmerCounts) -> BTreeMap<u64, u64> {
    let mut histogram = BTreeMap::new();
    for &count in counts.values() {
        *histogram.entry(count).or_insert(0) += 1;
    }
    histogram
}
