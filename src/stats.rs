//! Contig set statistics.

use serde::{Deserialize, Serialize};

/// Summary of a contig set. An empty set reports all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContigStats {
    pub num_contigs: usize,
    pub total_length: usize,
    pub longest: usize,
    pub shortest: usize,
    /// Rounded to one decimal
    pub mean_length: f64,
    pub n50: usize,
}

impl ContigStats {
    pub fn from_contigs<S: AsRef<str>>(contigs: &[S]) -> Self {
        let lengths: Vec<usize> = contigs.iter().map(|c| c.as_ref().len()).collect();
        Self::from_lengths(&lengths)
    }

    pub fn from_lengths(lengths: &[usize]) -> Self {
        if lengths.is_empty() {
            return ContigStats::default();
        }
        let total_length: usize = lengths.iter().sum();
        let mean = total_length as f64 / lengths.len() as f64;
        ContigStats {
            num_contigs: lengths.len(),
            total_length,
            longest: lengths.iter().copied().max().unwrap_or(0),
            shortest: lengths.iter().copied().min().unwrap_or(0),
            mean_length: (mean * 10.0).round() / 10.0,
            n50: n50(lengths),
        }
    }
}

/// Length at which the running sum of lengths, longest first, first reaches
/// half of the total.
pub fn n50(lengths: &[usize]) -> usize {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let total: usize = sorted.iter().sum();
    let mut running = 0;
    for len in sorted {
        running += len;
        if running * 2 >= total {
            return len;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n50_longest_first() {
        assert_eq!(n50(&[100, 500, 100, 300]), 500);
        assert_eq!(n50(&[100, 100, 100]), 100);
        assert_eq!(n50(&[400, 300, 200, 100]), 300);
        assert_eq!(n50(&[]), 0);
    }

    #[test]
    fn test_stats_from_lengths() {
        let stats = ContigStats::from_lengths(&[500, 300, 100, 100]);
        assert_eq!(stats.num_contigs, 4);
        assert_eq!(stats.total_length, 1000);
        assert_eq!(stats.longest, 500);
        assert_eq!(stats.shortest, 100);
        assert_eq!(stats.mean_length, 250.0);
        assert_eq!(stats.n50, 500);
    }

    #[test]
    fn test_mean_rounded_to_one_decimal() {
        let stats = ContigStats::from_lengths(&[10, 10, 11]);
        assert_eq!(stats.mean_length, 10.3);
    }

    #[test]
    fn test_empty_contig_set() {
        let contigs: Vec<String> = Vec::new();
        assert_eq!(ContigStats::from_contigs(&contigs), ContigStats::default());
        assert_eq!(ContigStats::default().mean_length, 0.0);
    }

    #[test]
    fn test_stats_from_sequences() {
        let stats = ContigStats::from_contigs(&["ACGT", "AC"]);
        assert_eq!(stats.total_length, 6);
        assert_eq!(stats.n50, 4);
        assert_eq!(stats.mean_length, 3.0);
    }
}
