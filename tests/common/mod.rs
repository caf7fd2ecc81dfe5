#![allow(dead_code)]

use dbgrush::config::AssemblyConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Random ACGT sequence, reproducible for a given seed
pub fn random_genome(len: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

/// Error-free reads tiling the genome end to end, each copied `depth` times.
///
/// `step` must leave enough overlap between neighbouring reads for every
/// k-mer of interest to appear in at least one read.
pub fn tiled_reads(genome: &str, read_len: usize, step: usize, depth: usize) -> Vec<String> {
    let mut starts: Vec<usize> = (0..genome.len().saturating_sub(read_len) + 1)
        .step_by(step)
        .collect();
    let last = genome.len().saturating_sub(read_len);
    if starts.last() != Some(&last) {
        starts.push(last);
    }
    let mut reads = Vec::with_capacity(starts.len() * depth);
    for _ in 0..depth {
        for &start in &starts {
            reads.push(genome[start..start + read_len.min(genome.len())].to_string());
        }
    }
    reads
}

/// Replace the base at `pos` with a different one
pub fn mutate(seq: &str, pos: usize) -> String {
    let mut bytes = seq.as_bytes().to_vec();
    bytes[pos] = match bytes[pos] {
        b'A' => b'C',
        b'C' => b'G',
        b'G' => b'T',
        _ => b'A',
    };
    String::from_utf8(bytes).unwrap()
}

pub fn write_fasta(reads: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for (i, read) in reads.iter().enumerate() {
        writeln!(file, ">read_{}", i + 1).unwrap();
        writeln!(file, "{}", read).unwrap();
    }
    file.as_file_mut().sync_all().unwrap();
    file
}

/// Parameters used by the end-to-end scenarios
pub fn test_config() -> AssemblyConfig {
    AssemblyConfig {
        kmer_length: 31,
        min_kmer_count: 2,
        ..AssemblyConfig::default()
    }
}
