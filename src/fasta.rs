use crate::error::{AssemblyError, Result};
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parse FASTA records from a reader, returning uppercased sequences.
///
/// Multi-line records are joined, whitespace is trimmed, and records with
/// no sequence are dropped.
pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut sequences = Vec::new();
    let mut current = String::new();
    let mut in_record = false;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('>') {
            if in_record && !current.is_empty() {
                sequences.push(std::mem::take(&mut current));
            }
            current.clear();
            in_record = true;
        } else if in_record {
            current.push_str(&line.trim().to_ascii_uppercase());
        }
    }
    if in_record && !current.is_empty() {
        sequences.push(current);
    }

    Ok(sequences)
}

/// Load all reads from a FASTA file.
pub fn load_reads(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reads = parse_fasta(BufReader::new(file))?;
    if reads.is_empty() {
        return Err(AssemblyError::empty_input(format!(
            "no valid sequences found in FASTA file: {}",
            path.display()
        )));
    }
    info!("Loaded {} reads from {}", reads.len(), path.display());
    Ok(reads)
}

/// Write sequences as `>{prefix}_{i}` records, numbered from 1.
pub fn write_contigs<S: AsRef<str>>(contigs: &[S], path: &Path, prefix: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (i, seq) in contigs.iter().enumerate() {
        writeln!(writer, ">{}_{}", prefix, i + 1)?;
        writeln!(writer, "{}", seq.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_multiline_records() {
        let input = ">r1 first read\nacgt\nTTGA\n>r2\n\n>r3\n  GGCC  \n";
        let reads = parse_fasta(Cursor::new(input)).unwrap();
        assert_eq!(reads, vec!["ACGTTTGA", "GGCC"]);
    }

    #[test]
    fn test_load_reads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">read1").unwrap();
        writeln!(file, "ACGTACGT").unwrap();
        writeln!(file, ">read2").unwrap();
        writeln!(file, "tttt").unwrap();
        file.flush().unwrap();

        let reads = load_reads(file.path()).unwrap();
        assert_eq!(reads, vec!["ACGTACGT", "TTTT"]);
    }

    #[test]
    fn test_load_reads_without_sequences() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">empty").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_reads(file.path()),
            Err(AssemblyError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_reads(Path::new("/nonexistent/reads.fa"));
        assert!(matches!(result, Err(AssemblyError::Io(_))));
    }

    #[test]
    fn test_write_contigs_numbering() {
        let file = NamedTempFile::new().unwrap();
        write_contigs(&["ACGT", "GGCC"], file.path(), "contig").unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, ">contig_1\nACGT\n>contig_2\nGGCC\n");
    }
}
