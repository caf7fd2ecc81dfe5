//! Assembly parameters.
//!
//! Every numeric policy the engine applies lives here with its default, so a
//! run can be reproduced from the `params_used.json` it writes.

use crate::error::{AssemblyError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// K-mer length; graph nodes have length k-1
    pub kmer_length: usize,
    /// K-mers seen fewer times are not turned into edges
    pub min_kmer_count: u64,
    /// Connected components with fewer nodes are dropped
    pub min_component_size: usize,
    /// Longest dead-end path (in nodes) treated as a tip
    pub tip_max_len: usize,
    /// A tip survives if its weight reaches this fraction of the anchor's best alternative edge
    pub min_coverage_ratio: f64,
    pub pop_bubbles: bool,
    /// Longest bubble arm (in steps) considered for popping
    pub max_bubble_len: usize,
    /// Shorter contigs are discarded
    pub min_contig_len: usize,
    /// Estimate and apply a coverage cutoff before cleaning
    pub auto_cutoff: bool,
    pub use_tour_bus: bool,
    /// Longest branch (in edges) followed by Tour Bus
    pub max_repeat_length: usize,
    pub tour_bus_iterations: usize,
    /// Pass limit for each tip and bubble fixpoint loop
    pub max_clean_iterations: usize,
    /// Run k-mer spectrum read correction before counting
    pub correct_reads: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            kmer_length: 31,
            min_kmer_count: 2,
            min_component_size: 10,
            tip_max_len: 3,
            min_coverage_ratio: 0.5,
            pop_bubbles: false,
            max_bubble_len: 5,
            min_contig_len: 300,
            auto_cutoff: true,
            use_tour_bus: true,
            max_repeat_length: 10,
            tour_bus_iterations: 5,
            max_clean_iterations: 10,
            correct_reads: true,
        }
    }
}

impl AssemblyConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: AssemblyConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.kmer_length < 2 {
            return Err(AssemblyError::invalid_parameter(format!(
                "kmer_length must be at least 2, got {}",
                self.kmer_length
            )));
        }
        let positive = [
            ("min_kmer_count", self.min_kmer_count as usize),
            ("min_component_size", self.min_component_size),
            ("max_bubble_len", self.max_bubble_len),
            ("min_contig_len", self.min_contig_len),
            ("max_repeat_length", self.max_repeat_length),
            ("tour_bus_iterations", self.tour_bus_iterations),
            ("max_clean_iterations", self.max_clean_iterations),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(AssemblyError::invalid_parameter(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        if !(self.min_coverage_ratio > 0.0 && self.min_coverage_ratio <= 1.0) {
            return Err(AssemblyError::invalid_parameter(format!(
                "min_coverage_ratio must be in (0, 1], got {}",
                self.min_coverage_ratio
            )));
        }
        Ok(())
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        assert!(AssemblyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = AssemblyConfig {
            kmer_length: 1,
            ..AssemblyConfig::default()
        };
        assert!(matches!(config.validate(), Err(AssemblyError::InvalidParameter(_))));

        let config = AssemblyConfig {
            min_contig_len: 0,
            ..AssemblyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AssemblyConfig {
            min_coverage_ratio: 1.5,
            ..AssemblyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "kmer_length": 21, "pop_bubbles": true }"#).unwrap();

        let config = AssemblyConfig::load(&path).unwrap();
        assert_eq!(config.kmer_length, 21);
        assert!(config.pop_bubbles);
        assert_eq!(config.min_contig_len, 300);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        let config = AssemblyConfig {
            tip_max_len: 2,
            ..AssemblyConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AssemblyConfig::load(&path).unwrap(), config);
    }
}
