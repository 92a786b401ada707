//! Batch extraction configuration

use std::path::PathBuf;

/// Runtime configuration for the batch extractor
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `*.xml.gz` archives
    pub input_dir: PathBuf,
    /// Output directory for JSONL files; must be empty or absent
    pub output_dir: PathBuf,
    /// Parallel workers, one archive per worker
    pub workers: usize,
    /// Maximum archives to process (for testing)
    pub max_files: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("parsed_xml"),
            workers: default_workers(),
            max_files: None,
        }
    }
}

/// One worker per core, capped to keep disk contention reasonable
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("parsed_xml"));
        assert!(config.workers >= 1);
        assert!(config.max_files.is_none());
    }

    #[test]
    fn default_workers_bounded() {
        let workers = default_workers();
        assert!((1..=16).contains(&workers));
    }
}
