//! Batch runner: fan archives out to parallel workers

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use indicatif::MultiProgress;
use rayon::prelude::*;

use crate::config::Config;
use crate::worker;

/// Batch execution summary
#[derive(Debug)]
pub struct Summary {
    pub total_files: usize,
    pub completed_files: usize,
    pub failed_files: usize,
    pub total_records: usize,
    pub elapsed: std::time::Duration,
}

/// Extract every `*.xml.gz` archive in the input directory, one JSONL file
/// per archive.
///
/// Fails up front when the input directory holds no archives or the output
/// directory is not empty (a safety halt against clobbering a previous
/// run). Individual archive failures are logged and counted, not fatal to
/// the batch.
pub fn run(config: &Config, multi: &MultiProgress) -> Result<Summary> {
    let start = Instant::now();

    if !config.input_dir.is_dir() {
        bail!("input directory not found: {}", config.input_dir.display());
    }
    let pattern = config.input_dir.join("*.xml.gz");
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .context("invalid input pattern")?
        .filter_map(|p| p.ok())
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no .xml.gz archives in {}", config.input_dir.display());
    }
    if let Some(limit) = config.max_files {
        paths.truncate(limit);
    }

    std::fs::create_dir_all(&config.output_dir).context("failed to create output directory")?;
    if std::fs::read_dir(&config.output_dir)?.next().is_some() {
        bail!(
            "output directory {} is not empty, halting for safety",
            config.output_dir.display()
        );
    }

    let total_files = paths.len();
    log::info!(
        "Extracting {} archives with {} workers",
        total_files,
        config.workers
    );

    let records_counter = AtomicUsize::new(0);
    let completed_counter = AtomicUsize::new(0);
    let failed_counter = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .context("failed to create thread pool")?;

    pool.install(|| {
        paths.par_iter().for_each(|path| {
            let pb = multi.add(indicatif::ProgressBar::new_spinner());
            pb.set_style(
                indicatif::ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix:>20.cyan} {pos:>8} {wide_msg}")
                    .expect("invalid template"),
            );
            pb.set_prefix(
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string(),
            );

            match worker::process_file(path, &config.output_dir, &pb) {
                Ok(count) => {
                    records_counter.fetch_add(count, Ordering::Relaxed);
                    completed_counter.fetch_add(1, Ordering::Relaxed);
                    log::debug!("{}: {} records", path.display(), count);
                }
                Err(e) => {
                    failed_counter.fetch_add(1, Ordering::Relaxed);
                    log::error!("{}: {e:#}", path.display());
                }
            }
            pb.finish_and_clear();
        });
    });

    let elapsed = start.elapsed();
    let summary = Summary {
        total_files,
        completed_files: completed_counter.load(Ordering::Relaxed),
        failed_files: failed_counter.load(Ordering::Relaxed),
        total_records: records_counter.load(Ordering::Relaxed),
        elapsed,
    };

    log::info!("=== Extraction Summary ===");
    log::info!(
        "Archives: {}/{} completed ({} failed)",
        summary.completed_files,
        summary.total_files,
        summary.failed_files
    );
    log::info!("Records: {}", summary.total_records);
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());
    if summary.total_records > 0 {
        let rate = summary.total_records as f64 / summary.elapsed.as_secs_f64();
        log::info!("Throughput: {rate:.0} records/sec");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn write_archive(dir: &Path, name: &str, pmids: &[u64]) {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n<PubmedArticleSet>");
        for pmid in pmids {
            xml.push_str(&format!(
                "<PubmedArticle><MedlineCitation Status=\"MEDLINE\">\
                 <PMID Version=\"1\">{pmid}</PMID>\
                 </MedlineCitation></PubmedArticle>"
            ));
        }
        xml.push_str("</PubmedArticleSet>");

        let file = std::fs::File::create(dir.join(name)).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(xml.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    fn test_config(input: &Path, output: &Path) -> Config {
        Config {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            workers: 2,
            max_files: None,
        }
    }

    #[test]
    fn extracts_every_archive_in_the_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_archive(input.path(), "pubmed26n0001.xml.gz", &[1, 2, 3]);
        write_archive(input.path(), "pubmed26n0002.xml.gz", &[4, 5]);

        let out_dir = output.path().join("parsed");
        let config = test_config(input.path(), &out_dir);
        let summary = run(&config, &MultiProgress::new()).unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.completed_files, 2);
        assert_eq!(summary.failed_files, 0);
        assert_eq!(summary.total_records, 5);
        assert!(out_dir.join("pubmed26n0001.jsonl").exists());
        assert!(out_dir.join("pubmed26n0002.jsonl").exists());
    }

    #[test]
    fn max_files_limits_the_batch() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_archive(input.path(), "a.xml.gz", &[1]);
        write_archive(input.path(), "b.xml.gz", &[2]);

        let out_dir = output.path().join("parsed");
        let mut config = test_config(input.path(), &out_dir);
        config.max_files = Some(1);
        let summary = run(&config, &MultiProgress::new()).unwrap();

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.total_records, 1);
    }

    #[test]
    fn empty_input_directory_is_an_error() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let config = test_config(input.path(), &output.path().join("parsed"));
        let err = run(&config, &MultiProgress::new()).unwrap_err();
        assert!(err.to_string().contains("no .xml.gz archives"));
    }

    #[test]
    fn missing_input_directory_is_an_error() {
        let output = TempDir::new().unwrap();
        let config = test_config(
            &output.path().join("does-not-exist"),
            &output.path().join("parsed"),
        );
        let err = run(&config, &MultiProgress::new()).unwrap_err();
        assert!(err.to_string().contains("input directory not found"));
    }

    #[test]
    fn non_empty_output_directory_halts() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_archive(input.path(), "a.xml.gz", &[1]);
        std::fs::write(output.path().join("leftover.jsonl"), "x").unwrap();

        let config = test_config(input.path(), output.path());
        let err = run(&config, &MultiProgress::new()).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }
}
