//! Worker for extracting one archive to JSONL

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::extract::Records;
use crate::sink::JsonlSink;

/// Extract a single `.xml.gz` archive into `<stem>.jsonl` under `output_dir`.
///
/// The output stem is the filename up to the first dot, so
/// `pubmed26n0001.xml.gz` becomes `pubmed26n0001.jsonl`. Articles failing
/// with a malformed identifier are logged and skipped; stream-level errors
/// abort the file. Returns the number of records written.
pub fn process_file(path: &Path, output_dir: &Path, pb: &ProgressBar) -> Result<usize> {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    pb.set_message(filename.to_string());

    let stem = filename.split('.').next().unwrap_or(filename);
    let mut sink = JsonlSink::new(output_dir, stem)
        .with_context(|| format!("failed to create output for {filename}"))?;

    let records = Records::over_file(path)?;
    let mut skipped = 0usize;
    for result in records {
        match result {
            Ok(record) => {
                sink.write(&record)?;
                pb.inc(1);
            }
            Err(e) if e.is_article_scoped() => {
                log::warn!("{filename}: skipping article: {e}");
                skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("failed reading {filename}")),
        }
    }
    if skipped > 0 {
        log::warn!("{filename}: skipped {skipped} malformed articles");
    }

    let written = sink.finalize()?;
    Ok(written)
}
