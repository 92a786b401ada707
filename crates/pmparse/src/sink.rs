//! JSONL output sink with atomic tmp→rename

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::record::Record;

/// Buffered JSON-lines writer, one record per line.
///
/// Writes go to a `.tmp` sibling which [`JsonlSink::finalize`] renames into
/// place, so a crashed run never leaves a half-written final file. Refuses
/// to clobber an existing final file.
pub struct JsonlSink {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Create a sink for `<stem>.jsonl` under `output_dir`
    pub fn new(output_dir: &Path, stem: &str) -> io::Result<Self> {
        let filename = format!("{stem}.jsonl");
        let final_path = output_dir.join(&filename);
        if final_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("output file already exists: {}", final_path.display()),
            ));
        }

        let tmp_path = output_dir.join(format!("{filename}.tmp"));
        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Append one record as a JSON line
    pub fn write(&mut self, record: &Record) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.row_count += 1;
        Ok(())
    }

    /// Flush and atomically rename tmp → final
    pub fn finalize(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(self.row_count)
    }
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
