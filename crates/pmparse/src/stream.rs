//! Local gzip archive reader
//!
//! Validates the `.xml.gz` naming convention before opening and exposes a
//! lazily decompressed byte stream suitable for incremental parsing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::ExtractError;

/// Buffer size for the decompressed stream (256KB)
const GZIP_BUF_SIZE: usize = 256 * 1024;

/// Buffered reader over a gzipped local file
pub type ArchiveReader = BufReader<GzDecoder<File>>;

/// Open a compressed XML archive for streaming.
///
/// Fails with [`ExtractError::NotFound`] if `path` is not an existing file
/// and [`ExtractError::BadExtension`] if the filename does not end in
/// `.xml.gz`, both before the file is opened. Decompression is lazy, so
/// multi-gigabyte archives never sit in memory.
pub fn open_archive(path: &Path) -> Result<ArchiveReader, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if !name.ends_with(".xml.gz") {
        return Err(ExtractError::BadExtension(path.to_path_buf()));
    }

    let file = File::open(path)?;
    Ok(BufReader::with_capacity(GZIP_BUF_SIZE, GzDecoder::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn write_gz(path: &Path, content: &str) {
        let file = File::create(path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(content.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = open_archive(&dir.path().join("absent.xml.gz")).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = open_archive(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.xml");
        std::fs::write(&path, "<x/>").unwrap();
        let err = open_archive(&path).unwrap_err();
        assert!(matches!(err, ExtractError::BadExtension(_)));
    }

    #[test]
    fn plain_gz_without_xml_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.gz");
        write_gz(&path, "<x/>");
        let err = open_archive(&path).unwrap_err();
        assert!(matches!(err, ExtractError::BadExtension(_)));
    }

    #[test]
    fn decompresses_valid_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.xml.gz");
        write_gz(&path, "<PubmedArticleSet></PubmedArticleSet>");

        let mut reader = open_archive(&path).unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "<PubmedArticleSet></PubmedArticleSet>");
    }
}
