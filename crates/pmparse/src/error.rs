//! Error taxonomy for archive reading and record extraction

use std::path::PathBuf;

/// Error from opening an archive or extracting records from it.
///
/// `NotFound` and `BadExtension` are surfaced before the archive is opened.
/// `MalformedField` is scoped to one article; everything else is fatal to
/// the remainder of the archive, since the parser is incremental and
/// stateful.
#[derive(Debug)]
pub enum ExtractError {
    /// Input path does not reference an existing file
    NotFound(PathBuf),
    /// Filename does not carry the `.xml.gz` double extension
    BadExtension(PathBuf),
    /// An identifier field that is structurally present but not parseable
    /// as an integer. `article` is the zero-based position of the failing
    /// article in the stream.
    MalformedField {
        article: usize,
        field: &'static str,
        value: String,
    },
    /// XML syntax or decode error mid-stream
    Xml(quick_xml::Error),
    /// I/O or decompression error
    Io(std::io::Error),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "not found: {}", path.display()),
            Self::BadExtension(path) => {
                write!(f, "expected a .xml.gz archive: {}", path.display())
            }
            Self::MalformedField {
                article,
                field,
                value,
            } => write!(f, "article {article}: malformed {field}: {value:?}"),
            Self::Xml(e) => write!(f, "XML: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ExtractError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl ExtractError {
    /// True when the failure spoils one article only and iteration can
    /// continue with the next. Callers choose between skipping the article
    /// and aborting the archive.
    pub fn is_article_scoped(&self) -> bool {
        matches!(self, Self::MalformedField { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::path::Path;

    #[test]
    fn malformed_field_is_article_scoped() {
        let err = ExtractError::MalformedField {
            article: 7,
            field: "PMID",
            value: "x17".to_string(),
        };
        assert!(err.is_article_scoped());
    }

    #[test]
    fn io_error_is_fatal() {
        let err = ExtractError::Io(std::io::Error::new(ErrorKind::UnexpectedEof, "eof"));
        assert!(!err.is_article_scoped());
    }

    #[test]
    fn not_found_is_fatal() {
        let err = ExtractError::NotFound(Path::new("/does/not/exist.xml.gz").into());
        assert!(!err.is_article_scoped());
    }

    #[test]
    fn display_malformed_field() {
        let err = ExtractError::MalformedField {
            article: 3,
            field: "PMID",
            value: "abc".to_string(),
        };
        assert_eq!(format!("{err}"), "article 3: malformed PMID: \"abc\"");
    }

    #[test]
    fn display_bad_extension() {
        let err = ExtractError::BadExtension(Path::new("data.xml").into());
        assert!(format!("{err}").contains(".xml.gz"));
    }
}
