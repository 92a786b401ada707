//! pmparse - PubMed XML record extraction
//!
//! Streams gzip-compressed PubMed baseline archives and extracts one flat,
//! normalized record per `PubmedArticle` element.
//!
//! # Features
//!
//! - Incremental XML parsing with quick-xml; one article subtree in memory
//!   at a time, regardless of archive size
//! - Tolerant field extraction over a deeply optional schema
//! - Batch mode: one JSONL file per archive, parallel with rayon
//!
//! # Example
//!
//! ```ignore
//! use pmparse::Records;
//!
//! for result in Records::over_file("pubmed26n0001.xml.gz".as_ref())? {
//!     let record = result?;
//!     println!("{:?} {:?}", record.pmid, record.date);
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod record;
pub mod runner;
pub mod sink;
pub mod stream;
pub mod worker;

// Re-exports
pub use config::Config;
pub use error::ExtractError;
pub use extract::Records;
pub use logging::init_logging;
pub use record::{DataBankEntry, Record, TextSpan};
pub use runner::{Summary, run};
pub use sink::{JsonlSink, cleanup_tmp_files};
pub use stream::{ArchiveReader, open_archive};
