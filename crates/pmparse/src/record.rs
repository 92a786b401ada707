//! Flat record model for extracted articles

use serde::{Deserialize, Serialize};

/// One title or abstract segment, tagged with its origin.
///
/// `kind` is `"title"` or `"abstract:<category>"`, where `<category>` is the
/// lowercased NlmCategory label or `"raw"` when the source gave none. The
/// serialized key is `type`, matching the historical record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// External repository reference cited by an article.
///
/// One entry per accession number; entries from the same bank share `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBankEntry {
    pub name: Option<String>,
    pub id: String,
}

/// One article's normalized data.
///
/// Every field is always present in serialized form: absent subtrees become
/// `null` or `[]`, never omitted keys. `version` is populated only when
/// `pmid` was found in the same citation element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub pmid: Option<u64>,
    pub version: Option<u32>,
    /// Earliest valid history date, zero-padded `YYYY-MM-DD`
    pub date: Option<String>,
    /// Raw language code, unvalidated
    pub language: Option<String>,
    pub medline_status: Option<String>,
    /// Title first, then abstract segments in document order
    pub text_data: Vec<TextSpan>,
    pub publication_types: Vec<String>,
    /// Chemical-substance UIs first, then descriptor UIs
    pub mesh_headings: Vec<String>,
    pub data_banks: Vec<DataBankEntry>,
    /// Formatted display names in document order
    pub authors: Vec<String>,
}
