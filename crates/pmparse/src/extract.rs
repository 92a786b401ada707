//! Record extraction from PubMed XML
//!
//! Drives a quick-xml event reader over the decompressed byte stream and
//! applies a fixed set of tolerant field-extraction rules to each
//! `PubmedArticle` subtree. Missing structure yields defaults; the one
//! caller-visible per-article failure is a present-but-non-numeric PMID.
//!
//! Traversal is immediate-children only at the article and citation levels:
//! elements that are not dispatched are skipped wholesale, so a PMID nested
//! inside `CommentsCorrections` can never shadow the citation identifier.

use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ExtractError;
use crate::record::{DataBankEntry, Record, TextSpan};
use crate::stream::{self, ArchiveReader};

/// History entries with no usable components format to this sentinel
const NULL_DATE: &str = "0000-00-00";

/// Lazy, forward-only record iterator over one archive.
///
/// Yields one [`Record`] per `PubmedArticle` element in document order,
/// holding at most one article subtree's worth of state at a time. XML and
/// I/O errors are fatal: the failing result is yielded once and the
/// iterator is exhausted. [`ExtractError::MalformedField`] results are
/// per-article; iteration continues with the next article.
pub struct Records<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    next_ordinal: usize,
    done: bool,
}

impl Records<ArchiveReader> {
    /// Open a `.xml.gz` archive and iterate its records.
    pub fn over_file(path: &Path) -> Result<Self, ExtractError> {
        Ok(Self::new(stream::open_archive(path)?))
    }
}

impl<R: BufRead> Records<R> {
    /// Iterate records from an already-decompressed XML byte stream.
    ///
    /// Text nodes are deliberately not trimmed: titles and abstracts are
    /// exact concatenations of their text nodes.
    pub fn new(source: R) -> Self {
        Records {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            next_ordinal: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Record, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) if e.name().as_ref() == b"PubmedArticle" => {
                    let ordinal = self.next_ordinal;
                    self.next_ordinal += 1;
                    let result = extract_article(&mut self.reader, ordinal);
                    if let Err(ref e) = result {
                        if !e.is_article_scoped() {
                            self.done = true;
                        }
                    }
                    return Some(result);
                }
                Ok(Event::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ExtractError::Xml(e)));
                }
                Ok(_) => {}
            }
        }
    }
}

/// Extract one record from the subtree whose `<PubmedArticle>` start tag
/// was just consumed.
///
/// A malformed identifier is remembered rather than returned on the spot so
/// the walk still consumes the whole subtree; the reader is then aligned on
/// the next sibling and the caller may keep iterating.
fn extract_article<R: BufRead>(
    reader: &mut Reader<R>,
    ordinal: usize,
) -> Result<Record, ExtractError> {
    let mut record = Record::default();
    let mut malformed = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => {
                    record.medline_status = attr_value(&e, b"Status")?;
                    extract_citation(reader, ordinal, &mut record, &mut malformed)?;
                }
                b"PubmedData" => extract_pubmed_data(reader, &mut record)?,
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match malformed {
        Some(e) => Err(e),
        None => Ok(record),
    }
}

/// `MedlineCitation`: identity, status, article body, chemicals, headings
fn extract_citation<R: BufRead>(
    reader: &mut Reader<R>,
    ordinal: usize,
    record: &mut Record,
    malformed: &mut Option<ExtractError>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => {
                    let version = attr_value(&e, b"Version")?;
                    let text = read_nested_text(reader, b"PMID")?;
                    apply_identifier(&text, version.as_deref(), ordinal, record, malformed);
                }
                b"Article" => extract_article_body(reader, record)?,
                b"ChemicalList" => extract_chemicals(reader, &mut record.mesh_headings)?,
                b"MeshHeadingList" => {
                    extract_mesh_descriptors(reader, &mut record.mesh_headings)?
                }
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// PMID text and Version attribute, both integers.
///
/// This is the one field assumed well-formed whenever present; a parse
/// failure (or an absent Version on a present PMID) is recorded as a
/// `MalformedField` and voids the whole article. Only the first PMID child
/// and the first failure count.
fn apply_identifier(
    text: &str,
    version: Option<&str>,
    ordinal: usize,
    record: &mut Record,
    malformed: &mut Option<ExtractError>,
) {
    if record.pmid.is_some() || malformed.is_some() {
        return;
    }
    let pmid = match text.trim().parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            *malformed = Some(ExtractError::MalformedField {
                article: ordinal,
                field: "PMID",
                value: text.trim().to_string(),
            });
            return;
        }
    };
    let version = match version.map(|raw| (raw, raw.trim().parse::<u32>())) {
        Some((_, Ok(v))) => v,
        Some((raw, Err(_))) => {
            *malformed = Some(ExtractError::MalformedField {
                article: ordinal,
                field: "PMID/@Version",
                value: raw.trim().to_string(),
            });
            return;
        }
        None => {
            *malformed = Some(ExtractError::MalformedField {
                article: ordinal,
                field: "PMID/@Version",
                value: String::new(),
            });
            return;
        }
    };
    record.pmid = Some(pmid);
    record.version = Some(version);
}

/// `Article`: language, title, abstract, authors, publication types, banks
fn extract_article_body<R: BufRead>(
    reader: &mut Reader<R>,
    record: &mut Record,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Language" => {
                    // first language element only, raw text
                    let text = read_nested_text(reader, b"Language")?;
                    if record.language.is_none() {
                        record.language = Some(text);
                    }
                }
                b"ArticleTitle" => {
                    let text = read_nested_text(reader, b"ArticleTitle")?;
                    record.text_data.push(TextSpan {
                        text,
                        kind: "title".to_string(),
                    });
                }
                b"Abstract" => extract_abstract(reader, &mut record.text_data)?,
                b"AuthorList" => extract_authors(reader, &mut record.authors)?,
                b"PublicationTypeList" => {
                    extract_publication_types(reader, &mut record.publication_types)?
                }
                b"DataBankList" => extract_data_banks(reader, &mut record.data_banks)?,
                other => skip_element(reader, other)?,
            },
            // Self-closing text elements still count, with empty text
            Event::Empty(e) => match e.name().as_ref() {
                b"Language" => {
                    if record.language.is_none() {
                        record.language = Some(String::new());
                    }
                }
                b"ArticleTitle" => record.text_data.push(TextSpan {
                    text: String::new(),
                    kind: "title".to_string(),
                }),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// One span per `AbstractText`, whitespace-normalized
fn extract_abstract<R: BufRead>(
    reader: &mut Reader<R>,
    spans: &mut Vec<TextSpan>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"AbstractText" => {
                let kind = abstract_kind(&e)?;
                let raw = read_nested_text(reader, b"AbstractText")?;
                spans.push(TextSpan {
                    text: normalize_whitespace(&raw),
                    kind,
                });
            }
            Event::Empty(e) if e.name().as_ref() == b"AbstractText" => {
                spans.push(TextSpan {
                    text: String::new(),
                    kind: abstract_kind(&e)?,
                });
            }
            Event::End(e) if e.name().as_ref() == b"Abstract" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Span label for one `AbstractText` element
fn abstract_kind(e: &BytesStart) -> Result<String, ExtractError> {
    Ok(match attr_value(e, b"NlmCategory")? {
        Some(category) => format!("abstract:{}", category.to_lowercase()),
        None => "abstract:raw".to_string(),
    })
}

/// Display names, last name required
fn extract_authors<R: BufRead>(
    reader: &mut Reader<R>,
    authors: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                if let Some(name) = extract_author(reader)? {
                    authors.push(name);
                }
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Display name for one author: `<Initials>. <LastName>`, or the last name
/// alone. An author without a last name contributes nothing, even when
/// initials are present.
fn extract_author<R: BufRead>(reader: &mut Reader<R>) -> Result<Option<String>, ExtractError> {
    let mut initials = None;
    let mut last_name = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Initials" => {
                    initials = Some(read_nested_text(reader, b"Initials")?.trim().to_string());
                }
                b"LastName" => {
                    last_name = Some(read_nested_text(reader, b"LastName")?.trim().to_string());
                }
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(last_name.map(|last| match initials {
        Some(initials) => format!("{initials}. {last}"),
        None => last,
    }))
}

/// Publication type text, no normalization
fn extract_publication_types<R: BufRead>(
    reader: &mut Reader<R>,
    types: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PublicationType" => {
                types.push(read_nested_text(reader, b"PublicationType")?);
            }
            Event::Empty(e) if e.name().as_ref() == b"PublicationType" => {
                types.push(String::new());
            }
            Event::End(e) if e.name().as_ref() == b"PublicationTypeList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// One entry per accession number, all sharing the bank name
fn extract_data_banks<R: BufRead>(
    reader: &mut Reader<R>,
    banks: &mut Vec<DataBankEntry>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"DataBank" => {
                extract_data_bank(reader, banks)?;
            }
            Event::End(e) if e.name().as_ref() == b"DataBankList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// One `DataBank`: a bank with zero accession numbers emits nothing
fn extract_data_bank<R: BufRead>(
    reader: &mut Reader<R>,
    banks: &mut Vec<DataBankEntry>,
) -> Result<(), ExtractError> {
    let mut name: Option<String> = None;
    let mut ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"DataBankName" => name = Some(read_nested_text(reader, b"DataBankName")?),
                b"AccessionNumber" => ids.push(read_nested_text(reader, b"AccessionNumber")?),
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"AccessionNumber" => {
                ids.push(String::new());
            }
            Event::End(e) if e.name().as_ref() == b"DataBank" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    banks.extend(ids.into_iter().map(|id| DataBankEntry {
        name: name.clone(),
        id,
    }));
    Ok(())
}

/// UI attribute of each chemical's `NameOfSubstance`
fn extract_chemicals<R: BufRead>(
    reader: &mut Reader<R>,
    headings: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Chemical" => extract_chemical(reader, headings)?,
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"ChemicalList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// First `NameOfSubstance` among one chemical's immediate children
fn extract_chemical<R: BufRead>(
    reader: &mut Reader<R>,
    headings: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();
    let mut found = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"NameOfSubstance" => {
                    if !found {
                        found = true;
                        if let Some(ui) = attr_value(&e, b"UI")? {
                            headings.push(ui);
                        }
                    }
                    skip_element(reader, b"NameOfSubstance")?;
                }
                other => skip_element(reader, other)?,
            },
            Event::Empty(e) if e.name().as_ref() == b"NameOfSubstance" => {
                if !found {
                    found = true;
                    if let Some(ui) = attr_value(&e, b"UI")? {
                        headings.push(ui);
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"Chemical" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Reproduces the historical traversal literally: only the FIRST
/// `MeshHeading` group is examined, and a descriptor UI is taken from a
/// `DescriptorName` found one level inside each of that group's children.
/// In a schema-conforming list the group's children are themselves the
/// descriptor and qualifier elements, so this usually contributes nothing.
fn extract_mesh_descriptors<R: BufRead>(
    reader: &mut Reader<R>,
    headings: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();
    let mut seen_group = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"MeshHeading" => {
                if seen_group {
                    skip_element(reader, b"MeshHeading")?;
                } else {
                    seen_group = true;
                    first_group_descriptors(reader, headings)?;
                }
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Walk the immediate children of the first heading group
fn first_group_descriptors<R: BufRead>(
    reader: &mut Reader<R>,
    headings: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => child_descriptor(reader, headings)?,
            Event::End(e) if e.name().as_ref() == b"MeshHeading" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Scan one group child for the first `DescriptorName` among its own
/// immediate children, consuming the child subtree either way.
fn child_descriptor<R: BufRead>(
    reader: &mut Reader<R>,
    headings: &mut Vec<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    let mut found = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 1 && !found && e.name().as_ref() == b"DescriptorName" {
                    found = true;
                    if let Some(ui) = attr_value(&e, b"UI")? {
                        headings.push(ui);
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 && !found && e.name().as_ref() == b"DescriptorName" {
                    found = true;
                    if let Some(ui) = attr_value(&e, b"UI")? {
                        headings.push(ui);
                    }
                }
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// `PubmedData`: only the history dates matter
fn extract_pubmed_data<R: BufRead>(
    reader: &mut Reader<R>,
    record: &mut Record,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"History" => extract_history(reader, &mut record.date)?,
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Keeps the lexicographically smallest non-sentinel history date.
/// Lexicographic order on the fixed-width zero-padded format is
/// chronological order.
fn extract_history<R: BufRead>(
    reader: &mut Reader<R>,
    date: &mut Option<String>,
) -> Result<(), ExtractError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubMedPubDate" => {
                let candidate = read_history_date(reader)?;
                if candidate != NULL_DATE
                    && date.as_deref().map_or(true, |cur| candidate.as_str() < cur)
                {
                    *date = Some(candidate);
                }
            }
            Event::End(e) if e.name().as_ref() == b"History" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// One `PubMedPubDate` as zero-padded `YYYY-MM-DD`, missing or non-numeric
/// components defaulting to 0
fn read_history_date<R: BufRead>(reader: &mut Reader<R>) -> Result<String, ExtractError> {
    let mut year = 0u32;
    let mut month = 0u32;
    let mut day = 0u32;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => year = read_number(reader, b"Year")?,
                b"Month" => month = read_number(reader, b"Month")?,
                b"Day" => day = read_number(reader, b"Day")?,
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"PubMedPubDate" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(format!("{year:04}-{month:02}-{day:02}"))
}

fn read_number<R: BufRead>(reader: &mut Reader<R>, end_tag: &[u8]) -> Result<u32, ExtractError> {
    let text = read_nested_text(reader, end_tag)?;
    Ok(text.trim().parse().unwrap_or(0))
}

/// Concatenated descendant text of the current element, markup stripped.
/// Equivalent to joining every text node in document order, with no
/// trimming and no normalization.
fn read_nested_text<R: BufRead>(
    reader: &mut Reader<R>,
    end_tag: &[u8],
) -> Result<String, ExtractError> {
    let mut text = String::new();
    let mut depth = 1usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => {
                let chunk = e.unescape().map_err(|e| ExtractError::Xml(e.into()))?;
                text.push_str(&chunk);
            }
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Consume the rest of the current element, nested structure included
fn skip_element<R: BufRead>(reader: &mut Reader<R>, end_tag: &[u8]) -> Result<(), ExtractError> {
    let mut depth = 1usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Every Unicode whitespace character becomes one
/// ASCII space. No collapsing, no trimming; character count is preserved.
fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

/// Unescaped value of a named attribute, if present
fn attr_value(e: &BytesStart, key: &[u8]) -> Result<Option<String>, ExtractError> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| {
            a.unescape_value()
                .map(|v| v.into_owned())
                .map_err(|e| ExtractError::Xml(e.into()))
        })
        .transpose()
}
