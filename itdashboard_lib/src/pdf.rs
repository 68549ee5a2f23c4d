//! Key/value field extraction from business-case PDFs.
//!
//! The dashboard's generated PDFs carry a line-oriented summary block on
//! their first page, e.g. `1. Name of this Investment: Foo`. Extraction is a
//! whitelist filter: only labels present in the caller's label map make it
//! into the output, everything else is dropped silently.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SnapshotError;

/// Separator between a line's label and its value.
pub const FIELD_SEPARATOR: &str = ": ";

/// Extracts mapped fields from one page of a cached PDF artifact.
///
/// An empty `label_map` short-circuits to an empty result without opening
/// the document. An unopenable document or an out-of-range `page_index` is
/// fatal for the run.
pub fn extract_fields(
    path: &Path,
    page_index: usize,
    label_map: &BTreeMap<String, String>,
    separator: &str,
) -> Result<BTreeMap<String, String>, SnapshotError> {
    if label_map.is_empty() {
        return Ok(BTreeMap::new());
    }

    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| SnapshotError::Pdf(format!("{}: {}", path.display(), e)))?;
    let text = pages.get(page_index).ok_or_else(|| {
        SnapshotError::Pdf(format!(
            "page {} out of range ({} pages) in {}",
            page_index,
            pages.len(),
            path.display()
        ))
    })?;

    Ok(collect_fields(text, label_map, separator))
}

/// Scans page text line by line and projects `label{sep}value` pairs
/// through the label map.
///
/// A line participates only when splitting on the separator yields exactly
/// two parts; zero or multiple separators make the line ambiguous and it is
/// skipped.
fn collect_fields(
    text: &str,
    label_map: &BTreeMap<String, String>,
    separator: &str,
) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split(separator).collect();
        if parts.len() != 2 {
            continue;
        }
        if let Some(field) = label_map.get(parts[0]) {
            fields.insert(field.clone(), parts[1].to_string());
        }
    }
    fields
}
