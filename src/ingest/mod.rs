//! CSV zone-export ingestion.
//!
//! Reads a DNS zone export into normalized row tuples. The format is loose
//! by design: the delimiter is sniffed (`,` or `;`), the header may use any
//! of several column-name synonyms, `#` comment lines and blank lines are
//! skipped, and the TTL/View columns are optional. Rows that lack a name,
//! type, or value after normalization are silently dropped; only a missing
//! or unusable header is an error.

use log::warn;

use crate::error_handling::IngestError;

/// One normalized input row.
///
/// `name` and `value` are lowercased with any trailing dot stripped; `rtype`
/// is uppercased. `ttl` and `view` are `None` when the corresponding column
/// is absent from the header; the store applies the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub ttl: Option<String>,
    pub name: String,
    pub rtype: String,
    pub value: String,
    pub view: Option<String>,
}

/// Result of parsing one input file.
#[derive(Debug, Clone)]
pub struct ParsedInput {
    pub rows: Vec<RawRow>,
    /// Whether the header carried a TTL column.
    pub has_ttl: bool,
    /// Whether the header carried a View column.
    pub has_view: bool,
}

/// Column indices resolved from the header line.
struct ColumnMap {
    ttl: Option<usize>,
    name: usize,
    rtype: usize,
    value: usize,
    view: Option<usize>,
}

const NAME_SYNONYMS: &[&str] = &[
    "name",
    "rrname",
    "rr_name",
    "rr name",
    "rr name (ascii)",
    "hostname",
    "fqdn",
];
const TYPE_SYNONYMS: &[&str] = &["type", "record_type", "rrtype", "rr_type"];
const VALUE_SYNONYMS: &[&str] = &["value", "data", "rdata", "target", "rrvalue", "rr_value"];
const TTL_SYNONYMS: &[&str] = &["ttl", "rrttl", "rr_ttl"];
const VIEW_SYNONYMS: &[&str] = &["view", "vues", "views"];

/// Sniffs the field delimiter from the first non-comment, non-blank line.
///
/// Semicolons win when they outnumber commas; the tie goes to the comma.
fn detect_delimiter(content: &str) -> u8 {
    let first_line = content
        .lines()
        .find(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .unwrap_or("");
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn find_column(header: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|syn| header.iter().position(|col| col == syn))
}

fn resolve_columns(header: &[String]) -> Result<ColumnMap, IngestError> {
    let name = find_column(header, NAME_SYNONYMS);
    let rtype = find_column(header, TYPE_SYNONYMS);
    let value = find_column(header, VALUE_SYNONYMS);

    match (name, rtype, value) {
        (Some(name), Some(rtype), Some(value)) => Ok(ColumnMap {
            ttl: find_column(header, TTL_SYNONYMS),
            name,
            rtype,
            value,
            view: find_column(header, VIEW_SYNONYMS),
        }),
        _ => Err(IngestError::MissingColumns {
            found: header.join(", "),
        }),
    }
}

/// Lowercases, trims, and strips one trailing dot from an owner name or
/// record value.
fn normalize_name(raw: &str) -> String {
    let trimmed = raw.to_lowercase();
    let trimmed = trimmed.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Parses a zone export into normalized rows.
///
/// # Errors
///
/// Returns [`IngestError::NoHeader`] when the file holds nothing but
/// comments and blank lines, [`IngestError::MissingColumns`] when the
/// header lacks a Name, Type, or Value column, and [`IngestError::Csv`] on
/// malformed CSV framing.
pub fn parse_zone_csv(content: &str) -> Result<ParsedInput, IngestError> {
    let delimiter = detect_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    // The csv reader drops `#` comments and fully empty lines, but not
    // whitespace-only lines or comments indented with whitespace.
    fn is_skippable(record: &csv::StringRecord) -> bool {
        let first_nonempty = record.iter().find(|f| !f.trim().is_empty());
        match first_nonempty {
            Some(field) => field.trim_start().starts_with('#'),
            None => true,
        }
    }

    // The first surviving record is the header.
    let header: Vec<String> = loop {
        match records.next() {
            Some(record) => {
                let record = record?;
                if is_skippable(&record) {
                    continue;
                }
                break record.iter().map(|col| col.trim().to_lowercase()).collect();
            }
            None => return Err(IngestError::NoHeader),
        }
    };

    let columns = resolve_columns(&header)?;
    if columns.ttl.is_none() {
        warn!("TTL column not found, defaulting to 3600 for every record");
    }
    if columns.view.is_none() {
        warn!("View column not found, all records will be tagged \"default\"");
    }

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if is_skippable(&record) {
            continue;
        }

        let name = match record.get(columns.name) {
            Some(field) => normalize_name(field),
            None => continue,
        };
        let rtype = match record.get(columns.rtype) {
            Some(field) => field.trim().to_uppercase(),
            None => continue,
        };
        let value = match record.get(columns.value) {
            Some(field) => normalize_name(field),
            None => continue,
        };

        // Best-effort ingestion: rows with an empty required field are
        // dropped, not reported.
        if name.is_empty() || rtype.is_empty() || value.is_empty() {
            continue;
        }

        let ttl = columns
            .ttl
            .and_then(|i| record.get(i))
            .map(|f| f.trim().to_string());
        let view = columns
            .view
            .and_then(|i| record.get(i))
            .map(|f| f.trim().to_string());

        rows.push(RawRow {
            ttl,
            name,
            rtype,
            value,
            view,
        });
    }

    Ok(ParsedInput {
        rows,
        has_ttl: columns.ttl.is_some(),
        has_view: columns.view.is_some(),
    })
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
