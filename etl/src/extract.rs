use crate::columns::{ColumnMapping, SourceField};
use common::{Error, Result};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Cell tokens read as null, matching the usual CSV export conventions.
const NULL_TOKENS: [&str; 8] = ["", "NULL", "null", "NaN", "nan", "NA", "N/A", "#N/A"];

/// One row of the source extract, aligned with [`RawTable::headers`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    values: Vec<Option<String>>,
}

impl RawRecord {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|value| value.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The parsed extract plus the column mapping resolved against its headers.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    pub mapping: ColumnMapping,
    /// Hex SHA-256 of the payload the table was parsed from.
    pub digest: String,
}

impl RawTable {
    /// Parses a CSV payload whose first record is the header row.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        let mut records = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() > headers.len() {
                return Err(Error::InvalidInput(format!(
                    "Record {} has {} fields but the header declares {}",
                    line + 1,
                    record.len(),
                    headers.len()
                )));
            }

            let mut values: Vec<Option<String>> = record.iter().map(normalize_cell).collect();
            values.resize(headers.len(), None);
            records.push(RawRecord::new(values));
        }

        let mapping = ColumnMapping::resolve(&headers);
        let missing = mapping.missing(&SourceField::ALL);
        if !missing.is_empty() {
            warn!(?missing, "Source extract lacks some known columns");
        }

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        info!(
            rows = records.len(),
            columns = headers.len(),
            digest = %digest,
            "Parsed raw extract"
        );

        Ok(Self {
            headers,
            records,
            mapping,
            digest,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `field` in `record`, or `None` when the column is absent or the cell null.
    pub fn value<'a>(&self, record: &'a RawRecord, field: SourceField) -> Option<&'a str> {
        self.mapping
            .index(field)
            .and_then(|index| record.get(index))
    }
}

/// Trims, drops a BOM and collapses whitespace runs so exact alias matching
/// survives sloppy exports.
fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if NULL_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
