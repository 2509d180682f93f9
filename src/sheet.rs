//! Reads the raw bytes of a spreadsheet into a header row and data rows.
//! Excel workbooks (.xlsx, .xls) are read from their first worksheet;
//! anything else is treated as a delimited-text export.

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::cell::Cell;
use crate::error::ImportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

// Tokens spreadsheet tools read as "not available" in a text cell.
const NA_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "NAN",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn parse(bytes: &[u8]) -> Result<Self, ImportError> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            Self::parse_workbook(bytes)
        } else {
            Self::parse_delimited(bytes)
        }
    }

    fn parse_workbook(bytes: &[u8]) -> Result<Self, ImportError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::Unreadable {
                reason: "the workbook has no worksheets".to_string(),
            })??;
        debug!(size = ?range.get_size(), "worksheet read");

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(header_text).collect(),
            None => return Err(no_header_row()),
        };
        let rows = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        Ok(Sheet { headers, rows })
    }

    fn parse_delimited(bytes: &[u8]) -> Result<Self, ImportError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = decode(bytes);
        let delimiter = sniff_delimiter(&text);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(no_header_row()),
        };

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            let row = record
                .iter()
                .enumerate()
                .map(|(column, raw)| match column {
                    // names keep their literal text ("007" stays "007")
                    0 if raw.trim().is_empty() => Cell::Empty,
                    0 => Cell::Text(raw.to_string()),
                    _ => Cell::infer(raw),
                })
                .collect();
            rows.push(row);
        }

        Ok(Sheet { headers, rows })
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Trimmed child name of a row, or `None` when the row has no usable name.
    pub fn name(&self, row: usize) -> Option<String> {
        let name = match self.rows.get(row)?.first()? {
            Cell::Empty => return None,
            Cell::Float(value) if value.is_nan() => return None,
            Cell::Integer(value) => value.to_string(),
            Cell::Float(value) => value.to_string(),
            Cell::Text(text) => text.trim().to_string(),
        };
        if name.is_empty() || NA_TOKENS.contains(&name.as_str()) {
            None
        } else {
            Some(name)
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .cloned()
            .unwrap_or(Cell::Empty)
    }
}

fn no_header_row() -> ImportError {
    ImportError::Unreadable {
        reason: "the file has no header row".to_string(),
    }
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(value) => Cell::Integer(*value),
        Data::Float(value) => Cell::Float(*value),
        Data::String(text) if text.trim().is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        other => Cell::Text(other.to_string()),
    }
}

// Legacy exports are often Latin-1; every byte maps to the same code point.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = (b',', header.matches(',').count());
    for candidate in [b';', b'\t'] {
        let count = header.matches(char::from(candidate)).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
