use std::sync::OnceLock;

use regex::Regex;

use crate::error::ImportError;

/// A header recognized as holding one week's scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekColumn {
    pub number: i32,
    pub index: usize,
}

// "1ªSemana", "1ª Semana", "2a Semana", "3A Semana", "4º semana"
fn week_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+)\s*[ªºao]?\s*semana\s*$").expect("week header pattern is valid")
    })
}

/// Week number for a single header, `Ok(None)` if it is not a week column.
/// A header shaped like a week whose number does not fit is an error.
pub fn week_number(header: &str) -> Result<Option<i32>, ImportError> {
    if header.trim().eq_ignore_ascii_case("TOTAL") {
        return Ok(None);
    }
    let Some(digits) = week_header_re().captures(header).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    digits
        .as_str()
        .parse()
        .map(Some)
        .map_err(|_| ImportError::WeekNumberOutOfRange {
            header: header.to_string(),
        })
}

/// Scans every header after the first (the name column) and returns the week
/// columns in sheet order.
pub fn classify(headers: &[String]) -> Result<Vec<WeekColumn>, ImportError> {
    let mut columns = Vec::new();
    for (index, header) in headers.iter().enumerate().skip(1) {
        if let Some(number) = week_number(header)? {
            columns.push(WeekColumn { number, index });
        }
    }
    Ok(columns)
}
