use std::str::FromStr;

use rust_decimal::Decimal;

/// A spreadsheet cell as typed by the sheet reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Types a raw field the way spreadsheet tools do: integers, then floats,
    /// then text. Blank fields are empty.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Integer(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return Cell::Float(value);
        }
        Cell::Text(raw.to_string())
    }
}

const MISSING_MARKERS: [&str; 3] = ["nan", "none", "-"];

/// Reads a score out of a cell. Accepts both `1,5` and `1.5`; returns `None`
/// for blanks, NaN, `-`, `none` and anything that is not a number.
pub fn parse_decimal(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Empty => None,
        Cell::Integer(value) => Some(Decimal::from(*value)),
        Cell::Float(value) if value.is_nan() => None,
        Cell::Float(value) => decimal_from_text(&value.to_string().replace(',', ".")),
        Cell::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || is_missing_marker(trimmed) {
                return None;
            }
            decimal_from_text(&trimmed.replace(',', "."))
        }
    }
}

fn is_missing_marker(text: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| text.eq_ignore_ascii_case(marker))
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
