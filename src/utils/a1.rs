//! A1 notation helpers.
//!
//! Rows and columns are 1-based here, matching the spreadsheet UI. The grid
//! ranges handed to the Sheets batchUpdate API are 0-based and half-open.

use crate::utils::error::{Result, VoteCheckError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)([0-9]+)$").expect("A1 cell pattern"));

/// 1 -> "A", 26 -> "Z", 27 -> "AA"
pub fn column_label(col: u32) -> String {
    let mut n = col;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

pub fn column_index(label: &str) -> Option<u32> {
    if label.is_empty() || !label.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    label
        .bytes()
        .try_fold(0u32, |acc, b| acc.checked_mul(26)?.checked_add((b - b'A' + 1) as u32))
}

pub fn cell_label(row: u32, col: u32) -> String {
    format!("{}{}", column_label(col), row)
}

/// 整列範圍，例如 `A3:K3`
pub fn row_span(row: u32, first_col: &str, last_col: &str) -> String {
    format!("{first_col}{row}:{last_col}{row}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}

fn parse_cell(cell: &str) -> Option<(u32, u32)> {
    let caps = CELL_RE.captures(cell)?;
    let col = column_index(&caps[1])?;
    let row: u32 = caps[2].parse().ok()?;
    (row > 0).then_some((row, col))
}

/// Converts `A3:K3` (or a single cell such as `B2`) into a grid range on `sheet_id`.
pub fn parse_range(range: &str, sheet_id: i64) -> Result<GridRange> {
    let invalid = || VoteCheckError::InvalidRange {
        range: range.to_string(),
    };

    let (start, end) = match range.split_once(':') {
        Some((a, b)) => (a, b),
        None => (range, range),
    };
    let (start_row, start_col) = parse_cell(start).ok_or_else(invalid)?;
    let (end_row, end_col) = parse_cell(end).ok_or_else(invalid)?;

    if end_row < start_row || end_col < start_col {
        return Err(invalid());
    }

    Ok(GridRange {
        sheet_id,
        start_row_index: start_row - 1,
        end_row_index: end_row,
        start_column_index: start_col - 1,
        end_column_index: end_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_labels() {
        assert_eq!(column_label(1), "A");
        assert_eq!(column_label(2), "B");
        assert_eq!(column_label(11), "K");
        assert_eq!(column_label(26), "Z");
        assert_eq!(column_label(27), "AA");
        assert_eq!(column_label(703), "AAA");

        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("K"), Some(11));
        assert_eq!(column_index("AA"), Some(27));
        assert_eq!(column_index("a"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn test_cell_label() {
        assert_eq!(cell_label(2, 2), "B2");
        assert_eq!(cell_label(10, 28), "AB10");
    }

    #[test]
    fn test_row_span() {
        assert_eq!(row_span(3, "A", "K"), "A3:K3");
    }

    #[test]
    fn test_parse_row_range() {
        let grid = parse_range("A3:K3", 42).unwrap();
        assert_eq!(
            grid,
            GridRange {
                sheet_id: 42,
                start_row_index: 2,
                end_row_index: 3,
                start_column_index: 0,
                end_column_index: 11,
            }
        );
    }

    #[test]
    fn test_parse_single_cell() {
        let grid = parse_range("B2", 0).unwrap();
        assert_eq!(grid.start_row_index, 1);
        assert_eq!(grid.end_row_index, 2);
        assert_eq!(grid.start_column_index, 1);
        assert_eq!(grid.end_column_index, 2);
    }

    #[test]
    fn test_parse_invalid_ranges() {
        assert!(parse_range("", 0).is_err());
        assert!(parse_range("A0:K0", 0).is_err());
        assert!(parse_range("K3:A3", 0).is_err());
        assert!(parse_range("3A:K3", 0).is_err());
    }

    #[test]
    fn test_grid_range_serializes_camel_case() {
        let grid = parse_range("A3:K3", 7).unwrap();
        let json = serde_json::to_value(grid).unwrap();
        assert_eq!(json["sheetId"], 7);
        assert_eq!(json["startRowIndex"], 2);
        assert_eq!(json["endColumnIndex"], 11);
    }
}
