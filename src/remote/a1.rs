//! A1 notation: column letters, cell references and ranges.

use std::fmt;
use std::str::FromStr;

use crate::error::{ChantagError, Result};
use crate::types::RowId;

/// A zero-based column position, displayed as spreadsheet letters (`A`, `Z`, `AA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ColumnRef(pub usize);

impl ColumnRef {
    /// Column `D`, where tags live when the header does not say otherwise.
    pub const DEFAULT_TAGS: ColumnRef = ColumnRef(3);

    pub fn index(self) -> usize {
        self.0
    }

    pub fn letters(self) -> String {
        let mut n = self.0 + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Parse column letters, case-insensitively.
    pub fn from_letters(letters: &str) -> Option<Self> {
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let mut n: usize = 0;
        for c in letters.chars() {
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            n = n.checked_mul(26)?.checked_add(digit)?;
        }
        Some(ColumnRef(n - 1))
    }

    /// `D7`-style reference to this column on `row`.
    pub fn cell(self, row: RowId) -> String {
        format!("{}{}", self.letters(), row)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letters())
    }
}

/// One end of a range: a column with an optional row (`B`, `B2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAnchor {
    pub column: ColumnRef,
    pub row: Option<RowId>,
}

impl FromStr for CellAnchor {
    type Err = ChantagError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);
        let column =
            ColumnRef::from_letters(letters).ok_or_else(|| ChantagError::InvalidCellRef(s.to_string()))?;
        let row = if digits.is_empty() {
            None
        } else {
            let row: RowId = digits
                .parse()
                .map_err(|_| ChantagError::InvalidCellRef(s.to_string()))?;
            if row == 0 {
                return Err(ChantagError::InvalidCellRef(s.to_string()));
            }
            Some(row)
        };
        Ok(CellAnchor { column, row })
    }
}

/// A rectangular range such as `A1:Z1`, `A2:Z`, `B:B` or `D5`.
///
/// A missing start row means row 1; a missing end row means "to the last row".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellAnchor,
    pub end: CellAnchor,
}

impl CellRange {
    pub fn first_row(&self) -> RowId {
        self.start.row.unwrap_or(1)
    }

    pub fn last_row(&self) -> Option<RowId> {
        self.end.row
    }

    pub fn columns(&self) -> std::ops::RangeInclusive<usize> {
        self.start.column.index()..=self.end.column.index()
    }
}

impl FromStr for CellRange {
    type Err = ChantagError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = match s.split_once(':') {
            Some((a, b)) => (a.parse::<CellAnchor>()?, b.parse::<CellAnchor>()?),
            None => {
                let anchor: CellAnchor = s.parse()?;
                (anchor, anchor)
            }
        };
        if end.column < start.column {
            return Err(ChantagError::InvalidCellRef(s.to_string()));
        }
        if let (Some(a), Some(b)) = (start.row, end.row)
            && b < a
        {
            return Err(ChantagError::InvalidCellRef(s.to_string()));
        }
        Ok(CellRange { start, end })
    }
}

/// Prefix a range with its sheet, quoting the sheet name when needed.
pub fn qualified_range(sheet: &str, range: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{sheet}!{range}")
    } else {
        format!("'{}'!{range}", sheet.replace('\'', "''"))
    }
}

/// Split `Sheet!A1:B2` into the unquoted sheet name and the range.
pub fn split_qualified(range: &str) -> Option<(String, &str)> {
    let (sheet, cells) = range.rsplit_once('!')?;
    let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };
    Some((sheet, cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(ColumnRef(0).letters(), "A");
        assert_eq!(ColumnRef(3).letters(), "D");
        assert_eq!(ColumnRef(25).letters(), "Z");
        assert_eq!(ColumnRef(26).letters(), "AA");
        assert_eq!(ColumnRef(701).letters(), "ZZ");
        assert_eq!(ColumnRef(702).letters(), "AAA");
    }

    #[test]
    fn test_column_from_letters() {
        assert_eq!(ColumnRef::from_letters("A"), Some(ColumnRef(0)));
        assert_eq!(ColumnRef::from_letters("d"), Some(ColumnRef(3)));
        assert_eq!(ColumnRef::from_letters("AA"), Some(ColumnRef(26)));
        assert_eq!(ColumnRef::from_letters(""), None);
        assert_eq!(ColumnRef::from_letters("A1"), None);
    }

    #[test]
    fn test_cell() {
        assert_eq!(ColumnRef::DEFAULT_TAGS.cell(7), "D7");
    }

    #[test]
    fn test_parse_ranges() {
        let header: CellRange = "A1:Z1".parse().unwrap();
        assert_eq!(header.first_row(), 1);
        assert_eq!(header.last_row(), Some(1));
        assert_eq!(header.columns(), 0..=25);

        let open: CellRange = "A2:Z".parse().unwrap();
        assert_eq!(open.first_row(), 2);
        assert_eq!(open.last_row(), None);

        let column: CellRange = "B:B".parse().unwrap();
        assert_eq!(column.first_row(), 1);
        assert_eq!(column.columns(), 1..=1);

        let single: CellRange = "D5".parse().unwrap();
        assert_eq!(single.first_row(), 5);
        assert_eq!(single.last_row(), Some(5));
    }

    #[test]
    fn test_parse_rejects_bad_ranges() {
        assert!("".parse::<CellRange>().is_err());
        assert!("5".parse::<CellRange>().is_err());
        assert!("A0".parse::<CellRange>().is_err());
        assert!("C1:A1".parse::<CellRange>().is_err());
        assert!("A5:A2".parse::<CellRange>().is_err());
    }

    #[test]
    fn test_qualified_range_round_trip() {
        assert_eq!(qualified_range("Channels", "D5"), "Channels!D5");
        assert_eq!(qualified_range("My Tags", "A1"), "'My Tags'!A1");

        let (sheet, cells) = split_qualified("'Bob''s Sheet'!A1:B2").unwrap();
        assert_eq!(sheet, "Bob's Sheet");
        assert_eq!(cells, "A1:B2");
        assert!(split_qualified("A1").is_none());
    }
}
