//! Sorting for record listings.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::error::ChantagError;
use crate::keyword_enum;
use crate::types::Record;

/// Column a listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Type,
}

keyword_enum!(SortField, ChantagError::invalid_sort_field, {
    Name => "name",
    Type => "type",
});

impl SortField {
    /// Parse a sort key, falling back to `name` for anything unknown.
    pub fn from_key(key: &str) -> Self {
        key.parse().unwrap_or_default()
    }

    fn key(self, record: &Record) -> String {
        match self {
            SortField::Name => record.name.to_lowercase(),
            SortField::Type => record.channel_type.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

keyword_enum!(SortDirection, ChantagError::invalid_sort_direction, {
    Asc => "asc",
    Desc => "desc",
});

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Stable sort on the lowercased key. Equal keys keep their input order in
/// both directions.
pub fn sort_records(records: &mut [&Record], field: SortField, direction: SortDirection) {
    match direction {
        SortDirection::Asc => records.sort_by_cached_key(|r| field.key(r)),
        SortDirection::Desc => records.sort_by_cached_key(|r| Reverse(field.key(r))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(row_id: u32, name: &str, channel_type: &str) -> Record {
        Record::new(row_id, name, channel_type, "", "")
    }

    fn rows(records: &[&Record]) -> Vec<u32> {
        records.iter().map(|r| r.row_id).collect()
    }

    #[test]
    fn test_parse_and_fallback() {
        assert_eq!("TYPE".parse::<SortField>().unwrap(), SortField::Type);
        assert!("members".parse::<SortField>().is_err());
        assert_eq!(SortField::from_key("members"), SortField::Name);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(SortDirection::Asc.flipped(), SortDirection::Desc);
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let a = rec(2, "beta", "");
        let b = rec(3, "Alpha", "");
        let c = rec(4, "gamma", "");
        let mut list = vec![&a, &b, &c];

        sort_records(&mut list, SortField::Name, SortDirection::Asc);
        assert_eq!(rows(&list), vec![3, 2, 4]);

        sort_records(&mut list, SortField::Name, SortDirection::Desc);
        assert_eq!(rows(&list), vec![4, 2, 3]);
    }

    #[test]
    fn test_equal_names_keep_input_order() {
        let a = rec(2, "dup", "");
        let b = rec(3, "Dup", "");
        let c = rec(4, "aaa", "");

        let mut asc = vec![&a, &b, &c];
        sort_records(&mut asc, SortField::Name, SortDirection::Asc);
        assert_eq!(rows(&asc), vec![4, 2, 3]);

        let mut desc = vec![&a, &b, &c];
        sort_records(&mut desc, SortField::Name, SortDirection::Desc);
        assert_eq!(rows(&desc), vec![2, 3, 4]);
    }

    #[test]
    fn test_sort_by_type() {
        let a = rec(2, "x", "private");
        let b = rec(3, "y", "");
        let mut list = vec![&a, &b];
        sort_records(&mut list, SortField::Type, SortDirection::Asc);
        assert_eq!(rows(&list), vec![2, 3]);
    }
}
