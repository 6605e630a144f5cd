//! Core data types shared across the crate.

use serde::{Deserialize, Serialize};

/// Physical, 1-indexed spreadsheet row. Row 1 holds headers, so data rows start at 2.
pub type RowId = u32;

/// First physical row that holds data.
pub const FIRST_DATA_ROW: RowId = 2;

/// Channel type used when the sheet leaves the cell empty.
pub const DEFAULT_CHANNEL_TYPE: &str = "public";

/// A taggable channel record as loaded from the main sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub row_id: RowId,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    /// Opaque comma-joined member list.
    pub members: String,
    pub tags: Vec<String>,
    /// The serialization actually persisted in the tags cell.
    pub tag_raw: String,
}

impl Record {
    /// Build a record from raw cell text. An empty type becomes `public`.
    pub fn new(
        row_id: RowId,
        name: impl Into<String>,
        channel_type: impl Into<String>,
        members: impl Into<String>,
        tag_raw: impl Into<String>,
    ) -> Self {
        let channel_type = channel_type.into();
        let tag_raw = tag_raw.into();
        Self {
            row_id,
            name: name.into(),
            channel_type: if channel_type.is_empty() {
                DEFAULT_CHANNEL_TYPE.to_string()
            } else {
                channel_type
            },
            members: members.into(),
            tags: parse_tags(&tag_raw),
            tag_raw,
        }
    }

    /// Replace the tag list, keeping `tag_raw` in step.
    ///
    /// `tags` always equals `parse_tags(&tag_raw)` afterwards, so blank
    /// entries are dropped and comma-joined ones split.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = normalize_tags(&tags);
        self.tag_raw = join_tags(&self.tags);
    }

    /// Members split out of the comma-joined cell.
    pub fn member_list(&self) -> Vec<&str> {
        self.members
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect()
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A complete replacement tag list for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChange {
    pub row_id: RowId,
    pub tags: Vec<String>,
}

/// Split a comma-joined tag cell into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags with `", "`, the form written back to the sheet.
pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The list as it reads back from the sheet once written.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    parse_tags(&join_tags(tags))
}

/// `tag` trimmed, if it can be stored as a single tag.
pub fn normalize_tag(tag: &str) -> Option<&str> {
    let tag = tag.trim();
    (!tag.is_empty() && !tag.contains(',')).then_some(tag)
}

/// Case-insensitive tag comparison.
pub fn tag_eq(a: &str, b: &str) -> bool {
    unicase::eq(a, b)
}

/// Index of the first case-insensitive match of `tag` in `tags`.
pub fn find_tag<S: AsRef<str>>(tags: &[S], tag: &str) -> Option<usize> {
    tags.iter().position(|t| tag_eq(t.as_ref(), tag))
}

pub fn has_tag<S: AsRef<str>>(tags: &[S], tag: &str) -> bool {
    find_tag(tags, tag).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_drops_empty() {
        assert_eq!(parse_tags(" eng ,, ops,"), vec!["eng", "ops"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_join_tags() {
        assert_eq!(join_tags(&["eng", "ops"]), "eng, ops");
        assert_eq!(join_tags::<String>(&[]), "");
    }

    #[test]
    fn test_parse_join_round_trip() {
        let tags = vec!["Eng".to_string(), "ops".to_string(), "x y".to_string()];
        assert_eq!(parse_tags(&join_tags(&tags)), tags);
    }

    #[test]
    fn test_record_defaults_type_to_public() {
        let record = Record::new(2, "general", "", "", "");
        assert_eq!(record.channel_type, "public");
        assert!(record.is_untagged());
    }

    #[test]
    fn test_record_keeps_raw_tag_text() {
        let record = Record::new(3, "random", "private", "", "eng,ops");
        assert_eq!(record.tags, vec!["eng", "ops"]);
        assert_eq!(record.tag_raw, "eng,ops");
    }

    #[test]
    fn test_set_tags_recomputes_raw() {
        let mut record = Record::new(2, "general", "public", "", "eng");
        record.set_tags(vec!["eng".to_string(), "ops".to_string()]);
        assert_eq!(record.tag_raw, "eng, ops");
        record.set_tags(vec![]);
        assert_eq!(record.tag_raw, "");
    }

    #[test]
    fn test_set_tags_keeps_parse_invariant() {
        let mut record = Record::new(2, "general", "public", "", "");
        record.set_tags(vec!["a,b".to_string(), "  ".to_string(), " ops ".to_string()]);
        assert_eq!(record.tags, vec!["a", "b", "ops"]);
        assert_eq!(record.tag_raw, "a, b, ops");
        assert_eq!(parse_tags(&record.tag_raw), record.tags);

        record.set_tags(vec!["  ".to_string()]);
        assert!(record.tags.is_empty());
        assert_eq!(record.tag_raw, "");
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  eng "), Some("eng"));
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag("a,b"), None);
    }

    #[test]
    fn test_member_list() {
        let record = Record::new(2, "general", "", "ana, bo,, cy ", "");
        assert_eq!(record.member_list(), vec!["ana", "bo", "cy"]);
    }

    #[test]
    fn test_find_tag_is_case_insensitive_first_match() {
        let tags = ["Eng", "ops", "ENG"];
        assert_eq!(find_tag(&tags, "eng"), Some(0));
        assert_eq!(find_tag(&tags, "OPS"), Some(1));
        assert_eq!(find_tag(&tags, "sales"), None);
    }
}
