//! Filtering, sorting and paging of records.
//!
//! A [`RecordQuery`] is an ordered list of [`RecordFilter`] stages followed by
//! a stable sort and a page slice. Every stage reads *effective* tags, so
//! staged edits are visible before they are saved.

pub mod pages;
pub mod sort;
pub mod state;

use serde::Serialize;

use crate::pending::PendingEdits;
use crate::types::{Record, tag_eq};

pub use pages::{DEFAULT_MAX_VISIBLE, PageItem, page_numbers};
pub use sort::{SortDirection, SortField, sort_records};
pub use state::{DEFAULT_PAGE_SIZE, FilterState};

/// One filtering stage.
pub trait RecordFilter: Send + Sync {
    fn matches(&self, record: &Record, pending: &PendingEdits) -> bool;
}

/// Name or any effective tag contains the query, case-insensitively.
pub struct SearchFilter {
    query: String,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.trim().to_lowercase(),
        }
    }
}

impl RecordFilter for SearchFilter {
    fn matches(&self, record: &Record, pending: &PendingEdits) -> bool {
        record.name.to_lowercase().contains(&self.query)
            || pending
                .effective_tags(record)
                .iter()
                .any(|t| t.to_lowercase().contains(&self.query))
    }
}

/// Effective tags share at least one tag with the filter set.
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }
}

impl RecordFilter for TagFilter {
    fn matches(&self, record: &Record, pending: &PendingEdits) -> bool {
        let effective = pending.effective_tags(record);
        self.tags
            .iter()
            .any(|f| effective.iter().any(|t| tag_eq(t, f)))
    }
}

/// No effective tags.
pub struct UntaggedFilter;

impl RecordFilter for UntaggedFilter {
    fn matches(&self, record: &Record, pending: &PendingEdits) -> bool {
        pending.effective_tags(record).is_empty()
    }
}

/// A configured pipeline, ready to apply.
pub struct RecordQuery {
    filters: Vec<Box<dyn RecordFilter>>,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl RecordQuery {
    /// Run every stage in order and cut out the requested page.
    ///
    /// Page 0 is read as page 1. A page past the end yields an empty slice
    /// with `start == end == 0`.
    pub fn apply<'a>(&self, records: &'a [Record], pending: &PendingEdits) -> RecordView<'a> {
        let mut filtered: Vec<&Record> = records.iter().collect();
        for filter in &self.filters {
            filtered.retain(|r| filter.matches(r, pending));
        }
        sort_records(&mut filtered, self.sort_field, self.sort_direction);

        let total = filtered.len();
        let page_size = self.page_size.max(1);
        let page = self.page.max(1);
        let total_pages = total.div_ceil(page_size);

        let offset = (page - 1).saturating_mul(page_size);
        let (start, end) = if offset < total {
            (offset + 1, (offset + page_size).min(total))
        } else {
            (0, 0)
        };
        let slice = if start == 0 {
            Vec::new()
        } else {
            filtered[start - 1..end].to_vec()
        };

        RecordView {
            filtered,
            page: slice,
            total,
            start,
            end,
            page_number: page,
            page_size,
            total_pages,
        }
    }
}

pub struct RecordQueryBuilder {
    filters: Vec<Box<dyn RecordFilter>>,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl RecordQueryBuilder {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Append a stage. Stages run in the order added.
    pub fn with_filter(mut self, filter: Box<dyn RecordFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn build(self) -> RecordQuery {
        RecordQuery {
            filters: self.filters,
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl Default for RecordQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Search, then tags, then untagged-only. Empty criteria add no stage.
    ///
    /// Tag filters take precedence: while any are set the untagged-only
    /// stage is skipped.
    pub fn to_query(&self) -> RecordQuery {
        let mut builder = RecordQueryBuilder::new()
            .with_sort(self.sort_field, self.sort_direction)
            .with_page(self.page, self.page_size);

        if !self.search.trim().is_empty() {
            builder = builder.with_filter(Box::new(SearchFilter::new(&self.search)));
        }
        if !self.tag_filters.is_empty() {
            builder = builder.with_filter(Box::new(TagFilter::new(self.tag_filters.clone())));
        } else if self.untagged_only {
            builder = builder.with_filter(Box::new(UntaggedFilter));
        }
        builder.build()
    }
}

/// Result of a query: the full filtered list and the current page of it.
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    pub filtered: Vec<&'a Record>,
    pub page: Vec<&'a Record>,
    pub total: usize,
    /// 1-indexed position of the first row on the page, 0 when empty.
    pub start: usize,
    pub end: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl RecordView<'_> {
    pub fn has_prev(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn page_numbers(&self) -> Vec<PageItem> {
        page_numbers(self.page_number, self.total_pages, DEFAULT_MAX_VISIBLE)
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            total: self.total,
            start: self.start,
            end: self.end,
            page: self.page_number,
            total_pages: self.total_pages,
        }
    }
}

/// Page counters without the records, for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub total: usize,
    pub start: usize,
    pub end: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Apply `state` to `records` with `pending` edits visible.
pub fn compute_view<'a>(records: &'a [Record], pending: &PendingEdits, state: &FilterState) -> RecordView<'a> {
    state.to_query().apply(records, pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(row_id: u32, name: &str, tags: &str) -> Record {
        Record::new(row_id, name, "", "", tags)
    }

    fn rows(records: &[&Record]) -> Vec<u32> {
        records.iter().map(|r| r.row_id).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            rec(2, "general", ""),
            rec(3, "random", "eng"),
            rec(4, "eng-backend", "Eng, ops"),
            rec(5, "sales-west", "sales"),
        ]
    }

    #[test]
    fn test_no_criteria_returns_everything_sorted() {
        let records = sample();
        let view = compute_view(&records, &PendingEdits::new(), &FilterState::default());
        assert_eq!(rows(&view.filtered), vec![4, 2, 3, 5]);
        assert_eq!((view.start, view.end, view.total), (1, 4, 4));
    }

    #[test]
    fn test_search_matches_name_or_effective_tag() {
        let records = sample();
        let mut state = FilterState::default();
        state.set_search(" ENG ");

        let view = compute_view(&records, &PendingEdits::new(), &state);
        assert_eq!(rows(&view.filtered), vec![4, 3]);

        let mut pending = PendingEdits::new();
        pending.stage(3, vec![]);
        pending.stage(5, vec!["engineering".to_string()]);
        let view = compute_view(&records, &pending, &state);
        assert_eq!(rows(&view.filtered), vec![4, 5]);
    }

    #[test]
    fn test_tag_filter_uses_effective_tags() {
        let records = vec![rec(2, "general", ""), rec(3, "random", "eng")];
        let mut pending = PendingEdits::new();
        pending.toggle(&records[0], "eng");

        let mut state = FilterState::default();
        state.apply_tag_filters(vec!["ENG".to_string()]);

        let view = compute_view(&records, &pending, &state);
        assert_eq!(rows(&view.filtered), vec![2, 3]);
    }

    #[test]
    fn test_untagged_only() {
        let records = sample();
        let mut state = FilterState::default();
        state.toggle_untagged();
        let view = compute_view(&records, &PendingEdits::new(), &state);
        assert_eq!(rows(&view.filtered), vec![2]);
    }

    #[test]
    fn test_tag_filter_takes_precedence_over_untagged() {
        let records = sample();
        let mut state = FilterState::default();
        state.tag_filters = vec!["sales".to_string()];
        state.untagged_only = true;

        let view = compute_view(&records, &PendingEdits::new(), &state);
        assert_eq!(rows(&view.filtered), vec![5]);
    }

    #[test]
    fn test_stages_only_narrow() {
        let records = sample();
        let pending = PendingEdits::new();
        let all = compute_view(&records, &pending, &FilterState::default()).total;

        let mut state = FilterState::default();
        state.set_search("e");
        let searched = compute_view(&records, &pending, &state).total;
        state.apply_tag_filters(vec!["ops".to_string()]);
        let tagged = compute_view(&records, &pending, &state).total;

        assert!(searched <= all);
        assert!(tagged <= searched);
    }

    #[test]
    fn test_page_bounds() {
        let records: Vec<Record> = (0..7).map(|i| rec(i + 2, &format!("c{i}"), "")).collect();
        let pending = PendingEdits::new();
        let mut state = FilterState::with_page_size(3);

        state.page = 3;
        let view = compute_view(&records, &pending, &state);
        assert_eq!((view.start, view.end), (7, 7));
        assert_eq!(view.page.len(), 1);
        assert_eq!(view.total_pages, 3);
        assert!(view.has_prev());
        assert!(!view.has_next());

        state.page = 4;
        let view = compute_view(&records, &pending, &state);
        assert!(view.page.is_empty());
        assert_eq!((view.start, view.end), (0, 0));

        state.page = 0;
        let view = compute_view(&records, &pending, &state);
        assert_eq!(view.page_number, 1);
        assert_eq!((view.start, view.end), (1, 3));
    }

    #[test]
    fn test_empty_result_bounds() {
        let view = compute_view(&[], &PendingEdits::new(), &FilterState::default());
        assert_eq!((view.total, view.start, view.end, view.total_pages), (0, 0, 0, 0));
        assert!(view.page_numbers().is_empty());
    }

    #[test]
    fn test_identical_names_keep_row_order() {
        let records = vec![rec(2, "dup", ""), rec(3, "dup", ""), rec(4, "abc", "")];
        let view = compute_view(&records, &PendingEdits::new(), &FilterState::default());
        assert_eq!(rows(&view.filtered), vec![4, 2, 3]);
    }
}
