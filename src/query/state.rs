//! Listing criteria as the user adjusts them.

use serde::{Deserialize, Serialize};

use super::sort::{SortDirection, SortField};
use crate::types::find_tag;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Search, filters, sort and page window for one listing.
///
/// The setters keep "untagged only" and tag filters mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: String,
    pub tag_filters: Vec<String>,
    pub untagged_only: bool,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            tag_filters: Vec::new(),
            untagged_only: false,
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Store the search query lowercased and trimmed, back on page 1.
    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
        self.page = 1;
    }

    /// Same key flips direction; a new key sorts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn toggle_untagged(&mut self) {
        self.untagged_only = !self.untagged_only;
        self.tag_filters.clear();
        self.page = 1;
    }

    pub fn apply_tag_filters(&mut self, tags: Vec<String>) {
        self.tag_filters = tags;
        self.untagged_only = false;
        self.page = 1;
    }

    /// Drop one tag filter, matched case-insensitively.
    pub fn remove_tag_filter(&mut self, tag: &str) {
        if let Some(index) = find_tag(&self.tag_filters, tag) {
            self.tag_filters.remove(index);
            self.page = 1;
        }
    }

    /// Clear search and filters. Sort and page size are kept.
    pub fn clear_all(&mut self) {
        self.search.clear();
        self.tag_filters.clear();
        self.untagged_only = false;
        self.page = 1;
    }

    /// Move to `page`, clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn has_filters(&self) -> bool {
        !self.search.is_empty() || !self.tag_filters.is_empty() || self.untagged_only
    }
}
