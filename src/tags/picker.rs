//! Ordering for tag pickers.

use crate::types::has_tag;

fn matches_query(tag: &str, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || tag.to_lowercase().contains(&query)
}

/// Candidates for one row's tag picker.
///
/// Tags already on the row come first, then the rest by descending usage.
/// Ties keep catalog order.
pub fn picker_order<'a, S: AsRef<str>>(
    catalog: &'a [String],
    current: &[S],
    query: &str,
    usage: impl Fn(&str) -> usize,
) -> Vec<&'a str> {
    let mut tags: Vec<&str> = catalog
        .iter()
        .map(String::as_str)
        .filter(|t| matches_query(t, query))
        .collect();
    tags.sort_by_key(|t| (!has_tag(current, t), std::cmp::Reverse(usage(t))));
    tags
}

/// Tags for the filter list, most used first. Ties keep catalog order.
pub fn filter_list_order<'a>(
    catalog: &'a [String],
    query: &str,
    usage: impl Fn(&str) -> usize,
) -> Vec<&'a str> {
    let mut tags: Vec<&str> = catalog
        .iter()
        .map(String::as_str)
        .filter(|t| matches_query(t, query))
        .collect();
    tags.sort_by_key(|t| std::cmp::Reverse(usage(t)));
    tags
}
