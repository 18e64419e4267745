//! Substring search over fetched listings

use crate::models::Item;

/// Whether `item` mentions `needle` (already lower-cased) in its title,
/// location or description
fn matches(item: &Item, needle: &str) -> bool {
    [&item.title, &item.location, &item.description]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Keep the items whose title, location or description contains `query`,
/// ignoring case. A blank query returns the input unchanged. Input order is
/// preserved.
///
/// Surrounding whitespace is part of a non-blank query: `"wallet "` only
/// matches text where a space follows "wallet".
pub fn filter_items(items: Vec<Item>, query: &str) -> Vec<Item> {
    if query.trim().is_empty() {
        return items;
    }

    let needle = query.to_lowercase();

    items
        .into_iter()
        .filter(|item| matches(item, &needle))
        .collect()
}
