#![deny(missing_docs)]

//! # Tag Filter
//!
//! Removes operations from the working document according to include/exclude tag lists.

use crate::oas::document::OpenApiDocument;

/// True when an operation with `tags` survives the filter.
///
/// Kept iff (`include` is empty or at least one tag is included) and no tag is excluded.
pub fn operation_matches_tags(tags: &[String], include: &[String], exclude: &[String]) -> bool {
    let included = include.is_empty() || tags.iter().any(|t| include.contains(t));
    let excluded = tags.iter().any(|t| exclude.contains(t));
    included && !excluded
}

/// Drops filtered operations, then path items left without any operation.
///
/// Returns the number of removed operations.
pub fn filter_operations_by_tag(
    document: &mut OpenApiDocument,
    include: &[String],
    exclude: &[String],
) -> usize {
    if include.is_empty() && exclude.is_empty() {
        return 0;
    }

    let mut removed = 0;
    for item in document.paths.values_mut() {
        for slot in item.operation_slots_mut() {
            let keep = slot
                .as_ref()
                .map(|op| operation_matches_tags(&op.tags, include, exclude))
                .unwrap_or(true);
            if !keep {
                *slot = None;
                removed += 1;
            }
        }
    }
    if removed > 0 {
        document.paths.retain(|_, item| item.has_operations());
    }
    removed
}
