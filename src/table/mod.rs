//! Generic table layer: columns, client-side filters and local pagination
//!
//! Rows are kept as JSON values so one table implementation serves every
//! resource. Filtering never touches the network; the visible subset is
//! recomputed from the full row list whenever a filter commits.

pub mod cell;
pub mod debounce;
pub mod filter;
pub mod filter_set;

pub use cell::{lookup, Cell, Column};
pub use debounce::{DebounceWindows, Debouncer};
pub use filter::{
    advanced_number_filter, apply_filters, distinct_options, FilterDescriptor, FilterInput,
    FilterKind, TableFilter,
};
pub use filter_set::FilterSet;

/// Slice of `visible` shown on `page` (zero based)
pub fn page_slice(visible: &[usize], page: usize, per_page: usize) -> &[usize] {
    if per_page == 0 {
        return visible;
    }
    let start = page.saturating_mul(per_page).min(visible.len());
    let end = start.saturating_add(per_page).min(visible.len());
    &visible[start..end]
}

/// Number of pages needed for `total` rows, at least one
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 || total == 0 {
        1
    } else {
        total.div_ceil(per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_pagination() {
        let visible: Vec<usize> = (0..25).collect();
        assert_eq!(page_slice(&visible, 0, 10).len(), 10);
        assert_eq!(page_slice(&visible, 2, 10), &[20, 21, 22, 23, 24]);
        assert!(page_slice(&visible, 5, 10).is_empty());
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(0, 10), 1);
    }
}
