//! Operation surface of the time-series storage abstraction.
//!
//! Every backend implements exactly these methods. Anything that routes calls
//! to backends must account for every name listed here; the router checks its
//! method table against this manifest at startup.

use crate::types::OperationKind;

/// Methods that only read from a backend.
pub const READ_METHODS: &[&str] = &[
    "get_range",
    "get_sums",
    "get_distinct_counts_series",
    "get_distinct_counts_totals",
    "get_distinct_counts_union",
    "get_most_frequent",
    "get_most_frequent_series",
    "get_frequency_series",
    "get_frequency_totals",
];

/// Methods that mutate backend state.
pub const WRITE_METHODS: &[&str] = &[
    "incr",
    "incr_multi",
    "merge",
    "delete",
    "record",
    "record_multi",
    "merge_distinct_counts",
    "delete_distinct_counts",
    "record_frequency_multi",
    "merge_frequencies",
    "delete_frequencies",
    "flush",
];

/// Declared kind of a method, or `None` if the abstraction does not expose it.
#[must_use]
pub fn kind_of(method: &str) -> Option<OperationKind> {
    if READ_METHODS.contains(&method) {
        Some(OperationKind::Read)
    } else if WRITE_METHODS.contains(&method) {
        Some(OperationKind::Write)
    } else {
        None
    }
}

/// Every method name, reads first.
pub fn all_methods() -> impl Iterator<Item = &'static str> {
    READ_METHODS.iter().chain(WRITE_METHODS).copied()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn read_and_write_sets_are_disjoint() {
        let reads: HashSet<&str> = READ_METHODS.iter().copied().collect();
        assert!(WRITE_METHODS.iter().all(|m| !reads.contains(m)));
        assert_eq!(all_methods().count(), READ_METHODS.len() + WRITE_METHODS.len());
    }

    #[test]
    fn kind_of_known_and_unknown() {
        assert_eq!(kind_of("get_range"), Some(OperationKind::Read));
        assert_eq!(kind_of("flush"), Some(OperationKind::Write));
        assert_eq!(kind_of("unsupported_op"), None);
    }
}
