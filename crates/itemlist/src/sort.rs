//! Multi-column sort state and its compact URL encoding.
//!
//! The current sort order travels in a single query parameter as a
//! dot-joined list of signed column indices: `1.-0` means "column 1
//! ascending, then column 0 descending". Each header link toggles its own
//! column through a 3-state cycle (unsorted, ascending, descending)
//! without disturbing the relative order of the other columns.

use crate::query::{OrderBy, OrderDirection};

/// Ordered multi-column sort state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    entries: Vec<(usize, OrderDirection)>,
}

impl SortState {
    /// Parses a sort token string.
    ///
    /// Invalid tokens are silently skipped; a repeated column index keeps
    /// its first occurrence.
    pub fn parse(token: &str) -> Self {
        let mut entries: Vec<(usize, OrderDirection)> = Vec::new();
        for part in token.split('.').filter(|p| !p.is_empty()) {
            let direction = if part.starts_with('-') {
                OrderDirection::Desc
            } else {
                OrderDirection::Asc
            };
            let digits: String = part.chars().filter(char::is_ascii_digit).collect();
            let Ok(index) = digits.parse::<usize>() else {
                continue;
            };
            if entries.iter().any(|(i, _)| *i == index) {
                continue;
            }
            entries.push((index, direction));
        }
        Self { entries }
    }

    /// Encodes the state back into a token string.
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(index, direction)| match direction {
                OrderDirection::Asc => index.to_string(),
                OrderDirection::Desc => format!("-{index}"),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns the current direction for a column, if sorted.
    pub fn direction_of(&self, column: usize) -> Option<OrderDirection> {
        self.entries
            .iter()
            .find(|(i, _)| *i == column)
            .map(|(_, d)| *d)
    }

    /// Returns the state after clicking a column header.
    ///
    /// Cycle: unsorted -> ascending -> descending -> unsorted. The
    /// clicked column is re-emitted first; every other column keeps its
    /// direction and relative position.
    #[must_use]
    pub fn toggle(&self, column: usize) -> Self {
        let next = match self.direction_of(column) {
            None => Some(OrderDirection::Asc),
            Some(OrderDirection::Asc) => Some(OrderDirection::Desc),
            Some(OrderDirection::Desc) => None,
        };
        let mut entries: Vec<(usize, OrderDirection)> = Vec::new();
        if let Some(direction) = next {
            entries.push((column, direction));
        }
        entries.extend(self.entries.iter().filter(|(i, _)| *i != column));
        Self { entries }
    }

    /// Returns the CSS class describing a column's sort state.
    pub fn css_class(&self, column: usize) -> &'static str {
        match self.direction_of(column) {
            Some(OrderDirection::Asc) => "sorted-up",
            Some(OrderDirection::Desc) => "sorted-dn",
            None => "not-sorted",
        }
    }

    /// Returns the ordered `(column, direction)` entries.
    pub fn entries(&self) -> &[(usize, OrderDirection)] {
        &self.entries
    }

    /// Returns whether no column is sorted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the state to ordering specs over the given per-column
    /// sort keys (field names or annotation aliases).
    ///
    /// Entries whose index is out of range are skipped.
    pub fn to_ordering(&self, sort_keys: &[&str]) -> Vec<OrderBy> {
        self.entries
            .iter()
            .filter_map(|(index, direction)| {
                sort_keys.get(*index).map(|key| OrderBy {
                    column: (*key).to_string(),
                    direction: *direction,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encode_round_trip() {
        for token in ["1.-0", "0", "-2.1.0", "3.-1"] {
            assert_eq!(SortState::parse(token).encode(), token);
        }
    }

    #[test]
    fn test_parse_skips_invalid_tokens() {
        let state = SortState::parse("x.-1..2y.");
        assert_eq!(state.encode(), "-1.2");
    }

    #[test]
    fn test_parse_first_occurrence_wins() {
        let state = SortState::parse("1.-1.0");
        assert_eq!(state.encode(), "1.0");
    }

    #[test]
    fn test_toggle_cycle_returns_to_unsorted() {
        let start = SortState::parse("1.-0");
        // Column 0 is descending: one click removes it.
        let once = start.toggle(0);
        assert_eq!(once.encode(), "1");
        // Unsorted -> ascending, re-emitted first.
        let twice = once.toggle(0);
        assert_eq!(twice.encode(), "0.1");
        // Ascending -> descending.
        let thrice = twice.toggle(0);
        assert_eq!(thrice.encode(), "-0.1");
        // Three more clicks return column 0 to unsorted, column 1 intact.
        let gone = thrice.toggle(0);
        assert_eq!(gone.encode(), "1");
        assert_eq!(gone.direction_of(1), Some(OrderDirection::Asc));
    }

    #[test]
    fn test_toggle_preserves_other_columns_order() {
        let state = SortState::parse("2.-1.0");
        let toggled = state.toggle(1);
        assert_eq!(toggled.encode(), "2.0");
        let toggled = state.toggle(3);
        assert_eq!(toggled.encode(), "3.2.-1.0");
    }

    #[test]
    fn test_css_class() {
        let state = SortState::parse("1.-0");
        assert_eq!(state.css_class(1), "sorted-up");
        assert_eq!(state.css_class(0), "sorted-dn");
        assert_eq!(state.css_class(5), "not-sorted");
    }

    #[test]
    fn test_to_ordering_skips_out_of_range() {
        let state = SortState::parse("0.-7.1");
        let ordering = state.to_ordering(&["name", "_column_1"]);
        assert_eq!(ordering.len(), 2);
        assert_eq!(ordering[0], OrderBy::asc("name"));
        assert_eq!(ordering[1], OrderBy::asc("_column_1"));
    }
}
