//! In-memory reference backend.
//!
//! [`MemoryCollection`] executes list queries against a plain `Vec` of
//! model instances using the reference lookup semantics from
//! [`crate::query`]. It backs the demo application and the crate's own
//! tests; production deployments are expected to provide a [`Queryable`]
//! over their storage engine instead.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::model::{CellValue, ListModel};
use crate::query::{compare_values, Lookup, OrderBy, OrderDirection, Queryable};

/// A `Vec`-backed queryable collection.
///
/// Builder calls accumulate the query description; evaluation happens in
/// `count`, `page` and `distinct_values`. The source data is shared, so
/// cloning a collection is cheap.
#[derive(Debug, Clone)]
pub struct MemoryCollection<M: ListModel> {
    items: Arc<Vec<M>>,
    lookups: Vec<Lookup>,
    ordering: Vec<OrderBy>,
    annotations: Vec<(String, String)>,
    select_related: Vec<String>,
    prefetch_related: Vec<String>,
    distinct: bool,
}

impl<M: ListModel> MemoryCollection<M> {
    /// Creates a collection over the given items.
    pub fn new(items: Vec<M>) -> Self {
        Self {
            items: Arc::new(items),
            lookups: Vec::new(),
            ordering: Vec::new(),
            annotations: Vec::new(),
            select_related: Vec::new(),
            prefetch_related: Vec::new(),
            distinct: false,
        }
    }

    /// Returns the eager-load hints recorded on this collection.
    ///
    /// The memory backend has nothing to join-fetch, but the hints are
    /// kept observable for tests and diagnostics.
    pub fn load_hints(&self) -> (&[String], &[String]) {
        (&self.select_related, &self.prefetch_related)
    }

    /// Resolves an ordering column through the annotation aliases.
    fn ordering_path<'a>(&'a self, column: &'a str) -> &'a str {
        self.annotations
            .iter()
            .find(|(alias, _)| alias == column)
            .map_or(column, |(_, path)| path.as_str())
    }

    fn sort_value(&self, item: &M, column: &str) -> CellValue {
        let path = self.ordering_path(column);
        if path == "pk" || path == M::meta().pk_field {
            return CellValue::Int(item.pk());
        }
        item.value(path).unwrap_or(CellValue::Null)
    }

    fn evaluate(&self) -> Vec<M> {
        let mut rows: Vec<M> = self
            .items
            .iter()
            .filter(|item| self.lookups.iter().all(|lookup| lookup.matches(*item)))
            .cloned()
            .collect();

        if self.distinct {
            let mut seen = HashSet::new();
            rows.retain(|item| seen.insert(item.pk()));
        }

        if !self.ordering.is_empty() {
            rows.sort_by(|a, b| {
                for spec in &self.ordering {
                    let va = self.sort_value(a, &spec.column);
                    let vb = self.sort_value(b, &spec.column);
                    let ordering = compare_values(&va, &vb).unwrap_or(CmpOrdering::Equal);
                    let ordering = match spec.direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    };
                    if ordering != CmpOrdering::Equal {
                        return ordering;
                    }
                }
                CmpOrdering::Equal
            });
        }

        rows
    }
}

impl<M: ListModel> Queryable<M> for MemoryCollection<M> {
    fn filter(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    fn order_by(mut self, ordering: &[OrderBy]) -> Self {
        self.ordering = ordering.to_vec();
        self
    }

    fn annotate(mut self, alias: &str, path: &str) -> Self {
        self.annotations.push((alias.to_string(), path.to_string()));
        self
    }

    fn select_related(mut self, fields: &[String]) -> Self {
        self.select_related.extend(fields.iter().cloned());
        self
    }

    fn prefetch_related(mut self, fields: &[String]) -> Self {
        self.prefetch_related.extend(fields.iter().cloned());
        self
    }

    fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn count(&self) -> usize {
        self.evaluate().len()
    }

    fn page(&self, offset: usize, limit: Option<usize>) -> Vec<M> {
        let rows = self.evaluate();
        match limit {
            Some(n) => rows.into_iter().skip(offset).take(n).collect(),
            None => rows.into_iter().skip(offset).collect(),
        }
    }

    fn distinct_values(&self, path: &str) -> Vec<CellValue> {
        let mut values: Vec<CellValue> = Vec::new();
        let mut seen = HashSet::new();
        for item in self.evaluate() {
            if let Some(value) = item.value(path) {
                if !value.is_null() && seen.insert(value.text()) {
                    values.push(value);
                }
            }
        }
        values.sort_by(|a, b| compare_values(a, b).unwrap_or(CmpOrdering::Equal));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_books, BookKind};

    #[test]
    fn test_filter_narrows() {
        let qs = MemoryCollection::new(sample_books());
        let total = qs.count();
        let tech = qs.filter(Lookup::iexact("kind", BookKind::Tech.code()));
        assert!(tech.count() < total);
        assert!(tech.count() > 0);
    }

    #[test]
    fn test_order_by_alias() {
        let qs = MemoryCollection::new(sample_books())
            .annotate("_column_1", "author__last_name")
            .order_by(&[OrderBy::asc("_column_1"), OrderBy::desc("pk")]);
        let rows = qs.page(0, None);
        let names: Vec<String> = rows
            .iter()
            .map(|b| b.value("author__last_name").unwrap().text())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_page_slicing() {
        let qs = MemoryCollection::new(sample_books()).order_by(&[OrderBy::asc("pk")]);
        let all = qs.page(0, None);
        let first_two = qs.page(0, Some(2));
        let rest = qs.page(2, None);
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two.len() + rest.len(), all.len());
        assert_eq!(first_two[0].pk(), all[0].pk());
    }

    #[test]
    fn test_distinct_values_sorted_unique() {
        let qs = MemoryCollection::new(sample_books());
        let years: Vec<i32> = qs
            .distinct_values("published")
            .iter()
            .filter_map(CellValue::year)
            .collect();
        let mut sorted = years.clone();
        sorted.sort_unstable();
        assert_eq!(years, sorted);
    }

    #[test]
    fn test_load_hints_recorded() {
        let qs = MemoryCollection::new(sample_books())
            .select_related(&["author".to_string()])
            .prefetch_related(&["tags".to_string()]);
        let (select, prefetch) = qs.load_hints();
        assert_eq!(select, ["author".to_string()]);
        assert_eq!(prefetch, ["tags".to_string()]);
    }
}
