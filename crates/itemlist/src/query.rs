//! Lookups, ordering and the abstract queryable-collection interface.
//!
//! A [`Lookup`] is a backend-independent predicate on a field path that
//! can be combined with AND and OR, similar to Django's Q objects. List
//! views only ever describe queries in these terms; executing them is the
//! job of a [`Queryable`] implementation.

use std::cmp::Ordering as CmpOrdering;

use crate::model::{CellValue, ListModel};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl CompareOp {
    fn accepts(self, ordering: CmpOrdering) -> bool {
        match self {
            Self::Eq => ordering == CmpOrdering::Equal,
            Self::Gt => ordering == CmpOrdering::Greater,
            Self::Gte => ordering != CmpOrdering::Less,
            Self::Lt => ordering == CmpOrdering::Less,
            Self::Lte => ordering != CmpOrdering::Greater,
        }
    }
}

/// Internal lookup expression representation.
#[derive(Debug, Clone)]
pub enum LookupExpr {
    /// Typed comparison on a field path.
    Compare {
        /// Field path (may be dotted).
        path: String,
        /// Comparison operator.
        op: CompareOp,
        /// Value to compare against.
        value: CellValue,
    },
    /// Case-sensitive substring match.
    Contains {
        /// Field path.
        path: String,
        /// Needle.
        needle: String,
    },
    /// Case-insensitive substring match.
    IContains {
        /// Field path.
        path: String,
        /// Needle.
        needle: String,
    },
    /// Case-insensitive prefix match.
    IStartsWith {
        /// Field path.
        path: String,
        /// Needle.
        needle: String,
    },
    /// Case-insensitive exact match.
    IExact {
        /// Field path.
        path: String,
        /// Needle.
        needle: String,
    },
    /// Full-text match. Reference semantics: every word of the needle
    /// appears in the value, case-insensitively.
    Search {
        /// Field path.
        path: String,
        /// Needle.
        needle: String,
    },
    /// Comparison on the year component of a date-bearing field.
    Year {
        /// Field path.
        path: String,
        /// Comparison operator.
        op: CompareOp,
        /// Year to compare against.
        year: i32,
    },
    /// Exact match on the month component (1-12).
    Month {
        /// Field path.
        path: String,
        /// Month number.
        month: u32,
    },
    /// Exact match on the quarter (1-4).
    Quarter {
        /// Field path.
        path: String,
        /// Quarter number.
        quarter: u32,
    },
    /// Relation membership: a single-valued relation whose display equals
    /// the needle, or a multi-valued relation containing it.
    Relation {
        /// Field path of the relation.
        path: String,
        /// Display text of the related object.
        needle: String,
    },
    /// AND combination.
    And(Box<LookupExpr>, Box<LookupExpr>),
    /// OR combination.
    Or(Box<LookupExpr>, Box<LookupExpr>),
}

/// A combinable, backend-independent filter predicate.
#[derive(Debug, Clone)]
pub struct Lookup {
    expr: LookupExpr,
}

impl Lookup {
    /// Creates an equality lookup.
    pub fn eq(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    /// Creates a greater-than lookup.
    pub fn gt(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Gt, value)
    }

    /// Creates a greater-than-or-equal lookup.
    pub fn gte(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Gte, value)
    }

    /// Creates a less-than lookup.
    pub fn lt(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Lt, value)
    }

    /// Creates a less-than-or-equal lookup.
    pub fn lte(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Lte, value)
    }

    /// Creates a comparison lookup with an explicit operator.
    pub fn compare(path: &str, op: CompareOp, value: impl Into<CellValue>) -> Self {
        Self {
            expr: LookupExpr::Compare {
                path: path.to_string(),
                op,
                value: value.into(),
            },
        }
    }

    /// Creates an exact-value lookup.
    pub fn exact(path: &str, value: impl Into<CellValue>) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    /// Creates a case-sensitive substring lookup.
    pub fn contains(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::Contains {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Creates a case-insensitive substring lookup.
    pub fn icontains(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::IContains {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Creates a case-insensitive prefix lookup.
    pub fn istartswith(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::IStartsWith {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Creates a case-insensitive exact lookup.
    pub fn iexact(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::IExact {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Creates a full-text search lookup.
    pub fn search(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::Search {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Creates a comparison on the year component of a date field.
    pub fn year(path: &str, op: CompareOp, year: i32) -> Self {
        Self {
            expr: LookupExpr::Year {
                path: path.to_string(),
                op,
                year,
            },
        }
    }

    /// Creates an exact match on the month component of a date field.
    pub fn month(path: &str, month: u32) -> Self {
        Self {
            expr: LookupExpr::Month {
                path: path.to_string(),
                month,
            },
        }
    }

    /// Creates an exact match on the quarter of a date field.
    pub fn quarter(path: &str, quarter: u32) -> Self {
        Self {
            expr: LookupExpr::Quarter {
                path: path.to_string(),
                quarter,
            },
        }
    }

    /// Creates a relation-membership lookup.
    pub fn relation(path: &str, needle: &str) -> Self {
        Self {
            expr: LookupExpr::Relation {
                path: path.to_string(),
                needle: needle.to_string(),
            },
        }
    }

    /// Combines this lookup with another using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            expr: LookupExpr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines this lookup with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            expr: LookupExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Returns the internal expression.
    pub fn expr(&self) -> &LookupExpr {
        &self.expr
    }

    /// Evaluates the lookup against a model instance.
    ///
    /// This is the reference semantics used by in-memory backends; an
    /// unresolvable path never matches.
    pub fn matches<M: ListModel>(&self, item: &M) -> bool {
        eval(&self.expr, item)
    }
}

fn eval<M: ListModel>(expr: &LookupExpr, item: &M) -> bool {
    match expr {
        LookupExpr::Compare { path, op, value } => item
            .value(path)
            .and_then(|v| compare_values(&v, value))
            .is_some_and(|ordering| op.accepts(ordering)),
        LookupExpr::Contains { path, needle } => text_of(item, path).contains(needle),
        LookupExpr::IContains { path, needle } => text_of(item, path)
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        LookupExpr::IStartsWith { path, needle } => text_of(item, path)
            .to_lowercase()
            .starts_with(&needle.to_lowercase()),
        LookupExpr::IExact { path, needle } => {
            text_of(item, path).to_lowercase() == needle.to_lowercase()
        }
        LookupExpr::Search { path, needle } => {
            let haystack = text_of(item, path).to_lowercase();
            needle
                .split_whitespace()
                .all(|word| haystack.contains(&word.to_lowercase()))
        }
        LookupExpr::Year { path, op, year } => item
            .value(path)
            .and_then(|v| v.year())
            .is_some_and(|y| op.accepts(y.cmp(year))),
        LookupExpr::Month { path, month } => item
            .value(path)
            .and_then(|v| v.month())
            .is_some_and(|m| m == *month),
        LookupExpr::Quarter { path, quarter } => item
            .value(path)
            .and_then(|v| v.quarter())
            .is_some_and(|q| q == *quarter),
        LookupExpr::Relation { path, needle } => match item.value(path) {
            Some(CellValue::Related(Some(display))) => display == *needle,
            Some(CellValue::Many(items)) => items.iter().any(|d| d == needle),
            _ => false,
        },
        LookupExpr::And(left, right) => eval(left, item) && eval(right, item),
        LookupExpr::Or(left, right) => eval(left, item) || eval(right, item),
    }
}

fn text_of<M: ListModel>(item: &M, path: &str) -> String {
    item.value(path).map(|v| v.text()).unwrap_or_default()
}

/// Compares two cell values, if they are comparable.
///
/// Numeric variants compare numerically across kinds; timestamps compare
/// with bare dates through their local calendar date; everything else
/// compares within its own variant, falling back to text.
pub fn compare_values(a: &CellValue, b: &CellValue) -> Option<CmpOrdering> {
    match (a, b) {
        (CellValue::Null, CellValue::Null) => Some(CmpOrdering::Equal),
        (CellValue::Null, _) => Some(CmpOrdering::Less),
        (_, CellValue::Null) => Some(CmpOrdering::Greater),
        (CellValue::Bool(x), CellValue::Bool(y)) => Some(x.cmp(y)),
        (CellValue::Date(x), CellValue::Date(y)) => Some(x.cmp(y)),
        (CellValue::Time(x), CellValue::Time(y)) => Some(x.cmp(y)),
        (CellValue::DateTime(x), CellValue::DateTime(y)) => Some(x.cmp(y)),
        (CellValue::DateTime(_), CellValue::Date(y)) => a.as_date().map(|x| x.cmp(y)),
        (CellValue::Date(x), CellValue::DateTime(_)) => b.as_date().map(|y| x.cmp(&y)),
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.text().cmp(&b.text())),
        },
    }
}

// Precision loss is acceptable for ordering comparisons.
#[allow(clippy::cast_precision_loss)]
fn numeric(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Float(f) | CellValue::Decimal(f) => Some(*f),
        _ => None,
    }
}

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column, alias or field path to order by.
    pub column: String,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses a Django-style order specification.
    ///
    /// Prefix with `-` for descending order: `"-created"` is descending,
    /// `"name"` ascending.
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-')
            .map_or_else(|| Self::asc(spec), Self::desc)
    }
}

/// The abstract queryable-collection interface list views build against.
///
/// Implementations are immutable and chainable by value, in the manner of
/// a lazy query set: builder calls describe the query, the evaluation
/// methods (`count`, `page`, `distinct_values`) execute it.
pub trait Queryable<M: ListModel>: Clone + Sized {
    /// Narrows the collection with a predicate.
    #[must_use]
    fn filter(self, lookup: Lookup) -> Self;

    /// Replaces the ordering.
    ///
    /// Column names may reference annotation aliases.
    #[must_use]
    fn order_by(self, ordering: &[OrderBy]) -> Self;

    /// Binds a dotted field path to a flat output alias so it can be
    /// ordered and selected uniformly.
    #[must_use]
    fn annotate(self, alias: &str, path: &str) -> Self;

    /// Hints that the given single-valued relations should be loaded via
    /// a join-fetch.
    #[must_use]
    fn select_related(self, fields: &[String]) -> Self;

    /// Hints that the given multi-valued relations should be loaded via a
    /// batched fetch.
    #[must_use]
    fn prefetch_related(self, fields: &[String]) -> Self;

    /// Removes duplicate rows from the results.
    #[must_use]
    fn distinct(self) -> Self;

    /// Returns the number of matching rows.
    fn count(&self) -> usize;

    /// Returns a page of matching rows. `limit` of `None` returns all
    /// rows from `offset` on.
    fn page(&self, offset: usize, limit: Option<usize>) -> Vec<M>;

    /// Returns the distinct values present for a field path, ascending.
    fn distinct_values(&self, path: &str) -> Vec<CellValue>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{book, BookKind};
    use chrono::NaiveDate;

    #[test]
    fn test_icontains_matches() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(Lookup::icontains("title", "rust").matches(&item));
        assert!(!Lookup::icontains("title", "python").matches(&item));
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(Lookup::contains("title", "Rust").matches(&item));
        assert!(!Lookup::contains("title", "rust").matches(&item));
        assert!(Lookup::exact("title", "The Rust Book").matches(&item));
    }

    #[test]
    fn test_istartswith_and_iexact() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(Lookup::istartswith("title", "the r").matches(&item));
        assert!(!Lookup::istartswith("title", "rust").matches(&item));
        assert!(Lookup::iexact("title", "THE RUST BOOK").matches(&item));
    }

    #[test]
    fn test_search_matches_all_words() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(Lookup::search("title", "book rust").matches(&item));
        assert!(!Lookup::search("title", "rust manual").matches(&item));
    }

    #[test]
    fn test_missing_path_never_matches() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(!Lookup::eq("bogus", 1i64).matches(&item));
        assert!(!Lookup::icontains("bogus", "").matches(&item));
    }

    #[test]
    fn test_year_lookup() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        assert!(Lookup::year("published", CompareOp::Eq, 2021).matches(&item));
        assert!(Lookup::year("published", CompareOp::Gte, 2020).matches(&item));
        assert!(!Lookup::year("published", CompareOp::Lt, 2021).matches(&item));
    }

    #[test]
    fn test_or_and_combination() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        let either = Lookup::icontains("title", "python").or(Lookup::icontains("title", "rust"));
        assert!(either.matches(&item));
        let both = Lookup::icontains("title", "python").and(Lookup::icontains("title", "rust"));
        assert!(!both.matches(&item));
    }

    #[test]
    fn test_compare_date_against_datetime() {
        let item = book(1, "The Rust Book", BookKind::Tech);
        let cutoff = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(Lookup::gte("created", cutoff).matches(&item));
        let future = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        assert!(Lookup::lt("created", future).matches(&item));
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("-created").direction, OrderDirection::Desc);
        assert_eq!(OrderBy::parse("-created").column, "created");
        assert_eq!(OrderBy::parse("name").direction, OrderDirection::Asc);
    }
}
