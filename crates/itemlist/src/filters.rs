//! List view filters.
//!
//! Each filter binds a field name to a choice list and a
//! collection-narrowing predicate. Filters are plain value-type configs
//! consumed through the [`ListFilter`] trait; views construct the
//! defaults for plain field declarations via [`field_filter`].
//!
//! Every filter degrades silently to a pass-through on malformed or
//! unknown parameter values. A malformed filter value must never abort
//! rendering.

use std::sync::Arc;

use chrono::{Datelike, Days, Local, NaiveDate};
use tracing::warn;

use crate::columns::title_case;
use crate::error::{ItemListError, Result};
use crate::model::{CellValue, FieldKind, ListModel};
use crate::query::{CompareOp, Lookup, Queryable};

/// Month names for [`MonthFilter`] choices.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A filter that can be declared on a list view.
///
/// Instances are immutable configuration, shared across requests. The
/// current parameter value is passed into [`ListFilter::apply`] per
/// request.
pub trait ListFilter<M: ListModel, C: Queryable<M>>: Send + Sync {
    /// Returns the query-string parameter name (field plus semantic
    /// suffix, e.g. `created_since`).
    fn parameter_name(&self) -> String;

    /// Returns the display title.
    fn title(&self) -> String;

    /// Returns the available choices as `(value, label)` pairs. A filter
    /// whose choice list is empty has no output and is dropped.
    fn lookups(&self, collection: &C) -> Vec<(String, String)>;

    /// Applies the filter for the given parameter value. Malformed
    /// values return the collection unchanged.
    fn apply(&self, value: &str, collection: C) -> C;

    /// Returns whether filtering can duplicate rows through a
    /// one-to-many join.
    fn spawns_duplicates(&self) -> bool {
        false
    }
}

/// Year comparison flavors for [`YearLimitFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearLimit {
    /// Year `>=` value.
    Since,
    /// Year `<=` value.
    Until,
    /// Year `<` value.
    Before,
    /// Year `>` value.
    After,
}

impl YearLimit {
    /// Returns the parameter-name suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Since => "since",
            Self::Until => "until",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    fn op(self) -> CompareOp {
        match self {
            Self::Since => CompareOp::Gte,
            Self::Until => CompareOp::Lte,
            Self::Before => CompareOp::Lt,
            Self::After => CompareOp::Gt,
        }
    }
}

/// Filters on the year component of a date field with a configurable
/// comparison.
#[derive(Debug, Clone)]
pub struct YearLimitFilter {
    field: String,
    limit: YearLimit,
}

impl YearLimitFilter {
    /// Creates a new year-limit filter on the given field.
    pub fn new(field: &str, limit: YearLimit) -> Self {
        Self {
            field: field.to_string(),
            limit,
        }
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for YearLimitFilter {
    fn parameter_name(&self) -> String {
        format!("{}_{}", self.field, self.limit.suffix())
    }

    fn title(&self) -> String {
        format!(
            "{} {}",
            title_case(&self.field),
            title_case(self.limit.suffix())
        )
    }

    fn lookups(&self, collection: &C) -> Vec<(String, String)> {
        distinct_years(collection, &self.field, false)
    }

    fn apply(&self, value: &str, collection: C) -> C {
        match value.parse::<i32>() {
            Ok(year) => collection.filter(Lookup::year(&self.field, self.limit.op(), year)),
            Err(_) => {
                warn!(field = %self.field, value, "ignoring malformed year filter value");
                collection
            }
        }
    }
}

/// Filters on an exact year, with choices from the years present in the
/// data.
#[derive(Debug, Clone)]
pub struct YearFilter {
    field: String,
    reverse: bool,
}

impl YearFilter {
    /// Creates a new year filter; choices are listed newest first.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reverse: true,
        }
    }

    /// Sets whether choices are listed newest first.
    #[must_use]
    pub fn reverse(mut self, value: bool) -> Self {
        self.reverse = value;
        self
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for YearFilter {
    fn parameter_name(&self) -> String {
        format!("{}_year", self.field)
    }

    fn title(&self) -> String {
        title_case(&format!("{} year", self.field))
    }

    fn lookups(&self, collection: &C) -> Vec<(String, String)> {
        distinct_years(collection, &self.field, self.reverse)
    }

    fn apply(&self, value: &str, collection: C) -> C {
        match value.parse::<i32>() {
            Ok(year) => collection.filter(Lookup::year(&self.field, CompareOp::Eq, year)),
            Err(_) => {
                warn!(field = %self.field, value, "ignoring malformed year filter value");
                collection
            }
        }
    }
}

/// Filters on the month component of a date field.
#[derive(Debug, Clone)]
pub struct MonthFilter {
    field: String,
}

impl MonthFilter {
    /// Creates a new month filter on the given field.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for MonthFilter {
    fn parameter_name(&self) -> String {
        format!("{}_month", self.field)
    }

    fn title(&self) -> String {
        title_case(&format!("{} month", self.field))
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        (1..=12)
            .map(|m: usize| (m.to_string(), MONTH_NAMES[m - 1].to_string()))
            .collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        match value.parse::<u32>() {
            Ok(month @ 1..=12) => collection.filter(Lookup::month(&self.field, month)),
            _ => {
                warn!(field = %self.field, value, "ignoring malformed month filter value");
                collection
            }
        }
    }
}

/// Filters on the quarter of a date field.
#[derive(Debug, Clone)]
pub struct QuarterFilter {
    field: String,
}

impl QuarterFilter {
    /// Creates a new quarter filter on the given field.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for QuarterFilter {
    fn parameter_name(&self) -> String {
        format!("{}_quarter", self.field)
    }

    fn title(&self) -> String {
        title_case(&format!("{} quarter", self.field))
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        (1..=4).map(|q| (q.to_string(), format!("Q{q}"))).collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        match value.parse::<u32>() {
            Ok(quarter @ 1..=4) => collection.filter(Lookup::quarter(&self.field, quarter)),
            _ => {
                warn!(field = %self.field, value, "ignoring malformed quarter filter value");
                collection
            }
        }
    }
}

/// Filters a date field into expiry buckets relative to "now" in the
/// local time zone. Each bucket is a closed-open date range.
#[derive(Debug, Clone)]
pub struct ExpiryDateFilter {
    field: String,
}

impl ExpiryDateFilter {
    /// Creates a new expiry-date filter on the given field.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }

    fn bucket_lookup(&self, value: &str, today: NaiveDate) -> Option<Lookup> {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let day_after = today.checked_add_days(Days::new(2)).unwrap_or(today);
        let week_out = today.checked_add_days(Days::new(7)).unwrap_or(today);
        let next_month = if today.month() == 12 {
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
        }
        .unwrap_or(today);
        let next_year = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(today);

        let range = |since: NaiveDate, until: NaiveDate| {
            Lookup::gte(&self.field, since).and(Lookup::lt(&self.field, until))
        };

        match value {
            "expired" => Some(Lookup::lt(&self.field, today)),
            "today" => Some(range(today, tomorrow)),
            "tomorrow" => Some(range(tomorrow, day_after)),
            "7days" => Some(range(today, week_out)),
            "month" => Some(range(today, next_month)),
            "year" => Some(range(today, next_year)),
            _ => None,
        }
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for ExpiryDateFilter {
    fn parameter_name(&self) -> String {
        format!("{}_expiry", self.field)
    }

    fn title(&self) -> String {
        title_case(&self.field.replace('_', " "))
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        [
            ("expired", "Expired"),
            ("today", "Today"),
            ("tomorrow", "Tomorrow"),
            ("7days", "Within 7 days"),
            ("month", "This month"),
            ("year", "This year"),
        ]
        .iter()
        .map(|(v, l)| ((*v).to_string(), (*l).to_string()))
        .collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        let today = Local::now().date_naive();
        match self.bucket_lookup(value, today) {
            Some(lookup) => collection.filter(lookup),
            None => {
                warn!(field = %self.field, value, "ignoring unknown expiry bucket");
                collection
            }
        }
    }
}

/// Default filter for boolean fields.
#[derive(Debug, Clone)]
pub struct BooleanFilter {
    field: String,
    title: String,
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for BooleanFilter {
    fn parameter_name(&self) -> String {
        self.field.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        vec![
            ("1".to_string(), "Yes".to_string()),
            ("0".to_string(), "No".to_string()),
        ]
    }

    fn apply(&self, value: &str, collection: C) -> C {
        match value {
            "1" | "true" => collection.filter(Lookup::eq(self.field.as_str(), true)),
            "0" | "false" => collection.filter(Lookup::eq(self.field.as_str(), false)),
            _ => {
                warn!(field = %self.field, value, "ignoring malformed boolean filter value");
                collection
            }
        }
    }
}

/// Default filter for choice-coded fields: one choice per declared code,
/// labelled for humans.
#[derive(Debug, Clone)]
pub struct ChoiceFilter {
    field: String,
    title: String,
    choices: &'static [(&'static str, &'static str)],
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for ChoiceFilter {
    fn parameter_name(&self) -> String {
        self.field.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        self.choices
            .iter()
            .map(|(v, l)| ((*v).to_string(), (*l).to_string()))
            .collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        if self.choices.iter().any(|(v, _)| *v == value) {
            collection.filter(Lookup::eq(self.field.as_str(), value))
        } else {
            warn!(field = %self.field, value, "ignoring unknown choice filter value");
            collection
        }
    }
}

/// Default filter for date and datetime fields: fixed recency buckets.
#[derive(Debug, Clone)]
pub struct DateListFilter {
    field: String,
    title: String,
}

impl DateListFilter {
    fn bucket_lookup(&self, value: &str, today: NaiveDate) -> Option<Lookup> {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
        let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

        let range = |since: NaiveDate, until: NaiveDate| {
            Lookup::gte(&self.field, since).and(Lookup::lt(&self.field, until))
        };

        match value {
            "today" => Some(range(today, tomorrow)),
            "past_7_days" => Some(range(week_ago, tomorrow)),
            "this_month" => Some(range(month_start, tomorrow)),
            "this_year" => Some(range(year_start, tomorrow)),
            _ => None,
        }
    }
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for DateListFilter {
    fn parameter_name(&self) -> String {
        self.field.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn lookups(&self, _collection: &C) -> Vec<(String, String)> {
        [
            ("today", "Today"),
            ("past_7_days", "Past 7 days"),
            ("this_month", "This month"),
            ("this_year", "This year"),
        ]
        .iter()
        .map(|(v, l)| ((*v).to_string(), (*l).to_string()))
        .collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        let today = Local::now().date_naive();
        match self.bucket_lookup(value, today) {
            Some(lookup) => collection.filter(lookup),
            None => {
                warn!(field = %self.field, value, "ignoring unknown date filter value");
                collection
            }
        }
    }
}

/// Default filter for relation fields: one choice per related object.
#[derive(Debug, Clone)]
pub struct RelatedFilter {
    field: String,
    title: String,
    many: bool,
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for RelatedFilter {
    fn parameter_name(&self) -> String {
        self.field.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn lookups(&self, collection: &C) -> Vec<(String, String)> {
        let mut displays: Vec<String> = Vec::new();
        for value in collection.distinct_values(&self.field) {
            match value {
                CellValue::Related(Some(display)) => displays.push(display),
                CellValue::Many(items) => displays.extend(items),
                _ => {}
            }
        }
        displays.sort();
        displays.dedup();
        displays.into_iter().map(|d| (d.clone(), d)).collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        collection.filter(Lookup::relation(&self.field, value))
    }

    fn spawns_duplicates(&self) -> bool {
        self.many
    }
}

/// Default filter for everything else: one choice per distinct value.
#[derive(Debug, Clone)]
pub struct AllValuesFilter {
    field: String,
    title: String,
}

impl<M: ListModel, C: Queryable<M>> ListFilter<M, C> for AllValuesFilter {
    fn parameter_name(&self) -> String {
        self.field.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn lookups(&self, collection: &C) -> Vec<(String, String)> {
        collection
            .distinct_values(&self.field)
            .iter()
            .map(|v| (v.text(), v.text()))
            .collect()
    }

    fn apply(&self, value: &str, collection: C) -> C {
        collection.filter(Lookup::iexact(&self.field, value))
    }
}

/// Builds the default filter for a plain field declaration, based on the
/// field's kind.
pub fn field_filter<M: ListModel, C: Queryable<M>>(
    field: &str,
) -> Result<Arc<dyn ListFilter<M, C>>> {
    let meta = M::meta();
    let field_meta = meta
        .get_field(field)
        .ok_or_else(|| ItemListError::UnknownFilterField {
            field: field.to_string(),
        })?;
    let title = title_case(field_meta.verbose_name);
    let name = field_meta.name.to_string();
    Ok(match field_meta.kind {
        FieldKind::Choice { choices } => Arc::new(ChoiceFilter {
            field: name,
            title,
            choices,
        }),
        FieldKind::Boolean => Arc::new(BooleanFilter { field: name, title }),
        FieldKind::Date | FieldKind::DateTime => Arc::new(DateListFilter { field: name, title }),
        FieldKind::ForeignKey { .. } => Arc::new(RelatedFilter {
            field: name,
            title,
            many: false,
        }),
        FieldKind::ManyToMany { .. } => Arc::new(RelatedFilter {
            field: name,
            title,
            many: true,
        }),
        _ => Arc::new(AllValuesFilter { field: name, title }),
    })
}

/// Computes distinct year choices for a date field.
fn distinct_years<M: ListModel, C: Queryable<M>>(
    collection: &C,
    field: &str,
    reverse: bool,
) -> Vec<(String, String)> {
    let mut years: Vec<i32> = collection
        .distinct_values(field)
        .iter()
        .filter_map(CellValue::year)
        .collect();
    years.sort_unstable();
    years.dedup();
    if reverse {
        years.reverse();
    }
    years
        .into_iter()
        .map(|y| (y.to_string(), y.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCollection;
    use crate::testing::{sample_books, Book};

    type Books = MemoryCollection<Book>;

    fn books() -> Books {
        MemoryCollection::new(sample_books())
    }

    #[test]
    fn test_year_limit_parameter_names() {
        let since = YearLimitFilter::new("created", YearLimit::Since);
        let after = YearLimitFilter::new("created", YearLimit::After);
        assert_eq!(
            ListFilter::<Book, Books>::parameter_name(&since),
            "created_since"
        );
        assert_eq!(ListFilter::<Book, Books>::title(&since), "Created Since");
        assert_eq!(
            ListFilter::<Book, Books>::parameter_name(&after),
            "created_after"
        );
    }

    #[test]
    fn test_year_limit_malformed_value_is_noop() {
        let filter = YearLimitFilter::new("created", YearLimit::Since);
        let qs = books();
        let before = qs.count();
        let after = filter.apply("twenty", qs).count();
        assert_eq!(before, after);
    }

    #[test]
    fn test_year_limit_narrows() {
        let filter = YearLimitFilter::new("published", YearLimit::Since);
        let all = books().count();
        let narrowed = filter.apply("2021", books()).count();
        assert!(narrowed < all);
        assert!(narrowed > 0);
    }

    #[test]
    fn test_year_filter_choices_from_data() {
        let filter = YearFilter::new("published").reverse(false);
        let choices = ListFilter::<Book, Books>::lookups(&filter, &books());
        assert!(!choices.is_empty());
        let years: Vec<&String> = choices.iter().map(|(v, _)| v).collect();
        let mut sorted = years.clone();
        sorted.sort();
        assert_eq!(years, sorted);
    }

    #[test]
    fn test_month_filter_fixed_choices() {
        let filter = MonthFilter::new("created");
        let choices = ListFilter::<Book, Books>::lookups(&filter, &books());
        assert_eq!(choices.len(), 12);
        assert_eq!(choices[0], ("1".to_string(), "January".to_string()));
        assert_eq!(choices[11], ("12".to_string(), "December".to_string()));
    }

    #[test]
    fn test_month_filter_out_of_range_is_noop() {
        let filter = MonthFilter::new("created");
        assert_eq!(filter.apply("13", books()).count(), books().count());
        assert_eq!(filter.apply("", books()).count(), books().count());
    }

    #[test]
    fn test_quarter_filter_choices() {
        let filter = QuarterFilter::new("created");
        let choices = ListFilter::<Book, Books>::lookups(&filter, &books());
        assert_eq!(choices.len(), 4);
        assert_eq!(choices[0].1, "Q1");
        assert_eq!(filter.apply("5", books()).count(), books().count());
    }

    #[test]
    fn test_expiry_buckets() {
        let filter = ExpiryDateFilter::new("due");
        let today = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();

        let lookup = filter.bucket_lookup("expired", today).unwrap();
        assert!(format!("{lookup:?}").contains("Lt"));

        // December rolls the month bucket into the next year.
        let lookup = filter.bucket_lookup("month", today).unwrap();
        assert!(format!("{lookup:?}").contains("2024-01-01"));

        assert!(filter.bucket_lookup("sometime", today).is_none());
    }

    #[test]
    fn test_expiry_unknown_bucket_is_noop() {
        let filter = ExpiryDateFilter::new("created");
        assert_eq!(filter.apply("sometime", books()).count(), books().count());
    }

    #[test]
    fn test_field_filter_choice_kind() {
        let filter = field_filter::<Book, Books>("kind").unwrap();
        assert_eq!(filter.parameter_name(), "kind");
        let choices = filter.lookups(&books());
        assert_eq!(choices.len(), 2);
        let narrowed = filter.apply("tech", books()).count();
        assert!(narrowed < books().count());
        // Unknown code degrades to pass-through.
        assert_eq!(filter.apply("opera", books()).count(), books().count());
    }

    #[test]
    fn test_field_filter_boolean_kind() {
        let filter = field_filter::<Book, Books>("in_print").unwrap();
        let yes = filter.apply("1", books()).count();
        let no = filter.apply("0", books()).count();
        assert_eq!(yes + no, books().count());
        assert_eq!(filter.apply("maybe", books()).count(), books().count());
    }

    #[test]
    fn test_field_filter_related_spawns_duplicates() {
        let tags = field_filter::<Book, Books>("tags").unwrap();
        assert!(tags.spawns_duplicates());
        let author = field_filter::<Book, Books>("author").unwrap();
        assert!(!author.spawns_duplicates());
    }

    #[test]
    fn test_field_filter_unknown_field() {
        assert!(field_filter::<Book, Books>("bogus").is_err());
    }
}
