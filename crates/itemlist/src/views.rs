//! The list view: declarative configuration, query building and
//! per-request rendering records.
//!
//! An [`ItemListView`] is immutable, shared configuration in the manner
//! of an admin change-list: columns, search fields, filters, link target
//! and pagination. Each request constructs a short-lived [`ListRequest`]
//! from the current query parameters, builds the query against a
//! [`Queryable`] collection, and produces headers, rows, filter
//! descriptors and pagination context.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::cells::{format_value, link_cell, Cell};
use crate::columns::{column_title, title_case, ColumnResolution};
use crate::error::{ItemListError, Result};
use crate::filters::{field_filter, ListFilter};
use crate::model::{CellValue, FieldKind, ListModel};
use crate::query::{Lookup, OrderBy, Queryable};
use crate::sort::SortState;

/// Query parameter that disables pagination.
pub const ALL_VAR: &str = "all";
/// Query parameter carrying the sort token string.
pub const ORDER_VAR: &str = "order";
/// Query parameter carrying the page number.
pub const PAGE_VAR: &str = "page";
/// Query parameter carrying the search term.
pub const SEARCH_VAR: &str = "search";
/// Query parameter requesting CSV output (pass-through display hint).
pub const CSV_VAR: &str = "csv";
/// Query parameter requesting grid display (pass-through display hint).
pub const GRID_VAR: &str = "grid";

/// Parsed query-string parameters.
///
/// Keys are kept sorted so that re-encoded query strings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut values = BTreeMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            values.insert(percent_decode(key), percent_decode(value));
        }
        Self { values }
    }

    /// Sets a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns whether a parameter is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes a parameter.
    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the parameters back into a query string (no leading `?`).
    pub fn urlencode(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Simple percent encoding for query-string components.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Decodes percent escapes and `+` in a query-string component.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if let Some(hex) = s.get(i + 1..i + 3) {
                    if let Ok(byte) = u8::from_str_radix(hex, 16) {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                }
                out.push(b'%');
                i += 1;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Per-column value transform. The returned string is treated as
/// pre-sanitized HTML.
pub type Transform<M> = Arc<dyn Fn(&CellValue, &M) -> String + Send + Sync>;

/// Route-reversal callback: `(route name, key value) -> URL`.
pub type UrlReverser = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// A declared list filter: either a plain field name (resolved to a
/// default filter from the field's kind) or a fully configured instance.
pub enum FilterDecl<M: ListModel, C: Queryable<M>> {
    /// Plain field name.
    Field(String),
    /// Configured filter instance.
    Custom(Arc<dyn ListFilter<M, C>>),
}

impl<M: ListModel, C: Queryable<M>> Clone for FilterDecl<M, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(name) => Self::Field(name.clone()),
            Self::Custom(filter) => Self::Custom(Arc::clone(filter)),
        }
    }
}

/// A rendered column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Display text.
    pub text: String,
    /// Space-joined CSS classes (sort state plus column style).
    pub style: String,
    /// Sort-toggle URL for this column.
    pub url: String,
}

/// A rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Primary key of the underlying object.
    pub pk: i64,
    /// Rendered cells, one per column.
    pub cells: Vec<Cell>,
}

/// One choice in a filter descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChoice {
    /// Display label.
    pub display: String,
    /// Parameter value, `None` for the "All" choice.
    pub value: Option<String>,
    /// Whether this choice is currently selected.
    pub selected: bool,
    /// Query string selecting this choice, preserving all other state.
    pub query_string: String,
}

/// Filter-UI descriptor: title, choices and the selected label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterData {
    /// Filter title.
    pub title: String,
    /// Available choices, starting with "All".
    pub choices: Vec<FilterChoice>,
    /// Label of the selected choice.
    pub selected: String,
}

/// A fully built page of results.
#[derive(Debug, Clone)]
pub struct ListPage {
    /// List title.
    pub title: String,
    /// Column headers.
    pub headers: Vec<Header>,
    /// Rows for the current page.
    pub rows: Vec<Row>,
    /// Filter-UI descriptors.
    pub filters: Vec<FilterData>,
    /// Current page number (1-indexed).
    pub page: usize,
    /// Total number of pages.
    pub pages: usize,
    /// Total number of matching rows.
    pub total: usize,
    /// Page size.
    pub per_page: usize,
    /// Whether a search term or filter is active.
    pub has_filters: bool,
    /// Persistent query string (without pagination), including the `?`.
    pub query_string: String,
}

/// Declarative list view configuration.
///
/// Configuration is read-only and may be shared across concurrent
/// requests; all per-request state lives on [`ListRequest`].
pub struct ItemListView<M: ListModel, C: Queryable<M>> {
    columns: Vec<String>,
    resolutions: Vec<ColumnResolution>,
    header_overrides: HashMap<String, String>,
    transforms: HashMap<String, Transform<M>>,
    styles: HashMap<String, String>,
    search_fields: Vec<String>,
    filters: Vec<FilterDecl<M, C>>,
    title: Option<String>,
    link_url: Option<String>,
    link_kwarg: String,
    link_attr: Option<String>,
    link_field: Option<String>,
    ordering: Vec<String>,
    per_page: usize,
    reverser: Option<UrlReverser>,
}

impl<M: ListModel, C: Queryable<M>> Default for ItemListView<M, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ListModel, C: Queryable<M>> ItemListView<M, C> {
    /// Creates an empty view configuration.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            resolutions: Vec::new(),
            header_overrides: HashMap::new(),
            transforms: HashMap::new(),
            styles: HashMap::new(),
            search_fields: Vec::new(),
            filters: Vec::new(),
            title: None,
            link_url: None,
            link_kwarg: "pk".to_string(),
            link_attr: None,
            link_field: None,
            ordering: Vec::new(),
            per_page: 25,
            reverser: None,
        }
    }

    /// Sets the columns to display.
    #[must_use]
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| (*s).to_string()).collect();
        self.resolutions = cols
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnResolution::resolve(M::meta(), name, i))
            .collect();
        self
    }

    /// Overrides the header text for a column.
    #[must_use]
    pub fn header(mut self, column: &str, text: &str) -> Self {
        self.header_overrides
            .insert(column.to_string(), text.to_string());
        self
    }

    /// Registers a value transform for a column. The transform's output
    /// is treated as pre-sanitized HTML.
    #[must_use]
    pub fn transform(
        mut self,
        column: &str,
        f: impl Fn(&CellValue, &M) -> String + Send + Sync + 'static,
    ) -> Self {
        self.transforms.insert(column.to_string(), Arc::new(f));
        self
    }

    /// Sets the CSS style tag for a column.
    #[must_use]
    pub fn style(mut self, column: &str, style: &str) -> Self {
        self.styles.insert(column.to_string(), style.to_string());
        self
    }

    /// Sets the search fields. Each may carry a match-mode sigil:
    /// `^` prefix, `=` exact, `@` full-text; default is substring.
    #[must_use]
    pub fn search(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Declares a filter on a plain field, using the default filter for
    /// the field's kind.
    #[must_use]
    pub fn filter_field(mut self, field: &str) -> Self {
        self.filters.push(FilterDecl::Field(field.to_string()));
        self
    }

    /// Declares a configured filter instance.
    #[must_use]
    pub fn filter(mut self, filter: impl ListFilter<M, C> + 'static) -> Self {
        self.filters.push(FilterDecl::Custom(Arc::new(filter)));
        self
    }

    /// Sets the list title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the route name used to link rows.
    #[must_use]
    pub fn link(mut self, url_name: &str) -> Self {
        self.link_url = Some(url_name.to_string());
        self
    }

    /// Sets the key field passed to the route reverser (default `pk`).
    #[must_use]
    pub fn link_kwarg(mut self, kwarg: &str) -> Self {
        self.link_kwarg = kwarg.to_string();
        self
    }

    /// Sets the HTML attribute carrying the link URL. When set to
    /// anything other than `href`, a placeholder anchor is emitted for
    /// client-side interception.
    #[must_use]
    pub fn link_attr(mut self, attr: &str) -> Self {
        self.link_attr = Some(attr.to_string());
        self
    }

    /// Sets which column becomes the anchor (default: first column).
    #[must_use]
    pub fn link_field(mut self, field: &str) -> Self {
        self.link_field = Some(field.to_string());
        self
    }

    /// Sets the default ordering (`-` prefix for descending).
    #[must_use]
    pub fn ordering(mut self, specs: &[&str]) -> Self {
        self.ordering = specs.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn per_page(mut self, n: usize) -> Self {
        self.per_page = n;
        self
    }

    /// Sets the route-reversal callback.
    #[must_use]
    pub fn reverser(
        mut self,
        f: impl Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.reverser = Some(Arc::new(f));
        self
    }

    /// Returns the list title, falling back to the model's plural name.
    pub fn get_list_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| title_case(M::meta().verbose_name_plural))
    }

    /// Returns the column the link is attached to, if links are
    /// configured.
    fn get_link_field(&self) -> Option<&str> {
        self.link_url.as_ref()?;
        self.link_field
            .as_deref()
            .or_else(|| self.columns.first().map(String::as_str))
    }

    /// Starts a per-request list build from the given parameters.
    pub fn request(&self, params: Params) -> ListRequest<'_, M, C> {
        let sort = params
            .get(ORDER_VAR)
            .map(SortState::parse)
            .unwrap_or_default();
        ListRequest {
            view: self,
            params,
            sort,
            active_filters: Vec::new(),
            has_filters: false,
        }
    }

    /// Builds a complete page for the given parameters and collection.
    ///
    /// # Errors
    ///
    /// Returns [`ItemListError::IncorrectLookupParameters`] when a query
    /// key is neither reserved, claimed by a declared filter, nor a real
    /// field lookup, and [`ItemListError::UnknownFilterField`] for
    /// invalid filter declarations. Both should surface as client
    /// errors.
    pub fn handle(&self, params: Params, collection: C) -> Result<ListPage> {
        let base = collection.clone();
        let mut request = self.request(params);
        let qs = request.get_queryset(collection)?;

        let total = qs.count();
        let pages = total.div_ceil(self.per_page).max(1);
        let page = request
            .params
            .get(PAGE_VAR)
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, pages);

        let items = if request.params.contains(ALL_VAR) {
            qs.page(0, None)
        } else {
            qs.page((page - 1) * self.per_page, Some(self.per_page))
        };
        let rows = items.iter().map(|item| request.get_row(item)).collect();

        Ok(ListPage {
            title: self.get_list_title(),
            headers: request.get_headers(),
            rows,
            filters: request.get_filter_data(&base),
            page,
            pages,
            total,
            per_page: self.per_page,
            has_filters: request.has_filters,
            query_string: request.get_query_string(&[], &[CSV_VAR]),
        })
    }
}

struct ActiveFilter<M: ListModel, C: Queryable<M>> {
    filter: Arc<dyn ListFilter<M, C>>,
    param: String,
}

/// Per-request list build state.
///
/// Constructed fresh from the current query parameters and discarded
/// after the response is rendered; the underlying view configuration is
/// never mutated.
pub struct ListRequest<'a, M: ListModel, C: Queryable<M>> {
    view: &'a ItemListView<M, C>,
    params: Params,
    sort: SortState,
    active_filters: Vec<ActiveFilter<M, C>>,
    has_filters: bool,
}

impl<M: ListModel, C: Queryable<M>> ListRequest<'_, M, C> {
    /// Returns the list title.
    pub fn get_list_title(&self) -> String {
        self.view.get_list_title()
    }

    /// Returns whether a search term or filter parameter is active.
    /// Meaningful after [`ListRequest::get_queryset`] has run.
    pub fn has_filters(&self) -> bool {
        self.has_filters
    }

    /// Computes the persistent part of the query string for links.
    ///
    /// `new_params` entries with a `None` value delete the key; `remove`
    /// entries delete every key they prefix. The page parameter is
    /// always dropped so links land on page one.
    pub fn get_query_string(
        &self,
        new_params: &[(&str, Option<&str>)],
        remove: &[&str],
    ) -> String {
        let mut params = self.params.clone();
        let prefixes: Vec<&str> = remove.iter().copied().chain([PAGE_VAR]).collect();
        let stale: Vec<String> = params
            .iter()
            .map(|(k, _)| k.to_string())
            .filter(|k| prefixes.iter().any(|p| k.starts_with(p)))
            .collect();
        for key in stale {
            params.remove(&key);
        }
        for (key, value) in new_params {
            match value {
                Some(value) => params.set(*key, *value),
                None => params.remove(key),
            }
        }
        format!("?{}", params.urlencode())
    }

    /// Builds the filtered, searched, annotated, ordered collection.
    ///
    /// Step order matters: declared filters are resolved and applied
    /// first, then search, then annotations for dotted columns, then
    /// ordering with the primary-key tiebreak, then de-duplication and
    /// eager-load hints.
    ///
    /// # Errors
    ///
    /// Returns [`ItemListError::IncorrectLookupParameters`] for query
    /// keys that are neither reserved, claimed by a declared filter, nor
    /// resolvable as field lookups.
    pub fn get_queryset(&mut self, collection: C) -> Result<C> {
        let meta = M::meta();
        let base = collection.clone();
        let mut qs = collection;

        // Resolve declared filters, dropping any without output.
        let mut declared: Vec<(Arc<dyn ListFilter<M, C>>, String)> = Vec::new();
        for decl in &self.view.filters {
            let filter = match decl {
                FilterDecl::Field(name) => field_filter::<M, C>(name)?,
                FilterDecl::Custom(filter) => Arc::clone(filter),
            };
            let param = filter.parameter_name();
            declared.push((filter, param));
        }

        let reserved = [ALL_VAR, ORDER_VAR, PAGE_VAR, SEARCH_VAR, CSV_VAR, GRID_VAR];
        let filter_params: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(key, _)| !reserved.contains(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.has_filters = !filter_params.is_empty();

        let mut use_distinct = false;
        let declared_params: Vec<String> = declared.iter().map(|(_, p)| p.clone()).collect();
        self.active_filters = declared
            .into_iter()
            .filter(|(filter, _)| !filter.lookups(&base).is_empty())
            .map(|(filter, param)| ActiveFilter { filter, param })
            .collect();

        // Let every active filter narrow the collection to its liking.
        for spec in &self.active_filters {
            if let Some(value) = self.params.get(&spec.param) {
                qs = spec.filter.apply(value, qs);
                use_distinct = use_distinct || spec.filter.spawns_duplicates();
            }
        }

        // Any key not claimed by a declared filter must be a real field
        // lookup.
        for (key, _) in &filter_params {
            if declared_params.iter().any(|param| param == key) {
                continue;
            }
            if !is_valid_lookup(meta, key) {
                return Err(ItemListError::IncorrectLookupParameters { key: key.clone() });
            }
            use_distinct = use_distinct || meta.path_spawns_duplicates(key);
        }

        // Search.
        let search_text = self.params.get(SEARCH_VAR).unwrap_or("").to_string();
        if !search_text.is_empty() {
            let (searched, search_distinct) = self.get_search_results(qs, &search_text);
            qs = searched;
            use_distinct = use_distinct || search_distinct;
            self.has_filters = true;
        }

        // Annotations for related entries addressed through dotted paths.
        for resolution in &self.view.resolutions {
            if let Some((alias, path)) = resolution.annotation() {
                qs = qs.annotate(alias, path);
            }
        }

        let ordering = self.get_ordering();
        debug!(
            search = %search_text,
            ordering = ordering.len(),
            distinct = use_distinct,
            "built list query"
        );
        qs = qs.order_by(&ordering);

        if use_distinct {
            qs = qs.distinct();
        }

        // Eager-loading hints for relations referenced by columns.
        let mut to_select: Vec<String> = Vec::new();
        let mut to_prefetch: Vec<String> = Vec::new();
        for column in &self.view.columns {
            let first = column.split("__").next().unwrap_or(column);
            match meta.get_field(first).map(|f| f.kind) {
                Some(FieldKind::ForeignKey { .. }) => to_select.push(first.to_string()),
                Some(FieldKind::ManyToMany { .. }) => to_prefetch.push(first.to_string()),
                _ => {}
            }
        }
        if !to_select.is_empty() {
            qs = qs.select_related(&to_select);
        }
        if !to_prefetch.is_empty() {
            qs = qs.prefetch_related(&to_prefetch);
        }

        Ok(qs)
    }

    /// Narrows the collection by the search term.
    ///
    /// The term is split on whitespace and one predicate is built per
    /// (token, field) pair; the full cross-product is combined with OR,
    /// so a row matches when any field matches any token.
    fn get_search_results(&self, qs: C, search_term: &str) -> (C, bool) {
        let meta = M::meta();
        if self.view.search_fields.is_empty() || search_term.is_empty() {
            return (qs, false);
        }

        let mut combined: Option<Lookup> = None;
        for token in search_term.split_whitespace() {
            for field in &self.view.search_fields {
                let lookup = search_lookup(field, token);
                combined = Some(match combined {
                    Some(prev) => prev.or(lookup),
                    None => lookup,
                });
            }
        }

        let use_distinct = self
            .view
            .search_fields
            .iter()
            .any(|field| meta.path_spawns_duplicates(strip_sigil(field)));

        match combined {
            Some(lookup) => (qs.filter(lookup), use_distinct),
            None => (qs, false),
        }
    }

    /// Resolves the effective ordering: the sort token if present, else
    /// the view's declared ordering, else the model default; always with
    /// a primary-key tiebreak appended for determinism.
    pub fn get_ordering(&self) -> Vec<OrderBy> {
        let meta = M::meta();
        let mut ordering: Vec<OrderBy> = if self.sort.is_empty() {
            let specs = if self.view.ordering.is_empty() {
                meta.default_ordering
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            } else {
                self.view.ordering.clone()
            };
            specs.iter().map(|s| OrderBy::parse(s)).collect()
        } else {
            let sort_keys: Vec<&str> = self
                .view
                .resolutions
                .iter()
                .map(ColumnResolution::sort_key)
                .collect();
            self.sort.to_ordering(&sort_keys)
        };

        if !ordering
            .iter()
            .any(|o| o.column == "pk" || o.column == meta.pk_field)
        {
            ordering.push(OrderBy::desc("pk"));
        }
        ordering
    }

    /// Builds the header records, including the 3-state sort-toggle URL
    /// per column.
    pub fn get_headers(&self) -> Vec<Header> {
        let meta = M::meta();
        self.view
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let token = self.sort.toggle(i).encode();
                let url = self.get_query_string(&[(ORDER_VAR, Some(&token))], &[]);
                let text = self
                    .view
                    .header_overrides
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| column_title(meta, column));
                let column_style = self.view.styles.get(column).cloned().unwrap_or_default();
                Header {
                    text,
                    style: format!("{} {}", self.sort.css_class(i), column_style)
                        .trim_end()
                        .to_string(),
                    url,
                }
            })
            .collect()
    }

    /// Renders one row: per-column formatted cells, with the link column
    /// wrapped in an anchor.
    pub fn get_row(&self, obj: &M) -> Row {
        let meta = M::meta();
        let link_field = self.view.get_link_field();
        let cells = self
            .view
            .columns
            .iter()
            .zip(&self.view.resolutions)
            .map(|(column, resolution)| {
                let value = obj
                    .value(resolution.value_path())
                    .unwrap_or(CellValue::Null);
                let mut text = self.view.transforms.get(column).map_or_else(
                    || format_value(&value, meta.field_by_path(resolution.value_path())),
                    |transform| transform(&value, obj),
                );
                if Some(column.as_str()) == link_field {
                    if let Some(url) = self.get_link_url(obj) {
                        text = link_cell(&text, &url, self.view.link_attr.as_deref());
                    }
                }
                Cell {
                    text,
                    style: self.view.styles.get(column).cloned().unwrap_or_default(),
                }
            })
            .collect();
        Row {
            pk: obj.pk(),
            cells,
        }
    }

    /// Reverses the configured link route for an object.
    fn get_link_url(&self, obj: &M) -> Option<String> {
        let url_name = self.view.link_url.as_deref()?;
        let reverser = self.view.reverser.as_ref()?;
        let kwarg = if self.view.link_kwarg == "pk" {
            obj.pk().to_string()
        } else {
            obj.value(&self.view.link_kwarg)?.text()
        };
        reverser(url_name, &kwarg)
    }

    /// Builds the filter-UI descriptors for the active filter specs.
    /// Meaningful after [`ListRequest::get_queryset`] has run.
    pub fn get_filter_data(&self, collection: &C) -> Vec<FilterData> {
        self.active_filters
            .iter()
            .map(|spec| {
                let current = self.params.get(&spec.param);
                let mut choices = vec![FilterChoice {
                    display: "All".to_string(),
                    value: None,
                    selected: current.is_none(),
                    query_string: self.get_query_string(&[(&spec.param, None)], &[]),
                }];
                for (value, label) in spec.filter.lookups(collection) {
                    choices.push(FilterChoice {
                        display: label,
                        selected: current == Some(value.as_str()),
                        query_string: self
                            .get_query_string(&[(&spec.param, Some(&value))], &[]),
                        value: Some(value),
                    });
                }
                let selected = choices
                    .iter()
                    .find(|c| c.selected)
                    .map_or_else(|| "All".to_string(), |c| c.display.clone());
                FilterData {
                    title: spec.filter.title(),
                    choices,
                    selected,
                }
            })
            .collect()
    }
}

/// Builds the search predicate for one field and token, honoring the
/// field's match-mode sigil.
fn search_lookup(field: &str, token: &str) -> Lookup {
    if let Some(path) = field.strip_prefix('^') {
        Lookup::istartswith(path, token)
    } else if let Some(path) = field.strip_prefix('=') {
        Lookup::iexact(path, token)
    } else if let Some(path) = field.strip_prefix('@') {
        Lookup::search(path, token)
    } else {
        Lookup::icontains(field, token)
    }
}

/// Strips a match-mode sigil from a search field name.
fn strip_sigil(field: &str) -> &str {
    field
        .strip_prefix(['^', '=', '@'])
        .unwrap_or(field)
}

/// Returns whether a query key resolves to a real field, allowing one
/// trailing lookup segment (`created__year`).
fn is_valid_lookup(meta: &crate::model::ModelMeta, key: &str) -> bool {
    if meta.field_by_path(key).is_some() {
        return true;
    }
    key.rsplit_once("__")
        .is_some_and(|(head, _)| meta.field_by_path(head).is_some())
}
