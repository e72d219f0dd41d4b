//! # itemlist
//!
//! Reusable, sortable, filterable list views for tabular data, in the
//! spirit of an admin change-list.
//!
//! A view is declared once (columns, search fields, filters, link
//! target, pagination) and then driven entirely by query-string
//! parameters. Each request yields a [`views::ListPage`]: header records
//! with 3-state sort-toggle URLs, formatted and escaped row cells,
//! filter descriptors with state-preserving choice links, and pagination
//! context. It includes:
//!
//! - Multi-column sorting encoded as a compact `order` token (`1.-0`)
//! - Tokenized substring search with per-field match-mode sigils
//! - Declarative filters, from plain field names or configured
//!   factories (year, month, quarter, expiry buckets)
//! - Columns over direct fields, dotted relation paths and callable
//!   attributes
//! - Type-aware cell formatting with optional per-column transforms
//!
//! Data access goes through the [`query::Queryable`] trait, so any
//! collection that can filter, order and slice itself can back a view;
//! [`memory::MemoryCollection`] is the bundled in-memory backend.
//!
//! ## Quick Start
//!
//! ```ignore
//! use itemlist::views::{ItemListView, Params};
//!
//! let view = ItemListView::new()
//!     .columns(&["last_name", "first_name", "institution__name"])
//!     .search(&["first_name", "last_name"])
//!     .filter_field("kind")
//!     .per_page(20);
//! let page = view.handle(Params::parse("?search=ada&order=0"), people)?;
//! ```

pub mod cells;
pub mod columns;
pub mod error;
pub mod filters;
pub mod memory;
pub mod model;
pub mod query;
pub mod sort;
#[cfg(test)]
pub mod testing;
pub mod views;

pub use cells::{format_value, html_escape, Cell};
pub use columns::ColumnResolution;
pub use error::{ItemListError, Result};
pub use filters::{
    field_filter, ExpiryDateFilter, ListFilter, MonthFilter, QuarterFilter, YearFilter,
    YearLimit, YearLimitFilter,
};
pub use memory::MemoryCollection;
pub use model::{CellValue, FieldKind, FieldMeta, ListModel, ModelMeta};
pub use query::{CompareOp, Lookup, OrderBy, OrderDirection, Queryable};
pub use sort::SortState;
pub use views::{
    FilterChoice, FilterData, FilterDecl, Header, ItemListView, ListPage, ListRequest, Params,
    Row, ALL_VAR, CSV_VAR, GRID_VAR, ORDER_VAR, PAGE_VAR, SEARCH_VAR,
};
