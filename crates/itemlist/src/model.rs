//! Model metadata and typed field values.
//!
//! List views read rows through the [`ListModel`] trait rather than a
//! concrete storage backend. A model exposes static metadata (its fields,
//! labels and relations) and per-instance typed values keyed by column
//! identifier, including dotted relation paths and callable attributes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// A typed field value read from a model instance.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing / SQL NULL.
    Null,
    /// Plain text.
    Text(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Fixed-precision decimal (precision comes from the field metadata).
    Decimal(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Timestamp, stored in UTC.
    DateTime(DateTime<Utc>),
    /// Single-valued relation: the related object's display text, or
    /// `None` when the reference is null.
    Related(Option<String>),
    /// Multi-valued relation: display texts of the related objects.
    Many(Vec<String>),
}

impl CellValue {
    /// Returns the raw textual representation of the value.
    ///
    /// This is the unformatted form used for search matching and for
    /// distinct-value choice lists, not the display form.
    pub fn text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) | Self::Decimal(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::Related(r) => r.clone().unwrap_or_default(),
            Self::Many(items) => items.join(", "),
        }
    }

    /// Returns whether the value is null or an empty relation.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Related(None))
    }

    /// Returns the calendar date component, if the value carries one.
    ///
    /// Timestamps are converted to the local time zone first so the date
    /// matches what a user would call "today".
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::DateTime(dt) => Some(dt.with_timezone(&chrono::Local).date_naive()),
            _ => None,
        }
    }

    /// Returns the year component for date-bearing values.
    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.as_date().map(|d| d.year())
    }

    /// Returns the month component (1-12) for date-bearing values.
    pub fn month(&self) -> Option<u32> {
        use chrono::Datelike;
        self.as_date().map(|d| d.month())
    }

    /// Returns the quarter (1-4) for date-bearing values.
    pub fn quarter(&self) -> Option<u32> {
        self.month().map(|m| (m - 1) / 3 + 1)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

/// The kind of a model field, carrying formatting metadata.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Short text.
    Char,
    /// Long text.
    Text,
    /// Integer.
    Integer,
    /// Floating point number.
    Float,
    /// Fixed-precision decimal.
    Decimal {
        /// Number of decimal places to render.
        places: usize,
    },
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Timestamp.
    DateTime,
    /// Coded choice field.
    Choice {
        /// `(code, label)` pairs; cells render the label, never the code.
        choices: &'static [(&'static str, &'static str)],
    },
    /// Single-valued relation to another model.
    ForeignKey {
        /// Metadata of the related model (a function so self-references
        /// work in const context).
        related: fn() -> &'static ModelMeta,
    },
    /// Multi-valued relation to another model.
    ManyToMany {
        /// Metadata of the related model.
        related: fn() -> &'static ModelMeta,
    },
}

impl FieldKind {
    /// Returns the related model metadata for relation fields.
    pub fn related_meta(&self) -> Option<&'static ModelMeta> {
        match self {
            Self::ForeignKey { related } | Self::ManyToMany { related } => Some(related()),
            _ => None,
        }
    }

    /// Returns whether the field is a multi-valued relation.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::ManyToMany { .. })
    }
}

/// Metadata for a single model field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    /// Field name, as used in column identifiers and lookups.
    pub name: &'static str,
    /// Human-readable label, lower case (title-cased where displayed).
    pub verbose_name: &'static str,
    /// Field kind.
    pub kind: FieldKind,
}

/// Static metadata for a model.
#[derive(Debug)]
pub struct ModelMeta {
    /// Model name.
    pub name: &'static str,
    /// Human-readable singular name.
    pub verbose_name: &'static str,
    /// Human-readable plural name.
    pub verbose_name_plural: &'static str,
    /// Primary key field name.
    pub pk_field: &'static str,
    /// Declared fields, in definition order.
    pub fields: &'static [FieldMeta],
    /// Default ordering specs (`-` prefix for descending).
    pub default_ordering: &'static [&'static str],
}

impl ModelMeta {
    /// Looks up a directly declared field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolves a possibly dotted field path (`institution__name`) to the
    /// final field's metadata, walking relation hops.
    pub fn field_by_path(&self, path: &str) -> Option<&FieldMeta> {
        match path.split_once("__") {
            None => self.get_field(path),
            Some((first, rest)) => {
                let field = self.get_field(first)?;
                field.kind.related_meta()?.field_by_path(rest)
            }
        }
    }

    /// Returns whether filtering on the given path can produce duplicate
    /// rows through a one-to-many join.
    pub fn path_spawns_duplicates(&self, path: &str) -> bool {
        let mut meta = self;
        for hop in path.split("__") {
            let Some(field) = meta.get_field(hop) else {
                return false;
            };
            if field.kind.is_many() {
                return true;
            }
            match field.kind.related_meta() {
                Some(related) => meta = related,
                None => return false,
            }
        }
        false
    }
}

/// A row type that list views can display.
///
/// `value` must resolve direct fields, dotted relation paths and callable
/// attributes, returning `None` when any intermediate attribute is
/// missing. Missing values render as empty cells; they never abort a
/// request.
pub trait ListModel: Clone + Send + Sync + 'static {
    /// Returns the model's static metadata.
    fn meta() -> &'static ModelMeta;

    /// Returns the primary key value.
    fn pk(&self) -> i64;

    /// Resolves a column identifier to a typed value.
    fn value(&self, path: &str) -> Option<CellValue>;

    /// Returns the textual representation of the instance.
    fn display(&self) -> String;
}
