//! Shared test fixtures: a small library domain with a choice field, a
//! foreign key, a many-to-many relation and a callable attribute.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{CellValue, FieldKind, FieldMeta, ListModel, ModelMeta};

pub const KIND_CHOICES: &[(&str, &str)] = &[("tech", "Technical"), ("fiction", "Fiction")];

static AUTHOR_META: ModelMeta = ModelMeta {
    name: "author",
    verbose_name: "author",
    verbose_name_plural: "authors",
    pk_field: "id",
    fields: &[
        FieldMeta {
            name: "first_name",
            verbose_name: "first name",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "last_name",
            verbose_name: "last name",
            kind: FieldKind::Char,
        },
    ],
    default_ordering: &["last_name"],
};

static TAG_META: ModelMeta = ModelMeta {
    name: "tag",
    verbose_name: "tag",
    verbose_name_plural: "tags",
    pk_field: "id",
    fields: &[FieldMeta {
        name: "name",
        verbose_name: "name",
        kind: FieldKind::Char,
    }],
    default_ordering: &["name"],
};

static BOOK_META: ModelMeta = ModelMeta {
    name: "book",
    verbose_name: "book",
    verbose_name_plural: "books",
    pk_field: "id",
    fields: &[
        FieldMeta {
            name: "title",
            verbose_name: "title",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "kind",
            verbose_name: "kind",
            kind: FieldKind::Choice {
                choices: KIND_CHOICES,
            },
        },
        FieldMeta {
            name: "in_print",
            verbose_name: "in print",
            kind: FieldKind::Boolean,
        },
        FieldMeta {
            name: "price",
            verbose_name: "price",
            kind: FieldKind::Decimal { places: 2 },
        },
        FieldMeta {
            name: "published",
            verbose_name: "published on",
            kind: FieldKind::Date,
        },
        FieldMeta {
            name: "created",
            verbose_name: "created",
            kind: FieldKind::DateTime,
        },
        FieldMeta {
            name: "author",
            verbose_name: "author",
            kind: FieldKind::ForeignKey {
                related: author_meta,
            },
        },
        FieldMeta {
            name: "tags",
            verbose_name: "tags",
            kind: FieldKind::ManyToMany { related: tag_meta },
        },
    ],
    default_ordering: &["title"],
};

fn author_meta() -> &'static ModelMeta {
    &AUTHOR_META
}

fn tag_meta() -> &'static ModelMeta {
    &TAG_META
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookKind {
    Tech,
    Fiction,
}

impl BookKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Fiction => "fiction",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    pub fn new(id: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

impl ListModel for Author {
    fn meta() -> &'static ModelMeta {
        &AUTHOR_META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn value(&self, path: &str) -> Option<CellValue> {
        match path {
            "id" => Some(CellValue::Int(self.id)),
            "first_name" => Some(self.first_name.as_str().into()),
            "last_name" => Some(self.last_name.as_str().into()),
            _ => None,
        }
    }

    fn display(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub kind: BookKind,
    pub in_print: bool,
    pub price: f64,
    pub published: NaiveDate,
    pub created: DateTime<Utc>,
    pub author: Author,
    pub tags: Vec<String>,
}

impl ListModel for Book {
    fn meta() -> &'static ModelMeta {
        &BOOK_META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn value(&self, path: &str) -> Option<CellValue> {
        match path {
            "id" => Some(CellValue::Int(self.id)),
            "title" => Some(self.title.as_str().into()),
            "kind" => Some(self.kind.code().into()),
            "in_print" => Some(self.in_print.into()),
            "price" => Some(CellValue::Decimal(self.price)),
            "published" => Some(self.published.into()),
            "created" => Some(self.created.into()),
            "author" => Some(CellValue::Related(Some(self.author.display()))),
            "tags" => Some(CellValue::Many(self.tags.clone())),
            // Callable attribute, not a declared field.
            "shelf_code" => Some(format!("S-{:03}", self.id).into()),
            _ => path
                .strip_prefix("author__")
                .and_then(|rest| self.author.value(rest)),
        }
    }

    fn display(&self) -> String {
        self.title.clone()
    }
}

/// Builds a single book with fixed dates in 2021.
pub fn book(id: i64, title: &str, kind: BookKind) -> Book {
    Book {
        id,
        title: title.to_string(),
        kind,
        in_print: true,
        price: 39.95,
        published: NaiveDate::from_ymd_opt(2021, 3, 9).unwrap(),
        created: Utc.with_ymd_and_hms(2021, 3, 9, 12, 0, 0).unwrap(),
        author: Author::new(1, "Steve", "Klabnik"),
        tags: vec!["rust".to_string(), "systems".to_string()],
    }
}

/// A small library with mixed kinds, print states, authors and years.
pub fn sample_books() -> Vec<Book> {
    vec![
        book(1, "The Rust Book", BookKind::Tech),
        Book {
            id: 2,
            title: "Pride and Prejudice".to_string(),
            kind: BookKind::Fiction,
            in_print: true,
            price: 9.99,
            published: NaiveDate::from_ymd_opt(1813, 1, 28).unwrap(),
            created: Utc.with_ymd_and_hms(2020, 6, 1, 9, 30, 0).unwrap(),
            author: Author::new(2, "Jane", "Austen"),
            tags: vec!["classic".to_string()],
        },
        Book {
            id: 3,
            title: "The Pragmatic Programmer".to_string(),
            kind: BookKind::Tech,
            in_print: true,
            price: 49.95,
            published: NaiveDate::from_ymd_opt(1999, 10, 30).unwrap(),
            created: Utc.with_ymd_and_hms(2019, 11, 15, 16, 45, 0).unwrap(),
            author: Author::new(3, "Andrew", "Hunt"),
            tags: vec!["craft".to_string(), "systems".to_string()],
        },
        Book {
            id: 4,
            title: "Dune".to_string(),
            kind: BookKind::Fiction,
            in_print: false,
            price: 12.50,
            published: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            created: Utc.with_ymd_and_hms(2018, 2, 20, 8, 0, 0).unwrap(),
            author: Author::new(4, "Frank", "Herbert"),
            tags: vec!["classic".to_string(), "scifi".to_string()],
        },
        Book {
            id: 5,
            title: "Zero To Production In Rust".to_string(),
            kind: BookKind::Tech,
            in_print: true,
            price: 44.90,
            published: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(),
            created: Utc.with_ymd_and_hms(2022, 4, 2, 10, 15, 0).unwrap(),
            author: Author::new(5, "Luca", "Palmieri"),
            tags: vec!["rust".to_string(), "web".to_string()],
        },
    ]
}
