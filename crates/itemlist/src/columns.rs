//! Column resolution and header title derivation.
//!
//! A column identifier may name a direct field, a dotted relation path or
//! a callable attribute. Identifiers are resolved once, when the view is
//! configured, so the per-request code never guesses what a column is.

use crate::model::ModelMeta;

/// How a column identifier resolves against the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// A directly declared field.
    Field {
        /// Field name.
        name: String,
    },
    /// A dotted path across one or more relation hops, bound to a flat
    /// annotation alias for ordering.
    RelationPath {
        /// The dotted path.
        path: String,
        /// The annotation alias (`_column_{i}`).
        alias: String,
    },
    /// A callable attribute or property on the model.
    Attribute {
        /// Attribute name.
        name: String,
    },
}

impl ColumnResolution {
    /// Resolves a column identifier for the column at `index`.
    pub fn resolve(meta: &ModelMeta, identifier: &str, index: usize) -> Self {
        if identifier.contains("__") {
            if meta.field_by_path(identifier).is_some() {
                return Self::RelationPath {
                    path: identifier.to_string(),
                    alias: format!("_column_{index}"),
                };
            }
            return Self::Attribute {
                name: identifier.to_string(),
            };
        }
        if meta.get_field(identifier).is_some() {
            Self::Field {
                name: identifier.to_string(),
            }
        } else {
            Self::Attribute {
                name: identifier.to_string(),
            }
        }
    }

    /// The path used to read the value from a model instance.
    pub fn value_path(&self) -> &str {
        match self {
            Self::Field { name } | Self::Attribute { name } => name,
            Self::RelationPath { path, .. } => path,
        }
    }

    /// The key used when this column appears in an ordering spec: the
    /// annotation alias for relation paths, the identifier otherwise.
    pub fn sort_key(&self) -> &str {
        match self {
            Self::Field { name } | Self::Attribute { name } => name,
            Self::RelationPath { alias, .. } => alias,
        }
    }

    /// The annotation binding `(alias, path)` for relation-path columns.
    pub fn annotation(&self) -> Option<(&str, &str)> {
        match self {
            Self::RelationPath { path, alias } => Some((alias, path)),
            _ => None,
        }
    }
}

/// Derives the human-readable title for a column identifier.
///
/// Direct fields use their label, title-cased. Dotted paths join each
/// hop's label with " / ". Anything else falls back to the identifier
/// with underscores replaced by spaces, title-cased.
pub fn column_title(meta: &ModelMeta, identifier: &str) -> String {
    match identifier.split_once("__") {
        None => meta.get_field(identifier).map_or_else(
            || title_case(&identifier.replace('_', " ")),
            |field| title_case(field.verbose_name),
        ),
        Some((first, rest)) => {
            let Some(field) = meta.get_field(first) else {
                return title_case(&identifier.replace('_', " "));
            };
            let Some(related) = field.kind.related_meta() else {
                return title_case(&identifier.replace('_', " "));
            };
            format!(
                "{} / {}",
                title_case(field.verbose_name),
                column_title(related, rest)
            )
        }
    }
}

/// Title-cases a string: the first letter of every word upper case, the
/// rest lower case.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListModel;
    use crate::testing::Book;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("first name"), "First Name");
        assert_eq!(title_case("AGE"), "Age");
        assert_eq!(title_case("q1 report"), "Q1 Report");
    }

    #[test]
    fn test_resolve_field() {
        let resolution = ColumnResolution::resolve(Book::meta(), "title", 0);
        assert_eq!(
            resolution,
            ColumnResolution::Field {
                name: "title".to_string()
            }
        );
        assert_eq!(resolution.sort_key(), "title");
    }

    #[test]
    fn test_resolve_relation_path() {
        let resolution = ColumnResolution::resolve(Book::meta(), "author__last_name", 2);
        assert_eq!(resolution.sort_key(), "_column_2");
        assert_eq!(resolution.value_path(), "author__last_name");
        assert_eq!(
            resolution.annotation(),
            Some(("_column_2", "author__last_name"))
        );
    }

    #[test]
    fn test_resolve_attribute() {
        let resolution = ColumnResolution::resolve(Book::meta(), "shelf_code", 1);
        assert_eq!(
            resolution,
            ColumnResolution::Attribute {
                name: "shelf_code".to_string()
            }
        );
        assert!(resolution.annotation().is_none());
    }

    #[test]
    fn test_column_title_field() {
        assert_eq!(column_title(Book::meta(), "title"), "Title");
        assert_eq!(column_title(Book::meta(), "published"), "Published On");
    }

    #[test]
    fn test_column_title_dotted() {
        assert_eq!(
            column_title(Book::meta(), "author__last_name"),
            "Author / Last Name"
        );
    }

    #[test]
    fn test_column_title_fallback() {
        assert_eq!(column_title(Book::meta(), "shelf_code"), "Shelf Code");
        assert_eq!(column_title(Book::meta(), "weird__path"), "Weird  Path");
    }
}
