//! Demo domain: subjects, institutions and people.
//!
//! Rows are held in a small in-memory database loaded from embedded
//! JSON. Relations are stored by id in the raw records and denormalized
//! to display text on load, which is all the list views need.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use itemlist::memory::MemoryCollection;
use itemlist::model::{CellValue, FieldKind, FieldMeta, ListModel, ModelMeta};

/// Choice codes and labels for the person type field.
pub const PERSON_TYPE_CHOICES: &[(&str, &str)] = &[
    ("admin", "Administrator"),
    ("user", "User"),
    ("guest", "Guest"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    Admin,
    User,
    Guest,
}

impl PersonType {
    /// Returns the stored choice code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }

    /// Parses a stored choice code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

static SUBJECT_META: ModelMeta = ModelMeta {
    name: "subject",
    verbose_name: "subject",
    verbose_name_plural: "subjects",
    pk_field: "id",
    fields: &[
        FieldMeta {
            name: "name",
            verbose_name: "name",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "description",
            verbose_name: "description",
            kind: FieldKind::Text,
        },
    ],
    default_ordering: &["name"],
};

static INSTITUTION_META: ModelMeta = ModelMeta {
    name: "institution",
    verbose_name: "institution",
    verbose_name_plural: "institutions",
    pk_field: "id",
    fields: &[
        FieldMeta {
            name: "name",
            verbose_name: "name",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "city",
            verbose_name: "city",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "country",
            verbose_name: "country",
            kind: FieldKind::Char,
        },
        FieldMeta {
            name: "created",
            verbose_name: "created",
            kind: FieldKind::DateTime,
        },
        FieldMeta {
            name: "modified",
            verbose_name: "modified",
            kind: FieldKind::DateTime,
        },
        FieldMeta {
            name: "parent",
            verbose_name: "parent institution",
            kind: FieldKind::ForeignKey {
                related: institution_meta,
            },
        },
        FieldMeta {
            name: "subjects",
            verbose_name: "subjects",
            kind: FieldKind::ManyToMany {
                related: subject_meta,
            },
        },
    ],
    default_ordering: &["name"],
};

static PERSON_META: ModelMeta = ModelMeta {
    name: "person",
    verbose_name: "person",
    verbose_name_plural: "people",
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
        FieldMeta {
            name: "age",
            verbose_name: "age",
            kind: FieldKind::Integer,
        },
        FieldMeta {
            name: "bio",
            verbose_name: "bio",
            kind: FieldKind::Text,
        },
        FieldMeta {
            name: "created",
            verbose_name: "created",
            kind: FieldKind::DateTime,
        },
        FieldMeta {
            name: "modified",
            verbose_name: "modified",
            kind: FieldKind::DateTime,
        },
        FieldMeta {
            name: "type",
            verbose_name: "type",
            kind: FieldKind::Choice {
                choices: PERSON_TYPE_CHOICES,
            },
        },
        FieldMeta {
            name: "institution",
            verbose_name: "institution",
            kind: FieldKind::ForeignKey {
                related: institution_meta,
            },
        },
    ],
    default_ordering: &["last_name", "first_name"],
};

fn subject_meta() -> &'static ModelMeta {
    &SUBJECT_META
}

fn institution_meta() -> &'static ModelMeta {
    &INSTITUTION_META
}

#[derive(Debug, Clone)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl ListModel for Subject {
    fn meta() -> &'static ModelMeta {
        &SUBJECT_META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn value(&self, path: &str) -> Option<CellValue> {
        match path {
            "id" => Some(CellValue::Int(self.id)),
            "name" => Some(self.name.as_str().into()),
            "description" => Some(self.description.as_str().into()),
            _ => None,
        }
    }

    fn display(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub country: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Display name of the parent institution, if any.
    pub parent: Option<String>,
    /// Display names of the attached subjects.
    pub subjects: Vec<String>,
}

impl ListModel for Institution {
    fn meta() -> &'static ModelMeta {
        &INSTITUTION_META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn value(&self, path: &str) -> Option<CellValue> {
        match path {
            "id" => Some(CellValue::Int(self.id)),
            "name" => Some(self.name.as_str().into()),
            "city" => Some(self.city.as_str().into()),
            "country" => Some(self.country.as_str().into()),
            "created" => Some(self.created.into()),
            "modified" => Some(self.modified.into()),
            "parent" => Some(CellValue::Related(self.parent.clone())),
            "parent__name" => Some(CellValue::Related(self.parent.clone())),
            "subjects" | "subjects__name" => Some(CellValue::Many(self.subjects.clone())),
            _ => None,
        }
    }

    fn display(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub bio: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub kind: PersonType,
    /// Display name of the institution.
    pub institution: String,
}

impl ListModel for Person {
    fn meta() -> &'static ModelMeta {
        &PERSON_META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn value(&self, path: &str) -> Option<CellValue> {
        match path {
            "id" => Some(CellValue::Int(self.id)),
            "first_name" => Some(self.first_name.as_str().into()),
            "last_name" => Some(self.last_name.as_str().into()),
            "age" => Some(self.age.into()),
            "bio" => Some(self.bio.as_str().into()),
            "created" => Some(self.created.into()),
            "modified" => Some(self.modified.into()),
            "type" => Some(self.kind.code().into()),
            "institution" | "institution__name" => {
                Some(CellValue::Related(Some(self.institution.clone())))
            }
            _ => None,
        }
    }

    fn display(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize)]
struct RawSubject {
    id: i64,
    name: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawInstitution {
    id: i64,
    name: String,
    city: String,
    country: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    parent: Option<i64>,
    subjects: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    id: i64,
    first_name: String,
    last_name: String,
    age: i64,
    bio: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: PersonType,
    institution: i64,
}

#[derive(Debug, Deserialize)]
struct RawData {
    subjects: Vec<RawSubject>,
    institutions: Vec<RawInstitution>,
    people: Vec<RawPerson>,
}

const SAMPLE_DATA: &str = include_str!("../data/sample.json");

/// The demo's in-memory database.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub subjects: Vec<Subject>,
    pub institutions: Vec<Institution>,
    pub people: Vec<Person>,
}

impl Database {
    /// Loads the embedded sample data set.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when the embedded data does not
    /// parse; that indicates a packaging problem, not user input.
    pub fn load() -> serde_json::Result<Self> {
        let raw: RawData = serde_json::from_str(SAMPLE_DATA)?;

        let subjects: Vec<Subject> = raw
            .subjects
            .into_iter()
            .map(|s| Subject {
                id: s.id,
                name: s.name,
                description: s.description,
            })
            .collect();
        let subject_names: HashMap<i64, String> =
            subjects.iter().map(|s| (s.id, s.name.clone())).collect();

        let institution_names: HashMap<i64, String> = raw
            .institutions
            .iter()
            .map(|i| (i.id, i.name.clone()))
            .collect();
        let institutions: Vec<Institution> = raw
            .institutions
            .into_iter()
            .map(|i| Institution {
                id: i.id,
                name: i.name,
                city: i.city,
                country: i.country,
                created: i.created,
                modified: i.modified,
                parent: i.parent.and_then(|id| institution_names.get(&id).cloned()),
                subjects: i
                    .subjects
                    .iter()
                    .filter_map(|id| subject_names.get(id).cloned())
                    .collect(),
            })
            .collect();

        let people: Vec<Person> = raw
            .people
            .into_iter()
            .map(|p| Person {
                id: p.id,
                first_name: p.first_name,
                last_name: p.last_name,
                age: p.age,
                bio: p.bio,
                created: p.created,
                modified: p.modified,
                kind: p.kind,
                institution: institution_names
                    .get(&p.institution)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        info!(
            subjects = subjects.len(),
            institutions = institutions.len(),
            people = people.len(),
            "loaded sample data"
        );
        Ok(Self {
            subjects,
            institutions,
            people,
        })
    }

    /// Returns the people as a queryable collection.
    pub fn people(&self) -> MemoryCollection<Person> {
        MemoryCollection::new(self.people.clone())
    }

    /// Returns the institutions as a queryable collection.
    pub fn institutions(&self) -> MemoryCollection<Institution> {
        MemoryCollection::new(self.institutions.clone())
    }

    /// Returns the subjects as a queryable collection.
    pub fn subjects(&self) -> MemoryCollection<Subject> {
        MemoryCollection::new(self.subjects.clone())
    }

    /// Returns the next unused person id.
    pub fn next_person_id(&self) -> i64 {
        self.people.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    /// Finds an institution by display name.
    pub fn institution_by_name(&self, name: &str) -> Option<&Institution> {
        self.institutions.iter().find(|i| i.name == name)
    }

    /// Removes a person, returning whether one was removed.
    pub fn delete_person(&mut self, pk: i64) -> bool {
        let before = self.people.len();
        self.people.retain(|p| p.id != pk);
        self.people.len() != before
    }
}
