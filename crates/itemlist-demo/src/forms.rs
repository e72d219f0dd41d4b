//! Modal CRUD forms for the demo models.
//!
//! Each form describes its fields and layout, computes its submit
//! action from the route table, validates submitted key/value data and
//! applies the result to the in-memory database. Rendering is left to
//! the front end; this module only produces the form description and
//! the validated changes.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use itemlist::model::ListModel;

use crate::models::{Database, Person, PersonType, Subject, PERSON_TYPE_CHOICES};
use crate::views::reverse;

/// Field errors keyed by field name; form-wide errors use
/// [`ValidationErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Key for errors not attached to a single field.
    pub const NON_FIELD: &'static str = "__all__";

    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns the errors for a field.
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// Returns whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Input widget for a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    TextInput,
    NumberInput,
    Textarea { rows: usize },
    Select { choices: Vec<(String, String)> },
    CheckboxSelectMultiple { choices: Vec<String> },
}

/// Layout width of a field within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Third,
    Half,
    Full,
}

/// Definition of a single form field.
#[derive(Debug)]
pub struct FormFieldDef {
    /// Field name.
    pub name: String,
    /// Field label.
    pub label: String,
    /// Whether the field is required.
    pub required: bool,
    /// The widget to render.
    pub widget: Widget,
    /// Layout width.
    pub width: Width,
    /// Initial value.
    pub initial: Option<String>,
}

impl FormFieldDef {
    /// Creates a new field definition.
    pub fn new(name: impl Into<String>, label: impl Into<String>, widget: Widget) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
            widget,
            width: Width::Full,
            initial: None,
        }
    }

    /// Makes the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the layout width.
    #[must_use]
    pub fn width(mut self, width: Width) -> Self {
        self.width = width;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<String>) -> Self {
        self.initial = Some(value.into());
        self
    }
}

/// A modal form description: fields, submit action and optional delete
/// target.
#[derive(Debug)]
pub struct ModalForm {
    /// Field definitions, in layout order.
    pub fields: Vec<FormFieldDef>,
    /// Submit URL (add or edit route, depending on the instance).
    pub action: String,
    /// Delete URL, present when editing.
    pub delete_url: Option<String>,
}

fn institution_choices(db: &Database) -> Vec<(String, String)> {
    db.institutions
        .iter()
        .map(|i| (i.name.clone(), i.name.clone()))
        .collect()
}

/// Builds the person form, pre-filled when editing an instance.
pub fn person_form(db: &Database, instance: Option<&Person>) -> ModalForm {
    let action = match instance {
        Some(person) => reverse("person-edit", &person.id.to_string()),
        None => reverse("person-add", ""),
    }
    .unwrap_or_default();
    let delete_url =
        instance.and_then(|person| reverse("person-delete", &person.id.to_string()));

    let type_choices = PERSON_TYPE_CHOICES
        .iter()
        .map(|(v, l)| ((*v).to_string(), (*l).to_string()))
        .collect();

    let mut fields = vec![
        FormFieldDef::new("first_name", "First Name", Widget::TextInput)
            .required()
            .width(Width::Third),
        FormFieldDef::new("last_name", "Last Name", Widget::TextInput)
            .required()
            .width(Width::Third),
        FormFieldDef::new("age", "Age", Widget::NumberInput)
            .required()
            .width(Width::Third),
        FormFieldDef::new(
            "type",
            "Type",
            Widget::Select {
                choices: type_choices,
            },
        )
        .required()
        .width(Width::Half),
        FormFieldDef::new(
            "institution",
            "Institution",
            Widget::Select {
                choices: institution_choices(db),
            },
        )
        .required()
        .width(Width::Half),
        FormFieldDef::new("bio", "Bio", Widget::Textarea { rows: 4 }),
    ];
    if let Some(person) = instance {
        for field in &mut fields {
            if let Some(value) = person.value(&field.name) {
                field.initial = Some(value.text());
            }
        }
    }

    ModalForm {
        fields,
        action,
        delete_url,
    }
}

/// Builds the institution form.
pub fn institution_form(db: &Database, instance_pk: Option<i64>) -> ModalForm {
    let action = match instance_pk {
        Some(pk) => reverse("institution-edit", &pk.to_string()),
        None => reverse("institution-add", ""),
    }
    .unwrap_or_default();

    let parent_choices = institution_choices(db);
    let subject_choices = db.subjects.iter().map(|s| s.name.clone()).collect();

    ModalForm {
        fields: vec![
            FormFieldDef::new("name", "Name", Widget::TextInput)
                .required()
                .width(Width::Half),
            FormFieldDef::new("city", "City", Widget::TextInput)
                .required()
                .width(Width::Half),
            FormFieldDef::new("country", "Country", Widget::TextInput)
                .required()
                .width(Width::Half),
            FormFieldDef::new(
                "parent",
                "Parent Institution",
                Widget::Select {
                    choices: parent_choices,
                },
            )
            .width(Width::Half),
            FormFieldDef::new(
                "subjects",
                "Subjects",
                Widget::CheckboxSelectMultiple {
                    choices: subject_choices,
                },
            ),
        ],
        action,
        delete_url: instance_pk.and_then(|pk| reverse("institution-delete", &pk.to_string())),
    }
}

/// Builds the subject form.
pub fn subject_form(instance: Option<&Subject>) -> ModalForm {
    let action = match instance {
        Some(subject) => reverse("subject-edit", &subject.id.to_string()),
        None => reverse("subject-add", ""),
    }
    .unwrap_or_default();

    let mut name = FormFieldDef::new("name", "Name", Widget::TextInput).required();
    let mut description =
        FormFieldDef::new("description", "Description", Widget::Textarea { rows: 2 });
    if let Some(subject) = instance {
        name = name.initial(&subject.name);
        description = description.initial(&subject.description);
    }

    ModalForm {
        fields: vec![name, description],
        action,
        delete_url: instance.and_then(|s| reverse("subject-delete", &s.id.to_string())),
    }
}

fn required_text(
    data: &HashMap<String, String>,
    field: &str,
    errors: &mut ValidationErrors,
) -> String {
    match data.get(field).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            errors.add(field, "This field is required.");
            String::new()
        }
    }
}

/// Validates submitted person data against the database.
///
/// # Errors
///
/// Returns the per-field validation errors when any field is missing,
/// malformed or refers to an unknown institution.
pub fn clean_person(
    db: &Database,
    data: &HashMap<String, String>,
) -> Result<Person, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let first_name = required_text(data, "first_name", &mut errors);
    let last_name = required_text(data, "last_name", &mut errors);
    let bio = data.get("bio").cloned().unwrap_or_default();

    let age = match required_text(data, "age", &mut errors).parse::<i64>() {
        Ok(age) if (0..=150).contains(&age) => age,
        Ok(_) => {
            errors.add("age", "Enter an age between 0 and 150.");
            0
        }
        Err(_) => {
            if errors.get("age").is_none() {
                errors.add("age", "Enter a whole number.");
            }
            0
        }
    };

    let kind = match PersonType::from_code(&required_text(data, "type", &mut errors)) {
        Some(kind) => kind,
        None => {
            errors.add("type", "Select a valid choice.");
            PersonType::User
        }
    };

    let institution = required_text(data, "institution", &mut errors);
    if !institution.is_empty() && db.institution_by_name(&institution).is_none() {
        errors.add("institution", "Select a valid institution.");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let now = chrono::Utc::now();
    Ok(Person {
        id: 0,
        first_name,
        last_name,
        age,
        bio,
        created: now,
        modified: now,
        kind,
        institution,
    })
}

/// Creates a person from submitted data, returning the new pk.
///
/// # Errors
///
/// Returns the validation errors when the data does not clean.
pub fn add_person(
    db: &mut Database,
    data: &HashMap<String, String>,
) -> Result<i64, ValidationErrors> {
    let mut person = clean_person(db, data)?;
    person.id = db.next_person_id();
    let pk = person.id;
    info!(pk, name = %person.display(), "person added");
    db.people.push(person);
    Ok(pk)
}

/// Updates an existing person from submitted data.
///
/// # Errors
///
/// Returns the validation errors when the data does not clean or the pk
/// does not exist.
pub fn edit_person(
    db: &mut Database,
    pk: i64,
    data: &HashMap<String, String>,
) -> Result<(), ValidationErrors> {
    let cleaned = clean_person(db, data)?;
    let Some(person) = db.people.iter_mut().find(|p| p.id == pk) else {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationErrors::NON_FIELD, "Person not found.");
        return Err(errors);
    };
    person.first_name = cleaned.first_name;
    person.last_name = cleaned.last_name;
    person.age = cleaned.age;
    person.bio = cleaned.bio;
    person.kind = cleaned.kind;
    person.institution = cleaned.institution;
    person.modified = chrono::Utc::now();
    info!(pk, "person updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn valid_person() -> HashMap<String, String> {
        data(&[
            ("first_name", "Mary"),
            ("last_name", "Somerville"),
            ("age", "91"),
            ("type", "user"),
            ("institution", "ETH Zurich"),
            ("bio", "Polymath and science writer."),
        ])
    }

    #[test]
    fn test_add_person_assigns_pk() {
        let mut db = Database::load().unwrap();
        let before = db.people.len();
        let pk = add_person(&mut db, &valid_person()).unwrap();
        assert_eq!(db.people.len(), before + 1);
        assert!(db.people.iter().any(|p| p.id == pk));
    }

    #[test]
    fn test_clean_person_collects_field_errors() {
        let db = Database::load().unwrap();
        let mut bad = valid_person();
        bad.insert("age".to_string(), "ninety".to_string());
        bad.insert("type".to_string(), "robot".to_string());
        bad.remove("first_name");
        let errors = clean_person(&db, &bad).unwrap_err();
        assert!(errors.get("age").is_some());
        assert!(errors.get("type").is_some());
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("last_name").is_none());
    }

    #[test]
    fn test_clean_person_unknown_institution() {
        let db = Database::load().unwrap();
        let mut bad = valid_person();
        bad.insert("institution".to_string(), "Miskatonic University".to_string());
        let errors = clean_person(&db, &bad).unwrap_err();
        assert!(errors.get("institution").is_some());
    }

    #[test]
    fn test_edit_person_unknown_pk() {
        let mut db = Database::load().unwrap();
        let errors = edit_person(&mut db, 9999, &valid_person()).unwrap_err();
        assert!(errors.get(ValidationErrors::NON_FIELD).is_some());
    }

    #[test]
    fn test_person_form_edit_prefills_and_links_delete() {
        let db = Database::load().unwrap();
        let person = db.people[0].clone();
        let form = person_form(&db, Some(&person));
        assert_eq!(form.action, format!("/people/{}/edit/", person.id));
        assert_eq!(
            form.delete_url.as_deref(),
            Some(format!("/people/{}/delete/", person.id).as_str())
        );
        let first = form.fields.iter().find(|f| f.name == "first_name").unwrap();
        assert_eq!(first.initial.as_deref(), Some(person.first_name.as_str()));
    }

    #[test]
    fn test_subject_form_add_has_no_delete() {
        let form = subject_form(None);
        assert_eq!(form.action, "/subjects/add/");
        assert!(form.delete_url.is_none());
    }
}
