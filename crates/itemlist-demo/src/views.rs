//! Demo list views and the route table.

use itemlist::memory::MemoryCollection;
use itemlist::views::{ItemListView, Params};

use crate::models::{Institution, Person, Subject};

/// Reverses a named route to a URL. The `pk` argument is ignored by
/// routes without a key segment.
pub fn reverse(name: &str, pk: &str) -> Option<String> {
    match name {
        "home" => Some("/".to_string()),
        "person-list" => Some("/people/".to_string()),
        "institution-list" => Some("/institutions/".to_string()),
        "subject-list" => Some("/subjects/".to_string()),
        "fancy-person-list" => Some("/fancy/people/".to_string()),
        "person-add" => Some("/people/add/".to_string()),
        "institution-add" => Some("/institutions/add/".to_string()),
        "subject-add" => Some("/subjects/add/".to_string()),
        "person-edit" => Some(format!("/people/{pk}/edit/")),
        "institution-edit" => Some(format!("/institutions/{pk}/edit/")),
        "subject-edit" => Some(format!("/subjects/{pk}/edit/")),
        "person-delete" => Some(format!("/people/{pk}/delete/")),
        "institution-delete" => Some(format!("/institutions/{pk}/delete/")),
        "subject-delete" => Some(format!("/subjects/{pk}/delete/")),
        _ => None,
    }
}

/// The fancy person list: searchable and filterable, with rows linking
/// to the modal edit form through `data-modal-url`.
pub fn person_list() -> ItemListView<Person, MemoryCollection<Person>> {
    ItemListView::new()
        .columns(&["first_name", "last_name", "age", "type", "institution"])
        .search(&[
            "first_name",
            "last_name",
            "age",
            "type",
            "bio",
            "institution__name",
        ])
        .filter_field("type")
        .filter_field("created")
        .title("Fancy Person List")
        .link("person-edit")
        .link_attr("data-modal-url")
        .per_page(15)
        .reverser(reverse)
}

/// The institution list, including the parent link and attached
/// subjects.
pub fn institution_list() -> ItemListView<Institution, MemoryCollection<Institution>> {
    ItemListView::new()
        .columns(&["name", "city", "country", "parent", "subjects", "created"])
        .search(&["name", "city", "country"])
        .filter_field("country")
        .filter_field("subjects")
        .link("institution-edit")
        .link_attr("data-modal-url")
        .per_page(15)
        .reverser(reverse)
}

/// The subject list.
pub fn subject_list() -> ItemListView<Subject, MemoryCollection<Subject>> {
    ItemListView::new()
        .columns(&["name", "description"])
        .search(&["name", "description"])
        .link("subject-edit")
        .link_attr("data-modal-url")
        .per_page(15)
        .reverser(reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Database;

    #[test]
    fn test_reverse_routes() {
        assert_eq!(reverse("person-edit", "7").unwrap(), "/people/7/edit/");
        assert_eq!(reverse("subject-add", "").unwrap(), "/subjects/add/");
        assert!(reverse("nonsense", "1").is_none());
    }

    #[test]
    fn test_person_list_renders_page() {
        let db = Database::load().unwrap();
        let page = person_list()
            .handle(Params::parse("?order=1"), db.people())
            .unwrap();
        assert_eq!(page.title, "Fancy Person List");
        assert_eq!(page.headers.len(), 5);
        // Rows sorted ascending by last name.
        let names: Vec<&str> = page
            .rows
            .iter()
            .map(|r| r.cells[1].text.as_str())
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        // The first column carries the modal link.
        assert!(page.rows[0].cells[0]
            .text
            .contains("data-modal-url=\"/people/"));
    }

    #[test]
    fn test_person_list_search_and_filter() {
        let db = Database::load().unwrap();
        let page = person_list()
            .handle(Params::parse("?search=london&type=admin"), db.people())
            .unwrap();
        assert!(page.has_filters);
        assert!(page.total < db.people.len());
        // Type and created filters are both declared.
        assert_eq!(page.filters.len(), 2);
    }

    #[test]
    fn test_institution_list_relation_columns() {
        let db = Database::load().unwrap();
        let page = institution_list()
            .handle(Params::new(), db.institutions())
            .unwrap();
        assert_eq!(page.headers[3].text, "Parent Institution");
        // One institution lists its parent by name.
        assert!(page
            .rows
            .iter()
            .any(|r| r.cells[3].text.contains("University of Saskatchewan")));
    }

    #[test]
    fn test_subject_list_defaults() {
        let db = Database::load().unwrap();
        let page = subject_list().handle(Params::new(), db.subjects()).unwrap();
        assert_eq!(page.total, db.subjects.len());
        assert_eq!(page.page, 1);
    }
}
