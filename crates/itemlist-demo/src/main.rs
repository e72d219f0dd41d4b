//! itemlist-demo CLI
//!
//! Renders the demo list views as text tables, driven by the same query
//! strings a browser would send.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use itemlist::model::ListModel;
use itemlist::query::Queryable;
use itemlist::views::{ItemListView, ListPage, Params};

mod forms;
mod models;
mod views;

use models::Database;

/// Sortable, filterable list views over sample data.
#[derive(Parser)]
#[command(name = "itemlist-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Query string to drive the view, e.g. "search=ada&order=1.-0".
    #[arg(short, long, default_value = "")]
    query: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the fancy person list.
    People,
    /// Show the institution list.
    Institutions,
    /// Show the subject list.
    Subjects,
    /// Add a person from key=value pairs and show the updated list.
    AddPerson {
        /// Field values, e.g. first_name=Mary last_name=Somerville.
        #[arg(value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Update a person from key=value pairs and show the updated list.
    EditPerson {
        /// Primary key of the person to update.
        pk: i64,
        /// Full form data as key=value pairs.
        #[arg(value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Delete a person by pk and show the updated list.
    DeletePerson {
        /// Primary key of the person to delete.
        pk: i64,
    },
    /// Describe the modal add forms for every model.
    Forms,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut db = Database::load()?;
    let params = Params::parse(&cli.query);

    match cli.command {
        Commands::People => render(&views::person_list(), params, db.people())?,
        Commands::Institutions => render(&views::institution_list(), params, db.institutions())?,
        Commands::Subjects => render(&views::subject_list(), params, db.subjects())?,
        Commands::AddPerson { fields } => {
            let data = fields.into_iter().collect();
            match forms::add_person(&mut db, &data) {
                Ok(pk) => {
                    println!("added person {pk}");
                    render(&views::person_list(), params, db.people())?;
                }
                Err(errors) => print_form_errors(&errors, &forms::person_form(&db, None)),
            }
        }
        Commands::EditPerson { pk, fields } => {
            let data = fields.into_iter().collect();
            match forms::edit_person(&mut db, pk, &data) {
                Ok(()) => {
                    println!("updated person {pk}");
                    render(&views::person_list(), params, db.people())?;
                }
                Err(errors) => {
                    let instance = db.people.iter().find(|p| p.id == pk).cloned();
                    print_form_errors(&errors, &forms::person_form(&db, instance.as_ref()));
                }
            }
        }
        Commands::DeletePerson { pk } => {
            if db.delete_person(pk) {
                println!("deleted person {pk}");
                render(&views::person_list(), params, db.people())?;
            } else {
                println!("no person with pk {pk}");
            }
        }
        Commands::Forms => {
            print_form("person", &forms::person_form(&db, None));
            print_form("institution", &forms::institution_form(&db, None));
            print_form("subject", &forms::subject_form(None));
        }
    }
    Ok(())
}

fn print_form(name: &str, form: &forms::ModalForm) {
    println!("{name} form -> {}", form.action);
    for field in &form.fields {
        let required = if field.required { " (required)" } else { "" };
        println!("  {}: {:?}{required}", field.label, field.widget);
    }
    println!();
}

fn print_form_errors(errors: &forms::ValidationErrors, form: &forms::ModalForm) {
    println!("submission rejected (form action {}):", form.action);
    for field in &form.fields {
        if let Some(messages) = errors.get(&field.name) {
            for message in messages {
                println!("  {}: {message}", field.label);
            }
        }
    }
    if let Some(messages) = errors.get(forms::ValidationErrors::NON_FIELD) {
        for message in messages {
            println!("  {message}");
        }
    }
}

fn render<M: ListModel, C: Queryable<M>>(
    view: &ItemListView<M, C>,
    params: Params,
    collection: C,
) -> anyhow::Result<()> {
    let page = view.handle(params, collection)?;
    print_page(&page);
    Ok(())
}

fn print_page(page: &ListPage) {
    println!("{}", page.title);
    println!("{}", "=".repeat(page.title.len()));

    for filter in &page.filters {
        println!("{}: {}", filter.title, filter.selected);
    }
    if !page.filters.is_empty() {
        println!();
    }

    let headers: Vec<String> = page
        .headers
        .iter()
        .map(|h| {
            let marker = if h.style.contains("sorted-up") {
                " ^"
            } else if h.style.contains("sorted-dn") {
                " v"
            } else {
                ""
            };
            format!("{}{marker}", h.text)
        })
        .collect();

    let cells: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|c| plain(&c.text)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    print_row(&headers, &widths);
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        print_row(row, &widths);
    }

    println!();
    println!(
        "page {} of {} ({} records)",
        page.page, page.pages, page.total
    );
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    println!("{line}");
}

/// Reduces a rendered cell to terminal text: tags removed, the common
/// entities decoded.
fn plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&check;", "yes")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_strips_markup() {
        assert_eq!(
            plain("<a href=\"#!\" data-modal-url=\"/people/1/edit/\">Ada</a>"),
            "Ada"
        );
        assert_eq!(plain("Smith &amp; Sons"), "Smith & Sons");
        assert_eq!(plain("&check;"), "yes");
    }
}
