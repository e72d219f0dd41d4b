//! Cell formatting.
//!
//! Converts typed field values into display-safe HTML snippets. All
//! default formatting escapes its output; only registered transforms and
//! the anchor markup produced here are treated as pre-sanitized.

use crate::model::{CellValue, FieldKind, FieldMeta};

/// A rendered table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Display text, safe to embed in HTML.
    pub text: String,
    /// CSS style tag for the cell.
    pub style: String,
}

/// Escapes a string for embedding in HTML text or attribute context.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Formats a typed value for display, using the field metadata to decode
/// choices and decimal precision. The result is escaped.
pub fn format_value(value: &CellValue, field: Option<&FieldMeta>) -> String {
    match value {
        CellValue::Null | CellValue::Related(None) => String::new(),
        CellValue::DateTime(dt) => dt
            .with_timezone(&chrono::Local)
            .format("%c")
            .to_string(),
        CellValue::Time(t) => t.format("%X").to_string(),
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::Bool(b) => boolean_icon(*b).to_string(),
        CellValue::Decimal(v) => {
            let places = match field.map(|f| f.kind) {
                Some(FieldKind::Decimal { places }) => places,
                _ => 2,
            };
            format!("{v:.places$}")
        }
        CellValue::Related(Some(display)) => html_escape(display),
        CellValue::Many(items) => html_escape(&items.join(", ")),
        CellValue::Text(code) => {
            if let Some(FieldKind::Choice { choices }) = field.map(|f| f.kind) {
                let label = choices
                    .iter()
                    .find(|(value, _)| value == code)
                    .map_or(code.as_str(), |(_, label)| label);
                html_escape(label)
            } else {
                html_escape(code)
            }
        }
        other => html_escape(&other.text()),
    }
}

/// Wraps an already-safe cell value in an anchor.
///
/// With a custom attribute name the href is a placeholder and the target
/// URL travels in that attribute, for client-side interception (modal
/// dialogs). Otherwise a plain hyperlink is emitted.
pub fn link_cell(text: &str, url: &str, attr: Option<&str>) -> String {
    let url = html_escape(url);
    match attr {
        Some(attr) if attr != "href" => {
            format!("<a href=\"#!\" {attr}=\"{url}\">{text}</a>")
        }
        _ => format!("<a href=\"{url}\">{text}</a>"),
    }
}

/// Returns the glyph used for boolean cells: a check mark for true,
/// nothing for false.
pub fn boolean_icon(value: bool) -> &'static str {
    if value {
        "&check;"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    use crate::model::ListModel;
    use crate::testing::Book;

    fn field(name: &str) -> Option<&'static FieldMeta> {
        Book::meta().get_field(name)
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"A&B"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_boolean_formatting() {
        assert_eq!(format_value(&CellValue::Bool(true), field("in_print")), "&check;");
        assert_eq!(format_value(&CellValue::Bool(false), field("in_print")), "");
    }

    #[test]
    fn test_choice_renders_label_not_code() {
        let value = CellValue::Text("tech".to_string());
        assert_eq!(format_value(&value, field("kind")), "Technical");
        // Unknown codes fall back to the raw code.
        let value = CellValue::Text("mystery".to_string());
        assert_eq!(format_value(&value, field("kind")), "mystery");
    }

    #[test]
    fn test_decimal_zero_padded() {
        let value = CellValue::Decimal(12.5);
        assert_eq!(format_value(&value, field("price")), "12.50");
        assert_eq!(format_value(&value, None), "12.50");
    }

    #[test]
    fn test_null_related_renders_empty() {
        assert_eq!(format_value(&CellValue::Related(None), field("author")), "");
        assert_eq!(format_value(&CellValue::Null, None), "");
    }

    #[test]
    fn test_related_display_is_escaped() {
        let value = CellValue::Related(Some("Smith & Sons".to_string()));
        assert_eq!(format_value(&value, field("author")), "Smith &amp; Sons");
    }

    #[test]
    fn test_date_and_time_formatting() {
        let date = CellValue::Date(NaiveDate::from_ymd_opt(2021, 3, 9).unwrap());
        assert_eq!(format_value(&date, None), "2021-03-09");
        let time = CellValue::Time(NaiveTime::from_hms_opt(13, 5, 30).unwrap());
        assert_eq!(format_value(&time, None), "13:05:30");
        let stamp = Utc.with_ymd_and_hms(2021, 3, 9, 12, 0, 0).unwrap();
        assert!(!format_value(&CellValue::DateTime(stamp), None).is_empty());
    }

    #[test]
    fn test_link_cell_default_href() {
        assert_eq!(
            link_cell("Jane", "/people/4/edit/", None),
            "<a href=\"/people/4/edit/\">Jane</a>"
        );
    }

    #[test]
    fn test_link_cell_custom_attribute() {
        assert_eq!(
            link_cell("Jane", "/people/4/edit/", Some("data-modal-url")),
            "<a href=\"#!\" data-modal-url=\"/people/4/edit/\">Jane</a>"
        );
    }
}
