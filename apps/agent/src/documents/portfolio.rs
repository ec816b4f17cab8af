//! Portfolio document: the `projects` array in the site's component source.
//!
//! The array is located by its declaration anchor and scanned structurally;
//! everything outside the inserted entry is preserved byte for byte.

use serde::Serialize;

use crate::documents::pattern;
use crate::documents::scan::{
    find_matching, string_literals, top_level_key_positions, top_level_objects,
};
use crate::errors::AgentError;
use crate::models::PortfolioEntry;
use crate::text::normalize_key;

const TITLE_KEYS: &[&str] = &["title", "name"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc", "summary"];
const TECH_KEYS: &[&str] = &["tech", "technologies", "techStack", "stack", "tags"];
const HIGHLIGHT_KEYS: &[&str] = &["highlights", "features", "bullets"];
const DATE_KEYS: &[&str] = &["date"];

/// `const projects = [`, with an optional type annotation.
const ANCHOR_PATTERN: &str = r"\bconst\s+projects\s*(?::[^=\n]+)?=\s*\[";

/// An entry as it currently appears in the document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListedEntry {
    pub position: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub technologies: Vec<String>,
}

/// The `projects` array located in a document.
struct ProjectsArray<'a> {
    text: &'a str,
    open: usize,
    objects: Vec<(usize, usize)>,
}

impl<'a> ProjectsArray<'a> {
    fn locate(text: &'a str) -> Result<Self, AgentError> {
        let found = pattern(ANCHOR_PATTERN)?.find(text).ok_or_else(|| {
            AgentError::MalformedDocument("no `const projects = [` declaration found".to_string())
        })?;
        let open = found.end() - 1;
        let close = find_matching(text, open).ok_or_else(|| {
            AgentError::MalformedDocument("`projects` array is never closed".to_string())
        })?;

        Ok(Self {
            text,
            open,
            objects: top_level_objects(text, open, close),
        })
    }

    fn object(&self, index: usize) -> &'a str {
        let (start, end) = self.objects[index];
        &self.text[start..=end]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Property access
// ────────────────────────────────────────────────────────────────────────────

/// `(key, raw value text)` for each of an object literal's own properties.
fn properties(object: &str) -> Vec<(String, &str)> {
    let positions = top_level_key_positions(object);
    let mut props = Vec::with_capacity(positions.len());

    for (n, &start) in positions.iter().enumerate() {
        let end = positions.get(n + 1).copied().unwrap_or(object.len());
        let segment = &object[start..end];
        let Some(colon) = segment.find(':') else {
            continue; // shorthand property
        };
        let key = segment[..colon].trim().trim_matches(|c| matches!(c, '"' | '\'' | '`'));
        props.push((key.to_string(), segment[colon + 1..].trim()));
    }
    props
}

fn value_for<'p>(props: &'p [(String, &'p str)], keys: &[&str]) -> Option<&'p str> {
    keys.iter()
        .find_map(|k| props.iter().find(|(key, _)| key == k).map(|(_, v)| *v))
}

fn string_value(raw: &str) -> Option<String> {
    raw.starts_with(['"', '\'', '`'])
        .then(|| string_literals(raw).into_iter().next())
        .flatten()
}

fn string_list(raw: &str) -> Vec<String> {
    if !raw.starts_with('[') {
        return Vec::new();
    }
    match find_matching(raw, 0) {
        Some(close) => string_literals(&raw[..=close]),
        None => Vec::new(),
    }
}

fn first_key_present(props: &[(String, &str)], keys: &[&'static str]) -> Option<&'static str> {
    keys.iter()
        .copied()
        .find(|k| props.iter().any(|(key, _)| key == k))
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Entries in document order (newest first).
pub fn list_entries(doc_text: &str) -> Result<Vec<ListedEntry>, AgentError> {
    let array = ProjectsArray::locate(doc_text)?;

    Ok((0..array.objects.len())
        .map(|position| {
            let props = properties(array.object(position));
            ListedEntry {
                position,
                title: value_for(&props, TITLE_KEYS)
                    .and_then(string_value)
                    .unwrap_or_default(),
                description: value_for(&props, DESCRIPTION_KEYS).and_then(string_value),
                technologies: value_for(&props, TECH_KEYS)
                    .map(string_list)
                    .unwrap_or_default(),
            }
        })
        .collect())
}

/// True when an entry with the same normalized title is already listed.
pub fn contains_title(entries: &[ListedEntry], title: &str) -> bool {
    let key = normalize_key(title);
    !key.is_empty() && entries.iter().any(|e| normalize_key(&e.title) == key)
}

/// Inserts `entry` at the head of the `projects` array.
///
/// Fails with `DuplicateEntry` when the title is already present, so a
/// repeated insertion leaves the document exactly as the first one did.
pub fn insert_portfolio_entry(
    doc_text: &str,
    entry: &PortfolioEntry,
) -> Result<String, AgentError> {
    let array = ProjectsArray::locate(doc_text)?;
    let entries = list_entries(doc_text)?;

    if contains_title(&entries, &entry.title) {
        return Err(AgentError::DuplicateEntry(format!(
            "'{}' is already in the portfolio",
            entry.title
        )));
    }

    let style = EntryStyle::mirror(&array);
    let rendered = style.render(entry);

    let head = &doc_text[..=array.open];
    let rest = &doc_text[array.open + 1..];
    let updated = if array.objects.is_empty() {
        format!("{head}\n{rendered},\n{}", rest.trim_start())
    } else {
        format!("{head}\n{rendered},{rest}")
    };
    Ok(updated)
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Field names and indentation copied from the first existing entry.
struct EntryStyle {
    entry_indent: String,
    field_indent: String,
    title_key: &'static str,
    description_key: &'static str,
    tech_key: &'static str,
    highlights_key: Option<&'static str>,
    date_key: Option<&'static str>,
}

impl EntryStyle {
    fn mirror(array: &ProjectsArray<'_>) -> Self {
        let Some(&(start, _)) = array.objects.first() else {
            return Self {
                entry_indent: "  ".to_string(),
                field_indent: "    ".to_string(),
                title_key: "title",
                description_key: "description",
                tech_key: "technologies",
                highlights_key: Some("highlights"),
                date_key: Some("date"),
            };
        };

        let object = array.object(0);
        let props = properties(object);
        let entry_indent = line_indent(array.text, start);
        let field_indent = top_level_key_positions(object)
            .first()
            .filter(|&&p| object[..p].contains('\n'))
            .map(|&p| line_indent(array.text, start + p))
            .unwrap_or_else(|| format!("{entry_indent}  "));

        Self {
            title_key: first_key_present(&props, TITLE_KEYS).unwrap_or("title"),
            description_key: first_key_present(&props, DESCRIPTION_KEYS).unwrap_or("description"),
            tech_key: first_key_present(&props, TECH_KEYS).unwrap_or("technologies"),
            highlights_key: first_key_present(&props, HIGHLIGHT_KEYS),
            date_key: first_key_present(&props, DATE_KEYS),
            entry_indent,
            field_indent,
        }
    }

    fn render(&self, entry: &PortfolioEntry) -> String {
        let indent = &self.field_indent;
        let mut lines = vec![
            format!("{}{{", self.entry_indent),
            format!("{indent}{}: {},", self.title_key, js_string(&entry.title)),
            format!("{indent}{}: {},", self.description_key, js_string(&entry.description)),
            format!("{indent}{}: {},", self.tech_key, js_array(&entry.technologies)),
        ];
        if let Some(key) = self.highlights_key {
            lines.push(format!("{indent}{key}: {},", js_array(&entry.highlights)));
        }
        if let Some(key) = self.date_key {
            let date = entry.order_key.format("%Y-%m-%d").to_string();
            lines.push(format!("{indent}{key}: {},", js_string(&date)));
        }
        lines.push(format!("{}}}", self.entry_indent));
        lines.join("\n")
    }
}

/// Leading whitespace of the line containing byte `pos`.
fn line_indent(text: &str, pos: usize) -> String {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..pos]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect()
}

/// Double-quoted literal; JSON string syntax is valid JavaScript.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn js_array(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| js_string(v)).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PORTFOLIO_TSX;
    use chrono::NaiveDate;

    fn entry(title: &str) -> PortfolioEntry {
        PortfolioEntry {
            title: title.to_string(),
            description: "Says \"hi\" to everyone.".to_string(),
            technologies: vec!["React".to_string(), "Vite".to_string()],
            highlights: vec!["Fast cold start".to_string()],
            order_key: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        }
    }

    #[test]
    fn test_list_entries_in_document_order() {
        let entries = list_entries(PORTFOLIO_TSX).unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Trail Finder", "Budget Bot", "Pixel Forge"]);
        assert_eq!(entries[1].technologies, vec!["Python", "SQLite"]);
        assert_eq!(
            entries[2].description.as_deref(),
            Some("Sprite editor in the browser.")
        );
    }

    #[test]
    fn test_insert_prepends_and_preserves_rest() {
        let updated = insert_portfolio_entry(PORTFOLIO_TSX, &entry("Hello App")).unwrap();

        let titles: Vec<String> = list_entries(&updated)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Hello App", "Trail Finder", "Budget Bot", "Pixel Forge"]);

        let expected_entry = concat!(
            "const projects: Project[] = [\n",
            "  {\n",
            "    title: \"Hello App\",\n",
            "    description: \"Says \\\"hi\\\" to everyone.\",\n",
            "    tech: [\"React\", \"Vite\"],\n",
            "    highlights: [\"Fast cold start\"],\n",
            "    date: \"2026-10-16\",\n",
            "  },\n",
            "  {\n",
            "    title: \"Trail Finder\",",
        );
        assert!(updated.contains(expected_entry));

        // Removing the inserted block restores the original byte for byte.
        let inserted_len = updated.len() - PORTFOLIO_TSX.len();
        let anchor_end = PORTFOLIO_TSX.find("= [").unwrap() + 3;
        let mut restored = updated.clone();
        restored.replace_range(anchor_end..anchor_end + inserted_len, "");
        assert_eq!(restored, PORTFOLIO_TSX);
    }

    #[test]
    fn test_second_identical_insert_is_duplicate_and_unchanged() {
        let once = insert_portfolio_entry(PORTFOLIO_TSX, &entry("Hello App")).unwrap();
        let err = insert_portfolio_entry(&once, &entry("hello-app")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateEntry(_)));
    }

    #[test]
    fn test_missing_anchor_is_malformed() {
        let doc = "export const items = [];\n";
        let err = insert_portfolio_entry(doc, &entry("Hello App")).unwrap_err();
        assert!(matches!(err, AgentError::MalformedDocument(_)));
        assert!(matches!(list_entries(doc), Err(AgentError::MalformedDocument(_))));
    }

    #[test]
    fn test_unclosed_array_is_malformed() {
        let doc = "const projects = [\n  { title: \"A\" },\n";
        let err = insert_portfolio_entry(doc, &entry("Hello App")).unwrap_err();
        assert!(matches!(err, AgentError::MalformedDocument(_)));
    }

    #[test]
    fn test_empty_array_uses_default_field_names() {
        let doc = "const projects = [];\n";
        let updated = insert_portfolio_entry(doc, &entry("Hello App")).unwrap();
        assert!(updated.starts_with("const projects = [\n  {\n    title: \"Hello App\","));
        assert!(updated.contains("    technologies: [\"React\", \"Vite\"],\n"));
        assert!(updated.ends_with("  },\n];\n"));
        assert_eq!(list_entries(&updated).unwrap().len(), 1);
    }

    #[test]
    fn test_mirrors_name_key_and_single_line_entries() {
        let doc = "const projects = [\n\t{ name: 'Old', technologies: ['Go'] },\n];\n";
        let updated = insert_portfolio_entry(doc, &entry("Hello App")).unwrap();
        assert!(updated.contains("\t{\n\t  name: \"Hello App\",\n"));
        assert!(updated.contains("\t  technologies: [\"React\", \"Vite\"],\n"));
        assert!(!updated.contains("highlights"));
        assert!(!updated.contains("date:"));
    }
}
