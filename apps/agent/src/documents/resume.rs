//! Resume document: a fixed window of project slots in an HTML page.
//!
//! A slot is any element whose `class` list contains the `project` token.
//! Its title is the first `<h2>`–`<h6>` inside it and its bullets are the
//! `<li>` items. Replacement rewrites only the slot's inner content.

use regex::Regex;

use crate::documents::pattern;
use crate::errors::AgentError;
use crate::models::resume::MAX_BULLETS_PER_SLOT;
use crate::models::{ResumeSlot, RESUME_SLOT_COUNT};
use crate::text::normalize_key;

const OPEN_TAG_PATTERN: &str = r#"(?i)<([a-z][a-z0-9]*)\b[^>]*?\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#;
const HEADING_PATTERN: &str = r"(?is)(<h([2-6])\b[^>]*>)(.*?)</h[2-6]\s*>";
const LIST_OPEN_PATTERN: &str = r"(?i)<ul\b[^>]*>";
const ITEM_PATTERN: &str = r"(?is)<li\b[^>]*>(.*?)</li\s*>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

/// Byte layout of one slot element.
#[derive(Debug, Clone, Copy)]
struct SlotSpan {
    /// Start of the opening tag.
    start: usize,
    /// End of the opening tag (start of inner content).
    inner_start: usize,
    /// Start of the closing tag (end of inner content).
    inner_end: usize,
}

fn slot_spans(doc_text: &str) -> Result<Vec<SlotSpan>, AgentError> {
    let open_tag = pattern(OPEN_TAG_PATTERN)?;
    let mut spans: Vec<SlotSpan> = Vec::new();

    for caps in open_tag.captures_iter(doc_text) {
        let Some(whole) = caps.get(0) else { continue };
        if spans.last().is_some_and(|s| whole.start() < s.inner_end) {
            continue; // nested inside the previous slot
        }
        let classes = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        if !classes.split_whitespace().any(|c| c.eq_ignore_ascii_case("project")) {
            continue;
        }
        let Some(tag) = caps.get(1) else { continue };
        let inner_end = closing_tag_start(doc_text, tag.as_str(), whole.end())?.ok_or_else(|| {
            AgentError::MalformedDocument(format!(
                "<{}> project element at byte {} is never closed",
                tag.as_str(),
                whole.start()
            ))
        })?;

        spans.push(SlotSpan {
            start: whole.start(),
            inner_start: whole.end(),
            inner_end,
        });
    }
    Ok(spans)
}

/// Start of the tag closing an element named `tag` whose content begins at
/// `from`, accounting for nested elements of the same name.
fn closing_tag_start(text: &str, tag: &str, from: usize) -> Result<Option<usize>, AgentError> {
    let same_tag = pattern(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag)))?;
    let mut depth = 1usize;

    for caps in same_tag.captures_iter(&text[from..]) {
        let Some(whole) = caps.get(0) else { continue };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Ok(Some(from + whole.start()));
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    Ok(None)
}

/// Visible text of an HTML fragment.
fn inner_text(tag_re: &Regex, html: &str) -> String {
    let stripped = tag_re.replace_all(html, "");
    decode_entities(&stripped.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Leading whitespace of the line containing byte `pos`.
fn line_indent(text: &str, pos: usize) -> &str {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..pos];
    &line[..line.len() - line.trim_start().len()]
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Current slots in document order. Only the first `RESUME_SLOT_COUNT`
/// elements form the replaceable window.
pub fn list_slots(doc_text: &str) -> Result<Vec<ResumeSlot>, AgentError> {
    let heading = pattern(HEADING_PATTERN)?;
    let item = pattern(ITEM_PATTERN)?;
    let tag = pattern(TAG_PATTERN)?;

    Ok(slot_spans(doc_text)?
        .into_iter()
        .take(RESUME_SLOT_COUNT)
        .map(|span| {
            let inner = &doc_text[span.inner_start..span.inner_end];
            ResumeSlot {
                title: heading
                    .captures(inner)
                    .and_then(|c| c.get(3))
                    .map(|m| inner_text(&tag, m.as_str()))
                    .unwrap_or_default(),
                bullets: item
                    .captures_iter(inner)
                    .filter_map(|c| c.get(1))
                    .map(|m| inner_text(&tag, m.as_str()))
                    .filter(|b| !b.is_empty())
                    .collect(),
            }
        })
        .collect())
}

/// Overwrites slot `slot_index` with `slot`, keeping the slot element's own
/// tags, the heading tag and the list tag.
///
/// Checks, in order: index range (`InvalidSlot`), slot presence
/// (`MalformedDocument`), title already on the resume (`DuplicateEntry`),
/// bullet bounds (`ContentConstraint`).
pub fn replace_resume_slot(
    doc_text: &str,
    slot_index: usize,
    slot: &ResumeSlot,
) -> Result<String, AgentError> {
    if slot_index >= RESUME_SLOT_COUNT {
        return Err(AgentError::InvalidSlot {
            index: slot_index,
            max: RESUME_SLOT_COUNT,
        });
    }

    let spans = slot_spans(doc_text)?;
    if spans.is_empty() {
        return Err(AgentError::MalformedDocument(
            "no element with class \"project\" found".to_string(),
        ));
    }
    let span = *spans.get(slot_index).ok_or_else(|| {
        AgentError::MalformedDocument(format!(
            "resume has {} project slots, slot {slot_index} does not exist",
            spans.len()
        ))
    })?;

    let key = normalize_key(&slot.title);
    if list_slots(doc_text)?
        .iter()
        .any(|existing| normalize_key(&existing.title) == key)
    {
        return Err(AgentError::DuplicateEntry(format!(
            "'{}' is already on the resume",
            slot.title
        )));
    }
    if slot.bullets.is_empty() || slot.bullets.len() > MAX_BULLETS_PER_SLOT {
        return Err(AgentError::ContentConstraint(format!(
            "a resume slot holds 1 to {MAX_BULLETS_PER_SLOT} bullets, got {}",
            slot.bullets.len()
        )));
    }

    let inner = &doc_text[span.inner_start..span.inner_end];
    let heading_open = pattern(HEADING_PATTERN)?
        .captures(inner)
        .and_then(|c| c.get(1).zip(c.get(2)))
        .map(|(open, level)| (open.as_str().to_string(), level.as_str().to_string()))
        .unwrap_or_else(|| ("<h3>".to_string(), "3".to_string()));
    let list_open = pattern(LIST_OPEN_PATTERN)?
        .find(inner)
        .map_or("<ul>", |m| m.as_str());

    let outer_indent = line_indent(doc_text, span.start);
    let indent = format!("{outer_indent}  ");
    let mut lines = vec![format!(
        "{indent}{}{}</h{}>",
        heading_open.0,
        escape_html(&slot.title),
        heading_open.1
    )];
    lines.push(format!("{indent}{list_open}"));
    for bullet in &slot.bullets {
        lines.push(format!("{indent}  <li>{}</li>", escape_html(bullet)));
    }
    lines.push(format!("{indent}</ul>"));

    Ok(format!(
        "{}\n{}\n{}{}",
        &doc_text[..span.inner_start],
        lines.join("\n"),
        outer_indent,
        &doc_text[span.inner_end..]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RESUME_HTML;

    fn slot(title: &str) -> ResumeSlot {
        ResumeSlot {
            title: title.to_string(),
            bullets: vec![
                "Built a <fast> & tiny UI".to_string(),
                "Shipped it".to_string(),
            ],
        }
    }

    #[test]
    fn test_list_slots_reads_titles_and_bullets() {
        let slots = list_slots(RESUME_HTML).unwrap();
        let titles: Vec<&str> = slots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Trail Finder", "Budget Bot", "Pixel Forge"]);
        assert_eq!(slots[0].bullets.len(), 2);
        assert_eq!(
            slots[1].bullets,
            vec!["Parsed free-text expenses with a rule-based tokenizer"]
        );
    }

    #[test]
    fn test_replace_rewrites_only_target_slot() {
        let updated = replace_resume_slot(RESUME_HTML, 1, &slot("Hello App")).unwrap();

        let slots = list_slots(&updated).unwrap();
        assert_eq!(slots[0], list_slots(RESUME_HTML).unwrap()[0]);
        assert_eq!(slots[1].title, "Hello App");
        assert_eq!(slots[1].bullets, vec!["Built a <fast> & tiny UI", "Shipped it"]);
        assert_eq!(slots[2].title, "Pixel Forge");

        assert!(updated.contains(concat!(
            "    <div class=\"entry project\">\n",
            "      <h3 class=\"entry-title\">Hello App</h3>\n",
            "      <ul>\n",
            "        <li>Built a &lt;fast&gt; &amp; tiny UI</li>\n",
            "        <li>Shipped it</li>\n",
            "      </ul>\n",
            "    </div>\n",
        )));
        assert!(!updated.contains("Budget Bot"));

        let before_slot = RESUME_HTML.find("Budget Bot").unwrap();
        assert_eq!(updated[..before_slot - 30], RESUME_HTML[..before_slot - 30]);
        assert!(updated.ends_with("  </section>\n</body>\n</html>\n"));
    }

    #[test]
    fn test_out_of_range_index_is_invalid_slot() {
        let err = replace_resume_slot(RESUME_HTML, 3, &slot("Hello App")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidSlot { index: 3, max: 3 }));
    }

    #[test]
    fn test_missing_slots_is_malformed() {
        let doc = "<html><body><p>No projects yet</p></body></html>";
        let err = replace_resume_slot(doc, 0, &slot("Hello App")).unwrap_err();
        assert!(matches!(err, AgentError::MalformedDocument(_)));
    }

    #[test]
    fn test_second_identical_replace_is_duplicate() {
        let once = replace_resume_slot(RESUME_HTML, 2, &slot("Hello App")).unwrap();
        let err = replace_resume_slot(&once, 2, &slot("Hello App")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateEntry(_)));
    }

    #[test]
    fn test_too_many_bullets_is_content_constraint() {
        let mut big = slot("Hello App");
        big.bullets = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let err = replace_resume_slot(RESUME_HTML, 0, &big).unwrap_err();
        assert!(matches!(err, AgentError::ContentConstraint(_)));
    }

    #[test]
    fn test_class_token_must_match_exactly() {
        let doc = concat!(
            "<div class=\"projects-list\">\n",
            "  <section class='project'><h4>Solo</h4><ul><li>One</li></ul></section>\n",
            "</div>\n",
        );
        let slots = list_slots(doc).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].title, "Solo");

        let updated = replace_resume_slot(doc, 0, &slot("Hello App")).unwrap();
        assert!(updated.contains("<h4>Hello App</h4>"));
        assert!(updated.starts_with("<div class=\"projects-list\">\n  <section class='project'>\n"));
    }
}
