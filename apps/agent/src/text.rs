//! Small text helpers shared by analysis, generation and the document mutator.

/// Truncates to at most `max_chars` characters on a char boundary,
/// preferring the last word break and marking the cut with an ellipsis.
pub fn clip_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > cut.len() / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches(|c: char| c.is_whitespace() || c == ','))
}

/// Comparison key: lowercase alphanumerics only, so "My-App" and "my app"
/// collide.
pub fn normalize_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collapses runs of whitespace (including newlines) to single spaces.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
