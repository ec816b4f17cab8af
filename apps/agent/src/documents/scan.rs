//! Minimal structural scan of JavaScript/TypeScript source.
//!
//! Not a parser: it only knows enough to skip string literals and comments
//! while matching brackets, which is all the portfolio mutator needs.

/// If a string literal or comment starts at `i`, returns the index just past
/// its end (or the text length when unterminated).
fn skip_literal(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        quote @ (b'"' | b'\'' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b if b == quote => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p),
        ),
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| i + 2 + p + 2),
        ),
        _ => None,
    }
}

fn is_open(b: u8) -> bool {
    matches!(b, b'[' | b'{' | b'(')
}

fn is_close(b: u8) -> bool {
    matches!(b, b']' | b'}' | b')')
}

/// Index of the bracket closing the one at `open`.
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !is_open(*bytes.get(open)?) {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if is_open(bytes[i]) {
            depth += 1;
        } else if is_close(bytes[i]) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Spans (`start..=end`, braces included) of the object literals directly
/// inside the array delimited by `open..=close`.
pub fn top_level_objects(text: &str, open: usize, close: usize) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = open + 1;

    while i < close {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => match find_matching(text, i) {
                Some(end) if end < close => {
                    spans.push((i, end));
                    i = end + 1;
                }
                _ => break,
            },
            b'[' | b'(' => match find_matching(text, i) {
                Some(end) => i = end + 1,
                None => break,
            },
            _ => i += 1,
        }
    }
    spans
}

/// Byte offsets where the keys of an object literal's own properties start.
/// Keys of nested objects are not reported.
pub fn top_level_key_positions(object: &str) -> Vec<usize> {
    let bytes = object.as_bytes();
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut expect_key = false;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            // Quoted keys (`"title": ...`) count as keys too.
            if expect_key && depth == 1 && bytes[i] != b'/' {
                positions.push(i);
                expect_key = false;
            }
            i = next;
            continue;
        }
        let b = bytes[i];
        if is_open(b) {
            depth += 1;
            expect_key = depth == 1 && b == b'{';
        } else if is_close(b) {
            depth = depth.saturating_sub(1);
        } else if depth == 1 && b == b',' {
            expect_key = true;
        } else if expect_key && depth == 1 && (b.is_ascii_alphabetic() || b == b'_' || b == b'$')
        {
            positions.push(i);
            expect_key = false;
        }
        i += 1;
    }
    positions
}

/// Contents of the string literals in `text`, in order, with the common
/// escapes resolved. Comments are skipped.
pub fn string_literals(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match skip_literal(bytes, i) {
            Some(next) => {
                if bytes[i] != b'/' {
                    let terminated = next > i + 1 && bytes[next - 1] == bytes[i];
                    let end = if terminated { next - 1 } else { bytes.len() };
                    literals.push(unescape(&text[i + 1..end]));
                }
                i = next;
            }
            None => i += 1,
        }
    }
    literals
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
