use serde_json::Value;

/// Maximum nesting depth explored by [`find_key`].
pub const MAX_SEARCH_DEPTH: usize = 32;

/// Extracts the balanced JSON object starting at the first `{` at or after `from`.
///
/// Tracks brace depth while skipping over string literals, so braces inside
/// captions do not end the object early.
pub fn balanced_object_at(text: &str, from: usize) -> Option<&str> {
    let rest = text.get(from..)?;
    let brace_offset = rest.find('{')?;
    let obj_start = from + brace_offset;

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[obj_start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[obj_start..obj_start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Returns every balanced object that directly follows `needle`, in document order.
pub fn objects_after<'a>(text: &'a str, needle: &str) -> Vec<&'a str> {
    text.match_indices(needle)
        .filter_map(|(pos, _)| {
            let after = pos + needle.len();
            // Only accept an object that starts right after the key.
            let gap = text.get(after..)?.find(|c: char| !c.is_whitespace())?;
            if text[after + gap..].starts_with('{') {
                balanced_object_at(text, after + gap)
            } else {
                None
            }
        })
        .collect()
}

/// Reads the JSON string literal whose opening quote sits at `quote_pos`,
/// returning its decoded value.
pub fn string_literal_at(text: &str, quote_pos: usize) -> Option<String> {
    let bytes = text.as_bytes();
    if bytes.get(quote_pos) != Some(&b'"') {
        return None;
    }

    let mut i = quote_pos + 1;
    let mut escape = false;
    while i < bytes.len() {
        if escape {
            escape = false;
        } else if bytes[i] == b'\\' {
            escape = true;
        } else if bytes[i] == b'"' {
            break;
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    serde_json::from_str(&text[quote_pos..=i]).ok()
}

/// Depth-first search for the first value stored under `key`, visiting object
/// members in insertion order. Gives up below [`MAX_SEARCH_DEPTH`].
pub fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    find_key_bounded(value, key, 0)
}

fn find_key_bounded<'a>(value: &'a Value, key: &str, depth: usize) -> Option<&'a Value> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key).filter(|v| !v.is_null()) {
                return Some(found);
            }
            map.values()
                .find_map(|child| find_key_bounded(child, key, depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|child| find_key_bounded(child, key, depth + 1)),
        _ => None,
    }
}

/// Follows a `/`-separated path of object keys and array indices.
pub fn at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/').try_fold(value, |current, segment| {
        match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index),
            _ => current.get(segment),
        }
    })
}

/// String at `path`, skipping empty strings.
pub fn str_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    at_path(value, path)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Non-negative integer at `path`. Accepts floats and numeric strings, which
/// some payloads use for counts.
pub fn u64_at(value: &Value, path: &str) -> Option<u64> {
    let v = at_path(value, path)?;
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

/// Floating-point number at `path`.
pub fn f64_at(value: &Value, path: &str) -> Option<f64> {
    at_path(value, path).and_then(|v| v.as_f64())
}
