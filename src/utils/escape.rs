use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref UNICODE_ESCAPE: Regex = Regex::new(r"\\+u[0-9A-Fa-f]{4}").unwrap();
}

/// Upper bound on clean-up passes; inputs escaped deeper than this are left as-is.
const MAX_PASSES: usize = 6;

/// Unescapes common HTML entities back to their raw characters.
pub fn unescape_html_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Removes HTML tags, keeping the text between them.
pub fn strip_tags(s: &str) -> String {
    HTML_TAG.replace_all(s, "").into_owned()
}

/// Resolves one level of JSON string escapes (`\uXXXX`, `\/`, `\"`, `\\`, `\n`).
///
/// Unlike `serde_json`, this tolerates fragments cut out of a larger document
/// by a regex, where a dangling or unknown escape is kept verbatim.
pub fn decode_json_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('/') => {
                chars.next();
                out.push('/');
            }
            Some('"') => {
                chars.next();
                out.push('"');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('u') => {
                let hex: String = chars.clone().skip(1).take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        chars.nth(4);
                        out.push(decoded);
                    }
                    _ => out.push('\\'),
                }
            }
            _ => out.push('\\'),
        }
    }

    out
}

/// Cleans a media URL lifted out of page source.
///
/// Escape sequences and `&amp;` are resolved repeatedly until the URL stops
/// changing, so double-escaped values (`\\u0026`, `\\/`) converge too.
pub fn clean_url(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    for _ in 0..MAX_PASSES {
        let next = decode_json_escapes(&current).replace("&amp;", "&");
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_text_once(s: &str) -> String {
    let s = s
        .replace("\\n", "\n")
        .replace("\\r", "")
        .replace("\\t", " ")
        .replace("\\\"", "\"");
    let s = UNICODE_ESCAPE.replace_all(&s, "");
    let s = s.replace("\\/", "/").replace("\\\\", "\\");
    let s = unescape_html_entities(&s);
    strip_tags(&s).trim().to_string()
}

/// Turns an extracted caption fragment into plain text.
///
/// Unescapes newline and quote escapes, drops `\uXXXX` sequences, collapses
/// escaped slashes, decodes common entities, strips tags and trims. Applied
/// until it reaches a fixed point, so running it twice changes nothing.
pub fn clean_caption_text(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAX_PASSES {
        let next = clean_text_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}
