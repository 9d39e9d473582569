//! Single-field extractors: thumbnail, caption and author.
//!
//! Each one is an ordered list of heuristics over the raw page; the first tier
//! that yields something wins.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::types::UNKNOWN_AUTHOR;
use crate::utils::escape::{clean_caption_text, clean_url, strip_tags, unescape_html_entities};
use crate::utils::instagram::extract_post_id;

/// Phrases that mark "related content" widgets rather than a caption.
pub const BOILERPLATE_PHRASES: [&str; 3] = ["more posts", "see more", "related posts"];

/// Path segments that are never usernames.
const RESERVED_SEGMENTS: [&str; 12] = [
    "p", "reel", "reels", "tv", "stories", "explore", "accounts", "www", "static", "rsrc.php",
    "images", "api",
];

/// Substrings that mark a static asset path rather than a username.
const ASSET_MARKERS: [&str; 5] = ["static", "rsrc", ".php", ".js", ".css"];

const THUMBNAIL_SOURCES: [&str; 3] = ["og:image", "twitter:image", "og:image:url"];

const MIN_CAPTION_LEN: usize = 10;

/// How far (in characters) a caption may sit from its post-id marker.
const CAPTION_WINDOW: usize = 1500;

lazy_static! {
    /// Markup regions that tend to hold the caption.
    static ref CAPTION_REGIONS: [Regex; 4] = [
        Regex::new(r"(?s)<h1[^>]*>(.*?)</h1>").unwrap(),
        Regex::new(r#"(?s)<span[^>]*class="[^"]*_ap3a[^"]*"[^>]*>(.*?)</span>"#).unwrap(),
        Regex::new(r#"(?s)<div[^>]*class="[^"]*(?:Caption|caption)[^"]*"[^>]*>(.*?)</div>"#).unwrap(),
        Regex::new(r#"(?s)<span[^>]*dir="auto"[^>]*>(.*?)</span>"#).unwrap(),
    ];

    static ref GENERIC_CAPTION_PATTERNS: [Regex; 5] = [
        Regex::new(r#""edge_media_to_caption":\{"edges":\[\{"node":\{"text":"((?:[^"\\]|\\.)*)""#).unwrap(),
        Regex::new(r#""caption":\{[^{}]*?"text":"((?:[^"\\]|\\.)*)""#).unwrap(),
        Regex::new(r#""caption":"((?:[^"\\]|\\.)*)""#).unwrap(),
        Regex::new(r#""node":\{"text":"((?:[^"\\]|\\.)*)""#).unwrap(),
        Regex::new(r#"":"((?:[^"\\]|\\.)*#[\p{L}\p{N}_](?:[^"\\]|\\.)*)""#).unwrap(),
    ];

    /// Caption shapes anchored just after a `"code":"<id>"` marker.
    static ref CAPTION_AFTER_ID: Regex = Regex::new(
        r#"(?s)^.{0,1500}?"caption":\{[^{}]*?"text":"((?:[^"\\]|\\.)*)""#
    ).unwrap();
    static ref EDGE_CAPTION_AFTER_ID: Regex = Regex::new(
        r#"(?s)^.{0,1500}?"edge_media_to_caption":\{"edges":\[\{"node":\{"text":"((?:[^"\\]|\\.)*)""#
    ).unwrap();
    /// A complete caption object, checked against a later post-id marker.
    static ref CAPTION_BEFORE_ID: Regex = Regex::new(
        r#""caption":\{[^{}]*?"text":"((?:[^"\\]|\\.)*)"[^{}]*\}"#
    ).unwrap();

    static ref META_TAG: Regex =
        Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap();
    static ref TAG_ATTRIBUTE: Regex =
        Regex::new(r#"([A-Za-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();

    static ref QUOTED_SEGMENT: Regex = Regex::new(r#""([^"]*#[^"]*)""#).unwrap();
    static ref ARTICLE_BLOCK: Regex = Regex::new(r"(?s)<article[^>]*>(.*?)</article>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();

    static ref HTML_PROFILE_URL: Regex =
        Regex::new(r#"https?:(?:\\?/){2}(?:www\.)?instagram\.com(?:\\?/)([^/\\?#\s"']+)"#).unwrap();

    static ref USERNAME_PATTERNS: [Regex; 4] = [
        Regex::new(r#""username":"([A-Za-z0-9_.]+)""#).unwrap(),
        Regex::new(r#""owner":\{[^{}]*?"username":"([A-Za-z0-9_.]+)""#).unwrap(),
        Regex::new(r#""user":\{[^{}]*?"username":"([A-Za-z0-9_.]+)""#).unwrap(),
        Regex::new(r#""account_username":"([A-Za-z0-9_.]+)""#).unwrap(),
    ];

    static ref TITLE_HANDLE: Regex = Regex::new(r"\(@([A-Za-z0-9_.]+)\)").unwrap();
    static ref ON_INSTAGRAM_SUFFIX: Regex = Regex::new(r"(?is)\s+on instagram.*$").unwrap();
    static ref BULLET_SUFFIX: Regex = Regex::new(r"(?s)\s*•.*$").unwrap();
    static ref PAREN_SUFFIX: Regex = Regex::new(r"(?s)\s*\(.*$").unwrap();
}

/// Reads the `content` of a `<meta>` tag keyed by `property` or `name`,
/// accepting either attribute order and either quote style.
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut keyed = false;
        let mut content = None;
        for caps in TAG_ATTRIBUTE.captures_iter(tag.as_str()) {
            let name = &caps[1];
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            if name.eq_ignore_ascii_case("property") || name.eq_ignore_ascii_case("name") {
                keyed |= value == key;
            } else if name.eq_ignore_ascii_case("content") {
                content = Some(value);
            }
        }

        let value = unescape_html_entities(content.filter(|_| keyed)?);
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn contains_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p))
}

fn has_hashtag(text: &str) -> bool {
    text.contains('#')
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

// --- thumbnail ---

/// Picks the best preview image from the page's meta tags.
///
/// A CDN-hosted value wins; otherwise the first present one; otherwise "".
pub fn extract_thumbnail(html: &str) -> String {
    let candidates: Vec<String> = THUMBNAIL_SOURCES
        .iter()
        .filter_map(|key| meta_content(html, key))
        .map(|v| clean_url(&v))
        .collect();

    candidates
        .iter()
        .find(|url| url.contains("cdninstagram"))
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_default()
}

// --- caption ---

/// Final caption clean-up applied whatever tier produced the text.
///
/// Returns an empty string for captions that are too short or still look like
/// page boilerplate.
pub fn finalize_caption(raw: &str) -> String {
    let cleaned = clean_caption_text(raw);
    if char_len(&cleaned) < MIN_CAPTION_LEN || contains_boilerplate(&cleaned) {
        return String::new();
    }
    cleaned
}

fn caption_from_markup(html: &str, _url: &str) -> Option<String> {
    CAPTION_REGIONS
        .iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_caption_text(&strip_tags(m.as_str())))
        .filter(|text| {
            has_hashtag(text) && char_len(text) > 20 && !contains_boilerplate(text)
        })
        .longest()
}

/// Byte offsets just past every `"<key>":"<post_id>"` marker, in document order.
fn id_marker_ends(html: &str, keys: &[&str], post_id: &str) -> Vec<usize> {
    let mut ends: Vec<usize> = keys
        .iter()
        .flat_map(|key| {
            let marker = format!("\"{key}\":\"{post_id}\"");
            html.match_indices(&marker)
                .map(|(pos, _)| pos + marker.len())
                .collect::<Vec<_>>()
        })
        .collect();
    ends.sort_unstable();
    ends
}

/// The first `n` characters of `text`.
fn char_window(text: &str, n: usize) -> &str {
    text.char_indices().nth(n).map_or(text, |(i, _)| &text[..i])
}

fn caption_for_post_id(html: &str, url: &str) -> Option<String> {
    let post_id = extract_post_id(url)?;
    let long_enough = |text: String| (char_len(&text) > 10).then_some(text);
    let capture_after = |re: &Regex, ends: &[usize]| {
        ends.iter()
            .find_map(|&end| Some(re.captures(&html[end..])?.get(1)?.as_str().to_string()))
    };

    let after_code = id_marker_ends(html, &["code", "shortcode"], &post_id);
    let after_shortcode = id_marker_ends(html, &["shortcode"], &post_id);
    let markers = [
        format!("\"code\":\"{post_id}\""),
        format!("\"shortcode\":\"{post_id}\""),
    ];
    let window = CAPTION_WINDOW + markers[1].len();

    capture_after(&*CAPTION_AFTER_ID, &after_code)
        .and_then(long_enough)
        .or_else(|| capture_after(&*EDGE_CAPTION_AFTER_ID, &after_shortcode).and_then(long_enough))
        .or_else(|| {
            CAPTION_BEFORE_ID
                .captures_iter(html)
                .find_map(|caps| {
                    let tail = char_window(&html[caps.get(0)?.end()..], window);
                    markers
                        .iter()
                        .any(|m| tail.contains(m.as_str()))
                        .then(|| caps[1].to_string())
                })
                .and_then(long_enough)
        })
}

fn caption_from_json(html: &str, _url: &str) -> Option<String> {
    let matches: Vec<String> = GENERIC_CAPTION_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|text| !contains_boilerplate(text))
        .collect();

    let tagged = matches
        .iter()
        .filter(|text| has_hashtag(text))
        .cloned()
        .longest();
    tagged.or_else(|| matches.into_iter().find(|text| char_len(text) > 10))
}

fn caption_from_meta_description(html: &str, _url: &str) -> Option<String> {
    let description = meta_content(html, "og:description")
        .or_else(|| meta_content(html, "description"))?;
    if !has_hashtag(&description) {
        return None;
    }

    if let Some(quoted) = QUOTED_SEGMENT.captures(&description).and_then(|c| c.get(1)) {
        return Some(quoted.as_str().to_string());
    }

    let rest = description
        .split_once(": ")
        .map(|(_, rest)| rest.to_string());
    Some(rest.unwrap_or(description))
}

fn caption_from_article(html: &str, _url: &str) -> Option<String> {
    let block = ARTICLE_BLOCK.captures(html)?.get(1)?.as_str();
    let text = ANY_TAG.replace_all(block, "\n");

    text.lines()
        .map(str::trim)
        .find(|line| {
            let len = char_len(line);
            has_hashtag(line) && len > 20 && len < 500
        })
        .map(String::from)
}

type FieldTier = fn(&str, &str) -> Option<String>;

const CAPTION_TIERS: [FieldTier; 5] = [
    caption_from_markup,
    caption_for_post_id,
    caption_from_json,
    caption_from_meta_description,
    caption_from_article,
];

/// Resolves the post caption from raw HTML. Returns "" when nothing usable is found.
pub fn extract_caption(html: &str, url: &str) -> String {
    let raw = CAPTION_TIERS
        .iter()
        .find_map(|tier| tier(html, url).filter(|text| !text.trim().is_empty()))
        .unwrap_or_default();
    finalize_caption(&raw)
}

/// Longest-string selection with first-wins tie breaking.
trait LongestFirst: Iterator<Item = String> + Sized {
    fn longest(self) -> Option<String> {
        self.fold(None, |best: Option<String>, text| match best {
            Some(current) if char_len(&current) >= char_len(&text) => Some(current),
            _ => Some(text),
        })
    }
}

impl<I: Iterator<Item = String>> LongestFirst for I {}

// --- author ---

fn is_asset_like(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    ASSET_MARKERS.iter().any(|m| lower.contains(m))
}

fn acceptable_segment(segment: &str) -> bool {
    segment.len() > 1
        && !RESERVED_SEGMENTS.contains(&segment.to_ascii_lowercase().as_str())
        && !is_asset_like(segment)
}

fn author_from_url(_html: &str, url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let first = parsed.path_segments()?.find(|s| !s.is_empty())?;
    acceptable_segment(first).then(|| first.to_string())
}

fn author_from_embedded_url(html: &str, _url: &str) -> Option<String> {
    let segment = HTML_PROFILE_URL.captures(html)?.get(1)?.as_str();
    acceptable_segment(segment).then(|| segment.to_string())
}

fn author_from_json(html: &str, _url: &str) -> Option<String> {
    USERNAME_PATTERNS.iter().find_map(|re| {
        re.captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|name| !is_asset_like(name))
            .map(String::from)
    })
}

fn author_from_title(html: &str, _url: &str) -> Option<String> {
    let title = meta_content(html, "og:title")?;

    if let Some(handle) = TITLE_HANDLE.captures(&title).and_then(|c| c.get(1)) {
        return Some(handle.as_str().to_string());
    }

    if let Some((before, _)) = title.split_once('(') {
        if !before.trim().is_empty() {
            return Some(before.trim().to_string());
        }
    }

    title
        .split('•')
        .next()
        .and_then(|head| head.split_whitespace().next())
        .map(String::from)
}

const AUTHOR_TIERS: [FieldTier; 4] = [
    author_from_url,
    author_from_embedded_url,
    author_from_json,
    author_from_title,
];

/// Strips decoration that titles and JSON add around a username.
fn tidy_author(raw: &str) -> String {
    let s = raw.replace("&quot;", "").replace(['"', '\''], "");
    let s = ON_INSTAGRAM_SUFFIX.replace(&s, "");
    let s = BULLET_SUFFIX.replace(&s, "");
    let s = PAREN_SUFFIX.replace(&s, "");
    s.trim().to_string()
}

fn is_valid_author(author: &str) -> bool {
    !author.is_empty() && !is_asset_like(author) && !author.eq_ignore_ascii_case("instagram")
}

/// Resolves the post author's username, or [`UNKNOWN_AUTHOR`].
pub fn extract_author(html: &str, url: &str) -> String {
    AUTHOR_TIERS
        .iter()
        .filter_map(|tier| tier(html, url))
        .map(|raw| tidy_author(&raw))
        .find(|author| is_valid_author(author))
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_URL: &str = "https://www.instagram.com/p/ABC123/";

    // --- meta_content ---

    #[test]
    fn meta_content_reads_both_attribute_orders() {
        let html = r#"<meta property="og:image" content="https://a/1.jpg" />
                      <meta content="Hello &amp; bye" name="description">"#;
        assert_eq!(meta_content(html, "og:image").as_deref(), Some("https://a/1.jpg"));
        assert_eq!(meta_content(html, "description").as_deref(), Some("Hello & bye"));
        assert_eq!(meta_content(html, "og:video"), None);
    }

    #[test]
    fn meta_content_keeps_the_other_quote_character() {
        let html = r#"<meta property="og:description" content="12 likes - jdoe: &quot;It's a beautiful morning by the lake #sunrise&quot;">
                      <meta property='og:title' content='Say "cheese" (@jdoe)'>"#;
        assert_eq!(
            meta_content(html, "og:description").as_deref(),
            Some("12 likes - jdoe: \"It's a beautiful morning by the lake #sunrise\"")
        );
        assert_eq!(
            meta_content(html, "og:title").as_deref(),
            Some("Say \"cheese\" (@jdoe)")
        );
    }

    #[test]
    fn meta_content_ignores_values_that_mention_the_key() {
        let html = r#"<meta name="description" content="og:image">
                      <meta property="og:image" content="https://a/2.jpg">"#;
        assert_eq!(meta_content(html, "og:image").as_deref(), Some("https://a/2.jpg"));
    }

    // --- thumbnail ---

    #[test]
    fn thumbnail_prefers_cdn_host() {
        let html = r#"<meta property="og:image" content="https://static.example.com/logo.png">
                      <meta name="twitter:image" content="https://scontent.cdninstagram.com/t.jpg?a=1&amp;b=2">"#;
        assert_eq!(
            extract_thumbnail(html),
            "https://scontent.cdninstagram.com/t.jpg?a=1&b=2"
        );
    }

    #[test]
    fn thumbnail_falls_back_to_first_or_empty() {
        let html = r#"<meta property="og:image" content="https://static.example.com/logo.png">"#;
        assert_eq!(extract_thumbnail(html), "https://static.example.com/logo.png");
        assert_eq!(extract_thumbnail("<html></html>"), "");
    }

    // --- caption ---

    #[test]
    fn caption_markup_tier_picks_longest_hashtag_text() {
        let html = r#"<h1>Short #a but long enough text</h1>
                      <h1>This is the much longer caption text #summer #beach</h1>
                      <h1>See more posts like this one #spam #spam #spam #spam</h1>"#;
        assert_eq!(
            extract_caption(html, POST_URL),
            "This is the much longer caption text #summer #beach"
        );
    }

    #[test]
    fn caption_post_id_tier_matches_the_right_post() {
        let html = r#"{"code":"OTHER","caption":{"text":"wrong caption entirely here"}}
                      {"code":"ABC123","like_count":3,"caption":{"pk":"1","text":"Right caption for this post"}}"#;
        assert_eq!(extract_caption(html, POST_URL), "Right caption for this post");
    }

    #[test]
    fn caption_json_tier_prefers_hashtags() {
        let html = r#"{"caption":"A plain caption without tags"} {"node":{"text":"Tagged caption text #tag"}}"#;
        assert_eq!(
            extract_caption(html, "https://www.instagram.com/explore/"),
            "Tagged caption text #tag"
        );
    }

    #[test]
    fn caption_json_tier_decodes_escapes() {
        let html = r#"{"edge_media_to_caption":{"edges":[{"node":{"text":"Line one\nLine two \u2764\ufe0f #love"}}]}}"#;
        assert_eq!(
            extract_caption(html, "https://www.instagram.com/explore/"),
            "Line one\nLine two  #love"
        );
    }

    #[test]
    fn caption_meta_description_tier_extracts_quoted_segment() {
        let html = r#"<meta property="og:description" content="10 likes, 2 comments - someone on May 1, 2024: &quot;Morning run by the river #fitness&quot;. ">"#;
        assert_eq!(
            extract_caption(html, "https://www.instagram.com/explore/"),
            "Morning run by the river #fitness"
        );
    }

    #[test]
    fn caption_meta_description_survives_apostrophes() {
        let html = r#"<meta property="og:description" content="12 likes - jdoe: &quot;It's a beautiful morning by the lake #sunrise&quot;">"#;
        assert_eq!(
            extract_caption(html, "https://www.instagram.com/explore/"),
            "It's a beautiful morning by the lake #sunrise"
        );
    }

    #[test]
    fn caption_post_id_tier_reads_edges_and_preceding_caption() {
        let edges = r#"{"shortcode":"ABC123","edge_media_to_caption":{"edges":[{"node":{"text":"Edge caption for this post"}}]}}"#;
        assert_eq!(caption_for_post_id(edges, POST_URL).as_deref(), Some("Edge caption for this post"));

        let before = r#"{"caption":{"text":"Caption placed before the code"},"code":"ABC123"}"#;
        assert_eq!(caption_for_post_id(before, POST_URL).as_deref(), Some("Caption placed before the code"));

        assert_eq!(caption_for_post_id(before, "https://www.instagram.com/p/ZZZ999/"), None);
    }

    #[test]
    fn caption_article_tier_scans_lines() {
        let html = "<article><div>nav</div><p>A caption found in the article body #found</p></article>";
        assert_eq!(
            extract_caption(html, "https://www.instagram.com/explore/"),
            "A caption found in the article body #found"
        );
    }

    #[test]
    fn caption_rejects_short_and_boilerplate() {
        assert_eq!(finalize_caption("tiny #x"), "");
        assert_eq!(finalize_caption("Click to see more from this creator"), "");
        assert_eq!(extract_caption("<html></html>", POST_URL), "");
    }

    #[test]
    fn caption_is_idempotent() {
        let once = finalize_caption(r#"<b>Hello there</b> friend \n#tag &amp; more"#);
        assert!(!once.is_empty());
        assert_eq!(finalize_caption(&once), once);
    }

    // --- author ---

    #[test]
    fn author_from_owner_qualified_url() {
        assert_eq!(
            extract_author("", "https://www.instagram.com/natgeo/reel/XYZ789/"),
            "natgeo"
        );
    }

    #[test]
    fn author_skips_reserved_segments() {
        let html = r#"<a href="https://www.instagram.com/travel.daily/">x</a>"#;
        assert_eq!(extract_author(html, POST_URL), "travel.daily");
    }

    #[test]
    fn author_from_json_username() {
        let html = r#"<a href="https://www.instagram.com/static/bundle.js">x</a> {"owner":{"id":"1","username":"jane_doe"}}"#;
        assert_eq!(extract_author(html, POST_URL), "jane_doe");
    }

    #[test]
    fn author_from_og_title_handle() {
        let html = r#"<meta property="og:title" content="Jane Doe (@jane.doe) • Instagram photos and videos">"#;
        assert_eq!(extract_author(html, POST_URL), "jane.doe");
    }

    #[test]
    fn author_from_og_title_with_apostrophe_in_name() {
        let html = r#"<meta property="og:title" content="Jane O'Neil (@jane.oneil) • Instagram photos and videos">"#;
        assert_eq!(extract_author(html, POST_URL), "jane.oneil");
    }

    #[test]
    fn author_from_og_title_on_instagram_suffix() {
        let html = r#"<meta property="og:title" content="jdoe on Instagram: &quot;hello&quot;">"#;
        assert_eq!(extract_author(html, POST_URL), "jdoe");
    }

    #[test]
    fn author_rejects_instagram_and_assets() {
        let html = r#"<meta property="og:title" content="Instagram">"#;
        assert_eq!(extract_author(html, POST_URL), UNKNOWN_AUTHOR);
    }
}
