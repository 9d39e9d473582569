//! Ordered extraction strategies over a post page.
//!
//! Every strategy is a plain `(html, url) -> Option<MediaRecord>` function so
//! it can be reordered, removed or tested on its own. [`run_cascade`] applies
//! them in priority order.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::fields::{extract_author, extract_caption, extract_thumbnail, finalize_caption, meta_content};
use super::normalize::normalize_media;
use super::types::{Dimensions, MediaRecord, MediaType, PostMeta, UNKNOWN_POST_ID};
use crate::utils::escape::{clean_url, decode_json_escapes};
use crate::utils::instagram::{extract_post_id, is_cdn_url, is_reel_url};
use crate::utils::json::{at_path, balanced_object_at, find_key, objects_after, str_at, string_literal_at, u64_at};

/// Precedence knobs for the "prefer video over image" heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadePolicy {
    /// Keep scanning inline `shortcode_media` blobs past an image match in
    /// case a later one is a video.
    pub prefer_video_matches: bool,
    /// Let the reel video scan replace an image result.
    pub video_override: bool,
}

impl Default for CascadePolicy {
    fn default() -> Self {
        Self {
            prefer_video_matches: true,
            video_override: true,
        }
    }
}

type Strategy = fn(&str, &str) -> Option<MediaRecord>;

/// Strategies tried before the `shortcode_media` scan, highest priority first.
const PRIMARY_STRATEGIES: [(&str, Strategy); 4] = [
    ("structured_data", from_structured_data),
    ("shared_data", from_shared_data),
    ("reel_patterns", from_reel_patterns),
    ("embedded_data", from_embedded_data),
];

/// Paths under which embedded payloads keep the post's media object.
const MEDIA_PATHS: [&str; 7] = [
    "graphql/shortcode_media",
    "shortcode_media",
    "xdt_shortcode_media",
    "gql_data/shortcode_media",
    "gql_data/xdt_shortcode_media",
    "data/xdt_shortcode_media",
    "items/0",
];

const MEDIA_KEYS: [&str; 2] = ["shortcode_media", "xdt_shortcode_media"];

lazy_static! {
    static ref LD_JSON: Regex = Regex::new(
        r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#
    ).unwrap();

    static ref SHARED_DATA: Regex = Regex::new(
        r"(?s)window\._sharedData\s*=\s*(\{.*?\});?\s*</script>"
    ).unwrap();

    static ref ADDITIONAL_DATA: Regex = Regex::new(
        r#"(?s)window\.__additionalDataLoaded\(\s*['"][^'"]*['"]\s*,\s*(\{.*?\})\s*\);"#
    ).unwrap();

    static ref SHORTCODE_MEDIA_KEY: Regex =
        Regex::new(r#""(?:xdt_)?shortcode_media":\s*\{"#).unwrap();

    static ref VIDEO_URL_FIELD: Regex = Regex::new(r#""video_url":"([^"]+)""#).unwrap();
    static ref VIDEO_VERSIONS_URL: Regex =
        Regex::new(r#""video_versions":\[\{[^\]]*?"url":"([^"]+)""#).unwrap();
    static ref CLIPS_METADATA_URL: Regex =
        Regex::new(r#"(?s)"clips_metadata":\{.{0,2000}?"(?:video_url|url)":"([^"]+)""#).unwrap();
    static ref DASH_MANIFEST: Regex =
        Regex::new(r#""dash_manifest":"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref DASH_BASE_URL: Regex = Regex::new(r"<BaseURL>([^<]+)</BaseURL>").unwrap();
    static ref CDN_MP4_URL: Regex = Regex::new(
        r#"(https?:(?:\\{0,2}/){2}[^"'\s<>]*?(?:cdninstagram\.com|fbcdn\.net)[^"'\s<>]*?\.mp4[^"'\s<>]*)"#
    ).unwrap();

    static ref ISO_DURATION: Regex =
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").unwrap();
}

/// Runs every strategy against one page and returns the winning record.
pub fn run_cascade(html: &str, url: &str, policy: &CascadePolicy) -> Option<MediaRecord> {
    let mut best = PRIMARY_STRATEGIES.iter().find_map(|(name, strategy)| {
        let record = strategy(html, url)?;
        log::debug!("[cascade] {} matched ({:?})", name, record.media_type);
        Some(record)
    });

    if best.is_none() {
        best = from_shortcode_media_scan(html, url, policy.prefer_video_matches);
    }

    let scan_for_video = match &best {
        None => true,
        Some(record) => policy.video_override && record.media_type == MediaType::Image,
    };
    if scan_for_video {
        if let Some(video) = from_reel_video_scan(html, url, best.as_ref()) {
            log::debug!("[cascade] reel video scan produced a video record");
            best = Some(video);
        }
    }

    best.or_else(|| {
        let record = from_meta_tags(html, url)?;
        log::debug!("[cascade] meta tag fallback matched ({:?})", record.media_type);
        Some(record)
    })
}

/// Metadata resolved from the page itself rather than from a JSON payload.
fn page_meta(html: &str, url: &str) -> PostMeta {
    PostMeta {
        author: extract_author(html, url),
        caption: extract_caption(html, url),
        is_reel: is_reel_url(url),
        ..PostMeta::new(extract_post_id(url).unwrap_or_else(|| UNKNOWN_POST_ID.to_string()))
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

// --- 1. structured data ---

/// Objects worth inspecting inside one `ld+json` document.
fn ld_nodes(value: &Value) -> Vec<&Value> {
    let mut roots: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
        roots.extend(graph.iter());
    }

    let mut nodes = Vec::new();
    for root in roots {
        nodes.push(root);
        match root.get("video") {
            Some(Value::Array(videos)) => nodes.extend(videos.iter()),
            Some(video @ Value::Object(_)) => nodes.push(video),
            _ => {}
        }
    }
    nodes
}

fn ld_author(node: &Value) -> Option<String> {
    let author = match node.get("author")? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let name = match author {
        Value::String(s) => s.as_str(),
        obj => str_at(obj, "alternateName")
            .or_else(|| str_at(obj, "identifier/value"))
            .or_else(|| str_at(obj, "name"))?,
    };
    let name = name.trim().trim_start_matches('@');
    (!name.is_empty()).then(|| name.to_string())
}

fn ld_thumbnail(node: &Value) -> Option<String> {
    let thumb = match node.get("thumbnailUrl")? {
        Value::Array(items) => items.first()?.as_str()?,
        other => other.as_str()?,
    };
    Some(clean_url(thumb))
}

/// Parses an ISO-8601 duration such as `PT1M5.5S` into seconds.
fn parse_iso_duration(raw: &str) -> Option<f64> {
    let caps = ISO_DURATION.captures(raw.trim())?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let seconds = part(1) * 86_400.0 + part(2) * 3_600.0 + part(3) * 60.0 + part(4);
    (raw.len() > 2).then_some(seconds)
}

fn ld_interaction(node: &Value, action: &str) -> Option<u64> {
    let stats = match node.get("interactionStatistic")? {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };
    stats.into_iter().find_map(|stat| {
        let kind = stat
            .get("interactionType")
            .and_then(|t| t.as_str().or_else(|| str_at(t, "@type")))?;
        if kind.ends_with(action) {
            u64_at(stat, "userInteractionCount")
        } else {
            None
        }
    })
}

fn video_from_ld(node: &Value, html: &str, url: &str) -> Option<MediaRecord> {
    let video_url = clean_url(str_at(node, "contentUrl")?);

    let caption = str_at(node, "description")
        .or_else(|| str_at(node, "caption"))
        .or_else(|| str_at(node, "name"))
        .map(finalize_caption)
        .and_then(non_empty)
        .unwrap_or_else(|| extract_caption(html, url));

    let timestamp = str_at(node, "uploadDate")
        .or_else(|| str_at(node, "dateCreated"))
        .or_else(|| str_at(node, "datePublished"))
        .and_then(|d| OffsetDateTime::parse(d, &Rfc3339).ok())
        .map(|d| d.unix_timestamp());

    let mut meta = PostMeta {
        author: ld_author(node).unwrap_or_else(|| extract_author(html, url)),
        caption,
        likes: ld_interaction(node, "LikeAction").unwrap_or(0),
        comments: u64_at(node, "commentCount")
            .or_else(|| ld_interaction(node, "CommentAction"))
            .unwrap_or(0),
        is_reel: is_reel_url(url),
        ..PostMeta::new(extract_post_id(url).unwrap_or_else(|| UNKNOWN_POST_ID.to_string()))
    };
    if let Some(ts) = timestamp {
        meta.timestamp = ts;
    }

    let dims = Dimensions {
        width: u64_at(node, "width").unwrap_or(0) as u32,
        height: u64_at(node, "height").unwrap_or(0) as u32,
    };
    let thumbnail = ld_thumbnail(node).or_else(|| non_empty(extract_thumbnail(html)));

    let mut record = MediaRecord::video(meta, Some(video_url), thumbnail, dims);
    record.duration = Some(
        str_at(node, "duration")
            .and_then(parse_iso_duration)
            .unwrap_or(0.0),
    );
    record.view_count = Some(ld_interaction(node, "WatchAction").unwrap_or(0));
    Some(record)
}

/// Strategy 1: `application/ld+json` blocks exposing a `contentUrl`.
pub fn from_structured_data(html: &str, url: &str) -> Option<MediaRecord> {
    LD_JSON
        .captures_iter(html)
        .filter_map(|caps| serde_json::from_str::<Value>(caps.get(1)?.as_str().trim()).ok())
        .find_map(|doc| {
            ld_nodes(&doc)
                .into_iter()
                .find_map(|node| video_from_ld(node, html, url))
        })
}

// --- 2. page-state graph ---

/// Strategy 2: the `window._sharedData` page-state assignment.
pub fn from_shared_data(html: &str, url: &str) -> Option<MediaRecord> {
    let json = SHARED_DATA.captures(html)?.get(1)?.as_str();
    let state: Value = serde_json::from_str(json).ok()?;
    let media = at_path(&state, "entry_data/PostPage/0/graphql/shortcode_media")?;
    normalize_media(media, url)
}

// --- 3. reel-specific patterns ---

fn dash_manifest_url(html: &str) -> Option<String> {
    DASH_MANIFEST.captures_iter(html).find_map(|caps| {
        let manifest = decode_json_escapes(caps.get(1)?.as_str());
        let base = DASH_BASE_URL.captures(&manifest)?.get(1)?.as_str();
        Some(clean_url(base))
    })
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_url(m.as_str()))
}

/// Strategy 3: direct video fields (clips metadata, `video_url`, version
/// lists, DASH manifests) on the Instagram CDN, combined with the page-level
/// thumbnail, caption and author.
pub fn from_reel_patterns(html: &str, url: &str) -> Option<MediaRecord> {
    let video_url = [&*CLIPS_METADATA_URL, &*VIDEO_URL_FIELD, &*VIDEO_VERSIONS_URL]
        .into_iter()
        .filter_map(|re| first_capture(re, html))
        .chain(dash_manifest_url(html))
        .find(|candidate| is_cdn_url(candidate))?;

    let thumbnail = non_empty(extract_thumbnail(html));
    Some(MediaRecord::video(
        page_meta(html, url),
        Some(video_url),
        thumbnail,
        Dimensions::default(),
    ))
}

// --- 4. alternate embedded data ---

fn additional_data_roots(html: &str) -> Vec<Value> {
    ADDITIONAL_DATA
        .captures_iter(html)
        .filter_map(|caps| serde_json::from_str(caps.get(1)?.as_str()).ok())
        .collect()
}

/// The double-encoded `"contextJSON":"..."` string of embed pages.
fn context_json_roots(html: &str) -> Vec<Value> {
    let needle = "\"contextJSON\":";
    html.match_indices(needle)
        .filter_map(|(pos, _)| {
            let inner = string_literal_at(html, pos + needle.len())?;
            serde_json::from_str(&inner).ok()
        })
        .collect()
}

fn keyed_object_roots(html: &str, key: &str) -> Vec<Value> {
    objects_after(html, key)
        .into_iter()
        .filter_map(|json| serde_json::from_str(json).ok())
        .collect()
}

fn graphql_roots(html: &str) -> Vec<Value> {
    keyed_object_roots(html, "\"graphql\":")
}

fn web_info_roots(html: &str) -> Vec<Value> {
    keyed_object_roots(html, "\"xdt_api__v1__media__shortcode__web_info\":")
}

/// Finds the post's media object inside an embedded payload.
fn locate_media(root: &Value) -> Option<&Value> {
    MEDIA_PATHS
        .iter()
        .filter_map(|path| at_path(root, path))
        .find(|v| v.is_object())
        .or_else(|| {
            MEDIA_KEYS
                .iter()
                .find_map(|key| find_key(root, key).filter(|v| v.is_object()))
        })
}

/// Strategy 4: other embedded payloads that nest a media object.
pub fn from_embedded_data(html: &str, url: &str) -> Option<MediaRecord> {
    let finders: [fn(&str) -> Vec<Value>; 4] = [
        additional_data_roots,
        context_json_roots,
        graphql_roots,
        web_info_roots,
    ];

    finders.iter().find_map(|finder| {
        finder(html)
            .iter()
            .find_map(|root| normalize_media(locate_media(root)?, url))
    })
}

// --- 5. inline shortcode_media scan ---

/// Strategy 5: every inline `shortcode_media` object, in document order.
///
/// With `prefer_video` the first video wins over an earlier image.
pub fn from_shortcode_media_scan(html: &str, url: &str, prefer_video: bool) -> Option<MediaRecord> {
    let mut first_image: Option<MediaRecord> = None;

    for found in SHORTCODE_MEDIA_KEY.find_iter(html) {
        let Some(json) = balanced_object_at(html, found.end() - 1) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json) else {
            continue;
        };
        let Some(record) = normalize_media(&value, url) else {
            continue;
        };

        if record.is_video() || !prefer_video {
            return Some(record);
        }
        first_image.get_or_insert(record);
    }

    first_image
}

// --- 6. reel video scan ---

fn is_playable_video_url(url: &str) -> bool {
    url != "video_versions" && is_cdn_url(url) && url.contains(".mp4")
}

/// Strategy 6: looks for any playable CDN `.mp4` URL. Builds on `prior` when
/// an image record was already found.
pub fn from_reel_video_scan(html: &str, url: &str, prior: Option<&MediaRecord>) -> Option<MediaRecord> {
    let patterns = [
        &*VIDEO_URL_FIELD,
        &*VIDEO_VERSIONS_URL,
        &*CDN_MP4_URL,
        &*CLIPS_METADATA_URL,
    ];

    let video_url = patterns
        .into_iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1).map(|m| clean_url(m.as_str())))
        .find(|candidate| is_playable_video_url(candidate))?;

    let (meta, thumbnail, dims) = match prior {
        Some(record) => {
            let mut meta = record.meta();
            meta.is_reel = meta.is_reel || is_reel_url(url);
            let thumbnail = record.image_url.clone().or_else(|| record.thumbnail.clone());
            let dims = record
                .images
                .as_ref()
                .and_then(|images| images.first())
                .map(|q| Dimensions { width: q.width, height: q.height })
                .unwrap_or_default();
            (meta, thumbnail, dims)
        }
        None => (page_meta(html, url), non_empty(extract_thumbnail(html)), Dimensions::default()),
    };

    let mut record = MediaRecord::video(meta, Some(video_url), thumbnail, dims);
    if let Some(prior) = prior {
        record.is_carousel = prior.is_carousel;
        record.items = prior.items.clone();
    }
    Some(record)
}

// --- 7. meta tags ---

fn meta_dimensions(html: &str, prefix: &str) -> Dimensions {
    let read = |suffix: &str| {
        meta_content(html, &format!("{prefix}:{suffix}"))
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
    };
    Dimensions {
        width: read("width"),
        height: read("height"),
    }
}

/// Strategy 7: Open Graph tags. Reel pages are typed as video even when only
/// an image tag is present.
pub fn from_meta_tags(html: &str, url: &str) -> Option<MediaRecord> {
    let video_url = ["og:video:secure_url", "og:video", "og:video:url"]
        .iter()
        .find_map(|key| meta_content(html, key))
        .map(|v| clean_url(&v));
    let image_url = meta_content(html, "og:image").map(|v| clean_url(&v));

    if video_url.is_none() && image_url.is_none() {
        return None;
    }

    let mut meta = page_meta(html, url);
    if meta.caption.is_empty() {
        if let Some(description) = meta_content(html, "og:description") {
            meta.caption = finalize_caption(&description);
        }
    }

    if video_url.is_some() || meta.is_reel {
        let dims = meta_dimensions(html, "og:video");
        return Some(MediaRecord::video(meta, video_url, image_url, dims));
    }

    let dims = meta_dimensions(html, "og:image");
    image_url.map(|image| MediaRecord::image(meta, image, dims))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_URL: &str = "https://www.instagram.com/p/ABC123/";
    const REEL_URL: &str = "https://www.instagram.com/reel/XYZ789/";

    fn cascade(html: &str, url: &str) -> Option<MediaRecord> {
        run_cascade(html, url, &CascadePolicy::default())
    }

    // --- structured data ---

    #[test]
    fn structured_data_video_wins() {
        let html = r#"<script type="application/ld+json">
            {"@type":"VideoObject","contentUrl":"https:\/\/scontent.cdninstagram.com\/v.mp4",
             "description":"Trail running in the alps #run","uploadDate":"2024-03-01T12:00:00+00:00",
             "duration":"PT1M5S","thumbnailUrl":["https://scontent.cdninstagram.com/t.jpg"],
             "author":{"@type":"Person","alternateName":"@alpine_runner"},
             "interactionStatistic":[{"interactionType":"http://schema.org/LikeAction","userInteractionCount":42}]}
            </script>"#;

        let record = cascade(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert_eq!(record.video_url.as_deref(), Some("https://scontent.cdninstagram.com/v.mp4"));
        assert_eq!(record.author, "alpine_runner");
        assert_eq!(record.caption, "Trail running in the alps #run");
        assert_eq!(record.timestamp, 1_709_294_400);
        assert_eq!(record.duration, Some(65.0));
        assert_eq!(record.likes, 42);
        assert_eq!(record.post_id, "ABC123");
        assert_eq!(record.thumbnail.as_deref(), Some("https://scontent.cdninstagram.com/t.jpg"));
    }

    #[test]
    fn structured_data_without_content_url_is_skipped() {
        let html = r#"<script type="application/ld+json">{"@type":"ImageObject","name":"x"}</script>"#;
        assert!(from_structured_data(html, POST_URL).is_none());
    }

    #[test]
    fn iso_durations_parse() {
        assert_eq!(parse_iso_duration("PT15S"), Some(15.0));
        assert_eq!(parse_iso_duration("PT1H2M3.5S"), Some(3723.5));
        assert_eq!(parse_iso_duration("nonsense"), None);
    }

    // --- shared data ---

    #[test]
    fn shared_data_graph_is_normalized() {
        let html = r#"<script>window._sharedData = {"entry_data":{"PostPage":[{"graphql":{"shortcode_media":
            {"shortcode":"ABC123","is_video":false,"display_url":"https://scontent.cdninstagram.com/a.jpg",
             "owner":{"username":"sharer"}}}}]}};</script>"#;

        let record = cascade(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Image);
        assert_eq!(record.author, "sharer");
        assert_eq!(record.image_url.as_deref(), Some("https://scontent.cdninstagram.com/a.jpg"));
    }

    // --- reel patterns ---

    #[test]
    fn reel_pattern_combines_page_fields() {
        let html = r#"<meta property="og:image" content="https://scontent.cdninstagram.com/thumb.jpg">
            <script>{"video_url":"https:\/\/scontent.cdninstagram.com\/o1\/reel.mp4?x=1&y=2"}</script>"#;

        let record = from_reel_patterns(html, "https://www.instagram.com/dancer/reel/XYZ789/").unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert_eq!(
            record.video_url.as_deref(),
            Some("https://scontent.cdninstagram.com/o1/reel.mp4?x=1&y=2")
        );
        assert_eq!(record.thumbnail.as_deref(), Some("https://scontent.cdninstagram.com/thumb.jpg"));
        assert_eq!(record.author, "dancer");
        assert_eq!(record.post_id, "XYZ789");
        assert!(record.is_reel);
    }

    #[test]
    fn reel_pattern_reads_dash_manifest() {
        let html = r#"{"dash_manifest":"<MPD><BaseURL>https://video.xx.fbcdn.net/v/dash.mp4?a=1&amp;b=2</BaseURL></MPD>"}"#;
        let record = from_reel_patterns(html, REEL_URL).unwrap();
        assert_eq!(
            record.video_url.as_deref(),
            Some("https://video.xx.fbcdn.net/v/dash.mp4?a=1&b=2")
        );
    }

    #[test]
    fn reel_patterns_ignore_foreign_hosts() {
        let html = r#"{"video_url":"https://example.com/v.mp4"}"#;
        assert!(from_reel_patterns(html, REEL_URL).is_none());
        assert!(from_reel_patterns(html, POST_URL).is_none());
    }

    #[test]
    fn reel_patterns_apply_to_post_pages() {
        let html = r#"{"dash_manifest":"<MPD><BaseURL>https://video.xx.fbcdn.net/v/post_dash.m4v</BaseURL></MPD>"}"#;
        let record = from_reel_patterns(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert_eq!(
            record.video_url.as_deref(),
            Some("https://video.xx.fbcdn.net/v/post_dash.m4v")
        );
        assert_eq!(record.post_id, "ABC123");
        assert!(!record.is_reel);

        let record = cascade(html, "https://www.instagram.com/tv/TV42/").unwrap();
        assert_eq!(record.post_id, "TV42");
        assert!(record.video_url.is_some());
    }

    // --- embedded data ---

    #[test]
    fn additional_data_loaded_is_normalized() {
        let html = r#"<script>window.__additionalDataLoaded('/p/ABC123/',{"graphql":{"shortcode_media":
            {"shortcode":"ABC123","is_video":true,"video_url":"https://scontent.cdninstagram.com/v.mp4"}}});</script>"#;
        let record = from_embedded_data(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert_eq!(record.post_id, "ABC123");
    }

    #[test]
    fn context_json_is_decoded_twice() {
        let html = r#"<script>{"contextJSON":"{\"gql_data\":{\"shortcode_media\":{\"shortcode\":\"CTX1\",\"display_url\":\"https://scontent.cdninstagram.com/c.jpg\"}}}"}</script>"#;
        let record = from_embedded_data(html, POST_URL).unwrap();
        assert_eq!(record.post_id, "CTX1");
        assert_eq!(record.image_url.as_deref(), Some("https://scontent.cdninstagram.com/c.jpg"));
    }

    #[test]
    fn web_info_items_use_deep_search_shapes() {
        let html = r#"{"require":[{"xdt_api__v1__media__shortcode__web_info":{"items":[{"code":"WEB1",
            "media_type":1,"image_versions2":{"candidates":[{"url":"https://scontent.cdninstagram.com/w.jpg","width":640,"height":640}]},
            "user":{"username":"web_user"}}]}}]}"#;
        let record = from_embedded_data(html, POST_URL).unwrap();
        assert_eq!(record.post_id, "WEB1");
        assert_eq!(record.author, "web_user");
        assert_eq!(record.image_url.as_deref(), Some("https://scontent.cdninstagram.com/w.jpg"));
    }

    #[test]
    fn locate_media_falls_back_to_deep_search() {
        let root: Value = serde_json::from_str(
            r#"{"a":{"b":[{"c":{"xdt_shortcode_media":{"shortcode":"DEEP"}}}]}}"#,
        )
        .unwrap();
        assert_eq!(str_at(locate_media(&root).unwrap(), "shortcode"), Some("DEEP"));
    }

    // --- shortcode_media scan ---

    #[test]
    fn scan_prefers_later_video_over_earlier_image() {
        let html = r#"x "shortcode_media": {"shortcode":"IMG","display_url":"https://scontent.cdninstagram.com/i.jpg"}
            y "shortcode_media": {"shortcode":"VID","is_video":true,"video_url":"https://scontent.cdninstagram.com/v.mp4"}"#;

        let preferred = from_shortcode_media_scan(html, POST_URL, true).unwrap();
        assert_eq!(preferred.post_id, "VID");

        let first = from_shortcode_media_scan(html, POST_URL, false).unwrap();
        assert_eq!(first.post_id, "IMG");
    }

    #[test]
    fn scan_keeps_image_when_no_video_follows() {
        let html = r#""shortcode_media":{"shortcode":"IMG","display_url":"https://scontent.cdninstagram.com/i.jpg"}
                      "shortcode_media":{"broken": "#;
        let record = from_shortcode_media_scan(html, POST_URL, true).unwrap();
        assert_eq!(record.post_id, "IMG");
    }

    // --- reel video scan ---

    #[test]
    fn video_scan_overrides_image_result() {
        let html = r#""shortcode_media":{"shortcode":"IMG","display_url":"https://scontent.cdninstagram.com/i.jpg",
                       "owner":{"username":"poster"}}
                      <video src="https://scontent.cdninstagram.com/o1/v/clip.mp4?efg=1"></video>"#;

        let record = cascade(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert_eq!(
            record.video_url.as_deref(),
            Some("https://scontent.cdninstagram.com/o1/v/clip.mp4?efg=1")
        );
        assert_eq!(record.post_id, "IMG");
        assert_eq!(record.author, "poster");
        assert_eq!(record.thumbnail.as_deref(), Some("https://scontent.cdninstagram.com/i.jpg"));
        assert!(record.image_url.is_none());
    }

    #[test]
    fn video_scan_can_be_disabled() {
        let html = r#""shortcode_media":{"shortcode":"IMG","display_url":"https://scontent.cdninstagram.com/i.jpg"}
                      <video src="https://scontent.cdninstagram.com/o1/v/clip.mp4"></video>"#;
        let policy = CascadePolicy {
            video_override: false,
            ..CascadePolicy::default()
        };
        let record = run_cascade(html, POST_URL, &policy).unwrap();
        assert_eq!(record.media_type, MediaType::Image);
    }

    #[test]
    fn video_scan_rejects_non_mp4_and_placeholder() {
        assert!(!is_playable_video_url("video_versions"));
        assert!(!is_playable_video_url("https://scontent.cdninstagram.com/a.jpg"));
        assert!(!is_playable_video_url("https://example.com/a.mp4"));
        assert!(is_playable_video_url("https://scontent.cdninstagram.com/a.mp4"));
    }

    // --- meta tags ---

    #[test]
    fn meta_fallback_builds_image_record() {
        let html = r#"<meta property="og:image" content="https://scontent.cdninstagram.com/og.jpg">
                      <meta property="og:title" content="Some One (@some.one) • Instagram photos and videos">
                      <meta property="og:description" content="5 likes - some.one: &quot;Evening walk in the park #walk&quot;">"#;

        let record = cascade(html, POST_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Image);
        assert_eq!(record.image_url.as_deref(), Some("https://scontent.cdninstagram.com/og.jpg"));
        assert_eq!(record.author, "some.one");
        assert_eq!(record.caption, "Evening walk in the park #walk");
    }

    #[test]
    fn meta_fallback_types_reels_as_video() {
        let html = r#"<meta property="og:image" content="https://scontent.cdninstagram.com/og.jpg">"#;
        let record = cascade(html, REEL_URL).unwrap();
        assert_eq!(record.media_type, MediaType::Video);
        assert!(record.video_url.is_none());
        assert_eq!(record.thumbnail.as_deref(), Some("https://scontent.cdninstagram.com/og.jpg"));
    }

    #[test]
    fn empty_page_is_not_found() {
        assert!(cascade("<html><body>nothing here</body></html>", POST_URL).is_none());
    }
}
