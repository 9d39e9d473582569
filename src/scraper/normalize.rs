//! Turns a loosely-typed media object (GraphQL `shortcode_media`, private-API
//! item, or a regex-captured fragment of either) into a [`MediaRecord`].

use serde_json::Value;

use super::types::{
    CarouselItem, Dimensions, MediaRecord, MediaType, PostMeta, QualityVariant, UNKNOWN_AUTHOR,
    UNKNOWN_POST_ID,
};
use crate::scraper::fields::BOILERPLATE_PHRASES;
use crate::utils::escape::{clean_caption_text, clean_url};
use crate::utils::instagram::is_reel_url;
use crate::utils::json::{at_path, f64_at, str_at, u64_at};
use crate::utils::time::now_secs;

const VIDEO_TYPENAMES: [&str; 2] = ["GraphVideo", "XDTGraphVideo"];
const SIDECAR_TYPENAMES: [&str; 2] = ["GraphSidecar", "XDTGraphSidecar"];
const REEL_PRODUCT_TYPE: &str = "clips";

/// Private-API `media_type` codes.
const PAPI_VIDEO: u64 = 2;
const PAPI_CAROUSEL: u64 = 8;

/// Smallest width preferred when picking from a version list.
const MIN_PREFERRED_WIDTH: u64 = 480;

/// Normalizes a raw media object.
///
/// Falls back to a minimal record built from whatever URL fields are present
/// when the full pass cannot produce one. Returns `None` only when there is no
/// URL at all and the source URL is not a reel.
pub fn normalize_media(raw: &Value, source_url: &str) -> Option<MediaRecord> {
    if !raw.is_object() {
        return None;
    }

    build_record(raw, source_url).or_else(|| {
        log::debug!("[normalize] full pass produced nothing, trying minimal record");
        minimal_record(raw, source_url)
    })
}

/// `true` if any of the video signals is present on the object or the URL.
pub fn is_video_media(raw: &Value, source_url: &str) -> bool {
    raw.get("is_video").and_then(Value::as_bool).unwrap_or(false)
        || typename(raw).is_some_and(|t| VIDEO_TYPENAMES.contains(&t))
        || is_reel_product(raw)
        || u64_at(raw, "media_type") == Some(PAPI_VIDEO)
        || is_reel_url(source_url)
}

fn typename(raw: &Value) -> Option<&str> {
    str_at(raw, "__typename")
}

fn is_reel_product(raw: &Value) -> bool {
    str_at(raw, "product_type") == Some(REEL_PRODUCT_TYPE)
}

fn is_sidecar(raw: &Value) -> bool {
    typename(raw).is_some_and(|t| SIDECAR_TYPENAMES.contains(&t))
        || u64_at(raw, "media_type") == Some(PAPI_CAROUSEL)
}

fn post_meta(raw: &Value, source_url: &str) -> PostMeta {
    let post_id = str_at(raw, "shortcode")
        .or_else(|| str_at(raw, "code"))
        .map(String::from)
        .or_else(|| id_field(raw))
        .unwrap_or_else(|| UNKNOWN_POST_ID.to_string());

    let author = str_at(raw, "owner/username")
        .or_else(|| str_at(raw, "user/username"))
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();

    let likes = u64_at(raw, "edge_media_preview_like/count")
        .or_else(|| u64_at(raw, "edge_liked_by/count"))
        .or_else(|| u64_at(raw, "like_count"))
        .unwrap_or(0);

    let comments = u64_at(raw, "edge_media_to_comment/count")
        .or_else(|| u64_at(raw, "edge_media_to_parent_comment/count"))
        .or_else(|| u64_at(raw, "comment_count"))
        .unwrap_or(0);

    let timestamp = u64_at(raw, "taken_at_timestamp")
        .or_else(|| u64_at(raw, "taken_at"))
        .map(|t| t as i64)
        .unwrap_or_else(now_secs);

    PostMeta {
        post_id,
        author,
        caption: caption(raw),
        likes,
        comments,
        timestamp,
        is_reel: is_reel_product(raw) || is_reel_url(source_url),
    }
}

/// The generic `id` field, which may be numeric.
fn id_field(raw: &Value) -> Option<String> {
    match raw.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn caption(raw: &Value) -> String {
    let text = str_at(raw, "edge_media_to_caption/edges/0/node/text")
        .or_else(|| str_at(raw, "caption/text"))
        .or_else(|| str_at(raw, "caption"))
        .map(clean_caption_text)
        .unwrap_or_default();

    let lower = text.to_lowercase();
    if BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p)) {
        return String::new();
    }
    text
}

fn dimensions(node: &Value) -> Dimensions {
    let width = u64_at(node, "dimensions/width").or_else(|| u64_at(node, "original_width"));
    let height = u64_at(node, "dimensions/height").or_else(|| u64_at(node, "original_height"));
    Dimensions {
        width: width.unwrap_or(0) as u32,
        height: height.unwrap_or(0) as u32,
    }
}

fn version_dimensions(version: &Value) -> Dimensions {
    Dimensions {
        width: u64_at(version, "width").unwrap_or(0) as u32,
        height: u64_at(version, "height").unwrap_or(0) as u32,
    }
}

fn video_versions(node: &Value) -> &[Value] {
    node.get("video_versions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Direct `video_url`, else the first version at least 480 wide, else the first version.
fn resolve_video_url(node: &Value) -> Option<String> {
    if let Some(url) = str_at(node, "video_url") {
        return Some(clean_url(url));
    }

    let versions = video_versions(node);
    versions
        .iter()
        .find(|v| u64_at(v, "width").is_some_and(|w| w >= MIN_PREFERRED_WIDTH))
        .or_else(|| versions.first())
        .and_then(|v| str_at(v, "url"))
        .map(clean_url)
}

fn resolve_display_url(node: &Value) -> Option<String> {
    str_at(node, "display_url")
        .or_else(|| str_at(node, "thumbnail_src"))
        .or_else(|| str_at(node, "image_versions2/candidates/0/url"))
        .or_else(|| str_at(node, "display_src"))
        .map(clean_url)
}

/// `original` first, then every other distinct version labelled `WxH`.
fn quality_list(node: &Value, original: &str, dims: Dimensions) -> Vec<QualityVariant> {
    let mut qualities = vec![QualityVariant::original(original, dims)];

    for version in video_versions(node) {
        let Some(url) = str_at(version, "url").map(clean_url) else {
            continue;
        };
        if qualities.iter().any(|q| q.url.as_deref() == Some(url.as_str())) {
            continue;
        }
        let size = version_dimensions(version);
        qualities.push(QualityVariant {
            quality: format!("{}x{}", size.width, size.height),
            url: Some(url),
            width: size.width,
            height: size.height,
        });
    }

    qualities
}

fn carousel_children(raw: &Value) -> Vec<&Value> {
    if let Some(edges) = at_path(raw, "edge_sidecar_to_children/edges").and_then(Value::as_array) {
        return edges.iter().filter_map(|edge| edge.get("node")).collect();
    }
    raw.get("carousel_media")
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn carousel_item(node: &Value) -> CarouselItem {
    let is_video = node.get("is_video").and_then(Value::as_bool).unwrap_or(false)
        || u64_at(node, "media_type") == Some(PAPI_VIDEO)
        || !video_versions(node).is_empty();

    let thumbnail = resolve_display_url(node);
    let (media_type, url) = if is_video {
        (MediaType::Video, resolve_video_url(node))
    } else {
        (MediaType::Image, thumbnail.clone())
    };

    let mut dims = dimensions(node);
    if dims == Dimensions::default() {
        if let Some(first) = node.pointer("/image_versions2/candidates/0") {
            dims = version_dimensions(first);
        }
    }

    CarouselItem {
        media_type,
        url,
        thumbnail,
        dimensions: dims,
    }
}

fn build_record(raw: &Value, source_url: &str) -> Option<MediaRecord> {
    let meta = post_meta(raw, source_url);
    let dims = dimensions(raw);
    let display_url = resolve_display_url(raw);

    let items: Vec<CarouselItem> = if is_sidecar(raw) {
        carousel_children(raw).into_iter().map(carousel_item).collect()
    } else {
        Vec::new()
    };

    let mut record = if is_video_media(raw, source_url) {
        let video_url = resolve_video_url(raw);
        // A carousel reports the video signal of its first child.
        let video_url = video_url.or_else(|| {
            items
                .iter()
                .find(|item| item.media_type == MediaType::Video)
                .and_then(|item| item.url.clone())
        });
        if video_url.is_none() && display_url.is_none() && items.is_empty() {
            return None;
        }

        let mut record = MediaRecord::video(meta, video_url.clone(), display_url, dims);
        if let Some(url) = &video_url {
            record.qualities = Some(quality_list(raw, url, dims));
        }
        record.duration = Some(
            f64_at(raw, "video_duration")
                .or_else(|| f64_at(raw, "duration"))
                .unwrap_or(0.0),
        );
        record.view_count = Some(
            u64_at(raw, "video_view_count")
                .or_else(|| u64_at(raw, "video_play_count"))
                .or_else(|| u64_at(raw, "play_count"))
                .or_else(|| u64_at(raw, "view_count"))
                .unwrap_or(0),
        );
        record
    } else {
        let image_url = display_url
            .or_else(|| items.first().and_then(|item| item.thumbnail.clone()))?;
        MediaRecord::image(meta, image_url, dims)
    };

    if !items.is_empty() {
        record.is_carousel = true;
        record.items = Some(items);
    }

    Some(record)
}

fn minimal_record(raw: &Value, source_url: &str) -> Option<MediaRecord> {
    let video_url = str_at(raw, "video_url").map(clean_url);
    let image_url = resolve_display_url(raw);
    let is_reel = is_reel_url(source_url);

    if video_url.is_none() && image_url.is_none() && !is_reel {
        return None;
    }

    let meta = PostMeta {
        post_id: str_at(raw, "shortcode")
            .or_else(|| str_at(raw, "code"))
            .unwrap_or(UNKNOWN_POST_ID)
            .to_string(),
        is_reel,
        ..PostMeta::new(UNKNOWN_POST_ID)
    };

    if video_url.is_some() || is_reel {
        return Some(MediaRecord::video(meta, video_url, image_url, Dimensions::default()));
    }

    image_url.map(|url| MediaRecord::image(meta, url, Dimensions::default()))
}
