use serde::{Deserialize, Serialize};

use crate::utils::time::now_secs;

/// Author sentinel used whenever no username could be resolved.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Post-ID sentinel used when neither the URL nor the payload yields one.
pub const UNKNOWN_POST_ID: &str = "unknown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// One rendition of a video or image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityVariant {
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl QualityVariant {
    pub fn original(url: &str, dimensions: Dimensions) -> Self {
        Self {
            quality: "original".to_string(),
            url: Some(url.to_string()),
            width: dimensions.width,
            height: dimensions.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A child of a carousel post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarouselItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub dimensions: Dimensions,
}

/// Canonical description of one post or reel.
///
/// Video records carry `video_url`, `duration`, `view_count` and `qualities`;
/// image records carry `image_url` and `images`. Carousels add `items`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub post_id: String,
    pub author: String,
    pub caption: String,
    pub likes: u64,
    pub comments: u64,
    pub timestamp: i64,
    pub is_carousel: bool,
    pub is_reel: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualities: Option<Vec<QualityVariant>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<QualityVariant>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CarouselItem>>,
}

/// Fields shared by every record variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub post_id: String,
    pub author: String,
    pub caption: String,
    pub likes: u64,
    pub comments: u64,
    pub timestamp: i64,
    pub is_reel: bool,
}

impl PostMeta {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            author: UNKNOWN_AUTHOR.to_string(),
            caption: String::new(),
            likes: 0,
            comments: 0,
            timestamp: now_secs(),
            is_reel: false,
        }
    }
}

impl MediaRecord {
    /// Builds a video record. `qualities` gets an `"original"` entry whenever a
    /// URL is known.
    pub fn video(
        meta: PostMeta,
        video_url: Option<String>,
        thumbnail: Option<String>,
        dimensions: Dimensions,
    ) -> Self {
        let qualities = video_url
            .iter()
            .map(|url| QualityVariant::original(url, dimensions))
            .collect();

        Self {
            media_type: MediaType::Video,
            video_url,
            thumbnail,
            duration: Some(0.0),
            view_count: Some(0),
            qualities: Some(qualities),
            ..Self::base(meta)
        }
    }

    /// Builds an image record with a single `"original"` rendition.
    pub fn image(meta: PostMeta, image_url: String, dimensions: Dimensions) -> Self {
        let images = vec![QualityVariant::original(&image_url, dimensions)];
        Self {
            media_type: MediaType::Image,
            image_url: Some(image_url),
            images: Some(images),
            ..Self::base(meta)
        }
    }

    fn base(meta: PostMeta) -> Self {
        Self {
            media_type: MediaType::Image,
            post_id: meta.post_id,
            author: meta.author,
            caption: meta.caption,
            likes: meta.likes,
            comments: meta.comments,
            timestamp: meta.timestamp,
            is_carousel: false,
            is_reel: meta.is_reel,
            video_url: None,
            thumbnail: None,
            duration: None,
            view_count: None,
            qualities: None,
            image_url: None,
            images: None,
            items: None,
        }
    }

    /// Shared metadata of this record, for rebuilding it as another variant.
    pub fn meta(&self) -> PostMeta {
        PostMeta {
            post_id: self.post_id.clone(),
            author: self.author.clone(),
            caption: self.caption.clone(),
            likes: self.likes,
            comments: self.comments,
            timestamp: self.timestamp,
            is_reel: self.is_reel,
        }
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Returns a copy with every direct media URL removed, for metadata-only
    /// responses. Thumbnails are kept.
    pub fn to_info_view(&self) -> MediaRecord {
        let mut view = self.clone();
        view.video_url = None;
        view.image_url = None;
        for variant in view
            .qualities
            .iter_mut()
            .chain(view.images.iter_mut())
            .flatten()
        {
            variant.url = None;
        }
        for item in view.items.iter_mut().flatten() {
            item.url = None;
        }
        view
    }
}
