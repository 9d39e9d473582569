use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

/// Host fragments that mark a URL as served by Instagram's media CDN.
const CDN_HOST_MARKERS: [&str; 2] = ["cdninstagram.com", "fbcdn.net"];

/// Hosts accepted for post URLs.
const INSTAGRAM_HOSTS: [&str; 4] = [
    "instagram.com",
    "www.instagram.com",
    "m.instagram.com",
    "instagr.am",
];

lazy_static! {
    /// Post-identifier patterns, tried in order. Owner-qualified shapes come
    /// last; their bare `/p/` form already matches the shorter pattern.
    static ref POST_ID_PATTERNS: [Regex; 6] = [
        Regex::new(r"/p/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/reel/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/reels/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/tv/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/[A-Za-z0-9_.]+/p/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"/[A-Za-z0-9_.]+/reel/([A-Za-z0-9_-]+)").unwrap(),
    ];

    static ref POST_PATH: Regex =
        Regex::new(r"^/(?:[A-Za-z0-9_.]+/)?(?:p|reel|reels|tv)/[A-Za-z0-9_-]+/?").unwrap();

    static ref REEL_PATH: Regex = Regex::new(r"/(?:[A-Za-z0-9_.]+/)?reels?/").unwrap();
}

/// Extracts the post ID (shortcode) from an Instagram URL.
///
/// Handles `/p/ID`, `/reel/ID`, `/reels/ID`, `/tv/ID` and the owner-qualified
/// `/owner/p/ID`, `/owner/reel/ID` shapes, with or without trailing slashes,
/// query strings, or extra path segments.
pub fn extract_post_id(url: &str) -> Option<String> {
    POST_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns `true` if `url` is an absolute Instagram URL pointing at a post,
/// reel or IGTV video.
pub fn is_valid_post_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host_ok = parsed
        .host_str()
        .map(|h| INSTAGRAM_HOSTS.contains(&h.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    host_ok && POST_PATH.is_match(parsed.path())
}

/// Returns `true` if the URL path contains a `/reel/` or `/reels/` segment,
/// owner-qualified or not.
pub fn is_reel_url(url: &str) -> bool {
    REEL_PATH.is_match(url)
}

/// Returns `true` if the URL references Instagram's media CDN.
pub fn is_cdn_url(url: &str) -> bool {
    CDN_HOST_MARKERS.iter().any(|marker| url.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- extract_post_id ---

    #[test]
    fn extracts_from_p_path() {
        assert_eq!(
            extract_post_id("https://www.instagram.com/p/ABC123/"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn extracts_from_reel_path() {
        assert_eq!(
            extract_post_id("https://www.instagram.com/reel/DEF456/"),
            Some("DEF456".to_string())
        );
    }

    #[test]
    fn extracts_from_reels_and_tv_paths() {
        assert_eq!(
            extract_post_id("https://instagram.com/reels/R_1-x"),
            Some("R_1-x".to_string())
        );
        assert_eq!(
            extract_post_id("https://www.instagram.com/tv/GHI789/"),
            Some("GHI789".to_string())
        );
    }

    #[test]
    fn extracts_owner_qualified() {
        assert_eq!(
            extract_post_id("https://www.instagram.com/some.user/p/OWN111/"),
            Some("OWN111".to_string())
        );
        assert_eq!(
            extract_post_id("https://www.instagram.com/username/reel/XYZ789/"),
            Some("XYZ789".to_string())
        );
    }

    #[test]
    fn extracts_with_query_and_extra_segments() {
        assert_eq!(
            extract_post_id("https://www.instagram.com/p/ABC123/embed/captioned?utm_source=ig"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn returns_none_for_unrecognized_path() {
        assert_eq!(extract_post_id("https://www.instagram.com/explore/tags/cat/"), None);
        assert_eq!(extract_post_id("https://www.instagram.com/p/"), None);
        assert_eq!(extract_post_id(""), None);
    }

    // --- is_valid_post_url ---

    #[test]
    fn validates_recognized_shapes() {
        assert!(is_valid_post_url("https://www.instagram.com/p/ABC123/"));
        assert!(is_valid_post_url("https://www.instagram.com/reel/ABC123"));
        assert!(is_valid_post_url("https://www.instagram.com/reels/ABC123/"));
        assert!(is_valid_post_url("https://www.instagram.com/tv/ABC123/"));
        assert!(is_valid_post_url("https://www.instagram.com/username/reel/XYZ789/"));
        assert!(is_valid_post_url("http://instagram.com/someone/p/XYZ789?igsh=1"));
    }

    #[test]
    fn rejects_malformed_or_foreign_urls() {
        assert!(!is_valid_post_url("not a url"));
        assert!(!is_valid_post_url("/p/ABC123/"));
        assert!(!is_valid_post_url("https://www.instagram.com/explore/"));
        assert!(!is_valid_post_url("https://www.instagram.com/username/"));
        assert!(!is_valid_post_url("https://example.com/p/ABC123/"));
        assert!(!is_valid_post_url("ftp://www.instagram.com/p/ABC123/"));
    }

    // --- is_reel_url ---

    #[test]
    fn classifies_reels() {
        assert!(is_reel_url("https://www.instagram.com/reel/XYZ789/"));
        assert!(is_reel_url("https://www.instagram.com/reels/XYZ789/"));
        assert!(is_reel_url("https://www.instagram.com/username/reel/XYZ789/"));
        assert!(!is_reel_url("https://www.instagram.com/p/ABC123/"));
        assert!(!is_reel_url("https://www.instagram.com/tv/ABC123/"));
    }

    #[test]
    fn detects_cdn_urls() {
        assert!(is_cdn_url("https://scontent-lax3-1.cdninstagram.com/v/t50/a.mp4"));
        assert!(is_cdn_url("https://video.fsgn2-1.fna.fbcdn.net/o1/v/t2/a.mp4"));
        assert!(!is_cdn_url("https://example.com/a.mp4"));
    }
}
