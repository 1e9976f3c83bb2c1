//! Size and count limits for inline media.

/// Maximum length of a single media URL string, in characters.
pub const MAX_MEDIA_URL_CHARS: usize = 10_000_000;

/// Maximum size of one decoded media payload, in bytes.
pub const MAX_MEDIA_PAYLOAD_BYTES: usize = 50_000_000;

/// Maximum number of images in one request.
pub const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Maximum raster width/height accepted, in pixels (applies to both axes).
pub const MAX_IMAGE_DIMENSION: u32 = 8192;

/// Limits applied while decoding one request's content.
///
/// Defaults are the production values above; tests construct smaller ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Cap on each media URL's character length (hard failure).
    pub max_url_chars: usize,
    /// Cap on each decoded payload's byte size (hard failure).
    pub max_payload_bytes: usize,
    /// Cap on accumulated image count (hard failure).
    pub max_images: usize,
    /// Cap on raster width and height (oversized images are skipped).
    pub max_image_dimension: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_url_chars: MAX_MEDIA_URL_CHARS,
            max_payload_bytes: MAX_MEDIA_PAYLOAD_BYTES,
            max_images: MAX_IMAGES_PER_REQUEST,
            max_image_dimension: MAX_IMAGE_DIMENSION,
        }
    }
}
