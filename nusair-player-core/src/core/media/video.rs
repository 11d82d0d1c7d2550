use log::trace;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::media;
use crate::core::media::MediaError;

/// The file extensions which are recognized as playable videos.
pub const VIDEO_EXTENSIONS: [&str; 7] = [
    ".mp4", ".mkv", ".webm", ".avi", ".mov", ".flv", ".wmv",
];

/// Verify if the given input is a playable video reference.
///
/// It returns `true` when the input parses as an absolute url and its path ends,
/// case-insensitively, with one of the [VIDEO_EXTENSIONS].
/// No network check or content-type sniffing is done.
pub fn is_valid_video_url(input: &str) -> bool {
    if input.is_empty() {
        return false;
    }

    match Url::parse(input) {
        Ok(url) => {
            let path = url.path().to_lowercase();
            VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        }
        Err(e) => {
            trace!("Input {} is not a valid url, {}", input, e);
            false
        }
    }
}

/// Extract a human-readable title from the given video url.
///
/// The title is derived from the last path segment by stripping a single trailing
/// extension, replacing dashes/underscores with spaces and percent-decoding the result.
/// When the url can't be parsed, the input is returned unmodified.
pub fn extract_title(input: &str) -> String {
    match Url::parse(input) {
        Ok(url) => {
            let segment = url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default();
            if segment.is_empty() {
                return input.to_string();
            }

            let stem = match segment.rsplit_once('.') {
                Some((name, extension)) if !extension.is_empty() => name,
                _ => segment,
            };
            let cleaned = stem.replace(['-', '_'], " ");

            percent_decode_str(cleaned.as_str())
                .decode_utf8()
                .map(|e| e.into_owned())
                .unwrap_or(cleaned)
        }
        Err(_) => input.to_string(),
    }
}

/// The identity and display title pairing of a loaded video.
///
/// The identity of a video reference is its exact url string, case-sensitive.
/// A reference is immutable once created and replaced wholesale when a new video loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoReference {
    /// The url of the video.
    pub url: String,
    /// The display title derived from the url.
    pub title: String,
}

impl VideoReference {
    /// Create a new video reference from the given url input.
    ///
    /// It returns the reference with its derived title, or [MediaError::InvalidUrl]
    /// when the input doesn't pass the video url validation.
    pub fn from_url(url: &str) -> media::Result<Self> {
        if !is_valid_video_url(url) {
            return Err(MediaError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
            title: extract_title(url),
        })
    }
}
