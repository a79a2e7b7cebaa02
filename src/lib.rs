pub mod captions;
pub mod config;
pub mod error;
pub mod notion;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod timerange;
pub mod tracks;
pub mod youtube;
pub mod ytdlp;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::SubtitleError;
pub use pipeline::SubtitlePipeline;
pub use timerange::TimeRange;

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

static URL_SHAPES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        // youtube.com/watch?v=ID, v= may follow other params
        Regex::new(r"youtube\.com/watch\?(?:[^#]*&)?v=([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtu\.be/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtube(?:-nocookie)?\.com/embed/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]+)").unwrap(),
    ]
});

/// Identifier of a single YouTube video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable subtitle stream for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub is_auto_generated: bool,
    pub fetch_url: String,
}

/// Extract the video ID from a watch, share, embed or shorts URL (or a bare 11-character ID).
///
/// Pure string matching; anything after the ID (query params, path separators) is dropped.
pub fn resolve(url: &str) -> Result<VideoReference, SubtitleError> {
    let input = url.trim();

    if BARE_ID.is_match(input) {
        return Ok(VideoReference(input.to_string()));
    }

    URL_SHAPES
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| VideoReference(caps[1].to_string()))
        .ok_or_else(|| SubtitleError::UnrecognizedUrlFormat(input.to_string()))
}
