use thiserror::Error;

/// Failures of the subtitle pipeline.
///
/// Every stage surfaces exactly one of these to its caller; nothing is retried
/// and nothing is downgraded to an empty result.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("malformed time range {input:?}: {reason}")]
    MalformedTimeRange { input: String, reason: String },

    #[error("unrecognized YouTube URL format: {0}")]
    UnrecognizedUrlFormat(String),

    #[error("no transcript available for video {video_id}: {reason}")]
    NoTranscriptAvailable { video_id: String, reason: String },

    #[error("no captions found for language: {0}")]
    NoCaptionsForLanguage(String),

    #[error("no json3 captions found for language: {0}")]
    UnsupportedCaptionFormat(String),

    #[error("failed to fetch subtitles: {0}")]
    SubtitleFetchError(String),

    #[error("caption payload is not in the json3 event format: {0}")]
    MalformedPayload(String),

    #[error("subtitles contained no usable text")]
    EmptyTranscript,

    #[error("{service} failed: {message}")]
    UpstreamFailure { service: &'static str, message: String },
}

impl SubtitleError {
    pub(crate) fn malformed_range(input: &str, reason: impl Into<String>) -> Self {
        SubtitleError::MalformedTimeRange {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures reported by a transcript-listing service.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("no transcript found for this video")]
    NoTranscriptFound,

    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for ListingError {
    fn from(e: reqwest::Error) -> Self {
        ListingError::Request(e.to_string())
    }
}
