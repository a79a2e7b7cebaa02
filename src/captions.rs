use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::error::SubtitleError;
use crate::{CaptionTrack, TimeRange};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Top level of a json3 timed-caption payload
#[derive(Debug, Default, Deserialize)]
pub struct CaptionPayload {
    #[serde(default)]
    pub events: Vec<CaptionEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptionEvent {
    #[serde(rename = "tStartMs")]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub segs: Vec<CaptionSegment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptionSegment {
    pub utf8: Option<String>,
    #[serde(rename = "tOffsetMs")]
    pub offset_ms: Option<u64>,
}

impl CaptionEvent {
    /// Presentation time of a segment: event start plus segment offset, either
    /// defaulting to 0. Untimed only when both are missing.
    fn timestamp(&self, seg: &CaptionSegment) -> Option<u64> {
        match (self.start_ms, seg.offset_ms) {
            (None, None) => None,
            (start, offset) => Some(start.unwrap_or(0).saturating_add(offset.unwrap_or(0))),
        }
    }
}

/// Downloads json3 caption payloads
pub struct CaptionFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl CaptionFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn fetch_and_normalize(
        &self,
        track: &CaptionTrack,
        range: Option<&TimeRange>,
    ) -> Result<String, SubtitleError> {
        let payload = self.fetch(&track.fetch_url).await?;
        info!("Subtitles fetched, cleaning up ({} events)", payload.events.len());

        let text = flatten(&payload, range)?;
        info!("Extracted {} characters of subtitle text", text.chars().count());
        Ok(text)
    }

    async fn fetch(&self, url: &str) -> Result<CaptionPayload, SubtitleError> {
        debug!("Fetching subtitles from {url}");

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SubtitleError::SubtitleFetchError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SubtitleError::SubtitleFetchError(format!("HTTP {status} from {url}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| SubtitleError::SubtitleFetchError(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| SubtitleError::MalformedPayload(e.to_string()))
    }
}

/// Join segment texts with single spaces in payload order, keeping only
/// timestamped segments inside `range` when one is given.
pub fn flatten(payload: &CaptionPayload, range: Option<&TimeRange>) -> Result<String, SubtitleError> {
    let texts = payload.events.iter().flat_map(|event| {
        event.segs.iter().filter_map(move |seg| {
            let text = seg.utf8.as_deref()?;
            let included = match range {
                None => true,
                Some(range) => event.timestamp(seg).is_some_and(|ts| range.contains(ts)),
            };
            included.then_some(text)
        })
    });

    let joined = texts.collect::<Vec<_>>().join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return Err(SubtitleError::EmptyTranscript);
    }
    Ok(trimmed.to_string())
}
