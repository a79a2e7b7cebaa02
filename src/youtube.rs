use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::VideoReference;
use crate::error::ListingError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// A transcript language the listing service knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedTranscript {
    pub language_code: String,
    pub is_generated: bool,
}

/// Enumerates which transcript languages exist for a video.
#[async_trait]
pub trait TranscriptLister: Send + Sync {
    /// Transcripts in the service's own iteration order.
    async fn list_transcripts(&self, video: &VideoReference) -> Result<Vec<ListedTranscript>, ListingError>;
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<InnerTubeCaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct InnerTubeCaptionTrack {
    #[serde(rename = "languageCode")]
    language_code: String,
    kind: Option<String>,
}

/// Lists transcripts through YouTube's InnerTube player endpoint
pub struct InnerTubeLister {
    client: reqwest::Client,
    base_url: String,
}

impl InnerTubeLister {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, YOUTUBE_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TranscriptLister for InnerTubeLister {
    async fn list_transcripts(&self, video: &VideoReference) -> Result<Vec<ListedTranscript>, ListingError> {
        // Step 1: the watch page carries the InnerTube API key
        let watch_url = format!("{}/watch?v={video}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: the player endpoint lists the caption tracks
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": "en",
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video.as_str()
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let listed = listed_transcripts(resp)?;
        debug!("Listed {} transcript(s) for {video}", listed.len());
        Ok(listed)
    }
}

/// Manually created transcripts come first, then generated ones, each in upstream order.
fn listed_transcripts(resp: InnerTubePlayerResponse) -> Result<Vec<ListedTranscript>, ListingError> {
    // Unplayable videos (login, age gate, removed) come back without captions too
    if let Some(playability) = resp.playability_status.as_ref().filter(|p| p.status != "OK") {
        return Err(ListingError::Request(format!(
            "video is not playable ({}): {}",
            playability.status,
            playability.reason.as_deref().unwrap_or("no reason given")
        )));
    }

    let renderer = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .ok_or(ListingError::TranscriptsDisabled)?;

    if renderer.caption_tracks.is_empty() {
        return Err(ListingError::NoTranscriptFound);
    }

    let (generated, manual): (Vec<_>, Vec<_>) = renderer
        .caption_tracks
        .into_iter()
        .map(|t| ListedTranscript {
            is_generated: t.kind.as_deref() == Some("asr"),
            language_code: t.language_code,
        })
        .partition(|t| t.is_generated);

    Ok(manual.into_iter().chain(generated).collect())
}

fn extract_api_key(html: &str) -> Result<String, ListingError> {
    let patterns = [r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#, r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#];

    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|e| ListingError::Request(e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }

    Err(ListingError::Request(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}
