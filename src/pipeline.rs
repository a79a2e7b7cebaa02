use std::time::Duration;

use log::info;

use crate::captions::{CaptionFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::error::SubtitleError;
use crate::tracks::TrackSelector;
use crate::youtube::{InnerTubeLister, TranscriptLister};
use crate::ytdlp::{MetadataExtractor, YtDlp};
use crate::{TimeRange, resolve};

/// URL -> video ID -> caption track -> normalized transcript text.
///
/// Holds no per-request state; one instance can serve concurrent requests.
pub struct SubtitlePipeline {
    lister: Box<dyn TranscriptLister>,
    extractor: Box<dyn MetadataExtractor>,
    fetcher: CaptionFetcher,
}

/// Settings for the default (network-backed) pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub yt_dlp_path: String,
    pub metadata_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            metadata_timeout: DEFAULT_FETCH_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl SubtitlePipeline {
    pub fn new(
        lister: Box<dyn TranscriptLister>,
        extractor: Box<dyn MetadataExtractor>,
        fetcher: CaptionFetcher,
    ) -> Self {
        Self {
            lister,
            extractor,
            fetcher,
        }
    }

    /// InnerTube listing, yt-dlp metadata and a reqwest payload fetcher sharing `client`
    pub fn from_settings(client: reqwest::Client, settings: &PipelineSettings) -> Self {
        Self::new(
            Box::new(InnerTubeLister::new(client.clone())),
            Box::new(YtDlp::new(&settings.yt_dlp_path, settings.metadata_timeout)),
            CaptionFetcher::new(client, settings.fetch_timeout),
        )
    }

    pub async fn get_transcript(
        &self,
        url: &str,
        lang: Option<&str>,
        range: Option<&TimeRange>,
    ) -> Result<String, SubtitleError> {
        info!("Processing video: {url}");
        let video = resolve(url)?;

        let track = TrackSelector::new(self.lister.as_ref(), self.extractor.as_ref())
            .select(&video, lang)
            .await?;

        if let Some(range) = range {
            info!("Restricting transcript to {range}");
        }
        self.fetcher.fetch_and_normalize(&track, range).await
    }
}
