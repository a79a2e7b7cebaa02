use log::{debug, info, warn};

use crate::error::{ListingError, SubtitleError};
use crate::youtube::{ListedTranscript, TranscriptLister};
use crate::ytdlp::{CaptionFormat, CaptionIndex, MetadataExtractor};
use crate::{CaptionTrack, VideoReference};

/// The only caption format carrying per-segment timing
pub const JSON3_EXT: &str = "json3";

/// Tie-break used when no language is requested.
///
/// `FirstListed` takes whatever the listing service yields first, with no
/// further ranking. Callers depend on this ordering being stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LanguagePolicy {
    #[default]
    FirstListed,
}

impl LanguagePolicy {
    pub fn pick<'a>(&self, listed: &'a [ListedTranscript]) -> Option<&'a ListedTranscript> {
        match self {
            LanguagePolicy::FirstListed => listed.first(),
        }
    }
}

/// Picks the caption track for a video from the listing and metadata services
pub struct TrackSelector<'a> {
    lister: &'a dyn TranscriptLister,
    extractor: &'a dyn MetadataExtractor,
    policy: LanguagePolicy,
}

impl<'a> TrackSelector<'a> {
    pub fn new(lister: &'a dyn TranscriptLister, extractor: &'a dyn MetadataExtractor) -> Self {
        Self {
            lister,
            extractor,
            policy: LanguagePolicy::default(),
        }
    }

    pub async fn select(
        &self,
        video: &VideoReference,
        requested_lang: Option<&str>,
    ) -> Result<CaptionTrack, SubtitleError> {
        let lang = match requested_lang {
            Some(lang) => lang.to_string(),
            None => {
                info!("No language requested, detecting from transcript listing");
                self.detect_language(video).await?
            }
        };
        info!("Using language code: {lang}");

        let index = self.extractor.extract_info(&video.watch_url()).await?;
        let track = pick_track(&index, &lang)?;
        debug!(
            "Selected {} track for {lang}: {}",
            if track.is_auto_generated { "automatic" } else { "manual" },
            track.fetch_url
        );
        Ok(track)
    }

    async fn detect_language(&self, video: &VideoReference) -> Result<String, SubtitleError> {
        let unavailable = |reason: String| SubtitleError::NoTranscriptAvailable {
            video_id: video.to_string(),
            reason,
        };

        let listed = match self.lister.list_transcripts(video).await {
            Ok(listed) => listed,
            Err(e @ (ListingError::TranscriptsDisabled | ListingError::NoTranscriptFound)) => {
                warn!("No transcripts available for {video}: {e}");
                return Err(unavailable(e.to_string()));
            }
            Err(ListingError::Request(message)) => {
                return Err(SubtitleError::UpstreamFailure {
                    service: "transcript listing",
                    message,
                });
            }
        };

        self.policy
            .pick(&listed)
            .map(|t| t.language_code.clone())
            .ok_or_else(|| unavailable("listing returned no transcripts".to_string()))
    }
}

/// Manual subtitles win over automatic captions; within the chosen set only json3 qualifies.
pub fn pick_track(index: &CaptionIndex, lang: &str) -> Result<CaptionTrack, SubtitleError> {
    let (formats, is_auto_generated) = match non_empty(index.subtitles.get(lang)) {
        Some(manual) => (manual, false),
        None => match non_empty(index.automatic_captions.get(lang)) {
            Some(auto) => (auto, true),
            None => return Err(SubtitleError::NoCaptionsForLanguage(lang.to_string())),
        },
    };

    formats
        .iter()
        .find(|f| f.ext == JSON3_EXT)
        .map(|f| CaptionTrack {
            language_code: lang.to_string(),
            is_auto_generated,
            fetch_url: f.url.clone(),
        })
        .ok_or_else(|| SubtitleError::UnsupportedCaptionFormat(lang.to_string()))
}

fn non_empty(formats: Option<&Vec<CaptionFormat>>) -> Option<&Vec<CaptionFormat>> {
    formats.filter(|f| !f.is_empty())
}
