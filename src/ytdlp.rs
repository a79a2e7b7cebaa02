use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::SubtitleError;

const SERVICE: &str = "yt-dlp";

/// One downloadable rendition of a caption track
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionFormat {
    pub ext: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A video's full caption index, keyed by language code
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionIndex {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtitles: HashMap<String, Vec<CaptionFormat>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub automatic_captions: HashMap<String, Vec<CaptionFormat>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<CaptionFormat>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Resolves where caption payloads for a video can be fetched from.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract_info(&self, url: &str) -> Result<CaptionIndex, SubtitleError>;
}

/// Metadata extraction by shelling out to `yt-dlp`
pub struct YtDlp {
    program: String,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MetadataExtractor for YtDlp {
    async fn extract_info(&self, url: &str) -> Result<CaptionIndex, SubtitleError> {
        debug!("Extracting caption index via {}: {url}", self.program);

        let child = Command::new(&self.program)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(upstream(format!(
                    "{} not found; install it with `pip install yt-dlp` or `brew install yt-dlp`",
                    self.program
                )));
            }
            Ok(Err(e)) => return Err(upstream(format!("failed to run {}: {e}", self.program))),
            Err(_) => return Err(upstream(format!("timed out after {}s", self.timeout.as_secs()))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(upstream(format!("exited with {}: {}", output.status, stderr.trim())));
        }

        parse_caption_index(&output.stdout)
    }
}

fn upstream(message: String) -> SubtitleError {
    SubtitleError::UpstreamFailure {
        service: SERVICE,
        message,
    }
}

fn parse_caption_index(json: &[u8]) -> Result<CaptionIndex, SubtitleError> {
    serde_json::from_slice(json).map_err(|e| upstream(format!("unexpected info JSON: {e}")))
}
