use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, info};

use crate::{SubtitlePipeline, TimeRange};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const TEMPERATURE: f64 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Anything that can turn a prompt into text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Fetch a video's subtitles and rewrite them as an article.
///
/// Pipeline failures come back as the original `SubtitleError` inside the report.
pub async fn summarize_video(
    pipeline: &SubtitlePipeline,
    llm: &dyn LanguageModel,
    url: &str,
    lang: Option<&str>,
    range: Option<&TimeRange>,
) -> Result<String> {
    let transcript = pipeline.get_transcript(url, lang, range).await?;
    info!("Subtitles extracted, sending {} characters to LLM", transcript.len());

    let summary = llm.complete(&summarization_prompt(&transcript)).await?;
    if summary.trim().is_empty() {
        bail!("LLM returned empty summary");
    }

    info!("Summarization completed");
    Ok(summary)
}

pub fn summarization_prompt(transcript: &str) -> String {
    format!(
        "Rewrite the following YouTube video transcript as a well-structured article.\n\
Keep the language the video is spoken in, and keep the summary comprehensive but concise.\n\
\n\
Do not open with phrases like \"Here is the summary of the video\" or \"The video is about\".\n\
Start the article directly.\n\
\n\
Instructions:\n\
- Use clear headings and sections\n\
- Keep the key points and important details\n\
- Keep the original tone and context\n\
- Make it read as an article, not a terse list of bullet points\n\
\n\
Transcript:\n\
{transcript}\n"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Gemini,
    Anthropic,
    OpenAi,
}

fn provider_for(model: &str) -> Provider {
    if model.starts_with("gemini") {
        Provider::Gemini
    } else if model.starts_with("claude") {
        Provider::Anthropic
    } else {
        Provider::OpenAi
    }
}

/// Chat-completion client; the provider is picked from the model name
pub struct LlmClient {
    client: reqwest::Client,
    model: String,
}

impl LlmClient {
    pub fn new(client: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match provider_for(&self.model) {
            Provider::Gemini => complete_gemini(&self.client, prompt, &self.model).await,
            Provider::Anthropic => complete_anthropic(&self.client, prompt, &self.model).await,
            Provider::OpenAi => complete_openai(&self.client, prompt, &self.model).await,
        }
    }
}

fn api_key(var: &str, provider: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| eyre::eyre!("{var} environment variable not set (required for {provider} summarization)"))
}

async fn complete_gemini(client: &reqwest::Client, prompt: &str, model: &str) -> Result<String> {
    let api_key = api_key("GOOGLE_API_KEY", "Gemini")?;

    debug!("Summarizing via Gemini API with model {model}");

    let body = serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [ { "text": prompt } ]
            }
        ],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "maxOutputTokens": MAX_OUTPUT_TOKENS
        }
    });

    let resp = client
        .post(format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        ))
        .header("x-goog-api-key", &api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Gemini API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_gemini_text(&json)
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Gemini API response format");
}

async fn complete_anthropic(client: &reqwest::Client, prompt: &str, model: &str) -> Result<String> {
    let api_key = api_key("ANTHROPIC_API_KEY", "Claude")?;

    debug!("Summarizing via Anthropic API with model {model}");

    let body = serde_json::json!({
        "model": model,
        "max_tokens": MAX_OUTPUT_TOKENS,
        "temperature": TEMPERATURE,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let resp = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Anthropic API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_anthropic_text(&json)
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str()
                } else {
                    None
                }
            })
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Anthropic API response format");
}

async fn complete_openai(client: &reqwest::Client, prompt: &str, model: &str) -> Result<String> {
    let api_key = api_key("OPENAI_API_KEY", "OpenAI")?;

    debug!("Summarizing via OpenAI API with model {model}");

    let body = serde_json::json!({
        "model": model,
        "temperature": TEMPERATURE,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(&api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("OpenAI API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_openai_text(&json)
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for() {
        assert_eq!(provider_for("gemini-2.0-flash"), Provider::Gemini);
        assert_eq!(provider_for("claude-sonnet-4-6"), Provider::Anthropic);
        assert_eq!(provider_for("gpt-4o"), Provider::OpenAi);
        assert_eq!(provider_for("gpt-4o-mini"), Provider::OpenAi);
    }

    #[test]
    fn test_prompt_embeds_transcript() {
        let prompt = summarization_prompt("hello world");
        assert!(prompt.contains("headings"));
        assert!(prompt.ends_with("Transcript:\nhello world\n"));
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                { "content": { "role": "model", "parts": [ { "text": "# Title\n\n" }, { "text": "Body" } ] } }
            ]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "# Title\n\nBody");
    }

    #[test]
    fn test_extract_gemini_text_empty() {
        let json = serde_json::json!({ "candidates": [] });
        assert!(extract_gemini_text(&json).is_err());
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                {
                    "type": "text",
                    "text": "Here is the summary."
                }
            ]
        });
        assert_eq!(extract_anthropic_text(&json).unwrap(), "Here is the summary.");
    }

    #[test]
    fn test_extract_anthropic_text_empty() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_text(&json).is_err());
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "Summary of the video."
                    }
                }
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "Summary of the video.");
    }

    #[test]
    fn test_extract_openai_text_empty() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_text(&json).is_err());
    }
}
