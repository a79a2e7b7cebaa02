use std::path::Path;
use std::sync::LazyLock;

use eyre::{Result, bail};
use log::{debug, info, warn};
use regex::Regex;
use serde_json::{Value, json};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion rejects rich-text items longer than this
const MAX_TEXT_CHARS: usize = 2000;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:(?:www\.)?youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)[\w-]+").unwrap()
});

/// Creates Notion pages from saved summaries
pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    parent_page_id: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(client: reqwest::Client, token: impl Into<String>, parent_page_id: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            parent_page_id: parent_page_id.into(),
            base_url: NOTION_API_URL.to_string(),
        }
    }

    /// Build from `NOTION_TOKEN` and `NOTION_PARENT_PAGE_ID` (the latter may come from config instead)
    pub fn from_env(client: reqwest::Client, parent_page_id: Option<String>) -> Result<Self> {
        let token = std::env::var("NOTION_TOKEN")
            .map_err(|_| eyre::eyre!("NOTION_TOKEN environment variable not set (required for --save-notion)"))?;
        let parent_page_id = std::env::var("NOTION_PARENT_PAGE_ID")
            .ok()
            .into_iter()
            .chain(parent_page_id)
            .find(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                eyre::eyre!(
                    "no Notion parent page configured: create a page, share it with your integration, \
                     then set NOTION_PARENT_PAGE_ID or notion_parent_page_id in the config file"
                )
            })?;
        Ok(Self::new(client, token, parent_page_id))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a page from a summary file; returns the new page's URL (or ID if Notion sent no URL).
    pub async fn save_file(&self, path: &Path, source_url: Option<&str>) -> Result<String> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            bail!("summary file {} is empty", path.display());
        }

        let source_url = source_url.map(str::to_string).or_else(|| extract_youtube_url(&content));

        let title = match extract_title(&content) {
            Some(title) => {
                debug!("Using title from content: {title}");
                title
            }
            None => {
                warn!("No # heading found in {}, using file name as title", path.display());
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "Video summary".to_string())
            }
        };

        self.create_page(&title, &content, source_url.as_deref()).await
    }

    pub async fn create_page(&self, title: &str, content: &str, source_url: Option<&str>) -> Result<String> {
        let page = page_body(&self.parent_page_id, title, content, source_url);

        let resp = self
            .client
            .post(format!("{}/pages", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&page)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Notion API returned {status}: {body}");
        }

        let json: Value = resp.json().await?;
        let location = json
            .get("url")
            .or_else(|| json.get("id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre::eyre!("unexpected Notion API response format"))?;

        info!("Created Notion page: {location}");
        Ok(location.to_string())
    }
}

fn page_body(parent_page_id: &str, title: &str, content: &str, source_url: Option<&str>) -> Value {
    let mut children = Vec::new();
    if let Some(url) = source_url {
        children.push(json!({ "object": "block", "type": "embed", "embed": { "url": url } }));
        children.push(json!({ "object": "block", "type": "divider", "divider": {} }));
    }
    children.extend(text_to_blocks(content));

    json!({
        "parent": { "page_id": parent_page_id },
        "properties": {
            "title": { "title": [ { "text": { "content": title } } ] }
        },
        "children": children
    })
}

/// First `# ` heading, used as the page title
pub fn extract_title(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

pub fn extract_youtube_url(content: &str) -> Option<String> {
    YOUTUBE_URL.find(content).map(|m| m.as_str().to_string())
}

/// Blank-line separated paragraphs become paragraph blocks; `#`-prefixed ones become headings (level capped at 3).
pub fn text_to_blocks(content: &str) -> Vec<Value> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|paragraph| {
            let hashes = paragraph.len() - paragraph.trim_start_matches('#').len();
            if hashes > 0 {
                let kind = format!("heading_{}", hashes.min(3));
                let text = paragraph.trim_start_matches('#').trim();
                let mut block = json!({ "object": "block", "type": kind.as_str() });
                block[kind.as_str()] = json!({ "rich_text": rich_text(text) });
                block
            } else {
                json!({ "object": "block", "type": "paragraph", "paragraph": { "rich_text": rich_text(paragraph) } })
            }
        })
        .collect()
}

fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk.iter().collect::<String>() } }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("intro\n  # My Title  \n## Sub"), Some("My Title".to_string()));
        assert_eq!(extract_title("## Only a subheading"), None);
        assert_eq!(extract_title("no headings"), None);
    }

    #[test]
    fn test_extract_youtube_url() {
        let text = "Source: https://www.youtube.com/watch?v=abc_123-x&t=5 and more";
        assert_eq!(
            extract_youtube_url(text).as_deref(),
            Some("https://www.youtube.com/watch?v=abc_123-x")
        );
        assert_eq!(
            extract_youtube_url("see https://youtu.be/xyz").as_deref(),
            Some("https://youtu.be/xyz")
        );
        assert_eq!(extract_youtube_url("nothing here"), None);
    }

    #[test]
    fn test_text_to_blocks() {
        let blocks = text_to_blocks("# Title\n\nFirst paragraph.\n\n#### Deep\n\n\n\nLast");
        assert_eq!(blocks.len(), 4);

        assert_eq!(blocks[0]["type"], "heading_1");
        assert_eq!(blocks[0]["heading_1"]["rich_text"][0]["text"]["content"], "Title");

        assert_eq!(blocks[1]["type"], "paragraph");
        assert_eq!(blocks[1]["paragraph"]["rich_text"][0]["text"]["content"], "First paragraph.");

        assert_eq!(blocks[2]["type"], "heading_3");
        assert_eq!(blocks[2]["heading_3"]["rich_text"][0]["text"]["content"], "Deep");

        assert_eq!(blocks[3]["paragraph"]["rich_text"][0]["text"]["content"], "Last");
    }

    #[test]
    fn test_long_paragraph_is_chunked() {
        let long = "é".repeat(MAX_TEXT_CHARS + 10);
        let blocks = text_to_blocks(&long);
        let rich = blocks[0]["paragraph"]["rich_text"].as_array().unwrap();
        assert_eq!(rich.len(), 2);
        assert_eq!(rich[1]["text"]["content"].as_str().unwrap().chars().count(), 10);
    }

    #[test]
    fn test_page_body_embeds_source() {
        let body = page_body("parent", "T", "text", Some("https://youtu.be/abc"));
        assert_eq!(body["parent"]["page_id"], "parent");
        assert_eq!(body["properties"]["title"]["title"][0]["text"]["content"], "T");
        assert_eq!(body["children"][0]["embed"]["url"], "https://youtu.be/abc");
        assert_eq!(body["children"][1]["type"], "divider");
        assert_eq!(body["children"][2]["type"], "paragraph");
    }

    #[test]
    fn test_page_body_without_source() {
        let body = page_body("parent", "T", "text", None);
        assert_eq!(body["children"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_file_creates_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .and(bearer_token("secret"))
            .and(header("Notion-Version", NOTION_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "page-id",
                "url": "https://www.notion.so/page-id"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("summary_20240101_000000.txt");
        std::fs::write(&file, "# Big Ideas\n\nSome text.").unwrap();

        let notion = NotionClient::new(reqwest::Client::new(), "secret", "parent").with_base_url(server.uri());
        let url = notion
            .save_file(&file, Some("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();
        assert_eq!(url, "https://www.notion.so/page-id");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["properties"]["title"]["title"][0]["text"]["content"], "Big Ideas");
        assert_eq!(sent["children"][0]["embed"]["url"], "https://www.youtube.com/watch?v=abc123");
    }

    #[tokio::test]
    async fn test_save_file_falls_back_to_file_stem() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "page-id" })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("summary_20240101_000000.txt");
        std::fs::write(&file, "No heading here.").unwrap();

        let notion = NotionClient::new(reqwest::Client::new(), "secret", "parent").with_base_url(server.uri());
        assert_eq!(notion.save_file(&file, None).await.unwrap(), "page-id");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            sent["properties"]["title"]["title"][0]["text"]["content"],
            "summary_20240101_000000"
        );
        assert_eq!(sent["children"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_page_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("validation_error"))
            .mount(&server)
            .await;

        let notion = NotionClient::new(reqwest::Client::new(), "secret", "parent").with_base_url(server.uri());
        let err = notion.create_page("T", "body", None).await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
