use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::Cli;
use ytsum::config::Config;
use ytsum::notion::NotionClient;
use ytsum::summarize::{DEFAULT_MODEL, LlmClient};
use ytsum::{SubtitlePipeline, output};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help(yt_dlp: &str) -> String {
    let yt_dlp_line = match tool_version(yt_dlp) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found: needed to locate subtitles)".to_string(),
    };

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\n\
ENVIRONMENT:\n\
\x20 GOOGLE_API_KEY / ANTHROPIC_API_KEY / OPENAI_API_KEY   LLM credentials\n\
\x20 NOTION_TOKEN, NOTION_PARENT_PAGE_ID                   for --save-notion\n\n\
Config: {}\nLogs are written to: {}",
        ytsum::config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;
    dotenvy::dotenv().ok();

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();
    let settings = config.pipeline_settings();

    let after_help = build_after_help(&settings.yt_dlp_path);
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // CLI flags take priority over config
    let lang = cli.lang.clone().or_else(|| config.default_lang.clone());
    let model = cli
        .model
        .clone()
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(output::DEFAULT_OUTPUT_DIR));

    debug!("lang={lang:?} model={model} range={:?}", cli.range);

    let client = reqwest::Client::new();
    let pipeline = SubtitlePipeline::from_settings(client.clone(), &settings);
    let llm = LlmClient::new(client.clone(), &model);
    let notion = if cli.save_notion {
        Some(NotionClient::from_env(client.clone(), config.notion_parent_page_id.clone())?)
    } else {
        None
    };

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL provided\n\nUsage: ytsum <URL>\n       echo <URL> | ytsum");
    }

    for url in &urls {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }

        let started = chrono::Local::now();

        if cli.transcript_only {
            let transcript = pipeline.get_transcript(url, lang.as_deref(), cli.range.as_ref()).await?;
            println!("{transcript}");
            continue;
        }

        if cli.verbose {
            eprintln!("Summarizing {url} with {}", llm.model());
        }

        let summary =
            ytsum::summarize::summarize_video(&pipeline, &llm, url, lang.as_deref(), cli.range.as_ref()).await?;
        println!("{summary}");

        if cli.verbose {
            let finished = chrono::Local::now();
            let minutes = (finished - started).num_milliseconds() as f64 / 60_000.0;
            eprintln!(
                "Completed at {} (took {minutes:.2} minutes)",
                finished.format("%Y-%m-%d %H:%M:%S")
            );
        }

        if cli.save_local || notion.is_some() {
            let path = output::save_summary(&output_dir, &summary)?;
            if cli.save_local {
                println!("\nSummary saved to: {}", path.display());
            }
            if let Some(ref notion) = notion {
                let page = notion.save_file(&path, Some(url)).await?;
                println!("Notion page created: {page}");
            }
        }
    }

    Ok(())
}
