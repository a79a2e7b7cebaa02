use clap::Parser;
use std::path::PathBuf;

use ytsum::TimeRange;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize YouTube videos from their subtitles",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (reads from stdin if omitted)
    pub url: Option<String>,

    /// Subtitle language code (default: first language YouTube lists for the video)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Only use subtitles in this window: START-END, each side SS, MM:SS or HH:MM:SS
    #[arg(short, long, value_parser = parse_range)]
    pub range: Option<TimeRange>,

    /// Print the cleaned transcript instead of summarizing it
    #[arg(short, long, conflicts_with_all = ["save_local", "save_notion"])]
    pub transcript_only: bool,

    /// Save the summary to a timestamped file in the output directory
    #[arg(long)]
    pub save_local: bool,

    /// Save the summary to a new Notion page
    #[arg(long)]
    pub save_notion: bool,

    /// Directory for saved summaries (default: ./outputs)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// LLM model for summarization (gemini-*, claude-*, or an OpenAI model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Show progress and timing on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_range(s: &str) -> Result<TimeRange, String> {
    s.parse().map_err(|e: ytsum::SubtitleError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "ytsum",
            "https://youtu.be/abc123",
            "--lang",
            "en",
            "--range",
            "0:30-1:30",
            "--save-local",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/abc123"));
        assert_eq!(cli.lang.as_deref(), Some("en"));
        let range = cli.range.unwrap();
        assert_eq!((range.start_ms(), range.end_ms()), (30_000, 90_000));
        assert!(cli.save_local);
        assert!(!cli.save_notion);
    }

    #[test]
    fn test_bad_range_rejected() {
        assert!(Cli::try_parse_from(["ytsum", "https://youtu.be/abc123", "-r", "90-30"]).is_err());
    }

    #[test]
    fn test_transcript_only_conflicts_with_saving() {
        let url = "https://youtu.be/abc123";
        assert!(Cli::try_parse_from(["ytsum", url, "-t", "--save-notion"]).is_err());
        assert!(Cli::try_parse_from(["ytsum", url, "-t", "--save-local"]).is_err());

        let cli = Cli::try_parse_from(["ytsum", url, "-t"]).unwrap();
        assert!(cli.transcript_only);
    }
}
