use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::{
    io, Briefing, BriefingMailer, BriefingSummarizer, Config, EmailConfig, NewsAggregator,
    ReportGenerator, ReportTheme,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "news-briefing")]
#[command(about = "Generate and send a weekly AI & tech news briefing")]
struct Args {
    /// Number of days to look back when fetching news
    #[arg(long, default_value_t = 7)]
    days: i64,

    /// Fetch, summarize, and render the report, but do not send email
    #[arg(long)]
    dry_run: bool,

    /// Path for the rendered report (default: AI-Tech-Briefing-YYYY-MM-DD.html)
    #[arg(long)]
    report_output: Option<PathBuf>,

    /// Save the rendered email HTML body to this path for debugging
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save the raw briefing JSON to this path for debugging
    #[arg(long)]
    save_json: Option<PathBuf>,

    /// Claude model to use for summarization
    #[arg(long, default_value = "claude-sonnet-4-5-20250929")]
    model: String,

    /// Minimum stories required to proceed
    #[arg(long, default_value_t = 10)]
    min_stories: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let started = Utc::now();
    info!(
        "AI & Tech news briefing starting (look-back: {} days | dry run: {} | model: {})",
        args.days, args.dry_run, args.model
    );

    println!("📡 STEP 1/4 — Aggregating news…");
    let aggregator = NewsAggregator::new()?;
    let items = aggregator.aggregate(args.days).await;
    check_minimum(items.len(), args.min_stories)?;
    println!("✓ Aggregated {} stories", items.len());

    println!("\n🤖 STEP 2/4 — Summarizing with {}…", args.model);
    let config = Config::from_env()?;
    let summarizer = BriefingSummarizer::new(config.anthropic_api_key, args.model.clone())?;
    let briefing = summarizer
        .summarize(&items)
        .await
        .context("Fatal error during summarization")?;

    if let Some(path) = &args.save_json {
        match io::save_briefing_json(&briefing, path) {
            Ok(()) => info!("Saved briefing JSON to {}", path.display()),
            Err(e) => warn!("Could not save JSON: {:#}", e),
        }
    }
    println!(
        "✓ Summarization complete: {} top stories, {} categorized",
        briefing.top_stories.len(),
        briefing.total_stories()
    );

    println!("\n📄 STEP 3/4 — Rendering report…");
    let now = Utc::now();
    let report_path = args
        .report_output
        .clone()
        .unwrap_or_else(|| ReportGenerator::default_path(now));
    let generator = ReportGenerator::new(ReportTheme::default());
    let html = generator.generate(&briefing, args.days, now);
    io::save_text(&report_path, &html).context("Fatal error during report rendering")?;
    println!("✓ Report written to {}", report_path.display());

    if args.dry_run {
        println!("\nSTEP 4/4 — DRY RUN: skipping email send.");
        print_dry_run_summary(&briefing, &report_path);
    } else {
        println!("\n📬 STEP 4/4 — Sending email…");
        let email_config = EmailConfig::from_env()?;
        let mailer = BriefingMailer::new(email_config);
        mailer
            .send(&briefing, &report_path, args.days, args.output.as_deref())
            .await
            .context("Fatal error during email send")?;
        println!("✓ Email sent");
    }

    let elapsed = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
    info!("Briefing pipeline completed in {:.1} seconds", elapsed);
    Ok(())
}

/// The run aborts before summarization when too few stories were found.
fn check_minimum(count: usize, min_stories: usize) -> Result<()> {
    if count < min_stories {
        anyhow::bail!(
            "Only {} stories found (minimum: {}). Check that news sources are reachable.",
            count,
            min_stories
        );
    }
    Ok(())
}

fn print_dry_run_summary(briefing: &Briefing, report_path: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("EXECUTIVE SUMMARY");
    println!("{}", "=".repeat(60));
    println!("{}", briefing.executive_summary);
    println!("\nTOP STORIES:");
    for (i, story) in briefing.top_stories.iter().enumerate() {
        println!("  {}. {} [{}]", i + 1, story.title, story.source);
    }
    println!("\nReport saved to: {}", report_path.display());
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_minimum_aborts_below_threshold() {
        let err = check_minimum(3, 10).unwrap_err().to_string();
        assert!(err.contains("Only 3 stories found (minimum: 10)"));
    }

    #[test]
    fn test_check_minimum_passes_at_threshold() {
        assert!(check_minimum(10, 10).is_ok());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["news-briefing"]);
        assert_eq!(args.days, 7);
        assert_eq!(args.min_stories, 10);
        assert!(!args.dry_run);
        assert!(args.report_output.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "news-briefing",
            "--days",
            "14",
            "--dry-run",
            "--min-stories",
            "3",
            "--report-output",
            "out/brief.html",
        ]);
        assert_eq!(args.days, 14);
        assert!(args.dry_run);
        assert_eq!(args.min_stories, 3);
        assert_eq!(args.report_output, Some(PathBuf::from("out/brief.html")));
    }
}
