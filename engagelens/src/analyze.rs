//! engagelens-analyze - CLI tool to compute engagement analytics
//!
//! Runs the analytics composer over the local database and prints the
//! result as text, pretty JSON, or the compact context blob.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use engagelens_core::analytics::{
    AccountAnalytics, AnalyticsEngine, AnalyticsRequest, AnalyticsResult,
};
use engagelens_core::format::{caption_preview, format_delta, NOT_AVAILABLE};
use engagelens_core::{Config, Database, Section};

#[derive(Parser)]
#[command(name = "engagelens-analyze")]
#[command(about = "Compute engagement analytics for social content")]
#[command(version)]
struct Args {
    /// Account to analyze. If not provided, analyzes all accounts
    #[arg(short, long)]
    username: Option<String>,

    /// Window length in days (defaults to analytics.default_days)
    #[arg(short, long)]
    days: Option<u32>,

    /// Section to compute; repeat for several. Defaults to all sections
    #[arg(short, long = "section")]
    sections: Vec<String>,

    /// Number of hashtags in each top list
    #[arg(long)]
    top_hashtags: Option<usize>,

    /// Number of top and bottom performers
    #[arg(short, long)]
    limit: Option<usize>,

    /// Compare several accounts (comma-separated usernames)
    #[arg(long, value_delimiter = ',', conflicts_with = "username")]
    compare: Vec<String>,

    /// Compute as of this RFC 3339 instant instead of now
    #[arg(long)]
    as_of: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    /// Compact JSON for the chat assistant
    Context,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        engagelens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Validate arguments before touching the database
    let sections = if args.sections.is_empty() {
        None
    } else {
        Some(Section::parse_list(&args.sections)?)
    };
    let now = match &args.as_of {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --as-of timestamp: {}", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let days = args.days.unwrap_or(config.analytics.default_days);

    // Open database
    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let engine =
        AnalyticsEngine::new(db, config.analytics).context("invalid analytics configuration")?;

    if !args.compare.is_empty() {
        let results = engine
            .compare_accounts(&args.compare, days, sections, now)
            .context("comparison failed")?;
        return print_comparison(&results, args.format);
    }

    let mut request = AnalyticsRequest::new(args.username.as_deref(), days);
    request.sections = sections;
    request.top_hashtags = args.top_hashtags;
    request.performer_limit = args.limit;

    let result = engine
        .compute_analytics_at(&request, now)
        .context("analytics failed")?;

    match args.format {
        OutputFormat::Json => println!("{}", result.to_json_pretty()?),
        OutputFormat::Context => println!("{}", result.to_context_json()?),
        OutputFormat::Text => print_text(&result),
    }

    Ok(())
}

fn print_comparison(results: &[AccountAnalytics], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Context => println!("{}", serde_json::to_string(results)?),
        OutputFormat::Text => {
            for account in results {
                println!("=== @{} ===", account.username);
                print_text(&account.result);
                println!();
            }
        }
    }
    Ok(())
}

fn print_text(result: &AnalyticsResult) {
    let meta = &result.metadata;
    println!(
        "Analytics for {} over {} day(s) (UTC{})",
        meta.username_filter
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "all accounts".to_string()),
        meta.period_days,
        meta.utc_offset
    );
    println!(
        "Window: {} .. {}",
        meta.window_start.format("%Y-%m-%d %H:%M"),
        meta.window_end.format("%Y-%m-%d %H:%M")
    );
    println!("Records: {}", meta.total_records);

    if let Some(basic) = &result.basic_stats {
        println!("\nBasic stats");
        println!("  Posts:           {}", basic.total_posts);
        println!("  Engagement:      {}", basic.total_engagement);
        println!("  Likes/Comments:  {} / {}", basic.total_likes, basic.total_comments);
        println!("  Avg per post:    {:.1}", basic.avg_engagement_per_post);
        println!("  Followers:       {}", basic.total_followers);
        for (media_type, count) in &basic.media_type_counts {
            println!("  {:<16} {}", format!("{}:", media_type), count);
        }
    }

    if let Some(types) = &result.content_type_performance {
        println!("\nContent types");
        for (media_type, stats) in &types.by_type {
            println!(
                "  {:<10} {:>5} posts  avg {:>8.1}  ({:.1}%)",
                media_type.as_str(),
                stats.count,
                stats.avg_engagement,
                stats.percentage
            );
        }
        println!(
            "  Best type: {}",
            types
                .best_performing_type
                .map(|t| t.as_str())
                .unwrap_or(NOT_AVAILABLE)
        );
    }

    if let Some(timing) = &result.posting_time_analysis {
        println!("\nPosting time");
        println!("  Timestamped posts: {}", timing.timestamped_records);
        for period in &timing.by_period {
            println!(
                "  {:<10} {:>5} posts  avg {:>8.1}  ({:.1}%)",
                period.period.as_str(),
                period.posts_count,
                period.avg_engagement,
                period.percentage
            );
        }
        println!(
            "  Recommended: {}",
            timing
                .recommended_posting_time
                .as_deref()
                .unwrap_or(NOT_AVAILABLE)
        );
    }

    if let Some(tags) = &result.hashtag_performance {
        println!("\nHashtags ({} distinct)", tags.distinct_hashtags);
        for stats in &tags.top_by_engagement {
            println!(
                "  {:<24} used {:>4}  total {:>8}  avg {:>8.1}",
                stats.hashtag, stats.usage_count, stats.total_engagement, stats.avg_engagement
            );
        }
    }

    if let Some(trend) = &result.engagement_trend {
        println!("\nDaily engagement");
        for day in &trend.daily {
            println!(
                "  {}  {:>4} posts  {:>8} engagement",
                day.date, day.posts_count, day.total_engagement
            );
        }
    }

    if let Some(insights) = &result.performance_insights {
        println!("\nInsights");
        println!(
            "  Engagement vs previous window: {}",
            format_delta(insights.engagement_change.change_pct)
        );
        println!("  Posts per week: {:.1}", insights.posts_per_week);
        println!(
            "  Engagement rate: {}",
            insights
                .engagement_rate_pct
                .map(|r| format!("{:.2}%", r))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        );
        println!("  Top performers:");
        for post in &insights.top_performers {
            println!(
                "    {:>8}  {}  {}",
                post.engagement,
                post.id,
                caption_preview(&post.caption_preview, 40)
            );
        }
    }
}
