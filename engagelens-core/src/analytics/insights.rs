//! Performance insights: performers, window-over-window change, posting
//! frequency and engagement rate.
//!
//! Performers are read from one total order (engagement desc, newer first,
//! missing timestamps oldest, then id). The top list is its head and the
//! bottom list its tail read backwards, skipping anything already in the
//! top list, so the two never share a record.

use super::{average, AnalyticsContext, SectionStatus};
use crate::format::{caption_preview, serialize_or_na};
use crate::types::{ContentRecord, MediaType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Characters of caption kept in performer summaries.
const CAPTION_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformerSummary {
    pub id: String,
    pub owner_id: String,
    #[serde(serialize_with = "serialize_or_na")]
    pub username: Option<String>,
    pub media_type: MediaType,
    #[serde(serialize_with = "serialize_or_na")]
    pub timestamp: Option<DateTime<Utc>>,
    pub engagement: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
    pub views: u64,
    pub caption_preview: String,
    pub permalink: Option<String>,
}

/// A current-window figure against the same figure one window earlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodChange {
    pub current: u64,
    pub previous: u64,
    /// `None` when the previous window has nothing to compare against
    pub change_pct: Option<f64>,
    pub comparable: bool,
}

impl PeriodChange {
    pub fn between(current: u64, previous: u64) -> Self {
        let change_pct = (previous > 0)
            .then(|| (current as f64 - previous as f64) / previous as f64 * 100.0);
        Self {
            current,
            previous,
            change_pct,
            comparable: change_pct.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceInsights {
    pub status: SectionStatus,
    pub top_performers: Vec<PerformerSummary>,
    pub bottom_performers: Vec<PerformerSummary>,
    pub engagement_change: PeriodChange,
    pub posts_change: PeriodChange,
    pub posts_per_day: f64,
    pub posts_per_week: f64,
    /// Total engagement over summed followers, as a percentage
    #[serde(serialize_with = "serialize_or_na")]
    pub engagement_rate_pct: Option<f64>,
    pub limit: usize,
}

pub fn compute(ctx: &AnalyticsContext<'_>, limit: usize) -> PerformanceInsights {
    let usernames: HashMap<&str, &str> = ctx
        .profiles
        .iter()
        .map(|p| (p.id.as_str(), p.username.as_str()))
        .collect();
    let summarize =
        |record: &ContentRecord| summary(record, usernames.get(record.owner_id.as_str()));

    let mut ranked: Vec<&ContentRecord> = ctx.records.iter().collect();
    ranked.sort_by(|a, b| performer_order(a, b));

    let top_len = limit.min(ranked.len());
    let top_performers = ranked[..top_len].iter().map(|r| summarize(*r)).collect();
    let bottom_performers = ranked[top_len..]
        .iter()
        .rev()
        .take(limit)
        .map(|r| summarize(*r))
        .collect();

    // Time comparisons only use records that can be placed in a window
    let (current_posts, current_engagement) = ctx
        .timestamped()
        .fold((0u64, 0u64), |(n, e), (r, _)| (n + 1, e.saturating_add(r.engagement())));
    let (previous_posts, previous_engagement) = ctx
        .previous_records
        .unwrap_or_default()
        .iter()
        .filter(|r| r.timestamp.is_some_and(|ts| ctx.window.in_previous(ts)))
        .fold((0u64, 0u64), |(n, e), r| (n + 1, e.saturating_add(r.engagement())));

    let posts_per_day = average(current_posts, u64::from(ctx.window.days));

    let total_engagement = ctx
        .records
        .iter()
        .fold(0u64, |sum, r| sum.saturating_add(r.engagement()));
    let total_followers = ctx
        .profiles
        .iter()
        .fold(0u64, |sum, p| sum.saturating_add(p.follower_count));
    let engagement_rate_pct = (total_followers > 0)
        .then(|| total_engagement as f64 * 100.0 / total_followers as f64);

    PerformanceInsights {
        status: SectionStatus::from_has_data(!ctx.records.is_empty()),
        top_performers,
        bottom_performers,
        engagement_change: PeriodChange::between(current_engagement, previous_engagement),
        posts_change: PeriodChange::between(current_posts, previous_posts),
        posts_per_day,
        posts_per_week: posts_per_day * 7.0,
        engagement_rate_pct,
        limit,
    }
}

fn performer_order(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    b.engagement()
        .cmp(&a.engagement())
        // Some(_) > None, so newer-first also puts untimestamped last
        .then(b.timestamp.cmp(&a.timestamp))
        .then_with(|| a.id.cmp(&b.id))
}

fn summary(record: &ContentRecord, username: Option<&&str>) -> PerformerSummary {
    PerformerSummary {
        id: record.id.clone(),
        owner_id: record.owner_id.clone(),
        username: username.map(|u| u.to_string()),
        media_type: record.media_type,
        timestamp: record.timestamp,
        engagement: record.engagement(),
        likes: record.like_count,
        comments: record.comment_count,
        shares: record.share_count,
        saves: record.save_count,
        views: record.view_count,
        caption_preview: caption_preview(&record.caption, CAPTION_PREVIEW_CHARS),
        permalink: record.permalink.clone(),
    }
}
