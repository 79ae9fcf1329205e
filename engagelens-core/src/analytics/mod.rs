//! Analytics module for engagelens
//!
//! Turns a loaded snapshot of content records into the sections consumed by
//! the dashboard, the comparison view and the chat assistant's context:
//! - [`basic`]: totals, averages and per-media-type counts
//! - [`content_type`]: per-type performance and the best-performing type
//! - [`posting_time`]: hour, weekday and time-of-day breakdowns
//! - [`hashtags`]: per-hashtag usage and engagement
//! - [`trend`]: gap-filled daily engagement series
//! - [`insights`]: top/bottom performers, window-over-window deltas, rates
//!
//! Every stage is a pure function of an [`AnalyticsContext`]. Stages never
//! fail: an input they cannot summarize produces a fully shaped section
//! flagged [`SectionStatus::NoData`].
//!
//! See [`engine`] for the composer that loads data once and runs the stages.

pub mod basic;
pub mod cache;
pub mod content_type;
pub mod engine;
pub mod hashtags;
pub mod insights;
pub mod loader;
pub mod posting_time;
pub mod trend;
pub mod window;

pub use basic::{BasicStats, ProfileSummary};
pub use content_type::{ContentTypePerformance, TypeStats};
pub use engine::{
    AccountAnalytics, AnalyticsEngine, AnalyticsRequest, AnalyticsResult, ResultMetadata,
};
pub use hashtags::{extract_hashtags, HashtagPerformance, HashtagStats};
pub use insights::{PerformanceInsights, PerformerSummary, PeriodChange};
pub use loader::{DataLoader, LoadRequest, LoadedData};
pub use posting_time::{DayStats, HourStats, PeriodStats, PostingTimeAnalysis, TimePeriod};
pub use trend::{DailyEngagement, EngagementTrend};
pub use window::Window;

use crate::error::{Error, Result};
use crate::types::{ContentRecord, ProfileRecord};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ============================================
// Section names
// ============================================

/// A named analytics section. The serialized names are the top-level keys
/// of an [`AnalyticsResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    BasicStats,
    ContentTypePerformance,
    PostingTimeAnalysis,
    HashtagPerformance,
    EngagementTrend,
    PerformanceInsights,
}

impl Section {
    /// Every section, in output order.
    pub const ALL: [Section; 6] = [
        Section::BasicStats,
        Section::ContentTypePerformance,
        Section::PostingTimeAnalysis,
        Section::HashtagPerformance,
        Section::EngagementTrend,
        Section::PerformanceInsights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::BasicStats => "basic_stats",
            Section::ContentTypePerformance => "content_type_performance",
            Section::PostingTimeAnalysis => "posting_time_analysis",
            Section::HashtagPerformance => "hashtag_performance",
            Section::EngagementTrend => "engagement_trend",
            Section::PerformanceInsights => "performance_insights",
        }
    }

    /// Parse caller-supplied section names.
    ///
    /// Duplicates collapse and the result is in output order. Any unknown
    /// name fails the whole list.
    pub fn parse_list<I, S>(names: I) -> Result<Vec<Section>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Section>>>()?;
        sections.sort();
        sections.dedup();
        Ok(sections)
    }
}

impl std::str::FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == name)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown section: {:?}", name)))
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a section had anything to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Ok,
    /// Input was structurally empty; the section is zero-filled
    NoData,
}

impl SectionStatus {
    pub(crate) fn from_has_data(has_data: bool) -> Self {
        if has_data {
            SectionStatus::Ok
        } else {
            SectionStatus::NoData
        }
    }
}

// ============================================
// Stage context
// ============================================

/// Read-only input shared by every stage in one composer call.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsContext<'a> {
    /// Records in the current window, plus untimestamped records
    pub records: &'a [ContentRecord],
    /// Records in the comparison window, if loaded
    pub previous_records: Option<&'a [ContentRecord]>,
    pub profiles: &'a [ProfileRecord],
    pub window: &'a Window,
}

impl<'a> AnalyticsContext<'a> {
    /// Records with a timestamp inside the window, paired with their local time.
    pub fn timestamped(
        &self,
    ) -> impl Iterator<Item = (&'a ContentRecord, DateTime<FixedOffset>)> + 'a {
        let window = self.window;
        let records = self.records;
        records.iter().filter_map(move |record| {
            record
                .timestamp
                .filter(|ts| window.contains(*ts))
                .map(|ts| (record, window.local(ts)))
        })
    }
}

// ============================================
// Shared arithmetic
// ============================================

/// `total / count`, or 0 when there is nothing to divide by.
pub(crate) fn average(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    average(part, whole) * 100.0
}

/// Post count and summed engagement for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub count: u64,
    pub engagement: u64,
}

impl Tally {
    pub fn add(&mut self, record: &ContentRecord) {
        self.count += 1;
        self.engagement = self.engagement.saturating_add(record.engagement());
    }

    pub fn avg(&self) -> f64 {
        average(self.engagement, self.count)
    }
}

/// Indices of non-empty tallies ranked by average engagement (desc), then
/// post count (desc), then index (asc).
pub(crate) fn rank_tallies(tallies: &[Tally]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..tallies.len())
        .filter(|&i| tallies[i].count > 0)
        .collect();
    ranked.sort_by(|&a, &b| {
        tallies[b]
            .avg()
            .total_cmp(&tallies[a].avg())
            .then(tallies[b].count.cmp(&tallies[a].count))
            .then(a.cmp(&b))
    });
    ranked
}
