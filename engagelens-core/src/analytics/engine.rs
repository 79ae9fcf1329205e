//! Analytics composer
//!
//! Loads one snapshot per request and runs the requested stages over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     ANALYTICS ENGINE                            │
//! │                                                                 │
//! │  AnalyticsRequest ──► Window ──► DataLoader ──► LoadedData      │
//! │                                  (RecordSource, optional cache) │
//! │                                                    │            │
//! │         ┌──────────┬──────────┬──────────┬────────┴─┬────────┐ │
//! │         ▼          ▼          ▼          ▼          ▼        ▼ │
//! │      basic    content_type posting_time hashtags  trend insights│
//! │         │          │          │          │          │        │ │
//! │         └──────────┴──────────┴────┬─────┴──────────┴────────┘ │
//! │                                    ▼                            │
//! │                             AnalyticsResult                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parameter and storage errors abort the request. A stage with nothing to
//! summarize still returns its section, marked `no_data`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use engagelens_core::analytics::{AnalyticsEngine, AnalyticsRequest};
//! use engagelens_core::{Config, Database};
//!
//! let config = Config::load()?;
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let engine = AnalyticsEngine::new(db, config.analytics)?;
//! let result = engine.compute_analytics(&AnalyticsRequest::new(Some("acme"), 30))?;
//! println!("{}", result.to_context_json()?);
//! ```

use super::loader::{DataLoader, LoadRequest};
use super::window::Window;
use super::{
    basic, content_type, hashtags, insights, posting_time, trend, AnalyticsContext, BasicStats,
    ContentTypePerformance, EngagementTrend, HashtagPerformance, PerformanceInsights,
    PostingTimeAnalysis, Section,
};
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::format::format_offset;
use crate::source::RecordSource;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::time::Instant;

// ============================================
// Request and result
// ============================================

/// Parameters for one composer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRequest {
    /// Restrict to one account; `None` means every account
    pub username: Option<String>,
    pub days: u32,
    /// Sections to compute; `None` means all of them
    pub sections: Option<Vec<Section>>,
    /// Top-N cutoff for hashtag views; `None` uses the configured default
    pub top_hashtags: Option<usize>,
    /// Size of the top/bottom performer lists; `None` uses the configured default
    pub performer_limit: Option<usize>,
}

impl AnalyticsRequest {
    pub fn new(username: Option<&str>, days: u32) -> Self {
        Self {
            username: username.map(str::to_string),
            days,
            sections: None,
            top_hashtags: None,
            performer_limit: None,
        }
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = Some(sections);
        self
    }

    pub fn with_top_hashtags(mut self, top_hashtags: usize) -> Self {
        self.top_hashtags = Some(top_hashtags);
        self
    }

    pub fn with_performer_limit(mut self, limit: usize) -> Self {
        self.performer_limit = Some(limit);
        self
    }

    /// Requested sections, deduplicated and in output order.
    fn resolved_sections(&self) -> Vec<Section> {
        match &self.sections {
            Some(sections) => {
                let mut sections = sections.clone();
                sections.sort();
                sections.dedup();
                sections
            }
            None => Section::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub period_days: u32,
    pub username_filter: Option<String>,
    pub generated_at: DateTime<Utc>,
    /// Records in the current window, including untimestamped ones
    pub total_records: usize,
    pub sections: Vec<Section>,
    /// Zone used for hour, weekday and date buckets (e.g. `+05:30`)
    pub utc_offset: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Output of one composer call. Only requested sections are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResult {
    pub metadata: ResultMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_stats: Option<BasicStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_performance: Option<ContentTypePerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_time_analysis: Option<PostingTimeAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtag_performance: Option<HashtagPerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_trend: Option<EngagementTrend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_insights: Option<PerformanceInsights>,
}

impl AnalyticsResult {
    /// Compact JSON handed to the chat assistant as context.
    pub fn to_context_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One account's result in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountAnalytics {
    pub username: String,
    pub result: AnalyticsResult,
}

// ============================================
// Engine
// ============================================

/// Composes the analytics stages over an injected record source.
pub struct AnalyticsEngine<S> {
    loader: DataLoader<S>,
    config: AnalyticsConfig,
    tz: FixedOffset,
}

impl<S: RecordSource> AnalyticsEngine<S> {
    pub fn new(source: S, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        let tz = config.timezone()?;
        let loader =
            DataLoader::new(source).with_cache(config.cache_ttl_secs, config.cache_capacity);
        Ok(Self { loader, config, tz })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        self.loader.source()
    }

    /// Compute analytics as of the current instant.
    pub fn compute_analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsResult> {
        self.compute_analytics_at(request, Utc::now())
    }

    /// Compute analytics as of `now`. Identical inputs give identical output.
    pub fn compute_analytics_at(
        &self,
        request: &AnalyticsRequest,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsResult> {
        let top_hashtags = positive(
            request.top_hashtags.unwrap_or(self.config.top_hashtags),
            "top_hashtags",
        )?;
        let performer_limit = positive(
            request.performer_limit.unwrap_or(self.config.performer_limit),
            "performer_limit",
        )?;
        if request.days == 0 {
            return Err(Error::InvalidParameter(
                "days must be at least 1".to_string(),
            ));
        }

        let sections = request.resolved_sections();
        let window = Window::ending_at(now, request.days, self.tz)?;
        let load_request = LoadRequest {
            username: request.username.clone(),
            days: request.days,
            max_records: self.config.max_records,
            include_previous: sections.contains(&Section::PerformanceInsights),
        };

        let started = Instant::now();
        let data = self.loader.load(&load_request, &window)?;

        let ctx = AnalyticsContext {
            records: &data.records,
            previous_records: data.previous_records.as_deref(),
            profiles: &data.profiles,
            window: &window,
        };

        let mut result = AnalyticsResult {
            metadata: ResultMetadata {
                period_days: request.days,
                username_filter: request.username.clone(),
                generated_at: now,
                total_records: data.records.len(),
                sections: sections.clone(),
                utc_offset: format_offset(self.tz),
                window_start: window.start,
                window_end: window.end,
            },
            basic_stats: None,
            content_type_performance: None,
            posting_time_analysis: None,
            hashtag_performance: None,
            engagement_trend: None,
            performance_insights: None,
        };

        for section in &sections {
            let stage_start = Instant::now();
            match section {
                Section::BasicStats => result.basic_stats = Some(basic::compute(&ctx)),
                Section::ContentTypePerformance => {
                    result.content_type_performance = Some(content_type::compute(&ctx))
                }
                Section::PostingTimeAnalysis => {
                    result.posting_time_analysis = Some(posting_time::compute(&ctx))
                }
                Section::HashtagPerformance => {
                    result.hashtag_performance = Some(hashtags::compute(&ctx, top_hashtags))
                }
                Section::EngagementTrend => result.engagement_trend = Some(trend::compute(&ctx)),
                Section::PerformanceInsights => {
                    result.performance_insights = Some(insights::compute(&ctx, performer_limit))
                }
            }
            tracing::debug!(
                section = %section,
                duration_us = stage_start.elapsed().as_micros() as u64,
                "Computed analytics section"
            );
        }

        tracing::info!(
            username = ?request.username,
            days = request.days,
            records = data.records.len(),
            sections = sections.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Analytics computed"
        );

        Ok(result)
    }

    /// Compute the same sections for several accounts, in the order given.
    pub fn compare_accounts<U: AsRef<str>>(
        &self,
        usernames: &[U],
        days: u32,
        sections: Option<Vec<Section>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccountAnalytics>> {
        if usernames.is_empty() {
            return Err(Error::InvalidParameter(
                "comparison needs at least one username".to_string(),
            ));
        }

        usernames
            .iter()
            .map(|username| {
                let username = username.as_ref();
                let request = AnalyticsRequest {
                    sections: sections.clone(),
                    ..AnalyticsRequest::new(Some(username), days)
                };
                Ok(AccountAnalytics {
                    username: username.to_string(),
                    result: self.compute_analytics_at(&request, now)?,
                })
            })
            .collect()
    }
}

fn positive(value: usize, name: &str) -> Result<usize> {
    if value == 0 {
        return Err(Error::InvalidParameter(format!(
            "{} must be at least 1",
            name
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::SectionStatus;
    use crate::source::MemorySource;
    use crate::types::{ContentRecord, MediaType, ProfileRecord};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn config() -> AnalyticsConfig {
        AnalyticsConfig {
            utc_offset_minutes: 0,
            ..Default::default()
        }
    }

    fn profile(id: &str, username: &str, followers: u64) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            username: username.to_string(),
            follower_count: followers,
            ..Default::default()
        }
    }

    fn record(id: &str, owner: &str, media_type: MediaType, likes: u64) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            media_type,
            timestamp: Some(now() - Duration::hours(1)),
            like_count: likes,
            caption: format!("post {} #launch", id),
            ..Default::default()
        }
    }

    fn engine() -> AnalyticsEngine<MemorySource> {
        let source = MemorySource::new(
            vec![profile("p1", "acme", 600), profile("p2", "globex", 0)],
            vec![
                record("a", "p1", MediaType::Image, 10),
                record("b", "p1", MediaType::Image, 20),
                record("c", "p1", MediaType::Video, 30),
                record("g", "p2", MediaType::Carousel, 5),
            ],
        );
        AnalyticsEngine::new(source, config()).unwrap()
    }

    #[test]
    fn test_single_day_scenario() {
        crate::logging::init_test();
        let result = engine()
            .compute_analytics_at(&AnalyticsRequest::new(Some("acme"), 1), now())
            .unwrap();

        assert_eq!(result.metadata.total_records, 3);
        assert_eq!(result.metadata.sections, Section::ALL.to_vec());

        let types = result.content_type_performance.unwrap();
        assert_eq!(types.by_type[&MediaType::Image].count, 2);
        assert_eq!(types.by_type[&MediaType::Image].avg_engagement, 15.0);
        assert_eq!(types.best_performing_type, Some(MediaType::Video));

        // A one-day window touches yesterday and today
        let trend = result.engagement_trend.unwrap();
        assert_eq!(trend.daily.len(), 2);
        assert_eq!(trend.daily[0].posts_count, 0);
        assert_eq!(trend.daily[1].total_engagement, 60);
        assert_eq!(trend.daily[1].posts_count, 3);
        assert_eq!(trend.daily[1].avg_engagement_per_post, 20.0);

        let insights = result.performance_insights.unwrap();
        assert_eq!(insights.engagement_rate_pct, Some(10.0));
        assert!(!insights.engagement_change.comparable);
    }

    #[test]
    fn test_steady_activity_reports_no_change() {
        // One post on every hour for 30 days, read half an hour past midnight
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 30, 0).unwrap();
        let records = (0..30 * 24)
            .map(|h| ContentRecord {
                id: format!("h{}", h),
                owner_id: "p1".to_string(),
                timestamp: Some(now - Duration::minutes(30) - Duration::hours(h)),
                like_count: 10,
                ..Default::default()
            })
            .collect();
        let engine = AnalyticsEngine::new(
            MemorySource::new(vec![profile("p1", "acme", 0)], records),
            config(),
        )
        .unwrap();

        for days in [1u32, 7] {
            let result = engine
                .compute_analytics_at(&AnalyticsRequest::new(Some("acme"), days), now)
                .unwrap();
            let expected_posts = u64::from(days) * 24;
            assert_eq!(result.metadata.total_records as u64, expected_posts);

            let insights = result.performance_insights.unwrap();
            assert_eq!(insights.engagement_change.current, expected_posts * 10);
            assert_eq!(insights.engagement_change.previous, expected_posts * 10);
            assert_eq!(insights.engagement_change.change_pct, Some(0.0));
            assert_eq!(insights.posts_change.change_pct, Some(0.0));
            assert_eq!(insights.posts_per_day, 24.0);

            let trend = result.engagement_trend.unwrap();
            assert_eq!(trend.daily.len(), days as usize + 1);
            assert_eq!(
                trend.daily.iter().map(|d| d.posts_count).sum::<u64>(),
                expected_posts
            );
        }
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let huge = |id: &str| ContentRecord {
            like_count: i64::MAX as u64,
            comment_count: 1,
            ..record(id, "p1", MediaType::Video, 0)
        };
        let engine = AnalyticsEngine::new(
            MemorySource::new(
                vec![profile("p1", "acme", i64::MAX as u64)],
                vec![huge("x"), huge("y")],
            ),
            config(),
        )
        .unwrap();

        let result = engine
            .compute_analytics_at(&AnalyticsRequest::new(Some("acme"), 7), now())
            .unwrap();

        let basic = result.basic_stats.as_ref().unwrap();
        assert_eq!(basic.total_engagement, u64::MAX);
        assert_eq!(basic.total_likes, u64::MAX - 1);

        let types = result.content_type_performance.as_ref().unwrap();
        assert_eq!(types.by_type[&MediaType::Video].total_engagement, u64::MAX);

        let tags = result.hashtag_performance.as_ref().unwrap();
        assert_eq!(tags.top_by_engagement[0].total_engagement, u64::MAX);

        let trend = result.engagement_trend.as_ref().unwrap();
        assert_eq!(trend.daily.last().unwrap().total_engagement, u64::MAX);

        let insights = result.performance_insights.as_ref().unwrap();
        assert_eq!(insights.engagement_change.current, u64::MAX);
        assert!(insights.engagement_rate_pct.is_some_and(f64::is_finite));
        assert!(result.to_context_json().is_ok());
    }

    #[test]
    fn test_section_subset_only_serializes_requested_keys() {
        let request = AnalyticsRequest::new(None, 7)
            .with_sections(vec![Section::EngagementTrend, Section::BasicStats]);
        let result = engine().compute_analytics_at(&request, now()).unwrap();

        let json = serde_json::to_value(&result).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["basic_stats", "engagement_trend", "metadata"]);
        assert_eq!(json["metadata"]["utc_offset"], "+00:00");
        assert_eq!(json["basic_stats"]["accounts"], 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let engine = engine();
        let request = AnalyticsRequest::new(None, 30);

        let first = engine.compute_analytics_at(&request, now()).unwrap();
        let second = engine.compute_analytics_at(&request, now()).unwrap();
        assert_eq!(
            first.to_context_json().unwrap(),
            second.to_context_json().unwrap()
        );
    }

    #[test]
    fn test_empty_source_yields_shaped_sections() {
        let engine = AnalyticsEngine::new(MemorySource::default(), config()).unwrap();
        let result = engine
            .compute_analytics_at(&AnalyticsRequest::new(None, 14), now())
            .unwrap();

        assert_eq!(result.metadata.total_records, 0);
        let basic = result.basic_stats.unwrap();
        assert_eq!(basic.status, SectionStatus::NoData);
        assert_eq!(result.engagement_trend.unwrap().daily.len(), 15);
        assert_eq!(
            result.content_type_performance.unwrap().best_performing_type,
            None
        );
        assert!(result.hashtag_performance.unwrap().top_by_engagement.is_empty());
        assert!(result.performance_insights.unwrap().top_performers.is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        let engine = engine();

        let err = engine
            .compute_analytics_at(&AnalyticsRequest::new(None, 0), now())
            .unwrap_err();
        assert!(err.is_invalid_parameter());

        let err = engine
            .compute_analytics_at(&AnalyticsRequest::new(None, 7).with_top_hashtags(0), now())
            .unwrap_err();
        assert!(err.is_invalid_parameter());

        let err = engine
            .compare_accounts::<&str>(&[], 7, None, now())
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_compare_accounts_keeps_request_order() {
        let results = engine()
            .compare_accounts(
                &["globex", "acme"],
                7,
                Some(vec![Section::BasicStats]),
                now(),
            )
            .unwrap();

        let names: Vec<&str> = results.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["globex", "acme"]);
        assert_eq!(results[0].result.metadata.total_records, 1);
        assert_eq!(results[1].result.metadata.total_records, 3);
        assert!(results[0].result.hashtag_performance.is_none());
    }

    #[test]
    fn test_unknown_username_is_empty_result() {
        let result = engine()
            .compute_analytics_at(&AnalyticsRequest::new(Some("nobody"), 7), now())
            .unwrap();
        assert_eq!(result.metadata.total_records, 0);
        assert_eq!(result.metadata.username_filter.as_deref(), Some("nobody"));
    }
}
