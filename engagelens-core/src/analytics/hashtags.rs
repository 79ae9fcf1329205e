//! Hashtag performance.
//!
//! Tags are matched with `#\w+`, lowercased, and keyed without the leading
//! `#`. A tag counts once per record for both usage and engagement, no matter
//! how often the caption repeats it.

use super::{average, AnalyticsContext, SectionStatus};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Distinct lowercase hashtags in `caption`, without the `#`.
pub fn extract_hashtags(caption: &str) -> BTreeSet<String> {
    HASHTAG_RE
        .captures_iter(caption)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagStats {
    /// Display form, with the leading `#`
    pub hashtag: String,
    pub usage_count: u64,
    pub total_engagement: u64,
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagPerformance {
    pub status: SectionStatus,
    pub distinct_hashtags: usize,
    pub records_with_hashtags: u64,
    /// Distinct tags per record, over every record in the section
    pub avg_hashtags_per_post: f64,
    /// What's trending: highest summed engagement first
    pub top_by_engagement: Vec<HashtagStats>,
    /// What converts: highest engagement per use first
    pub top_by_avg_engagement: Vec<HashtagStats>,
    pub limit: usize,
}

#[derive(Default)]
struct TagTally {
    usage: u64,
    engagement: u64,
}

pub fn compute(ctx: &AnalyticsContext<'_>, limit: usize) -> HashtagPerformance {
    let mut tallies: BTreeMap<String, TagTally> = BTreeMap::new();
    let mut records_with_hashtags = 0;
    let mut tag_uses = 0;

    for record in ctx.records {
        let tags = extract_hashtags(&record.caption);
        if tags.is_empty() {
            continue;
        }
        records_with_hashtags += 1;
        tag_uses += tags.len() as u64;

        let engagement = record.engagement();
        for tag in tags {
            let tally = tallies.entry(tag).or_default();
            tally.usage += 1;
            tally.engagement = tally.engagement.saturating_add(engagement);
        }
    }

    let stats: Vec<HashtagStats> = tallies
        .into_iter()
        .map(|(tag, tally)| HashtagStats {
            hashtag: format!("#{}", tag),
            usage_count: tally.usage,
            total_engagement: tally.engagement,
            avg_engagement: average(tally.engagement, tally.usage),
        })
        .collect();

    let top_by_engagement = top_n(&stats, limit, |a, b| {
        b.total_engagement.cmp(&a.total_engagement)
    });
    let top_by_avg_engagement = top_n(&stats, limit, |a, b| {
        b.avg_engagement.total_cmp(&a.avg_engagement)
    });

    HashtagPerformance {
        status: SectionStatus::from_has_data(!stats.is_empty()),
        distinct_hashtags: stats.len(),
        records_with_hashtags,
        avg_hashtags_per_post: average(tag_uses, ctx.records.len() as u64),
        top_by_engagement,
        top_by_avg_engagement,
        limit,
    }
}

/// Sort by `primary`, then usage (desc), then tag text, and keep `limit`.
fn top_n<F>(stats: &[HashtagStats], limit: usize, primary: F) -> Vec<HashtagStats>
where
    F: Fn(&HashtagStats, &HashtagStats) -> Ordering,
{
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| {
        primary(a, b)
            .then(b.usage_count.cmp(&a.usage_count))
            .then_with(|| a.hashtag.cmp(&b.hashtag))
    });
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Window;
    use crate::types::ContentRecord;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn record(id: &str, caption: &str, likes: u64) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            caption: caption.to_string(),
            like_count: likes,
            ..Default::default()
        }
    }

    fn run(records: &[ContentRecord], limit: usize) -> HashtagPerformance {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let window = Window::ending_at(now, 7, FixedOffset::east_opt(0).unwrap()).unwrap();
        compute(
            &AnalyticsContext {
                records,
                previous_records: None,
                profiles: &[],
                window: &window,
            },
            limit,
        )
    }

    fn tag<'a>(list: &'a [HashtagStats], name: &str) -> &'a HashtagStats {
        list.iter().find(|s| s.hashtag == name).unwrap()
    }

    #[test]
    fn test_extract_is_case_insensitive_and_distinct() {
        let tags = extract_hashtags("Launch! #Rust #rust #sun_set, #2024 #");
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["2024", "rust", "sun_set"]);
        assert!(extract_hashtags("no tags here").is_empty());
    }

    #[test]
    fn test_repeated_tag_counts_once_per_record() {
        let result = run(&[record("a", "Great day! #sun #fun #sun", 100)], 10);

        let sun = tag(&result.top_by_engagement, "#sun");
        assert_eq!(sun.usage_count, 1);
        assert_eq!(sun.total_engagement, 100);
        assert_eq!(result.distinct_hashtags, 2);
        assert_eq!(result.avg_hashtags_per_post, 2.0);
    }

    #[test]
    fn test_two_views_rank_differently() {
        let result = run(
            &[
                record("a", "#common", 30),
                record("b", "#common", 30),
                record("c", "#common #rare", 30),
                record("d", "#rare #niche", 60),
            ],
            10,
        );

        let by_total: Vec<&str> = result
            .top_by_engagement
            .iter()
            .map(|s| s.hashtag.as_str())
            .collect();
        assert_eq!(by_total, vec!["#common", "#rare", "#niche"]);

        let by_avg: Vec<&str> = result
            .top_by_avg_engagement
            .iter()
            .map(|s| s.hashtag.as_str())
            .collect();
        // niche 60 per use, rare 45, common 30
        assert_eq!(by_avg, vec!["#niche", "#rare", "#common"]);
        assert_eq!(tag(&result.top_by_avg_engagement, "#rare").avg_engagement, 45.0);
    }

    #[test]
    fn test_ties_break_on_usage_then_text() {
        let result = run(
            &[
                record("a", "#beta #alpha", 10),
                record("b", "#gamma", 5),
                record("c", "#gamma", 5),
            ],
            2,
        );

        let names: Vec<&str> = result
            .top_by_engagement
            .iter()
            .map(|s| s.hashtag.as_str())
            .collect();
        // all three total 10; gamma has two uses, then alpha before beta
        assert_eq!(names, vec!["#gamma", "#alpha"]);
        assert_eq!(result.limit, 2);
    }

    #[test]
    fn test_no_hashtags_is_no_data() {
        let result = run(&[record("a", "plain caption", 10)], 10);
        assert_eq!(result.status, SectionStatus::NoData);
        assert_eq!(result.records_with_hashtags, 0);
        assert!(result.top_by_engagement.is_empty());
        assert_eq!(result.avg_hashtags_per_post, 0.0);
    }
}
