//! Daily engagement trend.
//!
//! One entry per local calendar day the window touches, oldest first, with
//! empty days zero-filled. A window of `N` days always yields `N + 1` entries:
//! the partial first day, the full days between, and today.

use super::{average, AnalyticsContext, SectionStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEngagement {
    pub date: NaiveDate,
    pub posts_count: u64,
    pub total_engagement: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub avg_engagement_per_post: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementTrend {
    pub status: SectionStatus,
    pub daily: Vec<DailyEngagement>,
}

#[derive(Default)]
struct DayTally {
    posts: u64,
    engagement: u64,
    likes: u64,
    comments: u64,
}

pub fn compute(ctx: &AnalyticsContext<'_>) -> EngagementTrend {
    let mut by_date: HashMap<NaiveDate, DayTally> = HashMap::new();
    for (record, local) in ctx.timestamped() {
        let tally = by_date.entry(local.date_naive()).or_default();
        tally.posts += 1;
        tally.engagement = tally.engagement.saturating_add(record.engagement());
        tally.likes = tally.likes.saturating_add(record.like_count);
        tally.comments = tally.comments.saturating_add(record.comment_count);
    }

    let daily: Vec<DailyEngagement> = ctx
        .window
        .dates()
        .map(|date| {
            let tally = by_date.remove(&date).unwrap_or_default();
            DailyEngagement {
                date,
                posts_count: tally.posts,
                total_engagement: tally.engagement,
                total_likes: tally.likes,
                total_comments: tally.comments,
                avg_engagement_per_post: average(tally.engagement, tally.posts),
            }
        })
        .collect();

    let has_posts = daily.iter().any(|d| d.posts_count > 0);
    EngagementTrend {
        status: SectionStatus::from_has_data(has_posts),
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Window;
    use crate::types::ContentRecord;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn record(id: &str, ts: Option<DateTime<Utc>>, likes: u64, comments: u64) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            timestamp: ts,
            like_count: likes,
            comment_count: comments,
            ..Default::default()
        }
    }

    fn run(records: &[ContentRecord], days: u32, offset_secs: i32) -> EngagementTrend {
        let tz = FixedOffset::east_opt(offset_secs).unwrap();
        let window = Window::ending_at(now(), days, tz).unwrap();
        compute(&AnalyticsContext {
            records,
            previous_records: None,
            profiles: &[],
            window: &window,
        })
    }

    #[test]
    fn test_single_day_scenario() {
        let ts = Some(now() - Duration::hours(1));
        let result = run(
            &[
                record("a", ts, 10, 0),
                record("b", ts, 15, 5),
                record("c", ts, 30, 0),
            ],
            1,
            0,
        );

        assert_eq!(result.daily.len(), 2);
        assert_eq!(result.daily[0].posts_count, 0);
        let today = &result.daily[1];
        assert_eq!(today.posts_count, 3);
        assert_eq!(today.total_engagement, 60);
        assert_eq!(today.total_comments, 5);
        assert_eq!(today.avg_engagement_per_post, 20.0);
    }

    #[test]
    fn test_gap_filled_to_window_length_plus_one() {
        let result = run(
            &[record("a", Some(now() - Duration::days(3)), 8, 0)],
            30,
            330 * 60,
        );

        assert_eq!(result.daily.len(), 31);
        assert_eq!(result.status, SectionStatus::Ok);
        assert_eq!(result.daily.iter().filter(|d| d.posts_count > 0).count(), 1);
        assert!(result
            .daily
            .windows(2)
            .all(|pair| pair[1].date == pair[0].date.succ_opt().unwrap()));
        assert!(result
            .daily
            .iter()
            .filter(|d| d.posts_count == 0)
            .all(|d| d.avg_engagement_per_post == 0.0));
    }

    #[test]
    fn test_dates_follow_configured_zone() {
        // 20:00 UTC on the 9th is 01:30 on the 10th in IST
        let ts = Utc.with_ymd_and_hms(2024, 6, 9, 20, 0, 0).unwrap();
        let result = run(&[record("a", Some(ts), 1, 0)], 2, 330 * 60);

        assert_eq!(result.daily.len(), 3);
        assert_eq!(result.daily[1].posts_count, 0);
        assert_eq!(result.daily[2].posts_count, 1);
        assert_eq!(
            result.daily[2].date,
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }

    #[test]
    fn test_empty_input_still_has_every_day() {
        let result = run(&[record("undated", None, 50, 0)], 7, 0);
        assert_eq!(result.status, SectionStatus::NoData);
        assert_eq!(result.daily.len(), 8);
        assert!(result.daily.iter().all(|d| d.total_engagement == 0));
    }
}
