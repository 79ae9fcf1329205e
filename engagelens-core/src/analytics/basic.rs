//! Basic and profile statistics.

use super::{average, AnalyticsContext, SectionStatus};
use crate::types::MediaType;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStats {
    pub status: SectionStatus,
    pub total_posts: u64,
    pub total_engagement: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub total_saves: u64,
    pub total_views: u64,
    pub avg_engagement_per_post: f64,
    pub avg_likes_per_post: f64,
    pub avg_comments_per_post: f64,
    /// Count per media type; every type is present, including `post`
    pub media_type_counts: BTreeMap<MediaType, u64>,
    pub accounts: usize,
    pub total_followers: u64,
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub username: String,
    pub full_name: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub media_count: u64,
    pub is_verified: bool,
}

pub fn compute(ctx: &AnalyticsContext<'_>) -> BasicStats {
    let mut media_type_counts: BTreeMap<MediaType, u64> =
        MediaType::ALL.iter().map(|t| (*t, 0)).collect();

    let mut total_engagement = 0u64;
    let mut total_likes = 0u64;
    let mut total_comments = 0u64;
    let mut total_shares = 0u64;
    let mut total_saves = 0u64;
    let mut total_views = 0u64;

    for record in ctx.records {
        total_engagement = total_engagement.saturating_add(record.engagement());
        total_likes = total_likes.saturating_add(record.like_count);
        total_comments = total_comments.saturating_add(record.comment_count);
        total_shares = total_shares.saturating_add(record.share_count);
        total_saves = total_saves.saturating_add(record.save_count);
        total_views = total_views.saturating_add(record.view_count);
        *media_type_counts.entry(record.media_type).or_insert(0) += 1;
    }

    let total_posts = ctx.records.len() as u64;

    let mut profiles: Vec<ProfileSummary> = ctx
        .profiles
        .iter()
        .map(|p| ProfileSummary {
            username: p.username.clone(),
            full_name: p.full_name.clone(),
            followers: p.follower_count,
            following: p.following_count,
            media_count: p.media_count,
            is_verified: p.is_verified,
        })
        .collect();
    profiles.sort_by(|a, b| a.username.cmp(&b.username));

    BasicStats {
        status: SectionStatus::from_has_data(total_posts > 0),
        total_posts,
        total_engagement,
        total_likes,
        total_comments,
        total_shares,
        total_saves,
        total_views,
        avg_engagement_per_post: average(total_engagement, total_posts),
        avg_likes_per_post: average(total_likes, total_posts),
        avg_comments_per_post: average(total_comments, total_posts),
        media_type_counts,
        accounts: profiles.len(),
        total_followers: ctx
            .profiles
            .iter()
            .fold(0u64, |sum, p| sum.saturating_add(p.follower_count)),
        profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Window;
    use crate::types::{ContentRecord, ProfileRecord};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn window() -> Window {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        Window::ending_at(now, 7, FixedOffset::east_opt(0).unwrap()).unwrap()
    }

    fn record(id: &str, media_type: MediaType, likes: u64, comments: u64) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            owner_id: "p1".to_string(),
            media_type,
            like_count: likes,
            comment_count: comments,
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_and_averages() {
        let records = vec![
            ContentRecord {
                share_count: 2,
                save_count: 3,
                view_count: 500,
                ..record("a", MediaType::Video, 10, 5)
            },
            record("b", MediaType::Image, 20, 0),
        ];
        let profiles = vec![ProfileRecord {
            id: "p1".to_string(),
            username: "acme".to_string(),
            follower_count: 1_000,
            ..Default::default()
        }];
        let window = window();
        let ctx = AnalyticsContext {
            records: &records,
            previous_records: None,
            profiles: &profiles,
            window: &window,
        };

        let stats = compute(&ctx);
        assert_eq!(stats.status, SectionStatus::Ok);
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_engagement, 40);
        assert_eq!(stats.total_views, 500);
        assert_eq!(stats.avg_engagement_per_post, 20.0);
        assert_eq!(stats.avg_likes_per_post, 15.0);
        assert_eq!(stats.media_type_counts[&MediaType::Video], 1);
        assert_eq!(stats.media_type_counts[&MediaType::Carousel], 0);
        assert_eq!(stats.total_followers, 1_000);
        assert_eq!(stats.profiles[0].username, "acme");
    }

    #[test]
    fn test_empty_input_is_shaped() {
        let window = window();
        let ctx = AnalyticsContext {
            records: &[],
            previous_records: None,
            profiles: &[],
            window: &window,
        };

        let stats = compute(&ctx);
        assert_eq!(stats.status, SectionStatus::NoData);
        assert_eq!(stats.avg_engagement_per_post, 0.0);
        assert_eq!(stats.media_type_counts.len(), MediaType::ALL.len());
        assert!(stats.media_type_counts.values().all(|&c| c == 0));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["media_type_counts"]["post"], 0);
        assert_eq!(json["status"], "no_data");
    }
}
