//! Optimal posting-time analysis.
//!
//! Only records with a timestamp inside the window take part. Hours, weekdays
//! and periods are read in the window's zone. Rankings order slots by average
//! engagement (desc), then post count (desc), then the lower slot index.

use super::{percentage, rank_tallies, AnalyticsContext, SectionStatus, Tally};
use crate::format::{day_name, hour_display, serialize_or_na};
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

/// Fixed partition of the day. Each hour belongs to exactly one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    /// 06:00 to 11:59
    Morning,
    /// 12:00 to 17:59
    Afternoon,
    /// 18:00 to 23:59
    Evening,
    /// 00:00 to 05:59
    Night,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
        TimePeriod::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=23 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }

    fn index(&self) -> usize {
        match self {
            TimePeriod::Morning => 0,
            TimePeriod::Afternoon => 1,
            TimePeriod::Evening => 2,
            TimePeriod::Night => 3,
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourStats {
    pub hour: u32,
    pub label: String,
    pub posts_count: u64,
    pub total_engagement: u64,
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    /// 0 = Monday
    pub day: usize,
    pub name: &'static str,
    pub posts_count: u64,
    pub total_engagement: u64,
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub period: TimePeriod,
    pub posts_count: u64,
    pub total_engagement: u64,
    pub avg_engagement: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingTimeAnalysis {
    pub status: SectionStatus,
    pub timestamped_records: u64,
    /// All 24 hours, midnight first
    pub by_hour: Vec<HourStats>,
    /// All 7 days, Monday first
    pub by_day: Vec<DayStats>,
    pub by_period: Vec<PeriodStats>,
    /// Hours with posts, best first
    pub best_hours: Vec<u32>,
    /// Days with posts, best first
    pub best_days: Vec<&'static str>,
    #[serde(serialize_with = "serialize_or_na")]
    pub best_period: Option<TimePeriod>,
    #[serde(serialize_with = "serialize_or_na")]
    pub recommended_posting_time: Option<String>,
}

pub fn compute(ctx: &AnalyticsContext<'_>) -> PostingTimeAnalysis {
    let mut hours = [Tally::default(); 24];
    let mut days = [Tally::default(); 7];
    let mut periods = [Tally::default(); 4];

    for (record, local) in ctx.timestamped() {
        let hour = local.hour();
        hours[hour as usize].add(record);
        days[local.weekday().num_days_from_monday() as usize].add(record);
        periods[TimePeriod::from_hour(hour).index()].add(record);
    }

    let timestamped_records: u64 = hours.iter().map(|t| t.count).sum();

    let by_hour = hours
        .iter()
        .zip(0u32..)
        .map(|(tally, hour)| HourStats {
            hour,
            label: hour_display(hour),
            posts_count: tally.count,
            total_engagement: tally.engagement,
            avg_engagement: tally.avg(),
        })
        .collect();

    let by_day = days
        .iter()
        .enumerate()
        .map(|(day, tally)| DayStats {
            day,
            name: day_name(day),
            posts_count: tally.count,
            total_engagement: tally.engagement,
            avg_engagement: tally.avg(),
        })
        .collect();

    let by_period = TimePeriod::ALL
        .iter()
        .map(|period| {
            let tally = periods[period.index()];
            PeriodStats {
                period: *period,
                posts_count: tally.count,
                total_engagement: tally.engagement,
                avg_engagement: tally.avg(),
                percentage: percentage(tally.count, timestamped_records),
            }
        })
        .collect();

    let best_hours: Vec<u32> = rank_tallies(&hours).into_iter().map(|h| h as u32).collect();
    let best_days: Vec<&'static str> = rank_tallies(&days).into_iter().map(day_name).collect();
    let best_period = rank_tallies(&periods)
        .first()
        .map(|&i| TimePeriod::ALL[i]);

    let recommended_posting_time = match (best_days.first(), best_hours.first()) {
        (Some(day), Some(&hour)) => Some(format!(
            "{} at {} ({})",
            day,
            hour_display(hour),
            TimePeriod::from_hour(hour)
        )),
        _ => None,
    };

    PostingTimeAnalysis {
        status: SectionStatus::from_has_data(timestamped_records > 0),
        timestamped_records,
        by_hour,
        by_day,
        by_period,
        best_hours,
        best_days,
        best_period,
        recommended_posting_time,
    }
}
