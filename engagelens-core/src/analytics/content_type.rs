//! Content-type performance.
//!
//! The best-performing type is the categorized type (never the generic
//! `post` bucket) with the highest average engagement among types that have
//! at least one record. Ties go to the type with more records, then to the
//! earlier type in [`MediaType::ALL`]. When nothing qualifies the selector is
//! `"N/A"`.

use super::{percentage, rank_tallies, AnalyticsContext, SectionStatus, Tally};
use crate::format::serialize_or_na;
use crate::types::MediaType;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentTypePerformance {
    pub status: SectionStatus,
    /// Every media type, including empty ones
    pub by_type: BTreeMap<MediaType, TypeStats>,
    #[serde(serialize_with = "serialize_or_na")]
    pub best_performing_type: Option<MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeStats {
    pub count: u64,
    pub total_engagement: u64,
    pub avg_engagement: f64,
    /// Share of all records in this section
    pub percentage: f64,
}

pub fn compute(ctx: &AnalyticsContext<'_>) -> ContentTypePerformance {
    let mut tallies = [Tally::default(); MediaType::ALL.len()];
    for record in ctx.records {
        if let Some(slot) = MediaType::ALL.iter().position(|t| *t == record.media_type) {
            tallies[slot].add(record);
        }
    }

    let total = ctx.records.len() as u64;
    let by_type = MediaType::ALL
        .iter()
        .zip(tallies.iter())
        .map(|(media_type, tally)| {
            (
                *media_type,
                TypeStats {
                    count: tally.count,
                    total_engagement: tally.engagement,
                    avg_engagement: tally.avg(),
                    percentage: percentage(tally.count, total),
                },
            )
        })
        .collect();

    let best_performing_type = rank_tallies(&tallies)
        .into_iter()
        .map(|i| MediaType::ALL[i])
        .find(MediaType::is_categorized);

    ContentTypePerformance {
        status: SectionStatus::from_has_data(total > 0),
        by_type,
        best_performing_type,
    }
}
