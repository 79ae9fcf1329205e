//! Record sources
//!
//! The analytics engine never talks to storage directly. It is handed a
//! [`RecordSource`] and asks it for profiles and for content inside a time
//! range. [`crate::Database`] is the production source; [`MemorySource`]
//! serves vectors held in memory.

use crate::error::Result;
use crate::types::{ContentRecord, ProfileRecord};
use chrono::{DateTime, Utc};

/// Content filter passed to a [`RecordSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    /// Restrict to these owners. `None` means every account.
    pub owner_ids: Option<Vec<String>>,
    /// Earliest timestamp included
    pub since: DateTime<Utc>,
    /// Latest timestamp included
    pub until: DateTime<Utc>,
    /// Also return records with no timestamp
    pub include_untimestamped: bool,
    /// Maximum number of records to return
    pub limit: Option<usize>,
}

impl ContentQuery {
    /// Whether a record satisfies this query's owner and time filters.
    pub fn matches(&self, record: &ContentRecord) -> bool {
        if let Some(owners) = &self.owner_ids {
            if !owners.iter().any(|o| o == &record.owner_id) {
                return false;
            }
        }
        match record.timestamp {
            Some(ts) => ts >= self.since && ts <= self.until,
            None => self.include_untimestamped,
        }
    }
}

/// Read access to profile and content records.
///
/// Implementations must return content ordered by timestamp ascending,
/// untimestamped records last, ties broken by id.
pub trait RecordSource: Send + Sync {
    /// Profiles matching `username`, or all profiles when `None`, ordered by username.
    fn fetch_profiles(&self, username: Option<&str>) -> Result<Vec<ProfileRecord>>;

    /// Content matching `query`.
    fn fetch_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>>;
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn fetch_profiles(&self, username: Option<&str>) -> Result<Vec<ProfileRecord>> {
        (**self).fetch_profiles(username)
    }

    fn fetch_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>> {
        (**self).fetch_content(query)
    }
}

/// A source backed by in-memory vectors.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    profiles: Vec<ProfileRecord>,
    content: Vec<ContentRecord>,
}

impl MemorySource {
    pub fn new(profiles: Vec<ProfileRecord>, content: Vec<ContentRecord>) -> Self {
        Self { profiles, content }
    }

    /// Add or replace a profile (keyed by id).
    pub fn upsert_profile(&mut self, profile: ProfileRecord) {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Add or replace a content record (keyed by id).
    pub fn upsert_content(&mut self, record: ContentRecord) {
        match self.content.iter_mut().find(|c| c.id == record.id) {
            Some(existing) => *existing = record,
            None => self.content.push(record),
        }
    }
}

impl RecordSource for MemorySource {
    fn fetch_profiles(&self, username: Option<&str>) -> Result<Vec<ProfileRecord>> {
        let mut profiles: Vec<ProfileRecord> = self
            .profiles
            .iter()
            .filter(|p| username.map_or(true, |u| p.username == u))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }

    fn fetch_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>> {
        let mut records: Vec<ContentRecord> = self
            .content
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            (a.timestamp.is_none(), a.timestamp, &a.id).cmp(&(
                b.timestamp.is_none(),
                b.timestamp,
                &b.id,
            ))
        });

        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }
}
