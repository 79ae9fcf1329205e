//! Data loader: the single storage read behind every composer call.

use super::cache::{CacheKey, LoadCache};
use super::window::Window;
use crate::error::{Error, Result};
use crate::source::{ContentQuery, RecordSource};
use crate::types::{ContentRecord, ProfileRecord};
use std::sync::Arc;

/// What to load for one composer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Restrict to one account; `None` loads every account
    pub username: Option<String>,
    pub days: u32,
    /// Fail instead of loading more than this many records. The bound covers
    /// everything one storage read returns, so with `include_previous` it
    /// counts the comparison window too.
    pub max_records: usize,
    /// Also load the comparison window
    pub include_previous: bool,
}

/// Records and profiles held for the duration of one composer call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedData {
    pub profiles: Vec<ProfileRecord>,
    /// Records in the current window, plus records with no timestamp
    pub records: Vec<ContentRecord>,
    /// Records in the comparison window, when requested
    pub previous_records: Option<Vec<ContentRecord>>,
}

pub struct DataLoader<S> {
    source: S,
    cache: Option<LoadCache>,
}

impl<S: RecordSource> DataLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// Reuse snapshots for up to `ttl_secs`, keeping at most `capacity` of them.
    pub fn with_cache(mut self, ttl_secs: u64, capacity: usize) -> Self {
        self.cache = (ttl_secs > 0).then(|| LoadCache::new(ttl_secs, capacity));
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load profiles and content for `request` over `window`.
    pub fn load(&self, request: &LoadRequest, window: &Window) -> Result<Arc<LoadedData>> {
        if request.days == 0 {
            return Err(Error::InvalidParameter(
                "days must be at least 1".to_string(),
            ));
        }
        if request.days != window.days {
            return Err(Error::InvalidParameter(format!(
                "window covers {} days but {} were requested",
                window.days, request.days
            )));
        }

        let key = CacheKey {
            username: request.username.clone(),
            days: request.days,
            include_previous: request.include_previous,
        };
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key, window.end) {
                tracing::debug!(username = ?request.username, days = request.days, "Loader cache hit");
                return Ok(hit);
            }
        }

        let data = Arc::new(self.load_uncached(request, window)?);

        if let Some(cache) = &self.cache {
            cache.insert(key, Arc::clone(&data), window.end);
        }
        Ok(data)
    }

    fn load_uncached(&self, request: &LoadRequest, window: &Window) -> Result<LoadedData> {
        let profiles = self
            .source
            .fetch_profiles(request.username.as_deref())
            .map_err(unavailable)?;

        let owner_ids = match &request.username {
            Some(username) if profiles.is_empty() => {
                tracing::info!(username = %username, "No profile matches username; returning empty data");
                return Ok(LoadedData {
                    previous_records: request.include_previous.then(Vec::new),
                    ..Default::default()
                });
            }
            Some(_) => Some(profiles.iter().map(|p| p.id.clone()).collect()),
            None => None,
        };

        let query = ContentQuery {
            owner_ids,
            since: if request.include_previous {
                window.previous_start
            } else {
                window.start
            },
            until: window.end,
            include_untimestamped: true,
            limit: Some(request.max_records.saturating_add(1)),
        };

        let fetched = self.source.fetch_content(&query).map_err(unavailable)?;
        if fetched.len() > request.max_records {
            tracing::warn!(
                max_records = request.max_records,
                days = request.days,
                "Window exceeds max_records"
            );
            return Err(Error::InvalidParameter(format!(
                "window holds more than {} records; narrow the window or raise max_records",
                request.max_records
            )));
        }

        let (records, previous): (Vec<_>, Vec<_>) = fetched
            .into_iter()
            .partition(|r| r.timestamp.map_or(true, |ts| ts >= window.start));

        tracing::debug!(
            username = ?request.username,
            days = request.days,
            profiles = profiles.len(),
            records = records.len(),
            previous = previous.len(),
            "Loaded analytics snapshot"
        );

        Ok(LoadedData {
            profiles,
            records,
            previous_records: request.include_previous.then_some(previous),
        })
    }
}

/// Storage failures reach the caller as `DataUnavailable`.
fn unavailable(err: Error) -> Error {
    match err {
        Error::InvalidParameter(_) | Error::DataUnavailable(_) => err,
        other => Error::DataUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn profile(id: &str, username: &str) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            username: username.to_string(),
            ..Default::default()
        }
    }

    fn record(id: &str, owner: &str, ts: Option<DateTime<Utc>>) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            timestamp: ts,
            ..Default::default()
        }
    }

    fn source() -> MemorySource {
        MemorySource::new(
            vec![profile("p1", "acme"), profile("p2", "globex")],
            vec![
                record("today", "p1", Some(now() - Duration::hours(2))),
                record("last-week", "p1", Some(now() - Duration::days(8))),
                record("ancient", "p1", Some(now() - Duration::days(40))),
                record("undated", "p1", None),
                record("globex", "p2", Some(now() - Duration::hours(1))),
            ],
        )
    }

    fn request(username: Option<&str>, days: u32, include_previous: bool) -> LoadRequest {
        LoadRequest {
            username: username.map(str::to_string),
            days,
            max_records: 100,
            include_previous,
        }
    }

    fn ids(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_loads_single_account_with_previous_window() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 7, utc()).unwrap();

        let data = loader
            .load(&request(Some("acme"), 7, true), &window)
            .unwrap();

        assert_eq!(data.profiles.len(), 1);
        assert_eq!(ids(&data.records), vec!["today", "undated"]);
        assert_eq!(
            data.previous_records.as_deref().map(ids),
            Some(vec!["last-week"])
        );
    }

    #[test]
    fn test_all_accounts_without_previous() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 7, utc()).unwrap();

        let data = loader.load(&request(None, 7, false), &window).unwrap();

        assert_eq!(data.profiles.len(), 2);
        assert_eq!(ids(&data.records), vec!["today", "globex", "undated"]);
        assert!(data.previous_records.is_none());
    }

    #[test]
    fn test_unknown_username_is_empty_not_error() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 7, utc()).unwrap();

        let data = loader
            .load(&request(Some("nobody"), 7, true), &window)
            .unwrap();
        assert!(data.profiles.is_empty());
        assert!(data.records.is_empty());
        assert_eq!(data.previous_records, Some(vec![]));
    }

    #[test]
    fn test_max_records_guard() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 7, utc()).unwrap();
        let req = LoadRequest {
            max_records: 2,
            ..request(None, 7, false)
        };

        let err = loader.load(&req, &window).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_max_records_counts_comparison_window() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 7, utc()).unwrap();

        // "today" and "undated" fit; "last-week" only arrives with the previous window
        let current_only = LoadRequest {
            max_records: 2,
            ..request(Some("acme"), 7, false)
        };
        assert_eq!(loader.load(&current_only, &window).unwrap().records.len(), 2);

        let with_previous = LoadRequest {
            include_previous: true,
            ..current_only
        };
        let err = loader.load(&with_previous, &window).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_zero_days_rejected() {
        let loader = DataLoader::new(source());
        let window = Window::ending_at(now(), 1, utc()).unwrap();
        let err = loader.load(&request(None, 0, false), &window).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn fetch_profiles(&self, _username: Option<&str>) -> Result<Vec<ProfileRecord>> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "storage offline",
            )))
        }

        fn fetch_content(&self, _query: &ContentQuery) -> Result<Vec<ContentRecord>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_storage_failure_is_data_unavailable() {
        let loader = DataLoader::new(FailingSource);
        let window = Window::ending_at(now(), 7, utc()).unwrap();

        let err = loader.load(&request(None, 7, false), &window).unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(msg) if msg.contains("storage offline")));
    }

    struct CountingSource {
        inner: MemorySource,
        content_calls: AtomicUsize,
    }

    impl RecordSource for CountingSource {
        fn fetch_profiles(&self, username: Option<&str>) -> Result<Vec<ProfileRecord>> {
            self.inner.fetch_profiles(username)
        }

        fn fetch_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>> {
            self.content_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_content(query)
        }
    }

    #[test]
    fn test_cache_reuses_snapshot_within_ttl() {
        let loader = DataLoader::new(CountingSource {
            inner: source(),
            content_calls: AtomicUsize::new(0),
        })
        .with_cache(60, 4);

        let window = Window::ending_at(now(), 7, utc()).unwrap();
        let first = loader.load(&request(None, 7, false), &window).unwrap();
        let second = loader.load(&request(None, 7, false), &window).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.source().content_calls.load(Ordering::SeqCst), 1);

        // The window rolls forward with the clock but the snapshot is still fresh
        let drifted = Window::ending_at(now() + Duration::seconds(30), 7, utc()).unwrap();
        let third = loader.load(&request(None, 7, false), &drifted).unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(loader.source().content_calls.load(Ordering::SeqCst), 1);

        let later = Window::ending_at(now() + Duration::seconds(61), 7, utc()).unwrap();
        loader.load(&request(None, 7, false), &later).unwrap();
        assert_eq!(loader.source().content_calls.load(Ordering::SeqCst), 2);
    }
}
