//! # engagelens-core
//!
//! Core library for engagelens - engagement analytics over social content.
//!
//! This library provides:
//! - Domain types for profiles and content records
//! - Database storage layer with SQLite
//! - The analytics engine: data loader, aggregation stages and composer
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three steps:
//! - **Ingest:** exports are upserted into SQLite (`profiles`, `content`)
//! - **Load:** one windowed snapshot per request through [`RecordSource`]
//! - **Aggregate:** pure stages turn the snapshot into named sections
//!
//! ## Example
//!
//! ```rust,no_run
//! use engagelens_core::analytics::{AnalyticsEngine, AnalyticsRequest};
//! use engagelens_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! // Last 30 days for one account
//! let engine = AnalyticsEngine::new(db, config.analytics).expect("invalid config");
//! let result = engine
//!     .compute_analytics(&AnalyticsRequest::new(Some("acme"), 30))
//!     .expect("analytics failed");
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsEngine, AnalyticsRequest, AnalyticsResult, Section};
pub use config::Config;
pub use db::{Database, ImportSummary};
pub use error::{Error, Result};
pub use source::{ContentQuery, MemorySource, RecordSource};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod source;
pub mod types;
