//! Database layer for engagelens
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Upsert-by-id writes for the ingestion side
//! - The [`RecordSource`](crate::RecordSource) reads the analytics engine uses

pub mod repo;
pub mod schema;

pub use repo::{Database, ImportSummary};
