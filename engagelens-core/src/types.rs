//! Core domain types for engagelens
//!
//! These types are the canonical shape of what the ingestion layer stores and
//! the analytics engine reads.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Profile** | A social account: username, audience size, verification |
//! | **Content** | One published item (a "post") owned by a profile |
//! | **Engagement** | Likes + comments + shares + saves on one content item |
//! | **Media type** | Image, video, carousel, or the generic "post" bucket |
//!
//! All counters default to zero when absent from the source, so consumers never
//! need to handle missing interaction counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Media type
// ============================================

/// Kind of content item.
///
/// `Post` is the generic label some sources emit when they don't say what the
/// item is; it is counted but never chosen as a best-performing type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Carousel,
    #[default]
    Post,
}

impl MediaType {
    /// Every media type, in reporting order.
    pub const ALL: [MediaType; 4] = [
        MediaType::Image,
        MediaType::Video,
        MediaType::Carousel,
        MediaType::Post,
    ];

    /// Returns the identifier used in database storage and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Carousel => "carousel",
            MediaType::Post => "post",
        }
    }

    /// Whether this type is a meaningful category for "favoured type" selection.
    pub fn is_categorized(&self) -> bool {
        !matches!(self, MediaType::Post)
    }

    /// Map a source label to a media type.
    ///
    /// Accepts the labels used by the common social APIs (`IMAGE`,
    /// `CAROUSEL_ALBUM`, `reel`, ...). Anything unrecognized falls into the
    /// generic `Post` bucket.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" | "graphimage" => MediaType::Image,
            "video" | "reel" | "reels" | "clips" | "graphvideo" => MediaType::Video,
            "carousel" | "carousel_album" | "sidecar" | "graphsidecar" => MediaType::Carousel,
            _ => MediaType::Post,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Content
// ============================================

/// A published content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Source identifier (upsert key)
    pub id: String,
    /// Identifier of the owning profile
    pub owner_id: String,
    #[serde(default, deserialize_with = "deserialize_media_type")]
    pub media_type: MediaType,
    /// Publication instant (UTC). `None` when the source had no parseable time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub save_count: u64,
    /// Video plays/views. Reported separately, not part of engagement.
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub permalink: Option<String>,
}

impl ContentRecord {
    /// Total interactions on this item, saturating at `u64::MAX`.
    pub fn engagement(&self) -> u64 {
        self.like_count
            .saturating_add(self.comment_count)
            .saturating_add(self.share_count)
            .saturating_add(self.save_count)
    }
}

fn deserialize_media_type<'de, D>(deserializer: D) -> Result<MediaType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label
        .as_deref()
        .map(MediaType::from_label)
        .unwrap_or_default())
}

// ============================================
// Profile
// ============================================

/// A social account. Read-only reference data for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Source identifier; matches [`ContentRecord::owner_id`]
    pub id: String,
    /// Unique handle
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub is_verified: bool,
    /// When the ingestion layer last refreshed this profile
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================
// Import document
// ============================================

/// A batch of profiles and content as written by the ingestion layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub content: Vec<ContentRecord>,
}
