//! Data models for the URL shortener application
//!
//! This module defines the stored entity (`ShortLink` with its embedded
//! `ClickRecord` log) and the request/response shapes of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of click records retained on a single link
///
/// Older records are evicted first once this is exceeded. The lifetime
/// `click_count` is not affected by eviction.
pub const MAX_RETAINED_CLICKS: usize = 1000;

/// Maximum stored length of a user agent, in characters
pub const MAX_USER_AGENT_CHARS: usize = 200;

/// One redirect event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClickRecord {
    pub timestamp: DateTime<Utc>,

    /// User agent of the visitor, truncated to `MAX_USER_AGENT_CHARS`
    #[serde(default)]
    pub user_agent: String,

    /// Client IP, empty when it could not be determined
    #[serde(default)]
    pub ip: String,
}

/// A short code mapped to its destination plus the analytics state
///
/// Stored as a JSON document in the `links` table, keyed by `id`.
///
/// # Example
/// ```json
/// {
///   "id": "5b0f7c1e-...",
///   "original_url": "https://example.com/very/long/url",
///   "short_code": "Xy3_k9A",
///   "owner_id": "user_123",
///   "click_count": 3,
///   "created_at": "2026-01-17T13:40:00Z",
///   "last_accessed_at": "2026-01-18T08:12:00Z",
///   "clicks": [...]
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShortLink {
    /// Opaque identifier assigned at creation
    pub id: String,

    /// Destination URL; the only field an owner may change
    pub original_url: String,

    /// Globally unique code, 6-8 URL-safe characters
    pub short_code: String,

    /// Identity of the user that created this link
    pub owner_id: String,

    /// Lifetime number of recorded clicks
    #[serde(default)]
    pub click_count: u64,

    pub created_at: DateTime<Utc>,

    /// Set on every recorded click, `None` until the first one
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,

    /// Most recent clicks in insertion order, at most `MAX_RETAINED_CLICKS`
    #[serde(default)]
    pub clicks: Vec<ClickRecord>,
}

impl ShortLink {
    /// Builds a link that has never been clicked
    pub fn new(
        id: String,
        original_url: String,
        short_code: String,
        owner_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            owner_id,
            click_count: 0,
            created_at,
            last_accessed_at: None,
            clicks: Vec::new(),
        }
    }
}

/// Composes the public short URL for a link
///
/// Kept out of the stored document so the base URL can change per deployment.
pub fn short_url(link: &ShortLink, base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), link.short_code)
}

/// Request payload for creating or updating a short URL
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/very/long/url"
/// }
/// ```
#[derive(Deserialize, Serialize)]
pub struct UrlRequest {
    /// The destination URL (http or https)
    pub url: String,
}

/// Summary view of a link returned by create, update and list
#[derive(Serialize, Deserialize, Debug)]
pub struct LinkResponse {
    pub id: String,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,

    /// Last few clicks in insertion order; omitted on create/update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_clicks: Option<Vec<ClickRecord>>,
}

impl LinkResponse {
    pub fn from_link(link: &ShortLink, base_url: &str) -> Self {
        Self {
            id: link.id.clone(),
            short_code: link.short_code.clone(),
            short_url: short_url(link, base_url),
            original_url: link.original_url.clone(),
            click_count: link.click_count,
            created_at: link.created_at,
            last_accessed_at: link.last_accessed_at,
            recent_clicks: None,
        }
    }
}

/// Detailed analytics view of a single link
#[derive(Serialize, Deserialize, Debug)]
pub struct LinkDetailResponse {
    #[serde(flatten)]
    pub link: LinkResponse,

    /// Every retained click in insertion order
    pub clicks: Vec<ClickRecord>,

    /// Most recent clicks, newest first
    pub recent_clicks_desc: Vec<ClickRecord>,

    pub analytics: AnalyticsBlock,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnalyticsBlock {
    /// Clicks per UTC day over the retained window only
    pub clicks_by_day: BTreeMap<String, u64>,
    pub total_clicks: u64,
}

/// Pagination metadata for list responses
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_urls: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Query parameters for listing URLs with pagination
///
/// # Example
/// Query string: `?page=2&limit=20`
#[derive(Deserialize)]
pub struct ListParams {
    /// Page number for pagination (starts from 1)
    /// Defaults to 1 if not provided
    pub page: Option<usize>,

    /// Number of items per page
    /// Defaults to 10 if not provided, maximum is 100
    pub limit: Option<usize>,
}
