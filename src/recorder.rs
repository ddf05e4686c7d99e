//! Click recording
//!
//! Each redirect appends one `ClickRecord` to the link, bumps the lifetime
//! counter and stamps `last_accessed_at`. The record log is a sliding window
//! of the most recent `MAX_RETAINED_CLICKS` clicks.
//!
//! The click is applied to the copy of the link read inside the store's
//! write transaction, never to the copy the caller resolved earlier. A
//! destination change made in between is kept.

use chrono::{DateTime, Utc};

use crate::database::Store;
use crate::error::AppError;
use crate::model::{ClickRecord, ShortLink, MAX_RETAINED_CLICKS, MAX_USER_AGENT_CHARS};

/// Cuts a user agent down to `MAX_USER_AGENT_CHARS` characters
pub fn truncate_user_agent(user_agent: &str) -> String {
    user_agent.chars().take(MAX_USER_AGENT_CHARS).collect()
}

/// Applies one click to the in-memory link without persisting it
pub fn apply_click(link: &mut ShortLink, user_agent: &str, ip: &str, at: DateTime<Utc>) {
    link.click_count += 1;
    link.last_accessed_at = Some(at);
    link.clicks.push(ClickRecord {
        timestamp: at,
        user_agent: truncate_user_agent(user_agent),
        ip: ip.to_string(),
    });

    if link.clicks.len() > MAX_RETAINED_CLICKS {
        let excess = link.clicks.len() - MAX_RETAINED_CLICKS;
        link.clicks.drain(..excess);
    }
}

/// Records a click and persists the updated link
///
/// Returns `NotFound` if the link was deleted after it was resolved.
pub fn record_click(
    store: &Store,
    link: &ShortLink,
    user_agent: &str,
    ip: &str,
) -> Result<ShortLink, AppError> {
    let at = Utc::now();
    store
        .modify(&link.id, |current| apply_click(current, user_agent, ip, at))?
        .ok_or(AppError::NotFound)
}

/// Records a click, logging instead of returning any failure
///
/// Used on the redirect path, where a failed write must never block the
/// visitor from reaching the destination.
pub fn record_click_best_effort(store: &Store, link: &ShortLink, user_agent: &str, ip: &str) {
    if let Err(err) = record_click(store, link, user_agent, ip) {
        tracing::warn!(code = %link.short_code, error = %err, "failed to record click");
    }
}
