//! Read-only analytics derived from stored links
//!
//! Nothing here mutates a link. Per-link views only see the retained click
//! window, so a link with more than `MAX_RETAINED_CLICKS` lifetime clicks has
//! a histogram that sums to less than its `click_count`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ClickRecord, ShortLink};

/// Counts retained clicks per UTC calendar day, keyed `YYYY-MM-DD`
pub fn daily_histogram(link: &ShortLink) -> BTreeMap<String, u64> {
    let mut by_day = BTreeMap::new();
    for click in &link.clicks {
        let day = click.timestamp.date_naive().format("%Y-%m-%d").to_string();
        *by_day.entry(day).or_insert(0) += 1;
    }
    by_day
}

/// Last `n` retained clicks in insertion order
pub fn recent_clicks(link: &ShortLink, n: usize) -> &[ClickRecord] {
    let start = link.clicks.len().saturating_sub(n);
    &link.clicks[start..]
}

/// Last `n` retained clicks, newest first
pub fn recent_clicks_newest_first(link: &ShortLink, n: usize) -> Vec<ClickRecord> {
    recent_clicks(link, n).iter().rev().cloned().collect()
}

/// Totals across a set of links
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_clicks: u64,
    pub total_urls: usize,
    /// Mean lifetime clicks per link, rounded to the nearest integer
    pub avg_clicks_per_url: u64,
}

pub fn summarize(links: &[ShortLink]) -> Summary {
    let total_urls = links.len();
    let total_clicks: u64 = links.iter().map(|link| link.click_count).sum();

    let avg_clicks_per_url = if total_urls == 0 {
        0
    } else {
        (total_clicks as f64 / total_urls as f64).round() as u64
    };

    Summary {
        total_clicks,
        total_urls,
        avg_clicks_per_url,
    }
}
