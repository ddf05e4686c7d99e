//! Short code allocation
//!
//! Mints collision-free short codes for (url, owner) pairs. A repeat
//! submission of the same pair returns the link created the first time.

use std::sync::Arc;

use rand::Rng;
use url::Url;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::database::{InsertOutcome, Store};
use crate::error::AppError;
use crate::model::ShortLink;

/// Length of freshly minted codes
pub const CODE_LENGTH: usize = 7;

/// Accepted code lengths, inclusive
pub const MIN_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 8;

/// Uniqueness checks performed before giving up on a request
pub const MAX_ATTEMPTS: usize = 10;

/// URL-safe alphabet codes are drawn from
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Source of candidate short codes
pub trait CodeSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws codes uniformly from `ALPHABET` using the thread-local RNG
#[derive(Debug, Clone)]
pub struct RandomCodeSource {
    length: usize,
}

impl RandomCodeSource {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeSource {
    fn default() -> Self {
        Self::new(CODE_LENGTH)
    }
}

impl CodeSource for RandomCodeSource {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Checks the length and alphabet contract of a short code
pub fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
        && code.bytes().all(|b| ALPHABET.contains(&b))
}

/// Validates a destination URL and returns it trimmed
///
/// The URL must be absolute, use `http` or `https`, and name a host.
pub fn validate_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL is required".to_string()));
    }

    let parsed =
        Url::parse(trimmed).map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!(
            "unsupported scheme '{}', must be http or https",
            parsed.scheme()
        )));
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(AppError::InvalidUrl(format!("{}: missing host", trimmed))),
    }

    Ok(trimmed.to_string())
}

/// Outcome of an allocation
#[derive(Debug, Clone)]
pub enum Allocation {
    /// The owner had already shortened this URL
    Existing(ShortLink),
    Created(ShortLink),
}

impl Allocation {
    pub fn into_link(self) -> ShortLink {
        match self {
            Allocation::Existing(link) | Allocation::Created(link) => link,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Allocation::Created(_))
    }
}

/// Mints short links against a store
#[derive(Clone)]
pub struct Allocator {
    store: Arc<Store>,
    codes: Arc<dyn CodeSource>,
    clock: Arc<dyn Clock>,
}

impl Allocator {
    pub fn new(store: Arc<Store>, codes: Arc<dyn CodeSource>) -> Self {
        Self {
            store,
            codes,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock that stamps `created_at` on new links
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the owner's existing link for `original_url`, or persists a new one
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` when the URL fails validation
    /// - `AllocationExhausted` when `MAX_ATTEMPTS` candidates all collided
    /// - `DuplicateCode` when a concurrent insert claimed the code between the
    ///   uniqueness check and the write; calling again is safe
    pub fn allocate(&self, original_url: &str, owner_id: &str) -> Result<ShortLink, AppError> {
        self.allocate_tracked(original_url, owner_id)
            .map(Allocation::into_link)
    }

    /// Same as `allocate`, but tells a dedup hit apart from a fresh link
    pub fn allocate_tracked(
        &self,
        original_url: &str,
        owner_id: &str,
    ) -> Result<Allocation, AppError> {
        let original_url = validate_url(original_url)?;

        if let Some(existing) = self.store.find_by_owner_url(owner_id, &original_url)? {
            tracing::debug!(code = %existing.short_code, owner = %owner_id, "reusing existing short link");
            return Ok(Allocation::Existing(existing));
        }

        let short_code = self.unique_code()?;

        let link = ShortLink::new(
            Uuid::new_v4().to_string(),
            original_url,
            short_code,
            owner_id.to_string(),
            self.clock.now(),
        );

        // The store repeats the dedup lookup inside its write transaction
        if let InsertOutcome::Existing(existing) = self.store.insert(&link)? {
            tracing::debug!(code = %existing.short_code, owner = %owner_id, "concurrent request created the link first");
            return Ok(Allocation::Existing(existing));
        }

        tracing::info!(code = %link.short_code, owner = %owner_id, "allocated short link");
        Ok(Allocation::Created(link))
    }

    /// Samples candidates until one is free in the store
    ///
    /// Previously tried codes are not remembered, so a candidate may repeat.
    fn unique_code(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let code = self.codes.generate();

            if !is_valid_code(&code) {
                tracing::warn!(code = %code, "code source produced a malformed code");
                continue;
            }
            if !self.store.code_exists(&code)? {
                return Ok(code);
            }

            tracing::debug!(attempt, code = %code, "short code collision");
        }

        Err(AppError::AllocationExhausted {
            attempts: MAX_ATTEMPTS,
        })
    }
}
