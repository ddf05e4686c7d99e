//! Document store backed by the embedded redb database
//!
//! Links are stored as JSON documents keyed by id. Two secondary tables sit
//! next to the documents:
//! - a `short_code -> id` table that acts as the unique index on codes
//! - an owner index that keeps each user's links in creation order
//!
//! redb allows a single write transaction at a time, so every insert, update
//! and delete below is atomic with respect to the other writers.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::model::ShortLink;

/// Main table for storing link documents
///
/// Key: link id
/// Value: JSON-serialized ShortLink
pub const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Unique index on short codes
///
/// Key: short code (e.g. "Xy3_k9A")
/// Value: id of the owning link
///
/// An insert that finds its code already present here is rejected.
pub const TABLE_CODES: TableDefinition<&str, &str> = TableDefinition::new("codes_v1");

/// Index table for listing a user's links
///
/// Key: Composite key in format "{owner_id}:{created_at_micros:020}:{id}"
/// Value: link id
///
/// The zero-padded timestamp keeps range scans in chronological order.
pub const TABLE_OWNER_INDEX: TableDefinition<&str, &str> = TableDefinition::new("owner_index_v1");

fn owner_key(link: &ShortLink) -> String {
    format!(
        "{}:{:020}:{}",
        link.owner_id,
        link.created_at.timestamp_micros(),
        link.id
    )
}

/// Bounds covering every owner index key of `owner_id`
///
/// '{' sorts right after ':' so the end bound closes the prefix range.
fn owner_range(owner_id: &str) -> (String, String) {
    (format!("{}:", owner_id), format!("{}:{{", owner_id))
}

/// Reads every link of `owner_id` through the owner index, newest first
fn owned_links(
    owners: &impl ReadableTable<&'static str, &'static str>,
    links: &impl ReadableTable<&'static str, &'static str>,
    owner_id: &str,
) -> Result<Vec<ShortLink>, StoreError> {
    let (start_key, end_key) = owner_range(owner_id);

    let mut results = Vec::new();
    for entry in owners.range(start_key.as_str()..end_key.as_str())?.rev() {
        let (_, id) = entry?;
        let Some(value) = links.get(id.value())? else {
            continue;
        };
        let link: ShortLink = serde_json::from_str(value.value())?;
        // An owner id containing ':' can share a key prefix with another owner
        if link.owner_id == owner_id {
            results.push(link);
        }
    }

    Ok(results)
}

/// Result of [`Store::insert`]
#[derive(Debug)]
pub enum InsertOutcome {
    /// The link was written
    Inserted,
    /// The owner already had a link for the same URL; nothing was written
    Existing(ShortLink),
}

/// Handle to the link database
pub struct Store {
    db: Database,
}

impl Store {
    /// Creates or opens the database file and makes sure all tables exist
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use linkvault::database::Store;
    /// let store = Store::open("data.db").expect("Failed to initialize database");
    /// ```
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let db = Database::create(db_path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_LINKS)?;
            write_txn.open_table(TABLE_CODES)?;
            write_txn.open_table(TABLE_OWNER_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Inserts a new link unless its owner already shortened the same URL
    ///
    /// Both the per-owner dedup lookup and the code uniqueness check run
    /// inside the write transaction, so concurrent inserts of one
    /// `(owner_id, original_url)` pair converge on a single document.
    ///
    /// Returns `StoreError::UniqueViolation` without writing anything when the
    /// code is already taken.
    pub fn insert(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        let record_json = serde_json::to_string(link)?;

        let write_txn = self.db.begin_write()?;

        let (existing, taken) = {
            let owners = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let links = write_txn.open_table(TABLE_LINKS)?;
            let codes = write_txn.open_table(TABLE_CODES)?;

            let existing = owned_links(&owners, &links, &link.owner_id)?
                .into_iter()
                .find(|stored| stored.original_url == link.original_url);
            let taken = codes.get(link.short_code.as_str())?.is_some();
            (existing, taken)
        };

        if let Some(existing) = existing {
            write_txn.abort()?;
            return Ok(InsertOutcome::Existing(existing));
        }
        if taken {
            write_txn.abort()?;
            return Err(StoreError::UniqueViolation {
                code: link.short_code.clone(),
            });
        }

        {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            links.insert(link.id.as_str(), record_json.as_str())?;

            let mut codes = write_txn.open_table(TABLE_CODES)?;
            codes.insert(link.short_code.as_str(), link.id.as_str())?;

            let mut owners = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let index_key = owner_key(link);
            owners.insert(index_key.as_str(), link.id.as_str())?;
        }
        write_txn.commit()?;

        Ok(InsertOutcome::Inserted)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<ShortLink>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let links = read_txn.open_table(TABLE_LINKS)?;

        let record = links.get(id)?;
        let link = match record {
            Some(value) => Some(serde_json::from_str(value.value())?),
            None => None,
        };
        Ok(link)
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let codes = read_txn.open_table(TABLE_CODES)?;

        let id = match codes.get(code)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let links = read_txn.open_table(TABLE_LINKS)?;
        let record = links.get(id.as_str())?;
        let link = match record {
            Some(value) => Some(serde_json::from_str(value.value())?),
            None => None,
        };
        Ok(link)
    }

    pub fn code_exists(&self, code: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let codes = read_txn.open_table(TABLE_CODES)?;
        let exists = codes.get(code)?.is_some();
        Ok(exists)
    }

    /// Finds the link `owner_id` already created for exactly `original_url`
    pub fn find_by_owner_url(
        &self,
        owner_id: &str,
        original_url: &str,
    ) -> Result<Option<ShortLink>, StoreError> {
        Ok(self
            .list_by_owner(owner_id)?
            .into_iter()
            .find(|link| link.original_url == original_url))
    }

    /// Lists every link of `owner_id`, newest first
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let owners = read_txn.open_table(TABLE_OWNER_INDEX)?;
        let links = read_txn.open_table(TABLE_LINKS)?;

        owned_links(&owners, &links, owner_id)
    }

    /// Applies `change` to the current stored copy of link `id`
    ///
    /// The document is read and written back within one write transaction,
    /// so concurrent modifications of different fields never overwrite each
    /// other. `change` must leave `id`, `short_code`, `owner_id` and
    /// `created_at` alone; the indexes are not rewritten.
    ///
    /// Returns the modified link, or `None` if it no longer exists.
    pub fn modify<F>(&self, id: &str, change: F) -> Result<Option<ShortLink>, StoreError>
    where
        F: FnOnce(&mut ShortLink),
    {
        let write_txn = self.db.begin_write()?;

        let modified = {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            let current: Option<ShortLink> = match links.get(id)? {
                Some(value) => Some(serde_json::from_str(value.value())?),
                None => None,
            };

            match current {
                Some(mut link) => {
                    change(&mut link);
                    let record_json = serde_json::to_string(&link)?;
                    links.insert(id, record_json.as_str())?;
                    Some(link)
                }
                None => None,
            }
        };

        if modified.is_none() {
            write_txn.abort()?;
            return Ok(None);
        }

        write_txn.commit()?;
        Ok(modified)
    }

    /// Removes a link from the document table and both indexes
    ///
    /// Returns the removed link, or `None` if it did not exist.
    pub fn delete(&self, id: &str) -> Result<Option<ShortLink>, StoreError> {
        let write_txn = self.db.begin_write()?;

        let removed: Option<ShortLink> = {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            let record = links.remove(id)?;
            match record {
                Some(value) => Some(serde_json::from_str(value.value())?),
                None => None,
            }
        };

        let Some(link) = removed else {
            write_txn.abort()?;
            return Ok(None);
        };

        {
            let mut codes = write_txn.open_table(TABLE_CODES)?;
            codes.remove(link.short_code.as_str())?;

            let mut owners = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let index_key = owner_key(&link);
            owners.remove(index_key.as_str())?;
        }
        write_txn.commit()?;

        Ok(Some(link))
    }
}
