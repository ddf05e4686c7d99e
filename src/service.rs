//! Owner-scoped operations on existing links
//!
//! Only the identity that created a link may read its analytics, change its
//! destination or delete it.

use crate::allocator::validate_url;
use crate::database::Store;
use crate::error::AppError;
use crate::model::ShortLink;

/// Loads a link on behalf of `owner_id`
///
/// `NotFound` when no such link exists, `Forbidden` when it belongs to someone else.
pub fn get_owned(store: &Store, id: &str, owner_id: &str) -> Result<ShortLink, AppError> {
    let link = store.find_by_id(id)?.ok_or(AppError::NotFound)?;
    if link.owner_id != owner_id {
        return Err(AppError::Forbidden);
    }
    Ok(link)
}

/// Points an existing link at a new destination
///
/// Only `original_url` changes. Code, owner and analytics are kept, including
/// clicks recorded after the ownership check.
pub fn update_url(
    store: &Store,
    id: &str,
    owner_id: &str,
    new_url: &str,
) -> Result<ShortLink, AppError> {
    let new_url = validate_url(new_url)?;
    get_owned(store, id, owner_id)?;

    let link = store
        .modify(id, |current| current.original_url = new_url)?
        .ok_or(AppError::NotFound)?;

    tracing::info!(code = %link.short_code, owner = %owner_id, "updated short link destination");
    Ok(link)
}

pub fn delete_owned(store: &Store, id: &str, owner_id: &str) -> Result<ShortLink, AppError> {
    get_owned(store, id, owner_id)?;

    let removed = store.delete(id)?.ok_or(AppError::NotFound)?;
    tracing::info!(code = %removed.short_code, owner = %owner_id, "deleted short link");
    Ok(removed)
}
