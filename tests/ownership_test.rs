//! Tests for owner-scoped reads, updates and deletes

use std::sync::Arc;

use tempfile::NamedTempFile;

use linkvault::allocator::{Allocator, RandomCodeSource};
use linkvault::database::Store;
use linkvault::error::AppError;
use linkvault::model::ShortLink;
use linkvault::recorder::{record_click, record_click_best_effort};
use linkvault::service::{delete_owned, get_owned, update_url};

fn setup() -> (Arc<Store>, ShortLink, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let store = Arc::new(Store::open(temp_db.path().to_str().unwrap()).unwrap());

    let allocator = Allocator::new(store.clone(), Arc::new(RandomCodeSource::default()));
    let link = allocator.allocate("https://example.com/owned", "alice").unwrap();

    (store, link, temp_db)
}

#[test]
fn test_get_owned() {
    let (store, link, _temp_db) = setup();

    assert_eq!(get_owned(&store, &link.id, "alice").unwrap(), link);
    assert!(matches!(
        get_owned(&store, &link.id, "mallory"),
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        get_owned(&store, "missing", "alice"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn test_update_by_non_owner_is_forbidden() {
    let (store, link, _temp_db) = setup();

    let result = update_url(&store, &link.id, "mallory", "https://evil.example.com");
    assert!(matches!(result, Err(AppError::Forbidden)));

    let stored = store.find_by_id(&link.id).unwrap().unwrap();
    assert_eq!(stored, link);
}

#[test]
fn test_delete_by_non_owner_is_forbidden() {
    let (store, link, _temp_db) = setup();

    let result = delete_owned(&store, &link.id, "mallory");
    assert!(matches!(result, Err(AppError::Forbidden)));

    assert_eq!(store.find_by_id(&link.id).unwrap().unwrap(), link);
    assert!(store.find_by_code(&link.short_code).unwrap().is_some());
}

#[test]
fn test_update_changes_destination_only() {
    let (store, link, _temp_db) = setup();
    let clicked = record_click(&store, &link, "agent", "198.51.100.1").unwrap();

    let updated = update_url(&store, &link.id, "alice", " https://example.com/moved ").unwrap();

    assert_eq!(updated.original_url, "https://example.com/moved");
    assert_eq!(updated.short_code, link.short_code);
    assert_eq!(updated.owner_id, link.owner_id);
    assert_eq!(updated.click_count, clicked.click_count);
    assert_eq!(updated.clicks, clicked.clicks);

    let by_code = store.find_by_code(&link.short_code).unwrap().unwrap();
    assert_eq!(by_code.original_url, "https://example.com/moved");
}

#[test]
fn test_click_on_stale_link_keeps_new_destination() {
    let (store, link, _temp_db) = setup();

    // A redirect resolves the code, then the owner moves the link
    let resolved = store.find_by_code(&link.short_code).unwrap().unwrap();
    update_url(&store, &link.id, "alice", "https://example.com/moved").unwrap();

    let clicked = record_click(&store, &resolved, "agent", "198.51.100.1").unwrap();
    assert_eq!(clicked.original_url, "https://example.com/moved");

    record_click_best_effort(&store, &resolved, "agent", "198.51.100.2");

    let stored = store.find_by_id(&link.id).unwrap().unwrap();
    assert_eq!(stored.original_url, "https://example.com/moved");
    assert_eq!(stored.click_count, 2);
    assert_eq!(stored.clicks.len(), 2);
}

#[test]
fn test_update_keeps_clicks_recorded_after_read() {
    let (store, link, _temp_db) = setup();

    let owned = get_owned(&store, &link.id, "alice").unwrap();
    record_click(&store, &owned, "agent", "198.51.100.1").unwrap();

    let updated = update_url(&store, &link.id, "alice", "https://example.com/moved").unwrap();

    assert_eq!(updated.click_count, 1);
    assert_eq!(store.find_by_id(&link.id).unwrap().unwrap().click_count, 1);
}

#[test]
fn test_update_rejects_invalid_url() {
    let (store, link, _temp_db) = setup();

    let result = update_url(&store, &link.id, "alice", "ftp://example.com/file");
    assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    assert_eq!(store.find_by_id(&link.id).unwrap().unwrap(), link);
}

#[test]
fn test_update_missing_link() {
    let (store, _link, _temp_db) = setup();

    let result = update_url(&store, "missing", "alice", "https://example.com");
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[test]
fn test_delete_removes_link_and_indexes() {
    let (store, link, _temp_db) = setup();

    let removed = delete_owned(&store, &link.id, "alice").unwrap();
    assert_eq!(removed.id, link.id);

    assert!(store.find_by_id(&link.id).unwrap().is_none());
    assert!(store.find_by_code(&link.short_code).unwrap().is_none());
    assert!(!store.code_exists(&link.short_code).unwrap());
    assert!(store.list_by_owner("alice").unwrap().is_empty());

    // Deleting twice reports NotFound
    assert!(matches!(
        delete_owned(&store, &link.id, "alice"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn test_owner_prefix_does_not_leak_links() {
    let temp_db = NamedTempFile::new().unwrap();
    let store = Arc::new(Store::open(temp_db.path().to_str().unwrap()).unwrap());
    let allocator = Allocator::new(store.clone(), Arc::new(RandomCodeSource::default()));

    allocator.allocate("https://example.com/a", "team").unwrap();
    allocator.allocate("https://example.com/b", "team:ops").unwrap();

    let team = store.list_by_owner("team").unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].original_url, "https://example.com/a");

    // Dedup for one owner never returns the other owner's link
    assert!(store
        .find_by_owner_url("team", "https://example.com/b")
        .unwrap()
        .is_none());
}
