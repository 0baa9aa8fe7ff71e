//! End-to-end behaviour of the response cache and user store on disk

use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use gamedex::cache::{params, ResponseCache};
use gamedex::clock::ManualClock;
use gamedex::user::{GameSnapshot, UserStore};

#[test]
fn test_search_results_expire_after_ttl() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let clock = Arc::new(ManualClock::default());
    let cache = ResponseCache::open_dir(temp_dir.path(), Duration::days(2)).with_clock(clock.clone());
    let results = json!({"results": [
        {"id": 22511, "name": "The Legend of Zelda: Breath of the Wild"},
        {"id": 25097, "name": "The Legend of Zelda: Ocarina of Time"}
    ]});

    cache.set("games", &params([("search", "zelda")]), &results);
    cache.set("games", &params([("search", "metroid")]), &json!({"results": []}));

    clock.advance(Duration::days(1));
    let hit: Option<Value> = cache.get("games", &params([("search", "zelda")]));
    assert_eq!(hit, Some(results));

    let before = cache.stats();
    assert_eq!(before.count, 2);

    clock.advance(Duration::days(1) + Duration::minutes(1));
    let miss: Option<Value> = cache.get("games", &params([("search", "zelda")]));
    assert!(miss.is_none());

    let after = cache.stats();
    assert_eq!(after.count, before.count - 1);
    assert_eq!(after.expired_count, 1, "metroid is expired but not looked up yet");

    assert_eq!(cache.clear_expired(), 1);
    assert_eq!(cache.clear_expired(), 0);
    assert_eq!(cache.stats().count, 0);
}

#[test]
fn test_cache_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let p = params([("page_size", "20"), ("ordering", "-rating")]);

    let cache = ResponseCache::open_dir(temp_dir.path(), Duration::days(2));
    cache.set("games", &p, &json!({"count": 3}));
    drop(cache);

    let reopened = ResponseCache::open_dir(temp_dir.path(), Duration::days(2));
    assert_eq!(reopened.get::<Value>("games", &p), Some(json!({"count": 3})));
}

#[test]
fn test_history_keeps_fifty_most_recent_views() {
    let temp_dir = TempDir::new().unwrap();
    let store = UserStore::open_dir(temp_dir.path());

    for id in 0..51u64 {
        store.record_view(
            id,
            GameSnapshot {
                name: format!("Game {}", id),
                image: None,
                rating: None,
            },
        );
    }

    let history = store.history();
    assert_eq!(history.len(), 50);
    assert!(history.iter().all(|entry| entry.id != 0));

    store.record_view(
        10,
        GameSnapshot {
            name: "Game 10".to_string(),
            image: None,
            rating: None,
        },
    );
    let history = store.history();
    assert_eq!(history.len(), 50);
    assert_eq!(history.last().unwrap().id, 10);
    assert_eq!(store.recent_history().first().unwrap().id, 10);
}
