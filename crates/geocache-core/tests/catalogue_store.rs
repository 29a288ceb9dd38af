//! End-to-end behaviour of the file-backed catalogue store.

use std::fs::File;
use std::time::{Duration, SystemTime};

use geocache_core::models::{CachedSection, LocationSummary};
use geocache_core::{CatalogueFileStore, CataloguePersisting, StoreConfig};
use serde_json::{json, Value};
use tempfile::TempDir;

fn store(temp: &TempDir) -> CatalogueFileStore {
    CatalogueFileStore::new(StoreConfig::new(temp.path())).unwrap()
}

fn san_francisco() -> LocationSummary {
    LocationSummary::new()
        .with_country("US")
        .with_admin_area("California")
        .with_locality("San Francisco")
        .with_timezone("America/Los_Angeles")
        .with_coordinates(37.7749, -122.4194)
}

fn los_angeles() -> LocationSummary {
    LocationSummary::new()
        .with_country("US")
        .with_admin_area("California")
        .with_locality("Los Angeles")
        .with_coordinates(34.0522, -118.2437)
}

fn seattle() -> LocationSummary {
    LocationSummary::new()
        .with_country("US")
        .with_admin_area("Washington")
        .with_locality("Seattle")
}

fn scoped(value: Value, scope: &str) -> Value {
    let mut item = value;
    item["_metadata"] = json!({ "location": { "geoscope": scope } });
    item
}

fn order(types: &[&str]) -> Vec<String> {
    types.iter().map(|s| s.to_string()).collect()
}

fn context_file(temp: &TempDir, key: &str) -> std::path::PathBuf {
    temp.path()
        .join("catalogue")
        .join("contexts")
        .join(format!("{}.json", key))
}

fn age_file(path: &std::path::Path, age: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

#[tokio::test]
async fn test_unscoped_round_trip_preserves_content_and_order() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![
        CachedSection::new("overview", "Overview", json!({ "text": "Foggy and hilly" })),
        CachedSection::new("poi", "Points of Interest", json!({ "bridge": { "name": "Golden Gate" } })),
        CachedSection::new("cuisine", "Cuisine", json!(["sourdough", "cioppino"])),
    ];
    let section_order = order(&["cuisine", "overview", "poi"]);

    store
        .persist(&sections, &section_order, &san_francisco())
        .await
        .unwrap();
    let restored = store.restore(&san_francisco()).await.unwrap();

    let expected = vec![sections[2].clone(), sections[0].clone(), sections[1].clone()];
    assert_eq!(restored, expected);
}

#[tokio::test]
async fn test_unscoped_content_is_written_at_country_and_most_specific() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];

    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    assert!(context_file(&temp, "us").exists());
    assert!(context_file(&temp, "us.california.san_francisco").exists());
    assert!(!context_file(&temp, "us.california").exists());
}

#[tokio::test]
async fn test_cross_location_reuse_through_country_level() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new(
        "overview",
        "Overview",
        json!({
            "currency": scoped(json!({ "text": "USD" }), "country"),
            "state": scoped(json!({ "text": "Golden State" }), "adminarea"),
            "fog": scoped(json!({ "text": "Karl the Fog" }), "locality")
        }),
    )];

    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    let in_la = store.restore(&los_angeles()).await.unwrap();
    assert_eq!(in_la.len(), 1);
    let items = in_la[0].items().unwrap();
    assert!(items.contains_key("currency"));
    assert!(items.contains_key("state"));
    assert!(!items.contains_key("fog"));

    let in_seattle = store.restore(&seattle()).await.unwrap();
    let items = in_seattle[0].items().unwrap();
    assert_eq!(items.keys().collect::<Vec<_>>(), vec!["currency"]);
}

#[tokio::test]
async fn test_unscoped_cross_location_reuse_returns_country_copy() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "text": "USA" }))];

    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    assert_eq!(store.restore(&seattle()).await.unwrap(), sections);
}

#[tokio::test]
async fn test_merge_override_across_levels() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new(
        "overview",
        "Overview",
        json!({
            "a": scoped(json!({ "value": 1 }), "country"),
            "b": scoped(json!({ "value": 2 }), "locality")
        }),
    )];
    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    // A later locality write of "a" must win over the country copy.
    let local_override = vec![CachedSection::new(
        "overview",
        "Overview",
        json!({
            "a": scoped(json!({ "value": 10 }), "locality"),
            "b": scoped(json!({ "value": 2 }), "locality")
        }),
    )];
    store
        .persist(&local_override, &[], &san_francisco())
        .await
        .unwrap();

    let restored = store.restore(&san_francisco()).await.unwrap();
    assert_eq!(restored.len(), 1);
    let items = restored[0].items().unwrap();
    assert_eq!(items["a"]["value"], json!(10));
    assert_eq!(items["b"]["value"], json!(2));

    let country_only = store.restore(&seattle()).await.unwrap();
    assert_eq!(country_only[0].items().unwrap()["a"]["value"], json!(1));
}

#[tokio::test]
async fn test_merge_combines_items_from_both_levels() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new(
        "overview",
        "Overview",
        json!({
            "a": scoped(json!({ "value": 1 }), "country"),
            "b": scoped(json!({ "value": 2 }), "locality")
        }),
    )];

    store.persist(&sections, &[], &san_francisco()).await.unwrap();
    let restored = store.restore(&san_francisco()).await.unwrap();

    assert_eq!(restored, sections);
}

#[tokio::test]
async fn test_backend_context_keys_the_written_level() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let device = LocationSummary::new()
        .with_country("US")
        .with_admin_area("CA")
        .with_locality("Daly City");
    let sections = vec![CachedSection::new(
        "poi",
        "Places",
        json!({
            "park": {
                "name": "Golden Gate Park",
                "_metadata": { "location": {
                    "geoscope": "locality",
                    "context": {
                        "country_code": "US",
                        "admin_area": "California",
                        "locality": "San Francisco"
                    }
                }}
            }
        }),
    )];

    store.persist(&sections, &[], &device).await.unwrap();

    assert!(context_file(&temp, "us.california.san_francisco").exists());
    assert!(!context_file(&temp, "us.ca.daly_city").exists());
    let restored = store.restore(&san_francisco()).await.unwrap();
    assert_eq!(restored, sections);
}

#[tokio::test]
async fn test_empty_persist_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);

    store.persist(&[], &order(&["overview"]), &san_francisco()).await.unwrap();

    assert!(store.list_contexts().await.unwrap().is_empty());
    assert!(store.restore_last_context().await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_with_nothing_cached_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    assert!(store.restore(&san_francisco()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_expired_removes_only_old_contexts() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];
    store.persist(&sections, &[], &san_francisco()).await.unwrap();
    store.persist(&sections, &[], &seattle()).await.unwrap();

    let stale = context_file(&temp, "us.california.san_francisco");
    age_file(&stale, Duration::from_secs(15 * 24 * 60 * 60));
    let fresh = context_file(&temp, "us.washington.seattle");
    age_file(&fresh, Duration::from_secs(13 * 24 * 60 * 60));

    let removed = store.clear_expired().await.unwrap();

    assert_eq!(removed, 1);
    assert!(!stale.exists());
    assert!(fresh.exists());
    assert!(context_file(&temp, "us").exists());
}

#[tokio::test]
async fn test_clear_expired_honours_configured_age() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::new(temp.path())
        .with_subdirectory("guides")
        .with_max_context_age(chrono::Duration::hours(1));
    let store = CatalogueFileStore::new(config).unwrap();
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];
    store.persist(&sections, &[], &seattle()).await.unwrap();

    let path = temp.path().join("guides/contexts/us.json");
    age_file(&path, Duration::from_secs(2 * 60 * 60));

    assert_eq!(store.clear_expired().await.unwrap(), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_corrupt_context_is_treated_as_absent_and_deleted() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];
    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    let corrupt = context_file(&temp, "us.california.san_francisco");
    std::fs::write(&corrupt, b"\xff\xfe garbage {{{").unwrap();

    let restored = store.restore(&san_francisco()).await.unwrap();

    // Country copy still serves the content.
    assert_eq!(restored, sections);
    assert!(!corrupt.exists());

    std::fs::write(context_file(&temp, "us"), "[]").unwrap();
    assert!(store.restore(&san_francisco()).await.unwrap().is_empty());
    assert!(!context_file(&temp, "us").exists());
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![
        CachedSection::new("overview", "Overview", json!({ "text": "Emerald City" })),
        CachedSection::new("cuisine", "Cuisine", json!({ "dish": "salmon" })),
    ];
    let section_order = order(&["cuisine", "overview"]);

    store.persist(&sections, &section_order, &seattle()).await.unwrap();
    let last = store.restore_last_context().await.unwrap().unwrap();

    assert_eq!(last.snapshot.geo_key, "us.washington.seattle");
    assert_eq!(last.snapshot.section_order, section_order);
    assert_eq!(last.snapshot.location, seattle());
    assert_eq!(last.sections, vec![sections[1].clone(), sections[0].clone()]);
}

#[tokio::test]
async fn test_snapshot_follows_latest_persist() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let first = vec![CachedSection::new("overview", "Overview", json!({ "text": "SF" }))];
    let second = vec![CachedSection::new("overview", "Overview", json!({ "text": "SEA" }))];

    store.persist(&first, &[], &san_francisco()).await.unwrap();
    store.persist(&second, &[], &seattle()).await.unwrap();

    let last = store.restore_last_context().await.unwrap().unwrap();
    assert_eq!(last.snapshot.geo_key, "us.washington.seattle");
    assert_eq!(last.sections, second);
}

#[tokio::test]
async fn test_snapshot_points_at_most_specific_scoped_level() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new(
        "overview",
        "Overview",
        json!({
            "a": scoped(json!({ "value": 1 }), "country"),
            "b": scoped(json!({ "value": 2 }), "adminarea")
        }),
    )];

    store.persist(&sections, &order(&["overview"]), &san_francisco()).await.unwrap();

    let last = store.restore_last_context().await.unwrap().unwrap();
    assert_eq!(last.snapshot.geo_key, "us.california");
    assert_eq!(last.sections, sections);
}

#[tokio::test]
async fn test_restore_last_context_without_content_is_none() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];
    store.persist(&sections, &[], &seattle()).await.unwrap();

    store.remove_context("us").await.unwrap();
    store.remove_context("us.washington.seattle").await.unwrap();

    assert!(store.restore_last_context().await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_usable_as_trait_object() {
    let temp = TempDir::new().unwrap();
    let store: std::sync::Arc<dyn CataloguePersisting> = std::sync::Arc::new(
        CatalogueFileStore::new(StoreConfig::new(temp.path())).unwrap(),
    );
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "a": 1 }))];

    store.persist(&sections, &[], &seattle()).await.unwrap();
    assert_eq!(store.restore(&seattle()).await.unwrap(), sections);
    assert_eq!(store.clear_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_access_refresh_still_restores() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let sections = vec![CachedSection::new("overview", "Overview", json!({ "text": "Foggy" }))];
    store.persist(&sections, &[], &san_francisco()).await.unwrap();

    // The refresh of the country context cannot write its tmp file
    let blocker = context_file(&temp, "us").with_extension("json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    assert_eq!(store.restore(&san_francisco()).await.unwrap(), sections);
    assert_eq!(store.restore(&los_angeles()).await.unwrap(), sections);
    assert!(context_file(&temp, "us").exists());
}

#[tokio::test]
async fn test_failed_persist_keeps_earlier_levels_and_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let bretagne = LocationSummary::new()
        .with_country("FR")
        .with_admin_area("Bretagne");
    let earlier = vec![CachedSection::new("overview", "Overview", json!({ "text": "Crêpes" }))];
    store.persist(&earlier, &[], &bretagne).await.unwrap();

    let blocker = context_file(&temp, "us.california.san_francisco").with_extension("json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let sections = vec![CachedSection::new("overview", "Overview", json!({ "text": "Foggy" }))];
    let result = store.persist(&sections, &[], &san_francisco()).await;

    assert!(result.is_err());
    assert!(context_file(&temp, "us").exists());
    assert!(!context_file(&temp, "us.california.san_francisco").exists());
    let snapshot = store.load_snapshot().await.unwrap().unwrap();
    assert_eq!(snapshot.geo_key, "fr.bretagne");
    assert_eq!(snapshot.location, bretagne);
}
