use std::sync::Arc;

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use sat_tracker::{
    config::{AppConfig, DatabaseConfig},
    database::{Database, SEARCH_LIMIT},
    errors::SatTrackerError,
    models::{NewSatellite, NoradId},
};

async fn setup_test_db() -> Pool<Sqlite> {
    // A single connection keeps every query on the same in-memory database
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to database")
}

fn default_satellites() -> Vec<NewSatellite> {
    AppConfig::defaults().unwrap().seed.satellites
}

fn satellite(name: &str, norad_id: i64) -> NewSatellite {
    NewSatellite::new(
        name,
        NoradId::try_from(norad_id).unwrap(),
        "1 00000U 00000A   00000.00000000  .00000000  00000-0  00000-0 0  0000",
        "2 00000   0.0000   0.0000 0000000   0.0000   0.0000  0.00000000000000",
    )
}

#[tokio::test]
async fn test_seed_if_empty_is_idempotent() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let defaults = default_satellites();

    let first = db.seed_if_empty(&defaults).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "ISS (ZARYA)");
    assert_eq!(first[0].norad_id, 25544);
    assert_eq!(first[0].category, "Space Stations");
    assert!(first[0].is_active);

    let second = db.seed_if_empty(&defaults).await.unwrap();
    assert_eq!(second, first);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM satellites")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_seed_leaves_populated_store_alone() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    db.create(&satellite("NOAA 19", 33591)).await.unwrap();

    let listed = db.seed_if_empty(&default_satellites()).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].norad_id, 33591);
}

#[tokio::test]
async fn test_duplicate_norad_id_rejected() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let original = db.seed_if_empty(&default_satellites()).await.unwrap();

    let result = db.create(&satellite("ISS COPY", 25544)).await;
    assert!(matches!(result, Err(SatTrackerError::DuplicateNoradId(25544))));

    let after = db.list_active().await.unwrap();
    assert_eq!(after, original);
}

#[tokio::test]
async fn test_duplicate_of_inactive_record_rejected() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let sat = satellite("NOAA 19", 33591);
    db.create(&sat).await.unwrap();
    db.deactivate(sat.norad_id).await.unwrap();

    let result = db.create(&sat).await;

    assert!(matches!(result, Err(SatTrackerError::DuplicateNoradId(33591))));
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    db.seed_if_empty(&default_satellites()).await.unwrap();
    db.create(&satellite("NOAA 19", 33591)).await.unwrap();

    let found = db.search_active_by_name("ISS").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "ISS (ZARYA)");

    let found = db.search_active_by_name("zarya").await.unwrap();
    assert_eq!(found.len(), 1);

    let found = db.search_active_by_name("hubble").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_search_limit() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    for i in 0..30 {
        db.create(&satellite(&format!("STARLINK-{}", i), 44700 + i))
            .await
            .unwrap();
    }

    let found = db.search_active_by_name("starlink").await.unwrap();

    assert_eq!(found.len() as i64, SEARCH_LIMIT);
    // Truncation follows insertion order
    assert_eq!(found[0].name, "STARLINK-0");
    assert_eq!(found[19].name, "STARLINK-19");
}

#[tokio::test]
async fn test_inactive_records_hidden() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let hidden = satellite("ISS DECOY", 99999);
    db.create(&satellite("ISS (ZARYA)", 25544)).await.unwrap();
    db.create(&hidden).await.unwrap();

    assert!(db.deactivate(hidden.norad_id).await.unwrap());

    let listed = db.list_active().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].norad_id, 25544);

    let found = db.search_active_by_name("ISS").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].norad_id, 25544);
}

#[tokio::test]
async fn test_concurrent_seeding_does_not_duplicate() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", temp_dir.path().join("seed.db").display()),
        max_connections: 4,
        acquire_timeout: std::time::Duration::from_secs(5),
    };
    let db = Database::from_config(&config).await.unwrap();
    let defaults = Arc::new(default_satellites());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let db = db.clone();
        let defaults = defaults.clone();
        handles.push(tokio::spawn(
            async move { db.seed_if_empty(&defaults).await },
        ));
    }
    for handle in handles {
        let listed = handle.await.unwrap().unwrap();
        assert_eq!(listed.len(), 1);
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM satellites")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_records_persist_across_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", temp_dir.path().join("persist.db").display()),
        max_connections: 2,
        acquire_timeout: std::time::Duration::from_secs(5),
    };

    let db = Database::from_config(&config).await.unwrap();
    let created = db.create(&satellite("NOAA 19", 33591)).await.unwrap();
    db.pool().close().await;

    let reopened = Database::from_config(&config).await.unwrap();
    let listed = reopened.list_active().await.unwrap();
    assert_eq!(listed, vec![created]);
}
