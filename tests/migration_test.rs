mod common;

use common::TestStore;
use farm_records::{db, seed};
use migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, DbBackend, Statement};

#[tokio::test]
async fn nothing_pending_after_startup() {
    let store = TestStore::new().await;

    let pending = Migrator::get_pending_migrations(store.db.as_ref())
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn migrated_store_answers_a_ping() {
    let store = TestStore::new().await;

    db::check_connection(store.db.as_ref()).await.unwrap();
}

#[tokio::test]
async fn foreign_key_columns_are_indexed() {
    let store = TestStore::new().await;

    let rows = store
        .db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%' ORDER BY name",
        ))
        .await
        .unwrap();
    let names: Vec<String> = rows
        .iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect();

    assert_eq!(
        names,
        [
            "idx_employees_enterprise_id",
            "idx_field_operations_field_id",
            "idx_fields_enterprise_id",
            "idx_harvests_planting_id",
            "idx_plantings_crop_id",
            "idx_plantings_field_id",
        ]
    );
}

#[tokio::test]
async fn down_then_up_rebuilds_an_empty_schema() {
    let store = TestStore::seeded().await;

    Migrator::down(store.db.as_ref(), None).await.unwrap();
    Migrator::up(store.db.as_ref(), None).await.unwrap();

    let summary = store.records.summary().await.unwrap();
    assert_eq!(summary.total, 0);

    let report = seed::load_fixtures(store.db.as_ref()).await.unwrap();
    assert_eq!(report.inserted, 36);
}
