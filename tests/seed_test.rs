mod common;

use common::TestStore;
use farm_records::prelude::*;
use farm_records::seed::{self, FixtureSet};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const FIXTURE_ROWS: u64 = 36;

#[tokio::test]
async fn loading_twice_changes_nothing() {
    let store = TestStore::new().await;

    let first = seed::load_fixtures(store.db.as_ref()).await.unwrap();
    assert_eq!(first.inserted, FIXTURE_ROWS);
    assert_eq!(first.skipped, 0);
    assert!(first.is_clean());
    let after_first = store.records.summary().await.unwrap();

    let second = seed::load_fixtures(store.db.as_ref()).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, FIXTURE_ROWS);
    assert!(second.is_clean());

    let after_second = store.records.summary().await.unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.total, FIXTURE_ROWS);
}

#[tokio::test]
async fn fixture_counts_per_table() {
    let store = TestStore::seeded().await;
    let summary = store.records.summary().await.unwrap();

    let counts: Vec<(RecordKind, u64)> =
        summary.tables.iter().map(|t| (t.kind, t.rows)).collect();
    assert_eq!(
        counts,
        vec![
            (RecordKind::Enterprise, 3),
            (RecordKind::Field, 6),
            (RecordKind::Crop, 6),
            (RecordKind::Planting, 6),
            (RecordKind::Harvest, 4),
            (RecordKind::FieldOperation, 6),
            (RecordKind::Employee, 5),
        ]
    );
}

#[tokio::test]
async fn plantings_without_harvests_are_valid_state() {
    let store = TestStore::seeded().await;

    for planting_id in [3, 6] {
        let filter = HarvestFilter {
            planting_id: Some(planting_id),
            ..Default::default()
        };
        let page = store
            .records
            .harvests
            .list(filter, &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0, "planting {planting_id}");
    }

    let perennial = store.records.plantings.get(6).await.unwrap();
    assert_eq!(perennial.expected_harvest_date, None);
}

#[tokio::test]
async fn application_inserts_follow_fixture_ids() {
    let store = TestStore::seeded().await;

    let field = store.field(1).await;

    assert_eq!(field.id, 7);
}

#[tokio::test]
async fn reseeding_restores_deleted_rows() {
    let store = TestStore::seeded().await;
    let removed = store.records.enterprises.delete(1).await.unwrap().total();

    let report = seed::load_fixtures(store.db.as_ref()).await.unwrap();

    assert_eq!(report.inserted, removed);
    assert_eq!(report.skipped, FIXTURE_ROWS - removed);
    assert_eq!(store.records.summary().await.unwrap().total, FIXTURE_ROWS);
}

#[tokio::test]
async fn a_rejected_row_does_not_stop_the_load() {
    let store = TestStore::new().await;
    let mut fixtures = FixtureSet::reference().unwrap();
    fixtures.fields[0].row.area_hectares = Decimal::ZERO;

    let report = seed::load(store.db.as_ref(), fixtures).await.unwrap();

    // Field 1 fails its check; its planting, that planting's harvest and the
    // field's two operations then fail on the missing parent.
    let failed: Vec<(RecordKind, i32)> = report.failed.iter().map(|f| (f.kind, f.id)).collect();
    assert_eq!(
        failed,
        vec![
            (RecordKind::Field, 1),
            (RecordKind::Planting, 1),
            (RecordKind::Harvest, 1),
            (RecordKind::FieldOperation, 1),
            (RecordKind::FieldOperation, 2),
        ]
    );
    assert_eq!(report.inserted, FIXTURE_ROWS - 5);
    assert!(report.failed[0].reason.contains("area_hectares"));

    let field = store.records.fields.get(2).await.unwrap();
    assert_eq!(field.area_hectares, dec!(18));
}
