//! Deletes follow the ownership graph and leave no orphans.

mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use common::{date, TestStore};
use farm_records::prelude::*;
use rust_decimal_macros::dec;
use tokio::task::JoinSet;

#[tokio::test]
async fn deleting_an_enterprise_removes_everything_it_owns() {
    let store = TestStore::seeded().await;

    let report = store.records.enterprises.delete(1).await.unwrap();

    let expected = CascadeReport {
        enterprises: 1,
        fields: 2,
        employees: 2,
        plantings: 2,
        harvests: 2,
        field_operations: 3,
        crops: 0,
    };
    assert_eq!(report, expected);

    let records = &store.records;
    assert_matches!(records.enterprises.get(1).await, Err(ServiceError::NotFound { .. }));
    for id in [1, 2] {
        assert_matches!(records.fields.get(id).await, Err(ServiceError::NotFound { .. }));
        assert_matches!(records.employees.get(id).await, Err(ServiceError::NotFound { .. }));
        assert_matches!(records.plantings.get(id).await, Err(ServiceError::NotFound { .. }));
        assert_matches!(records.harvests.get(id).await, Err(ServiceError::NotFound { .. }));
    }
    for id in [1, 2, 3] {
        assert_matches!(
            records.field_operations.get(id).await,
            Err(ServiceError::NotFound { .. })
        );
    }

    // Other enterprises and shared crops are untouched.
    assert!(records.enterprises.get(2).await.is_ok());
    assert!(records.crops.get(1).await.is_ok());

    let summary = records.summary().await.unwrap();
    assert_eq!(summary.total, 36 - report.total());
    assert_eq!(summary.rows(RecordKind::Crop), 6);
}

#[tokio::test]
async fn deleting_a_crop_removes_its_plantings_and_harvests_only() {
    let store = TestStore::seeded().await;

    let report = store.records.crops.delete(1).await.unwrap();

    assert_eq!(report.crops, 1);
    assert_eq!(report.plantings, 1);
    assert_eq!(report.harvests, 1);
    assert_eq!(report.total(), 3);
    assert!(store.records.fields.get(1).await.is_ok());
    assert!(store.records.field_operations.get(1).await.is_ok());
}

#[tokio::test]
async fn deleting_a_field_removes_plantings_and_operations() {
    let store = TestStore::seeded().await;

    // Field 5 carries the perennial planting (no harvests) and one operation.
    let report = store.records.fields.delete(5).await.unwrap();

    assert_eq!(report.fields, 1);
    assert_eq!(report.plantings, 1);
    assert_eq!(report.harvests, 0);
    assert_eq!(report.field_operations, 1);
    assert_matches!(store.records.plantings.get(6).await, Err(ServiceError::NotFound { .. }));
    assert!(store.records.crops.get(5).await.is_ok());
}

#[tokio::test]
async fn deleting_an_unharvested_planting() {
    let store = TestStore::seeded().await;

    let report = store.records.delete(RecordKind::Planting, 3).await.unwrap();

    assert_eq!(report.plantings, 1);
    assert_eq!(report.harvests, 0);
    assert_eq!(report.count(RecordKind::Planting), 1);
}

#[tokio::test]
async fn deleting_leaf_records() {
    let store = TestStore::seeded().await;

    for kind in [RecordKind::Harvest, RecordKind::FieldOperation, RecordKind::Employee] {
        let report = store.records.delete(kind, 1).await.unwrap();
        assert_eq!(report.total(), 1, "{kind}");
        assert_eq!(report.count(kind), 1, "{kind}");
    }

    assert_matches!(
        store.records.delete(RecordKind::Harvest, 1).await,
        Err(ServiceError::NotFound { entity: RecordKind::Harvest, id: 1 })
    );
}

#[tokio::test]
async fn concurrent_harvests_never_outlive_their_planting() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Race Farm").await;
    let field = store.field(farm.id).await;
    let crop = store.crop("Sorghum").await;
    let planting_id = store.planting(field.id, crop.id).await.id;

    let mut tasks = JoinSet::new();
    for day in 1..=8 {
        let harvests = store.records.harvests.clone();
        tasks.spawn(async move {
            harvests
                .create(CreateHarvestInput::new(planting_id, date(2024, 9, day), dec!(250)))
                .await
                .map(|h| h.id)
        });
    }
    let plantings = store.records.plantings.clone();
    tasks.spawn(async move { plantings.delete(planting_id).await.map(|_| 0) });

    let mut created = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task completed") {
            Ok(0) => {}
            Ok(id) => {
                created.insert(id);
            }
            Err(err) => assert_matches!(err, ServiceError::ReferentialIntegrityViolation { .. }),
        }
    }

    for id in created {
        assert_matches!(store.records.harvests.get(id).await, Err(ServiceError::NotFound { .. }));
    }
    let remaining = store
        .records
        .harvests
        .list(HarvestFilter::default(), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(remaining.total, 0);
}

#[tokio::test]
async fn dependents_preview_leaves_the_store_untouched() {
    let store = TestStore::seeded().await;

    let preview = store.records.dependents(RecordKind::Enterprise, 1).await.unwrap();

    let expected = CascadeReport {
        fields: 2,
        employees: 2,
        plantings: 2,
        harvests: 2,
        field_operations: 3,
        ..Default::default()
    };
    assert_eq!(preview, expected);
    assert_eq!(store.records.summary().await.unwrap().total, 36);

    // The preview matches what the cascade then removes, less the row itself.
    let removed = store.records.enterprises.delete(1).await.unwrap();
    assert_eq!(removed.total(), preview.total() + 1);
}

#[tokio::test]
async fn dependents_per_kind() {
    let store = TestStore::seeded().await;
    let records = &store.records;

    let crop = records.dependents(RecordKind::Crop, 5).await.unwrap();
    assert_eq!((crop.plantings, crop.harvests), (1, 0));

    let planting = records.dependents(RecordKind::Planting, 2).await.unwrap();
    assert_eq!(planting.total(), 1);
    assert_eq!(planting.harvests, 1);

    for kind in [RecordKind::Harvest, RecordKind::FieldOperation, RecordKind::Employee] {
        assert_eq!(records.dependents(kind, 1).await.unwrap().total(), 0, "{kind}");
    }

    assert_matches!(
        records.dependents(RecordKind::Field, 99).await,
        Err(ServiceError::NotFound { entity: RecordKind::Field, id: 99 })
    );
}

#[tokio::test]
async fn restricted_delete_refuses_records_with_dependents() {
    let store = TestStore::seeded().await;

    let err = store
        .records
        .delete_restricted(RecordKind::Field, 1)
        .await
        .unwrap_err();

    match err {
        ServiceError::ReferentialIntegrityViolation { entity, message } => {
            assert_eq!(entity, RecordKind::Field);
            assert!(message.contains("plantings 1"), "{message}");
            assert!(message.contains("harvests 1"), "{message}");
            assert!(message.contains("field_operations 2"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.records.fields.get(1).await.is_ok());
    assert_eq!(store.records.summary().await.unwrap().total, 36);
}

#[tokio::test]
async fn restricted_delete_removes_unreferenced_rows() {
    let store = TestStore::seeded().await;

    // Planting 3 has no harvests yet.
    let report = store
        .records
        .delete_restricted(RecordKind::Planting, 3)
        .await
        .unwrap();
    assert_eq!(report.plantings, 1);
    assert_eq!(report.total(), 1);
    assert_matches!(store.records.plantings.get(3).await, Err(ServiceError::NotFound { .. }));

    let report = store
        .records
        .delete_restricted(RecordKind::Employee, 5)
        .await
        .unwrap();
    assert_eq!(report.count(RecordKind::Employee), 1);

    assert_matches!(
        store.records.delete_restricted(RecordKind::Employee, 5).await,
        Err(ServiceError::NotFound { .. })
    );
    assert_eq!(store.records.summary().await.unwrap().total, 34);
}
