//! Create, read, update and list behaviour of the record services.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{date, TestStore};
use farm_records::prelude::*;
use rust_decimal_macros::dec;

#[tokio::test]
async fn enterprise_defaults_to_active() {
    let store = TestStore::new().await;
    let before = Utc::now() - chrono::Duration::seconds(5);

    let farm = store.enterprise("Test Farm").await;

    assert!(farm.id > 0);
    assert_eq!(farm.name, "Test Farm");
    assert!(farm.is_active);
    assert!(farm.registration_date >= before);
    assert_eq!(store.records.enterprises.get(farm.id).await.unwrap(), farm);
}

#[tokio::test]
async fn field_defaults_to_not_irrigated() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;

    let field = store.field(farm.id).await;

    assert_eq!(field.enterprise_id, farm.id);
    assert!(!field.is_irrigated);
    assert_eq!(field.area_hectares, dec!(10));
}

#[tokio::test]
async fn remaining_boolean_defaults() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;
    let field = store.field(farm.id).await;
    let crop = store.crop("Barley").await;
    let planting = store.planting(field.id, crop.id).await;

    assert!(crop.is_annual);
    assert!(!planting.is_organic);

    let harvest = store
        .records
        .harvests
        .create(CreateHarvestInput::new(planting.id, date(2024, 9, 3), dec!(5400)))
        .await
        .unwrap();
    assert!(!harvest.is_certified);

    let operation = store
        .records
        .field_operations
        .create(CreateFieldOperationInput::new(field.id, date(2024, 3, 20), "Harrowing"))
        .await
        .unwrap();
    assert!(operation.is_completed);

    let employee = store
        .records
        .employees
        .create(CreateEmployeeInput::new(farm.id, "Ana", "Silva", date(2023, 1, 9)))
        .await
        .unwrap();
    assert!(employee.is_active);
}

#[tokio::test]
async fn planting_with_harvest_date_before_planting_is_rejected() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;
    let field = store.field(farm.id).await;
    let crop = store.crop("Maize").await;

    let mut input = CreatePlantingInput::new(field.id, crop.id, date(2024, 1, 1));
    input.expected_harvest_date = Some(date(2023, 12, 31));

    let err = store.records.plantings.create(input).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::ConstraintViolation {
            entity: RecordKind::Planting,
            field: "expected_harvest_date",
            ..
        }
    );

    let page = store
        .records
        .plantings
        .list(PlantingFilter::default(), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn harvest_for_missing_planting_is_a_referential_violation() {
    let store = TestStore::new().await;

    let err = store
        .records
        .harvests
        .create(CreateHarvestInput::new(404, date(2024, 8, 1), dec!(1200)))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ServiceError::ReferentialIntegrityViolation {
            entity: RecordKind::Harvest,
            ..
        }
    );
    assert_eq!(err.code(), "referential_integrity_violation");
}

#[tokio::test]
async fn planting_needs_both_field_and_crop() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;
    let field = store.field(farm.id).await;

    let err = store
        .records
        .plantings
        .create(CreatePlantingInput::new(field.id, 77, date(2024, 4, 1)))
        .await
        .unwrap_err();

    match err {
        ServiceError::ReferentialIntegrityViolation { entity, message } => {
            assert_eq!(entity, RecordKind::Planting);
            assert!(message.contains("crop 77"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn update_revalidates_against_stored_values() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;
    let field = store.field(farm.id).await;
    let crop = store.crop("Oats").await;
    let planting = store.planting(field.id, crop.id).await;

    // Stored expected_harvest_date is 2024-09-01.
    let patch = UpdatePlantingInput {
        planting_date: Some(date(2024, 9, 1)),
        ..Default::default()
    };
    let err = store
        .records
        .plantings
        .update(planting.id, patch)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ConstraintViolation { field: "expected_harvest_date", .. });

    let unchanged = store.records.plantings.get(planting.id).await.unwrap();
    assert_eq!(unchanged.planting_date, date(2024, 4, 1));

    // Clearing the expected date lifts the ordering constraint.
    let patch = UpdatePlantingInput {
        planting_date: Some(date(2024, 9, 1)),
        expected_harvest_date: Some(None),
        ..Default::default()
    };
    let updated = store
        .records
        .plantings
        .update(planting.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.planting_date, date(2024, 9, 1));
    assert_eq!(updated.expected_harvest_date, None);
    assert_eq!(updated.created_at, planting.created_at);
}

#[tokio::test]
async fn update_can_clear_and_keep_columns() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;

    let mut input = CreateFieldInput::new(farm.id, "Orchard", dec!(4.5));
    input.soil_type = Some("Sandy Loam".into());
    input.description = Some("Apple rows".into());
    let field = store.records.fields.create(input).await.unwrap();

    let patch: UpdateFieldInput =
        serde_json::from_value(serde_json::json!({ "soil_type": null, "is_irrigated": true }))
            .unwrap();
    let updated = store.records.fields.update(field.id, patch).await.unwrap();

    assert_eq!(updated.soil_type, None);
    assert_eq!(updated.description.as_deref(), Some("Apple rows"));
    assert!(updated.is_irrigated);
    assert_eq!(updated.area_hectares, dec!(4.5));
}

#[tokio::test]
async fn update_rejects_non_positive_area_and_missing_parent() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;
    let field = store.field(farm.id).await;

    let err = store
        .records
        .fields
        .update(
            field.id,
            UpdateFieldInput {
                area_hectares: Some(dec!(0)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ConstraintViolation { field: "area_hectares", .. });

    let err = store
        .records
        .fields
        .update(
            field.id,
            UpdateFieldInput {
                enterprise_id: Some(farm.id + 100),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrityViolation { .. });
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let store = TestStore::new().await;

    assert_matches!(
        store.records.crops.get(9).await,
        Err(ServiceError::NotFound { entity: RecordKind::Crop, id: 9 })
    );
    assert_matches!(
        store
            .records
            .employees
            .update(3, UpdateEmployeeInput::default())
            .await,
        Err(ServiceError::NotFound { entity: RecordKind::Employee, id: 3 })
    );
    assert_matches!(
        store.records.delete(RecordKind::FieldOperation, 1).await,
        Err(ServiceError::NotFound { entity: RecordKind::FieldOperation, id: 1 })
    );
}

#[tokio::test]
async fn status_flags_change_freely() {
    let store = TestStore::new().await;
    let farm = store.enterprise("Test Farm").await;

    for flag in [false, true, false] {
        let patch = UpdateEnterpriseInput {
            is_active: Some(flag),
            ..Default::default()
        };
        let updated = store.records.enterprises.update(farm.id, patch).await.unwrap();
        assert_eq!(updated.is_active, flag);
    }
}

#[tokio::test]
async fn list_paginates_in_id_order() {
    let store = TestStore::new().await;
    for name in ["Wheat", "Rye", "Barley", "Oats", "Spelt"] {
        store.crop(name).await;
    }

    let page = store
        .records
        .crops
        .list(CropFilter::default(), &ListQuery::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 2);
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Barley", "Oats"]);

    let newest = store
        .records
        .crops
        .list(CropFilter::default(), &ListQuery::new(1, 2).descending())
        .await
        .unwrap();
    assert_eq!(newest.items[0].name, "Spelt");

    let past_end = store
        .records
        .crops
        .list(CropFilter::default(), &ListQuery::new(9, 2))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 5);
}

#[tokio::test]
async fn list_filters_by_parent() {
    let store = TestStore::new().await;
    let north = store.enterprise("North").await;
    let south = store.enterprise("South").await;
    store.field(north.id).await;
    store.field(north.id).await;
    store.field(south.id).await;

    let filter = FieldFilter {
        enterprise_id: Some(north.id),
        ..Default::default()
    };
    let page = store
        .records
        .fields
        .list(filter, &ListQuery::default())
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|f| f.enterprise_id == north.id));
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let store = TestStore::seeded().await;

    for query in [ListQuery::new(u64::MAX, 20), ListQuery::new(u64::MAX, 1).descending()] {
        let page = store
            .records
            .crops
            .list(CropFilter::default(), &query)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 6);
        assert_eq!(page.page, u64::MAX);
    }
}
