#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use farm_records::{
    db::{self, DbPool},
    entities::{crop, enterprise, field, planting},
    prelude::*,
    seed,
};
use rust_decimal_macros::dec;

/// A fresh in-memory store with every migration applied.
pub struct TestStore {
    pub db: Arc<DbPool>,
    pub records: FarmRecords,
}

impl TestStore {
    pub async fn new() -> Self {
        let pool = db::establish_connection("sqlite::memory:")
            .await
            .expect("in-memory sqlite connection");
        db::run_migrations(&pool).await.expect("migrations apply");

        let db = Arc::new(pool);
        let records = FarmRecords::new(db.clone());
        Self { db, records }
    }

    /// A store holding the reference fixtures.
    pub async fn seeded() -> Self {
        let store = Self::new().await;
        let report = seed::load_fixtures(store.db.as_ref())
            .await
            .expect("seed loads");
        assert!(report.is_clean(), "seed failures: {:?}", report.failed);
        store
    }

    pub async fn enterprise(&self, name: &str) -> enterprise::Model {
        self.records
            .enterprises
            .create(CreateEnterpriseInput::new(name))
            .await
            .expect("enterprise created")
    }

    pub async fn field(&self, enterprise_id: i32) -> field::Model {
        self.records
            .fields
            .create(CreateFieldInput::new(enterprise_id, "Test Field", dec!(10.0)))
            .await
            .expect("field created")
    }

    pub async fn crop(&self, name: &str) -> crop::Model {
        self.records
            .crops
            .create(CreateCropInput::new(name, "Grain"))
            .await
            .expect("crop created")
    }

    pub async fn planting(&self, field_id: i32, crop_id: i32) -> planting::Model {
        let mut input = CreatePlantingInput::new(field_id, crop_id, date(2024, 4, 1));
        input.expected_harvest_date = Some(date(2024, 9, 1));
        self.records
            .plantings
            .create(input)
            .await
            .expect("planting created")
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}
