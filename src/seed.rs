//! Reference fixture set and its idempotent loader.
//!
//! Rows carry explicit ids and are inserted with `ON CONFLICT (id) DO NOTHING`,
//! so loading twice leaves the store unchanged. Each row is applied on its
//! own: a rejected row is reported and the load continues.

use chrono::Utc;
use metrics::counter;
use sea_orm::sea_query::{IntoIden, OnConflict};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::db;
use crate::entities::{
    crop, employee, enterprise, field, field_operation, harvest, planting, RecordKind,
};
use crate::errors::ServiceError;
use crate::services::constraints::Constrained;
use crate::services::crops::CreateCropInput;
use crate::services::employees::CreateEmployeeInput;
use crate::services::enterprises::CreateEnterpriseInput;
use crate::services::field_operations::CreateFieldOperationInput;
use crate::services::fields::CreateFieldInput;
use crate::services::harvests::CreateHarvestInput;
use crate::services::plantings::CreatePlantingInput;

const FIXTURES: &str = include_str!("../fixtures/seed.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture<T> {
    pub id: i32,
    #[serde(flatten)]
    pub row: T,
}

/// Every fixture row, grouped per table.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSet {
    pub enterprises: Vec<Fixture<CreateEnterpriseInput>>,
    pub crops: Vec<Fixture<CreateCropInput>>,
    pub fields: Vec<Fixture<CreateFieldInput>>,
    pub employees: Vec<Fixture<CreateEmployeeInput>>,
    pub plantings: Vec<Fixture<CreatePlantingInput>>,
    pub harvests: Vec<Fixture<CreateHarvestInput>>,
    pub field_operations: Vec<Fixture<CreateFieldOperationInput>>,
}

impl FixtureSet {
    pub fn reference() -> Result<Self, ServiceError> {
        serde_json::from_str(FIXTURES)
            .map_err(|e| ServiceError::InternalError(format!("invalid seed fixtures: {e}")))
    }

    pub fn len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Enterprise => self.enterprises.len(),
            RecordKind::Field => self.fields.len(),
            RecordKind::Crop => self.crops.len(),
            RecordKind::Planting => self.plantings.len(),
            RecordKind::Harvest => self.harvests.len(),
            RecordKind::FieldOperation => self.field_operations.len(),
            RecordKind::Employee => self.employees.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub kind: RecordKind,
    pub id: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: u64,
    pub skipped: u64,
    pub failed: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Loads the reference fixtures.
pub async fn load_fixtures<C: ConnectionTrait>(db: &C) -> Result<SeedReport, ServiceError> {
    load(db, FixtureSet::reference()?).await
}

/// Loads `fixtures` owners-first, then moves Postgres id sequences past them.
#[instrument(skip_all)]
pub async fn load<C: ConnectionTrait>(
    db: &C,
    fixtures: FixtureSet,
) -> Result<SeedReport, ServiceError> {
    let now = Utc::now();
    let mut report = SeedReport::default();

    seed_rows(db, fixtures.enterprises, enterprise::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults(now)
    })
    .await;
    seed_rows(db, fixtures.crops, crop::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults(now)
    })
    .await;
    seed_rows(db, fixtures.fields, field::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults(now)
    })
    .await;
    seed_rows(db, fixtures.employees, employee::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults()
    })
    .await;
    seed_rows(db, fixtures.plantings, planting::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults(now)
    })
    .await;
    seed_rows(db, fixtures.harvests, harvest::Column::Id, &mut report, |id, row| {
        let mut record = row.into_record();
        record.id = Set(id);
        record.with_defaults(now)
    })
    .await;
    seed_rows(
        db,
        fixtures.field_operations,
        field_operation::Column::Id,
        &mut report,
        |id, row| {
            let mut record = row.into_record();
            record.id = Set(id);
            record.with_defaults(now)
        },
    )
    .await;

    db::sync_id_sequences(db).await?;

    counter!("farm_records.seed.inserted", report.inserted);
    counter!("farm_records.seed.skipped", report.skipped);
    counter!("farm_records.seed.failed", report.failed.len() as u64);
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed.len(),
        "Seed fixtures loaded"
    );
    Ok(report)
}

async fn seed_rows<C, I, A, K>(
    db: &C,
    rows: Vec<Fixture<I>>,
    id_column: K,
    report: &mut SeedReport,
    build: impl Fn(i32, I) -> A,
) where
    C: ConnectionTrait,
    I: Constrained,
    A: ActiveModelTrait + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    K: IntoIden + Copy,
{
    for Fixture { id, row } in rows {
        let outcome = match row.ensure_valid() {
            Ok(()) => insert_if_absent(db, build(id, row), id_column, I::KIND).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(true) => report.inserted += 1,
            Ok(false) => report.skipped += 1,
            Err(error) => {
                warn!(kind = %I::KIND, id, %error, "Seed row rejected");
                report.failed.push(SeedFailure {
                    kind: I::KIND,
                    id,
                    reason: error.to_string(),
                });
            }
        }
    }
}

/// `true` when the row was written, `false` when its id already existed.
async fn insert_if_absent<C, A, K>(
    db: &C,
    record: A,
    id_column: K,
    kind: RecordKind,
) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    K: IntoIden,
{
    let rows = <A::Entity as EntityTrait>::insert(record)
        .on_conflict(OnConflict::column(id_column).do_nothing().to_owned())
        .exec_without_returning(db)
        .await
        .map_err(|e| ServiceError::db_error(kind, e))?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn reference_set_has_expected_shape() {
        let set = FixtureSet::reference().unwrap();
        let expected = [
            (RecordKind::Enterprise, 3),
            (RecordKind::Crop, 6),
            (RecordKind::Field, 6),
            (RecordKind::Employee, 5),
            (RecordKind::Planting, 6),
            (RecordKind::Harvest, 4),
            (RecordKind::FieldOperation, 6),
        ];
        for (kind, count) in expected {
            assert_eq!(set.len(kind), count, "{kind}");
        }
    }

    #[test]
    fn every_reference_row_passes_constraints() {
        let set = FixtureSet::reference().unwrap();
        set.enterprises.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.crops.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.fields.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.employees.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.plantings.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.harvests.iter().for_each(|f| f.row.ensure_valid().unwrap());
        set.field_operations
            .iter()
            .for_each(|f| f.row.ensure_valid().unwrap());
    }

    #[test]
    fn plantings_three_and_six_have_no_harvest() {
        let set = FixtureSet::reference().unwrap();
        let harvested: HashSet<i32> = set.harvests.iter().map(|h| h.row.planting_id).collect();
        let unharvested: Vec<i32> = set
            .plantings
            .iter()
            .map(|p| p.id)
            .filter(|id| !harvested.contains(id))
            .collect();
        assert_eq!(unharvested, vec![3, 6]);
    }

    #[test]
    fn parents_are_declared_in_the_set() {
        let set = FixtureSet::reference().unwrap();
        let enterprises: HashSet<i32> = set.enterprises.iter().map(|f| f.id).collect();
        let fields: HashSet<i32> = set.fields.iter().map(|f| f.id).collect();
        let crops: HashSet<i32> = set.crops.iter().map(|f| f.id).collect();

        assert!(set.fields.iter().all(|f| enterprises.contains(&f.row.enterprise_id)));
        assert!(set.employees.iter().all(|f| enterprises.contains(&f.row.enterprise_id)));
        assert!(set
            .plantings
            .iter()
            .all(|f| fields.contains(&f.row.field_id) && crops.contains(&f.row.crop_id)));
        assert!(set
            .field_operations
            .iter()
            .all(|f| fields.contains(&f.row.field_id)));
        assert_eq!(RecordKind::iter().count(), 7);
    }
}
