use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use super::cascade::{self, CascadeReport};
use super::constraints::{blank_to_none, fits_column, positive, Constrained, DECIMAL_12_2};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{harvest, planting, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Harvest;

/// A complete harvest record as written to the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHarvestInput {
    pub planting_id: i32,
    pub harvest_date: NaiveDate,
    /// Greater than 0, at most two decimal places.
    pub yield_kg: Decimal,
    #[validate(length(max = 50))]
    pub quality_grade: Option<String>,
    #[validate(length(max = 255))]
    pub storage_location: Option<String>,
    pub notes: Option<String>,
    /// Defaults to `false`.
    pub is_certified: Option<bool>,
    /// Defaults to the moment of insertion.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl CreateHarvestInput {
    pub fn new(planting_id: i32, harvest_date: NaiveDate, yield_kg: Decimal) -> Self {
        Self {
            planting_id,
            harvest_date,
            yield_kg,
            quality_grade: None,
            storage_location: None,
            notes: None,
            is_certified: None,
            recorded_at: None,
        }
    }

    pub(crate) fn into_record(self) -> harvest::ActiveModel {
        harvest::ActiveModel {
            planting_id: Set(self.planting_id),
            harvest_date: Set(self.harvest_date),
            yield_kg: Set(self.yield_kg),
            quality_grade: Set(blank_to_none(self.quality_grade)),
            storage_location: Set(blank_to_none(self.storage_location)),
            notes: Set(blank_to_none(self.notes)),
            is_certified: self.is_certified.map(Set).unwrap_or_default(),
            recorded_at: self.recorded_at.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreateHarvestInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        positive(KIND, "yield_kg", self.yield_kg)?;
        fits_column(KIND, "yield_kg", Some(self.yield_kg), DECIMAL_12_2)
    }
}

impl From<&harvest::Model> for CreateHarvestInput {
    fn from(model: &harvest::Model) -> Self {
        Self {
            planting_id: model.planting_id,
            harvest_date: model.harvest_date,
            yield_kg: model.yield_kg,
            quality_grade: model.quality_grade.clone(),
            storage_location: model.storage_location.clone(),
            notes: model.notes.clone(),
            is_certified: Some(model.is_certified),
            recorded_at: Some(model.recorded_at),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHarvestInput {
    pub planting_id: Option<i32>,
    pub harvest_date: Option<NaiveDate>,
    pub yield_kg: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub quality_grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub storage_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
    pub is_certified: Option<bool>,
}

impl UpdateHarvestInput {
    fn apply(self, draft: &mut CreateHarvestInput) {
        if let Some(planting_id) = self.planting_id {
            draft.planting_id = planting_id;
        }
        if let Some(harvest_date) = self.harvest_date {
            draft.harvest_date = harvest_date;
        }
        if let Some(yield_kg) = self.yield_kg {
            draft.yield_kg = yield_kg;
        }
        if let Some(grade) = self.quality_grade {
            draft.quality_grade = grade;
        }
        if let Some(location) = self.storage_location {
            draft.storage_location = location;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
        if let Some(is_certified) = self.is_certified {
            draft.is_certified = Some(is_certified);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestFilter {
    pub planting_id: Option<i32>,
    pub is_certified: Option<bool>,
}

#[derive(Clone)]
pub struct HarvestService {
    db: Arc<DbPool>,
}

impl HarvestService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(planting_id = input.planting_id))]
    pub async fn create(&self, input: CreateHarvestInput) -> Result<harvest::Model, ServiceError> {
        input.ensure_valid()?;

        let txn = self.db.begin().await?;
        cascade::require_parent::<planting::Entity, _>(
            &txn,
            KIND,
            RecordKind::Planting,
            input.planting_id,
        )
        .await?;

        let model = input
            .into_record()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(harvest_id = model.id, yield_kg = %model.yield_kg, "Harvest recorded");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<harvest::Model, ServiceError> {
        harvest::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateHarvestInput,
    ) -> Result<harvest::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<harvest::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateHarvestInput::from(&existing);
        patch.apply(&mut draft);
        draft.ensure_valid()?;
        if draft.planting_id != existing.planting_id {
            cascade::require_parent::<planting::Entity, _>(
                &txn,
                KIND,
                RecordKind::Planting,
                draft.planting_id,
            )
            .await?;
        }

        let mut record = draft.into_record();
        record.id = ActiveValue::Unchanged(id);
        let updated = record
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        info!(harvest_id = id, "Harvest updated");
        Ok(updated)
    }

    /// Harvests own nothing, so the report counts at most one row.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<harvest::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        report.harvests += harvest::Entity::delete_by_id(id)
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(harvest_id = id, "Harvest deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: HarvestFilter,
        query: &ListQuery,
    ) -> Result<Paginated<harvest::Model>, ServiceError> {
        let mut select = harvest::Entity::find();
        if let Some(planting_id) = filter.planting_id {
            select = select.filter(harvest::Column::PlantingId.eq(planting_id));
        }
        if let Some(is_certified) = filter.is_certified {
            select = select.filter(harvest::Column::IsCertified.eq(is_certified));
        }

        fetch_page(select, harvest::Column::Id, self.db.as_ref(), query).await
    }
}
