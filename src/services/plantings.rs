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
use super::constraints::{
    blank_to_none, fits_column, non_negative, strictly_after, Constrained, DECIMAL_10_2,
};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{crop, field, planting, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Planting;

/// A complete planting record as written to the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePlantingInput {
    pub field_id: i32,
    pub crop_id: i32,
    pub planting_date: NaiveDate,
    /// Must be strictly later than `planting_date` when present.
    pub expected_harvest_date: Option<NaiveDate>,
    /// Not negative, at most two decimal places.
    pub seed_amount_kg: Option<Decimal>,
    #[validate(length(max = 100))]
    pub planting_method: Option<String>,
    pub notes: Option<String>,
    /// Defaults to `false`.
    pub is_organic: Option<bool>,
    /// Defaults to the moment of insertion.
    pub created_at: Option<DateTime<Utc>>,
}

impl CreatePlantingInput {
    pub fn new(field_id: i32, crop_id: i32, planting_date: NaiveDate) -> Self {
        Self {
            field_id,
            crop_id,
            planting_date,
            expected_harvest_date: None,
            seed_amount_kg: None,
            planting_method: None,
            notes: None,
            is_organic: None,
            created_at: None,
        }
    }

    pub(crate) fn into_record(self) -> planting::ActiveModel {
        planting::ActiveModel {
            field_id: Set(self.field_id),
            crop_id: Set(self.crop_id),
            planting_date: Set(self.planting_date),
            expected_harvest_date: Set(self.expected_harvest_date),
            seed_amount_kg: Set(self.seed_amount_kg),
            planting_method: Set(blank_to_none(self.planting_method)),
            notes: Set(blank_to_none(self.notes)),
            is_organic: self.is_organic.map(Set).unwrap_or_default(),
            created_at: self.created_at.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreatePlantingInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        strictly_after(
            KIND,
            "expected_harvest_date",
            self.expected_harvest_date,
            "planting_date",
            self.planting_date,
        )?;
        non_negative(KIND, "seed_amount_kg", self.seed_amount_kg)?;
        fits_column(KIND, "seed_amount_kg", self.seed_amount_kg, DECIMAL_10_2)
    }
}

impl From<&planting::Model> for CreatePlantingInput {
    fn from(model: &planting::Model) -> Self {
        Self {
            field_id: model.field_id,
            crop_id: model.crop_id,
            planting_date: model.planting_date,
            expected_harvest_date: model.expected_harvest_date,
            seed_amount_kg: model.seed_amount_kg,
            planting_method: model.planting_method.clone(),
            notes: model.notes.clone(),
            is_organic: Some(model.is_organic),
            created_at: Some(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlantingInput {
    pub field_id: Option<i32>,
    pub crop_id: Option<i32>,
    pub planting_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub expected_harvest_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub seed_amount_kg: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub planting_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
    pub is_organic: Option<bool>,
}

impl UpdatePlantingInput {
    fn apply(self, draft: &mut CreatePlantingInput) {
        if let Some(field_id) = self.field_id {
            draft.field_id = field_id;
        }
        if let Some(crop_id) = self.crop_id {
            draft.crop_id = crop_id;
        }
        if let Some(planting_date) = self.planting_date {
            draft.planting_date = planting_date;
        }
        if let Some(expected) = self.expected_harvest_date {
            draft.expected_harvest_date = expected;
        }
        if let Some(seed_amount_kg) = self.seed_amount_kg {
            draft.seed_amount_kg = seed_amount_kg;
        }
        if let Some(method) = self.planting_method {
            draft.planting_method = method;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
        if let Some(is_organic) = self.is_organic {
            draft.is_organic = Some(is_organic);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlantingFilter {
    pub field_id: Option<i32>,
    pub crop_id: Option<i32>,
    pub is_organic: Option<bool>,
}

#[derive(Clone)]
pub struct PlantingService {
    db: Arc<DbPool>,
}

impl PlantingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(field_id = input.field_id, crop_id = input.crop_id))]
    pub async fn create(
        &self,
        input: CreatePlantingInput,
    ) -> Result<planting::Model, ServiceError> {
        input.ensure_valid()?;

        let txn = self.db.begin().await?;
        cascade::require_parent::<field::Entity, _>(&txn, KIND, RecordKind::Field, input.field_id)
            .await?;
        cascade::require_parent::<crop::Entity, _>(&txn, KIND, RecordKind::Crop, input.crop_id)
            .await?;

        let model = input
            .into_record()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(planting_id = model.id, "Planting created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<planting::Model, ServiceError> {
        planting::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdatePlantingInput,
    ) -> Result<planting::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<planting::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreatePlantingInput::from(&existing);
        patch.apply(&mut draft);
        draft.ensure_valid()?;
        if draft.field_id != existing.field_id {
            cascade::require_parent::<field::Entity, _>(
                &txn,
                KIND,
                RecordKind::Field,
                draft.field_id,
            )
            .await?;
        }
        if draft.crop_id != existing.crop_id {
            cascade::require_parent::<crop::Entity, _>(&txn, KIND, RecordKind::Crop, draft.crop_id)
                .await?;
        }

        let mut record = draft.into_record();
        record.id = ActiveValue::Unchanged(id);
        let updated = record
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        info!(planting_id = id, "Planting updated");
        Ok(updated)
    }

    /// Deletes the planting and its harvests.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<planting::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        cascade::delete_plantings(&txn, &[id], &mut report).await?;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(planting_id = id, removed = report.total(), "Planting deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: PlantingFilter,
        query: &ListQuery,
    ) -> Result<Paginated<planting::Model>, ServiceError> {
        let mut select = planting::Entity::find();
        if let Some(field_id) = filter.field_id {
            select = select.filter(planting::Column::FieldId.eq(field_id));
        }
        if let Some(crop_id) = filter.crop_id {
            select = select.filter(planting::Column::CropId.eq(crop_id));
        }
        if let Some(is_organic) = filter.is_organic {
            select = select.filter(planting::Column::IsOrganic.eq(is_organic));
        }

        fetch_page(select, planting::Column::Id, self.db.as_ref(), query).await
    }
}
