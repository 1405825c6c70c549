use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use super::cascade::{self, CascadeReport};
use super::constraints::{blank_to_none, positive_when_present, required_text, Constrained};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{crop, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Crop;

/// A complete crop record as written to the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCropInput {
    #[validate(length(max = 255))]
    pub name: String,
    /// Category such as grain, legume or vegetable.
    #[validate(length(max = 100))]
    pub crop_type: String,
    /// Greater than 0 when set.
    pub growing_season_days: Option<i32>,
    pub description: Option<String>,
    /// Defaults to `true`; perennials set it to `false`.
    pub is_annual: Option<bool>,
    /// Defaults to the moment of insertion.
    pub added_date: Option<DateTime<Utc>>,
}

impl CreateCropInput {
    pub fn new(name: impl Into<String>, crop_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crop_type: crop_type.into(),
            growing_season_days: None,
            description: None,
            is_annual: None,
            added_date: None,
        }
    }

    pub(crate) fn into_record(self) -> crop::ActiveModel {
        crop::ActiveModel {
            name: Set(self.name),
            crop_type: Set(self.crop_type),
            growing_season_days: Set(self.growing_season_days),
            description: Set(blank_to_none(self.description)),
            is_annual: self.is_annual.map(Set).unwrap_or_default(),
            added_date: self.added_date.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreateCropInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        required_text(KIND, "name", &self.name)?;
        required_text(KIND, "crop_type", &self.crop_type)?;
        positive_when_present(KIND, "growing_season_days", self.growing_season_days)
    }
}

impl From<&crop::Model> for CreateCropInput {
    fn from(model: &crop::Model) -> Self {
        Self {
            name: model.name.clone(),
            crop_type: model.crop_type.clone(),
            growing_season_days: model.growing_season_days,
            description: model.description.clone(),
            is_annual: Some(model.is_annual),
            added_date: Some(model.added_date),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCropInput {
    pub name: Option<String>,
    pub crop_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub growing_season_days: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub is_annual: Option<bool>,
}

impl UpdateCropInput {
    fn apply(self, draft: &mut CreateCropInput) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(crop_type) = self.crop_type {
            draft.crop_type = crop_type;
        }
        if let Some(days) = self.growing_season_days {
            draft.growing_season_days = days;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(is_annual) = self.is_annual {
            draft.is_annual = Some(is_annual);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CropFilter {
    pub crop_type: Option<String>,
    pub is_annual: Option<bool>,
}

#[derive(Clone)]
pub struct CropService {
    db: Arc<DbPool>,
}

impl CropService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateCropInput) -> Result<crop::Model, ServiceError> {
        input.ensure_valid()?;

        let model = input
            .into_record()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(crop_id = model.id, "Crop created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<crop::Model, ServiceError> {
        crop::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i32, patch: UpdateCropInput) -> Result<crop::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<crop::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateCropInput::from(&existing);
        patch.apply(&mut draft);
        draft.ensure_valid()?;

        let mut record = draft.into_record();
        record.id = ActiveValue::Unchanged(id);
        let updated = record
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        info!(crop_id = id, "Crop updated");
        Ok(updated)
    }

    /// Deletes the crop together with every planting of it and their harvests.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<crop::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        cascade::delete_crop(&txn, id, &mut report).await?;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(crop_id = id, removed = report.total(), "Crop deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: CropFilter,
        query: &ListQuery,
    ) -> Result<Paginated<crop::Model>, ServiceError> {
        let mut select = crop::Entity::find();
        if let Some(crop_type) = filter.crop_type {
            select = select.filter(crop::Column::CropType.eq(crop_type));
        }
        if let Some(is_annual) = filter.is_annual {
            select = select.filter(crop::Column::IsAnnual.eq(is_annual));
        }

        fetch_page(select, crop::Column::Id, self.db.as_ref(), query).await
    }
}
