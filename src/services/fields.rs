use std::sync::Arc;

use chrono::{DateTime, Utc};
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
    blank_to_none, fits_column, positive, required_text, Constrained, DECIMAL_10_2,
};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{enterprise, field, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Field;

/// A complete field record as written to the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFieldInput {
    pub enterprise_id: i32,
    #[validate(length(max = 255))]
    pub name: String,
    /// Greater than 0, at most two decimal places.
    pub area_hectares: Decimal,
    #[validate(length(max = 100))]
    pub soil_type: Option<String>,
    /// Defaults to `false`.
    pub is_irrigated: Option<bool>,
    pub description: Option<String>,
    /// Defaults to the moment of insertion.
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateFieldInput {
    pub fn new(enterprise_id: i32, name: impl Into<String>, area_hectares: Decimal) -> Self {
        Self {
            enterprise_id,
            name: name.into(),
            area_hectares,
            soil_type: None,
            is_irrigated: None,
            description: None,
            created_at: None,
        }
    }

    pub(crate) fn into_record(self) -> field::ActiveModel {
        field::ActiveModel {
            enterprise_id: Set(self.enterprise_id),
            name: Set(self.name),
            area_hectares: Set(self.area_hectares),
            soil_type: Set(blank_to_none(self.soil_type)),
            is_irrigated: self.is_irrigated.map(Set).unwrap_or_default(),
            description: Set(blank_to_none(self.description)),
            created_at: self.created_at.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreateFieldInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        required_text(KIND, "name", &self.name)?;
        positive(KIND, "area_hectares", self.area_hectares)?;
        fits_column(KIND, "area_hectares", Some(self.area_hectares), DECIMAL_10_2)
    }
}

impl From<&field::Model> for CreateFieldInput {
    fn from(model: &field::Model) -> Self {
        Self {
            enterprise_id: model.enterprise_id,
            name: model.name.clone(),
            area_hectares: model.area_hectares,
            soil_type: model.soil_type.clone(),
            is_irrigated: Some(model.is_irrigated),
            description: model.description.clone(),
            created_at: Some(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFieldInput {
    pub enterprise_id: Option<i32>,
    pub name: Option<String>,
    pub area_hectares: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub soil_type: Option<Option<String>>,
    pub is_irrigated: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

impl UpdateFieldInput {
    fn apply(self, draft: &mut CreateFieldInput) {
        if let Some(enterprise_id) = self.enterprise_id {
            draft.enterprise_id = enterprise_id;
        }
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(area_hectares) = self.area_hectares {
            draft.area_hectares = area_hectares;
        }
        if let Some(soil_type) = self.soil_type {
            draft.soil_type = soil_type;
        }
        if let Some(is_irrigated) = self.is_irrigated {
            draft.is_irrigated = Some(is_irrigated);
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldFilter {
    pub enterprise_id: Option<i32>,
    pub is_irrigated: Option<bool>,
}

#[derive(Clone)]
pub struct FieldService {
    db: Arc<DbPool>,
}

impl FieldService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(enterprise_id = input.enterprise_id))]
    pub async fn create(&self, input: CreateFieldInput) -> Result<field::Model, ServiceError> {
        input.ensure_valid()?;

        let txn = self.db.begin().await?;
        cascade::require_parent::<enterprise::Entity, _>(
            &txn,
            KIND,
            RecordKind::Enterprise,
            input.enterprise_id,
        )
        .await?;

        let model = input
            .into_record()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(field_id = model.id, "Field created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<field::Model, ServiceError> {
        field::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateFieldInput,
    ) -> Result<field::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<field::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateFieldInput::from(&existing);
        patch.apply(&mut draft);
        draft.ensure_valid()?;
        if draft.enterprise_id != existing.enterprise_id {
            cascade::require_parent::<enterprise::Entity, _>(
                &txn,
                KIND,
                RecordKind::Enterprise,
                draft.enterprise_id,
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

        info!(field_id = id, "Field updated");
        Ok(updated)
    }

    /// Deletes the field with its plantings, their harvests and its field operations.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<field::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        cascade::delete_fields(&txn, &[id], &mut report).await?;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(field_id = id, removed = report.total(), "Field deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: FieldFilter,
        query: &ListQuery,
    ) -> Result<Paginated<field::Model>, ServiceError> {
        let mut select = field::Entity::find();
        if let Some(enterprise_id) = filter.enterprise_id {
            select = select.filter(field::Column::EnterpriseId.eq(enterprise_id));
        }
        if let Some(is_irrigated) = filter.is_irrigated {
            select = select.filter(field::Column::IsIrrigated.eq(is_irrigated));
        }

        fetch_page(select, field::Column::Id, self.db.as_ref(), query).await
    }
}
