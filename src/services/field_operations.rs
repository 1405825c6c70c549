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
    blank_to_none, fits_column, non_negative, required_text, Constrained, DECIMAL_10_2,
    DECIMAL_12_2,
};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{field, field_operation, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::FieldOperation;

/// A complete field operation record as written to the store.
///
/// The three amounts are optional, never negative, and carry at most two
/// decimal places.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFieldOperationInput {
    pub field_id: i32,
    pub operation_date: NaiveDate,
    /// Free-form kind of work, e.g. "Plowing" or "Irrigation".
    #[validate(length(max = 100))]
    pub operation_type: String,
    pub description: Option<String>,
    pub fertilizer_amount_kg: Option<Decimal>,
    pub water_amount_liters: Option<Decimal>,
    pub cost: Option<Decimal>,
    /// Defaults to `true`.
    pub is_completed: Option<bool>,
    #[validate(length(max = 255))]
    pub performed_by: Option<String>,
    /// Defaults to the moment of insertion.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl CreateFieldOperationInput {
    pub fn new(field_id: i32, operation_date: NaiveDate, operation_type: impl Into<String>) -> Self {
        Self {
            field_id,
            operation_date,
            operation_type: operation_type.into(),
            description: None,
            fertilizer_amount_kg: None,
            water_amount_liters: None,
            cost: None,
            is_completed: None,
            performed_by: None,
            recorded_at: None,
        }
    }

    pub(crate) fn into_record(self) -> field_operation::ActiveModel {
        field_operation::ActiveModel {
            field_id: Set(self.field_id),
            operation_date: Set(self.operation_date),
            operation_type: Set(self.operation_type),
            description: Set(blank_to_none(self.description)),
            fertilizer_amount_kg: Set(self.fertilizer_amount_kg),
            water_amount_liters: Set(self.water_amount_liters),
            cost: Set(self.cost),
            is_completed: self.is_completed.map(Set).unwrap_or_default(),
            performed_by: Set(blank_to_none(self.performed_by)),
            recorded_at: self.recorded_at.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreateFieldOperationInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        required_text(KIND, "operation_type", &self.operation_type)?;
        non_negative(KIND, "fertilizer_amount_kg", self.fertilizer_amount_kg)?;
        non_negative(KIND, "water_amount_liters", self.water_amount_liters)?;
        non_negative(KIND, "cost", self.cost)?;
        fits_column(KIND, "fertilizer_amount_kg", self.fertilizer_amount_kg, DECIMAL_10_2)?;
        fits_column(KIND, "water_amount_liters", self.water_amount_liters, DECIMAL_12_2)?;
        fits_column(KIND, "cost", self.cost, DECIMAL_12_2)
    }
}

impl From<&field_operation::Model> for CreateFieldOperationInput {
    fn from(model: &field_operation::Model) -> Self {
        Self {
            field_id: model.field_id,
            operation_date: model.operation_date,
            operation_type: model.operation_type.clone(),
            description: model.description.clone(),
            fertilizer_amount_kg: model.fertilizer_amount_kg,
            water_amount_liters: model.water_amount_liters,
            cost: model.cost,
            is_completed: Some(model.is_completed),
            performed_by: model.performed_by.clone(),
            recorded_at: Some(model.recorded_at),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFieldOperationInput {
    pub field_id: Option<i32>,
    pub operation_date: Option<NaiveDate>,
    pub operation_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub fertilizer_amount_kg: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub water_amount_liters: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub cost: Option<Option<Decimal>>,
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub performed_by: Option<Option<String>>,
}

impl UpdateFieldOperationInput {
    fn apply(self, draft: &mut CreateFieldOperationInput) {
        if let Some(field_id) = self.field_id {
            draft.field_id = field_id;
        }
        if let Some(date) = self.operation_date {
            draft.operation_date = date;
        }
        if let Some(operation_type) = self.operation_type {
            draft.operation_type = operation_type;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(amount) = self.fertilizer_amount_kg {
            draft.fertilizer_amount_kg = amount;
        }
        if let Some(amount) = self.water_amount_liters {
            draft.water_amount_liters = amount;
        }
        if let Some(cost) = self.cost {
            draft.cost = cost;
        }
        if let Some(is_completed) = self.is_completed {
            draft.is_completed = Some(is_completed);
        }
        if let Some(performed_by) = self.performed_by {
            draft.performed_by = performed_by;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldOperationFilter {
    pub field_id: Option<i32>,
    pub operation_type: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Clone)]
pub struct FieldOperationService {
    db: Arc<DbPool>,
}

impl FieldOperationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(field_id = input.field_id, operation_type = %input.operation_type))]
    pub async fn create(
        &self,
        input: CreateFieldOperationInput,
    ) -> Result<field_operation::Model, ServiceError> {
        input.ensure_valid()?;

        let txn = self.db.begin().await?;
        cascade::require_parent::<field::Entity, _>(&txn, KIND, RecordKind::Field, input.field_id)
            .await?;

        let model = input
            .into_record()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(field_operation_id = model.id, "Field operation recorded");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<field_operation::Model, ServiceError> {
        field_operation::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateFieldOperationInput,
    ) -> Result<field_operation::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<field_operation::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateFieldOperationInput::from(&existing);
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

        let mut record = draft.into_record();
        record.id = ActiveValue::Unchanged(id);
        let updated = record
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        info!(field_operation_id = id, "Field operation updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<field_operation::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        report.field_operations += field_operation::Entity::delete_by_id(id)
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(field_operation_id = id, "Field operation deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: FieldOperationFilter,
        query: &ListQuery,
    ) -> Result<Paginated<field_operation::Model>, ServiceError> {
        let mut select = field_operation::Entity::find();
        if let Some(field_id) = filter.field_id {
            select = select.filter(field_operation::Column::FieldId.eq(field_id));
        }
        if let Some(operation_type) = filter.operation_type {
            select = select.filter(field_operation::Column::OperationType.eq(operation_type));
        }
        if let Some(is_completed) = filter.is_completed {
            select = select.filter(field_operation::Column::IsCompleted.eq(is_completed));
        }

        fetch_page(select, field_operation::Column::Id, self.db.as_ref(), query).await
    }
}
