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
use super::constraints::{blank_to_none, required_text, Constrained};
use super::{deserialize_some, fetch_page};
use crate::db::DbPool;
use crate::entities::{enterprise, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Enterprise;

/// A complete enterprise record as written to the store.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateEnterpriseInput {
    #[validate(length(max = 255))]
    pub name: String,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
    /// Defaults to the moment of insertion.
    pub registration_date: Option<DateTime<Utc>>,
}

impl CreateEnterpriseInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_record(self) -> enterprise::ActiveModel {
        enterprise::ActiveModel {
            name: Set(self.name),
            address: Set(blank_to_none(self.address)),
            phone: Set(blank_to_none(self.phone)),
            email: Set(blank_to_none(self.email)),
            is_active: self.is_active.map(Set).unwrap_or_default(),
            registration_date: self.registration_date.map(Set).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Constrained for CreateEnterpriseInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        required_text(KIND, "name", &self.name)
    }
}

impl From<&enterprise::Model> for CreateEnterpriseInput {
    fn from(model: &enterprise::Model) -> Self {
        Self {
            name: model.name.clone(),
            address: model.address.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            is_active: Some(model.is_active),
            registration_date: Some(model.registration_date),
        }
    }
}

/// Partial update; `None` leaves a column untouched, `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEnterpriseInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub registration_date: Option<DateTime<Utc>>,
}

impl UpdateEnterpriseInput {
    fn apply(self, draft: &mut CreateEnterpriseInput) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(address) = self.address {
            draft.address = address;
        }
        if let Some(phone) = self.phone {
            draft.phone = phone;
        }
        if let Some(email) = self.email {
            draft.email = email;
        }
        if let Some(is_active) = self.is_active {
            draft.is_active = Some(is_active);
        }
        if let Some(registration_date) = self.registration_date {
            draft.registration_date = Some(registration_date);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnterpriseFilter {
    pub is_active: Option<bool>,
}

/// Create, read, update, delete and list for enterprises.
#[derive(Clone)]
pub struct EnterpriseService {
    db: Arc<DbPool>,
}

impl EnterpriseService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        input: CreateEnterpriseInput,
    ) -> Result<enterprise::Model, ServiceError> {
        input.ensure_valid()?;

        let model = input
            .into_record()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;

        counter!("farm_records.created", 1, "entity" => KIND.table_name());
        info!(enterprise_id = model.id, "Enterprise created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<enterprise::Model, ServiceError> {
        enterprise::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateEnterpriseInput,
    ) -> Result<enterprise::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<enterprise::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateEnterpriseInput::from(&existing);
        patch.apply(&mut draft);
        draft.ensure_valid()?;

        let mut record = draft.into_record();
        record.id = ActiveValue::Unchanged(id);
        let updated = record
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(KIND, e))?;
        txn.commit().await?;

        info!(enterprise_id = id, "Enterprise updated");
        Ok(updated)
    }

    /// Deletes the enterprise with its fields, employees and everything under those fields.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<enterprise::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        cascade::delete_enterprise(&txn, id, &mut report).await?;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(enterprise_id = id, removed = report.total(), "Enterprise deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: EnterpriseFilter,
        query: &ListQuery,
    ) -> Result<Paginated<enterprise::Model>, ServiceError> {
        let mut select = enterprise::Entity::find();
        if let Some(is_active) = filter.is_active {
            select = select.filter(enterprise::Column::IsActive.eq(is_active));
        }

        fetch_page(select, enterprise::Column::Id, self.db.as_ref(), query).await
    }
}
