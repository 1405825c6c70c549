use std::sync::Arc;

use chrono::NaiveDate;
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
use crate::entities::{employee, enterprise, RecordKind};
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

const KIND: RecordKind = RecordKind::Employee;

/// A complete employee record as written to the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployeeInput {
    pub enterprise_id: i32,
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    pub hire_date: NaiveDate,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl CreateEmployeeInput {
    pub fn new(
        enterprise_id: i32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        hire_date: NaiveDate,
    ) -> Self {
        Self {
            enterprise_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            position: None,
            phone: None,
            email: None,
            hire_date,
            is_active: None,
            notes: None,
        }
    }

    pub(crate) fn into_record(self) -> employee::ActiveModel {
        employee::ActiveModel {
            enterprise_id: Set(self.enterprise_id),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            position: Set(blank_to_none(self.position)),
            phone: Set(blank_to_none(self.phone)),
            email: Set(blank_to_none(self.email)),
            hire_date: Set(self.hire_date),
            is_active: self.is_active.map(Set).unwrap_or_default(),
            notes: Set(blank_to_none(self.notes)),
            ..Default::default()
        }
    }
}

impl Constrained for CreateEmployeeInput {
    const KIND: RecordKind = KIND;

    fn check_constraints(&self) -> Result<(), ServiceError> {
        required_text(KIND, "first_name", &self.first_name)?;
        required_text(KIND, "last_name", &self.last_name)
    }
}

impl From<&employee::Model> for CreateEmployeeInput {
    fn from(model: &employee::Model) -> Self {
        Self {
            enterprise_id: model.enterprise_id,
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            position: model.position.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            hire_date: model.hire_date,
            is_active: Some(model.is_active),
            notes: model.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployeeInput {
    pub enterprise_id: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub email: Option<Option<String>>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl UpdateEmployeeInput {
    fn apply(self, draft: &mut CreateEmployeeInput) {
        if let Some(enterprise_id) = self.enterprise_id {
            draft.enterprise_id = enterprise_id;
        }
        if let Some(first_name) = self.first_name {
            draft.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            draft.last_name = last_name;
        }
        if let Some(position) = self.position {
            draft.position = position;
        }
        if let Some(phone) = self.phone {
            draft.phone = phone;
        }
        if let Some(email) = self.email {
            draft.email = email;
        }
        if let Some(hire_date) = self.hire_date {
            draft.hire_date = hire_date;
        }
        if let Some(is_active) = self.is_active {
            draft.is_active = Some(is_active);
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub enterprise_id: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<DbPool>,
}

impl EmployeeService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(enterprise_id = input.enterprise_id))]
    pub async fn create(
        &self,
        input: CreateEmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
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
        info!(employee_id = model.id, "Employee created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(KIND, id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: UpdateEmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = cascade::lock_existing::<employee::Entity, _>(&txn, KIND, id).await?;

        let mut draft = CreateEmployeeInput::from(&existing);
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

        info!(employee_id = id, "Employee updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_existing::<employee::Entity, _>(&txn, KIND, id).await?;

        let mut report = CascadeReport::default();
        report.employees += employee::Entity::delete_by_id(id)
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => KIND.table_name());
        info!(employee_id = id, "Employee deleted");
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: EmployeeFilter,
        query: &ListQuery,
    ) -> Result<Paginated<employee::Model>, ServiceError> {
        let mut select = employee::Entity::find();
        if let Some(enterprise_id) = filter.enterprise_id {
            select = select.filter(employee::Column::EnterpriseId.eq(enterprise_id));
        }
        if let Some(is_active) = filter.is_active {
            select = select.filter(employee::Column::IsActive.eq(is_active));
        }

        fetch_page(select, employee::Column::Id, self.db.as_ref(), query).await
    }
}
