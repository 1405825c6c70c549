//! Record services, one per table, sharing a single connection pool.

pub mod cascade;
pub mod constraints;
pub mod crops;
pub mod employees;
pub mod enterprises;
pub mod field_operations;
pub mod fields;
pub mod harvests;
pub mod plantings;
pub mod summary;

use std::sync::Arc;

use metrics::counter;
use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, IntoSimpleExpr, PaginatorTrait, QueryOrder,
    Select, TransactionTrait,
};
use serde::{Deserialize, Deserializer};
use tracing::{info, instrument, warn};

use crate::db::DbPool;
use crate::entities::RecordKind;
use crate::errors::ServiceError;
use crate::{ListQuery, Paginated};

use cascade::CascadeReport;
use crops::CropService;
use employees::EmployeeService;
use enterprises::EnterpriseService;
use field_operations::FieldOperationService;
use fields::FieldService;
use harvests::HarvestService;
use plantings::PlantingService;
use summary::RecordsSummary;

/// Distinguishes an absent patch field from an explicit `null`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Orders by `order_col` and returns the requested page plus totals.
///
/// A page beyond the last row comes back empty with the totals filled in.
pub(crate) async fn fetch_page<E, C, O>(
    select: Select<E>,
    order_col: O,
    db: &C,
    query: &ListQuery,
) -> Result<Paginated<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync + 'static,
    C: ConnectionTrait,
    O: IntoSimpleExpr,
{
    let page = query.page();
    let limit = query.limit();

    let paginator = select
        .order_by(order_col, query.sort_order.into())
        .paginate(db, limit);
    let totals = paginator.num_items_and_pages().await?;
    // A page past the last row, or with an offset beyond u64, is empty.
    let items = match query.offset() {
        Some(offset) if offset < totals.number_of_items => paginator.fetch_page(page - 1).await?,
        _ => Vec::new(),
    };

    Ok(Paginated {
        items,
        total: totals.number_of_items,
        page,
        limit,
        total_pages: totals.number_of_pages,
    })
}

/// Entry point bundling every record service around one pool.
#[derive(Clone)]
pub struct FarmRecords {
    db: Arc<DbPool>,
    pub enterprises: EnterpriseService,
    pub fields: FieldService,
    pub crops: CropService,
    pub plantings: PlantingService,
    pub harvests: HarvestService,
    pub field_operations: FieldOperationService,
    pub employees: EmployeeService,
}

impl FarmRecords {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            enterprises: EnterpriseService::new(db.clone()),
            fields: FieldService::new(db.clone()),
            crops: CropService::new(db.clone()),
            plantings: PlantingService::new(db.clone()),
            harvests: HarvestService::new(db.clone()),
            field_operations: FieldOperationService::new(db.clone()),
            employees: EmployeeService::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &Arc<DbPool> {
        &self.db
    }

    pub async fn summary(&self) -> Result<RecordsSummary, ServiceError> {
        summary::summarize(self.db.as_ref()).await
    }

    /// Deletes any record by kind, cascading per the ownership graph.
    pub async fn delete(&self, kind: RecordKind, id: i32) -> Result<CascadeReport, ServiceError> {
        match kind {
            RecordKind::Enterprise => self.enterprises.delete(id).await,
            RecordKind::Field => self.fields.delete(id).await,
            RecordKind::Crop => self.crops.delete(id).await,
            RecordKind::Planting => self.plantings.delete(id).await,
            RecordKind::Harvest => self.harvests.delete(id).await,
            RecordKind::FieldOperation => self.field_operations.delete(id).await,
            RecordKind::Employee => self.employees.delete(id).await,
        }
    }

    /// Rows a cascade delete of `kind` `id` would also remove. Nothing is deleted.
    #[instrument(skip(self))]
    pub async fn dependents(&self, kind: RecordKind, id: i32) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_row(&txn, kind, id).await?;
        let dependents = cascade::count_dependents(&txn, kind, id).await?;
        txn.commit().await?;
        Ok(dependents)
    }

    /// Deletes `kind` `id` only when no other row depends on it.
    ///
    /// Otherwise fails with `ReferentialIntegrityViolation` listing the
    /// dependent rows per table, and nothing is removed.
    #[instrument(skip(self))]
    pub async fn delete_restricted(
        &self,
        kind: RecordKind,
        id: i32,
    ) -> Result<CascadeReport, ServiceError> {
        let txn = self.db.begin().await?;
        cascade::lock_row(&txn, kind, id).await?;

        let dependents = cascade::count_dependents(&txn, kind, id).await?;
        if dependents.total() > 0 {
            warn!(%kind, id, dependents = dependents.total(), "Restricted delete refused");
            return Err(ServiceError::ReferentialIntegrityViolation {
                entity: kind,
                message: format!("{kind} {id} still has dependents: {}", dependents.describe()),
            });
        }

        let mut report = CascadeReport::default();
        report.add(kind, cascade::delete_row(&txn, kind, id).await?);
        txn.commit().await?;

        counter!("farm_records.deleted", report.total(), "entity" => kind.table_name());
        info!(%kind, id, "Record deleted without cascade");
        Ok(report)
    }
}
