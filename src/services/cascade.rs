//! Ownership-graph traversal for deletes.
//!
//! Every delete runs in one transaction: the target row is locked, dependents
//! are removed bottom-up, then the target itself. The schema's ON DELETE
//! CASCADE foreign keys also catch dependents committed by a concurrent
//! writer after the traversal read its id lists.
//!
//! `count_dependents` walks the same graph without deleting, for previews and
//! restricted deletes.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
    QuerySelect,
};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::entities::{
    crop, employee, enterprise, field, field_operation, harvest, planting, RecordKind,
};
use crate::errors::ServiceError;

/// Rows removed by one delete, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub enterprises: u64,
    pub fields: u64,
    pub crops: u64,
    pub plantings: u64,
    pub harvests: u64,
    pub field_operations: u64,
    pub employees: u64,
}

impl CascadeReport {
    pub fn count(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::Enterprise => self.enterprises,
            RecordKind::Field => self.fields,
            RecordKind::Crop => self.crops,
            RecordKind::Planting => self.plantings,
            RecordKind::Harvest => self.harvests,
            RecordKind::FieldOperation => self.field_operations,
            RecordKind::Employee => self.employees,
        }
    }

    pub(crate) fn add(&mut self, kind: RecordKind, rows: u64) {
        let slot = match kind {
            RecordKind::Enterprise => &mut self.enterprises,
            RecordKind::Field => &mut self.fields,
            RecordKind::Crop => &mut self.crops,
            RecordKind::Planting => &mut self.plantings,
            RecordKind::Harvest => &mut self.harvests,
            RecordKind::FieldOperation => &mut self.field_operations,
            RecordKind::Employee => &mut self.employees,
        };
        *slot += rows;
    }

    /// Non-zero counts in `RecordKind` order.
    pub fn tables(&self) -> impl Iterator<Item = (RecordKind, u64)> + '_ {
        RecordKind::iter()
            .map(|kind| (kind, self.count(kind)))
            .filter(|(_, rows)| *rows > 0)
    }

    /// e.g. `plantings 1, field_operations 2`
    pub fn describe(&self) -> String {
        self.tables()
            .map(|(kind, rows)| format!("{} {rows}", kind.table_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn total(&self) -> u64 {
        self.enterprises
            + self.fields
            + self.crops
            + self.plantings
            + self.harvests
            + self.field_operations
            + self.employees
    }
}

/// Fails with `ReferentialIntegrityViolation` unless the parent row exists.
///
/// Takes a shared lock on the parent so a concurrent cascade delete cannot
/// remove it before the dependent row commits.
pub(crate) async fn require_parent<E, C>(
    conn: &C,
    entity: RecordKind,
    parent: RecordKind,
    id: i32,
) -> Result<(), ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let found = E::find_by_id(id).lock_shared().one(conn).await?;
    if found.is_none() {
        return Err(ServiceError::missing_parent(entity, parent, id));
    }
    Ok(())
}

/// Loads a row for update or delete, holding an exclusive lock on it.
pub(crate) async fn lock_existing<E, C>(
    conn: &C,
    entity: RecordKind,
    id: i32,
) -> Result<E::Model, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(entity, id))
}

/// Exclusive-locks the row of any record kind; `NotFound` when it is absent.
pub(crate) async fn lock_row<C: ConnectionTrait>(
    conn: &C,
    kind: RecordKind,
    id: i32,
) -> Result<(), ServiceError> {
    match kind {
        RecordKind::Enterprise => {
            lock_existing::<enterprise::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::Field => {
            lock_existing::<field::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::Crop => {
            lock_existing::<crop::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::Planting => {
            lock_existing::<planting::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::Harvest => {
            lock_existing::<harvest::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::FieldOperation => {
            lock_existing::<field_operation::Entity, _>(conn, kind, id).await?;
        }
        RecordKind::Employee => {
            lock_existing::<employee::Entity, _>(conn, kind, id).await?;
        }
    }
    Ok(())
}

/// Deletes the single row, leaving dependents to the caller.
pub(crate) async fn delete_row<C: ConnectionTrait>(
    conn: &C,
    kind: RecordKind,
    id: i32,
) -> Result<u64, ServiceError> {
    let result = match kind {
        RecordKind::Enterprise => enterprise::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::Field => field::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::Crop => crop::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::Planting => planting::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::Harvest => harvest::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::FieldOperation => field_operation::Entity::delete_by_id(id).exec(conn).await,
        RecordKind::Employee => employee::Entity::delete_by_id(id).exec(conn).await,
    };
    Ok(result.map_err(|e| ServiceError::db_error(kind, e))?.rows_affected)
}

/// Rows a cascade delete of `kind` `id` would remove, not counting the row itself.
pub(crate) async fn count_dependents<C: ConnectionTrait>(
    conn: &C,
    kind: RecordKind,
    id: i32,
) -> Result<CascadeReport, ServiceError> {
    let mut report = CascadeReport::default();
    match kind {
        RecordKind::Enterprise => {
            let field_ids = fields_of_enterprise(conn, id).await?;
            report.fields = field_ids.len() as u64;
            count_field_dependents(conn, &field_ids, &mut report).await?;
            report.employees = employee::Entity::find()
                .filter(employee::Column::EnterpriseId.eq(id))
                .count(conn)
                .await?;
        }
        RecordKind::Field => count_field_dependents(conn, &[id], &mut report).await?,
        RecordKind::Crop => {
            let planting_ids = plantings_under(conn, planting::Column::CropId, &[id]).await?;
            report.plantings = planting_ids.len() as u64;
            report.harvests = count_harvests(conn, &planting_ids).await?;
        }
        RecordKind::Planting => report.harvests = count_harvests(conn, &[id]).await?,
        RecordKind::Harvest | RecordKind::FieldOperation | RecordKind::Employee => {}
    }
    Ok(report)
}

async fn count_field_dependents<C: ConnectionTrait>(
    conn: &C,
    field_ids: &[i32],
    report: &mut CascadeReport,
) -> Result<(), ServiceError> {
    if field_ids.is_empty() {
        return Ok(());
    }
    let planting_ids = plantings_under(conn, planting::Column::FieldId, field_ids).await?;
    report.plantings += planting_ids.len() as u64;
    report.harvests += count_harvests(conn, &planting_ids).await?;
    report.field_operations += field_operation::Entity::find()
        .filter(field_operation::Column::FieldId.is_in(field_ids.iter().copied()))
        .count(conn)
        .await?;
    Ok(())
}

async fn count_harvests<C: ConnectionTrait>(
    conn: &C,
    planting_ids: &[i32],
) -> Result<u64, ServiceError> {
    if planting_ids.is_empty() {
        return Ok(0);
    }
    Ok(harvest::Entity::find()
        .filter(harvest::Column::PlantingId.is_in(planting_ids.iter().copied()))
        .count(conn)
        .await?)
}

async fn fields_of_enterprise<C: ConnectionTrait>(
    conn: &C,
    enterprise_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    Ok(field::Entity::find()
        .select_only()
        .column(field::Column::Id)
        .filter(field::Column::EnterpriseId.eq(enterprise_id))
        .into_tuple()
        .all(conn)
        .await?)
}

/// Ids of plantings whose `parent_column` is one of `parents`.
async fn plantings_under<C: ConnectionTrait>(
    conn: &C,
    parent_column: planting::Column,
    parents: &[i32],
) -> Result<Vec<i32>, ServiceError> {
    Ok(planting::Entity::find()
        .select_only()
        .column(planting::Column::Id)
        .filter(parent_column.is_in(parents.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?)
}

pub(crate) async fn delete_enterprise<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    report: &mut CascadeReport,
) -> Result<(), ServiceError> {
    let field_ids = fields_of_enterprise(conn, id).await?;
    delete_fields(conn, &field_ids, report).await?;

    report.employees += employee::Entity::delete_many()
        .filter(employee::Column::EnterpriseId.eq(id))
        .exec(conn)
        .await?
        .rows_affected;

    report.enterprises += enterprise::Entity::delete_by_id(id)
        .exec(conn)
        .await?
        .rows_affected;
    Ok(())
}

pub(crate) async fn delete_crop<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    report: &mut CascadeReport,
) -> Result<(), ServiceError> {
    let planting_ids = plantings_under(conn, planting::Column::CropId, &[id]).await?;
    delete_plantings(conn, &planting_ids, report).await?;

    report.crops += crop::Entity::delete_by_id(id)
        .exec(conn)
        .await?
        .rows_affected;
    Ok(())
}

pub(crate) async fn delete_fields<C: ConnectionTrait>(
    conn: &C,
    field_ids: &[i32],
    report: &mut CascadeReport,
) -> Result<(), ServiceError> {
    if field_ids.is_empty() {
        return Ok(());
    }

    let planting_ids = plantings_under(conn, planting::Column::FieldId, field_ids).await?;
    delete_plantings(conn, &planting_ids, report).await?;

    report.field_operations += field_operation::Entity::delete_many()
        .filter(field_operation::Column::FieldId.is_in(field_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;

    report.fields += field::Entity::delete_many()
        .filter(field::Column::Id.is_in(field_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(())
}

pub(crate) async fn delete_plantings<C: ConnectionTrait>(
    conn: &C,
    planting_ids: &[i32],
    report: &mut CascadeReport,
) -> Result<(), ServiceError> {
    if planting_ids.is_empty() {
        return Ok(());
    }

    report.harvests += harvest::Entity::delete_many()
        .filter(harvest::Column::PlantingId.is_in(planting_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;

    report.plantings += planting::Entity::delete_many()
        .filter(planting::Column::Id.is_in(planting_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_every_table() {
        let report = CascadeReport {
            enterprises: 1,
            fields: 2,
            plantings: 3,
            harvests: 2,
            field_operations: 4,
            employees: 2,
            ..Default::default()
        };

        let by_kind: u64 = RecordKind::iter().map(|k| report.count(k)).sum();
        assert_eq!(report.total(), 14);
        assert_eq!(by_kind, report.total());
    }

    #[test]
    fn describe_lists_non_empty_tables_in_kind_order() {
        let mut report = CascadeReport::default();
        report.add(RecordKind::FieldOperation, 2);
        report.add(RecordKind::Planting, 1);
        report.add(RecordKind::Planting, 1);

        assert_eq!(report.describe(), "plantings 2, field_operations 2");
        assert_eq!(report.tables().count(), 2);
        assert_eq!(CascadeReport::default().describe(), "");
    }
}
