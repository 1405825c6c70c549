use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::instrument;

use crate::entities::{
    crop, employee, enterprise, field, field_operation, harvest, planting, RecordKind,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub kind: RecordKind,
    pub rows: u64,
}

/// Row counts for every table, in `RecordKind` declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordsSummary {
    pub tables: Vec<TableCount>,
    pub total: u64,
}

impl RecordsSummary {
    pub fn rows(&self, kind: RecordKind) -> u64 {
        self.tables
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.rows)
            .unwrap_or(0)
    }
}

async fn count_rows<C: ConnectionTrait>(db: &C, kind: RecordKind) -> Result<u64, ServiceError> {
    let rows = match kind {
        RecordKind::Enterprise => enterprise::Entity::find().count(db).await?,
        RecordKind::Field => field::Entity::find().count(db).await?,
        RecordKind::Crop => crop::Entity::find().count(db).await?,
        RecordKind::Planting => planting::Entity::find().count(db).await?,
        RecordKind::Harvest => harvest::Entity::find().count(db).await?,
        RecordKind::FieldOperation => field_operation::Entity::find().count(db).await?,
        RecordKind::Employee => employee::Entity::find().count(db).await?,
    };
    Ok(rows)
}

#[instrument(skip(db))]
pub async fn summarize<C: ConnectionTrait>(db: &C) -> Result<RecordsSummary, ServiceError> {
    let mut summary = RecordsSummary::default();
    for kind in RecordKind::iter() {
        let rows = count_rows(db, kind).await?;
        summary.total += rows;
        summary.tables.push(TableCount { kind, rows });
    }
    Ok(summary)
}
