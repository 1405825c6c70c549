use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A yield collection from one planting.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "harvests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub planting_id: i32,
    pub harvest_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub yield_kg: Decimal,
    pub quality_grade: Option<String>,
    pub storage_location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub is_certified: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::planting::Entity",
        from = "Column::PlantingId",
        to = "super::planting::Column::Id",
        on_delete = "Cascade"
    )]
    Planting,
}

impl Related<super::planting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Planting.def()
    }
}

impl ActiveModel {
    pub fn with_defaults(mut self, now: DateTime<Utc>) -> Self {
        if let ActiveValue::NotSet = self.is_certified {
            self.is_certified = Set(false);
        }
        if let ActiveValue::NotSet = self.recorded_at {
            self.recorded_at = Set(now);
        }
        self
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            return Ok(self.with_defaults(Utc::now()));
        }
        Ok(self)
    }
}
