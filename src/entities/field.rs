use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A land parcel owned by one enterprise.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub enterprise_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub area_hectares: Decimal,
    pub soil_type: Option<String>,
    pub is_irrigated: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enterprise::Entity",
        from = "Column::EnterpriseId",
        to = "super::enterprise::Column::Id",
        on_delete = "Cascade"
    )]
    Enterprise,
    #[sea_orm(has_many = "super::planting::Entity")]
    Plantings,
    #[sea_orm(has_many = "super::field_operation::Entity")]
    FieldOperations,
}

impl Related<super::enterprise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enterprise.def()
    }
}

impl Related<super::planting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plantings.def()
    }
}

impl Related<super::field_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldOperations.def()
    }
}

impl ActiveModel {
    pub fn with_defaults(mut self, now: DateTime<Utc>) -> Self {
        if let ActiveValue::NotSet = self.is_irrigated {
            self.is_irrigated = Set(false);
        }
        if let ActiveValue::NotSet = self.created_at {
            self.created_at = Set(now);
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
