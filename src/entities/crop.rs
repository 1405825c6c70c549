use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A plant species or variety, shared by every field it is sown on.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "crops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub crop_type: String,
    pub growing_season_days: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_annual: bool,
    pub added_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::planting::Entity")]
    Plantings,
}

impl Related<super::planting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plantings.def()
    }
}

impl ActiveModel {
    pub fn with_defaults(mut self, now: DateTime<Utc>) -> Self {
        if let ActiveValue::NotSet = self.is_annual {
            self.is_annual = Set(true);
        }
        if let ActiveValue::NotSet = self.added_date {
            self.added_date = Set(now);
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
