//! Farm Records
//!
//! Relational record store for agricultural enterprises: fields, crops,
//! plantings, harvests, field operations and staff, with constraint checking,
//! cascade deletes and an idempotent seed fixture set.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod seed;
pub mod services;

use sea_orm::Order;
use serde::{Deserialize, Serialize};

/// Upper bound on `ListQuery::limit`.
pub const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

// Common query parameters for list operations
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub sort_order: SortDirection,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            sort_order: SortDirection::Asc,
        }
    }
}

impl ListQuery {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    pub fn descending(mut self) -> Self {
        self.sort_order = SortDirection::Desc;
        self
    }

    /// 1-based page; 0 is treated as the first page.
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows skipped before the requested page; `None` when it does not fit in a `u64`.
    pub fn offset(&self) -> Option<u64> {
        (self.page() - 1).checked_mul(self.limit())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

pub mod prelude {
    pub use crate::entities::RecordKind;
    pub use crate::errors::ServiceError;
    pub use crate::services::cascade::CascadeReport;
    pub use crate::services::crops::{CreateCropInput, CropFilter, UpdateCropInput};
    pub use crate::services::employees::{
        CreateEmployeeInput, EmployeeFilter, UpdateEmployeeInput,
    };
    pub use crate::services::enterprises::{
        CreateEnterpriseInput, EnterpriseFilter, UpdateEnterpriseInput,
    };
    pub use crate::services::field_operations::{
        CreateFieldOperationInput, FieldOperationFilter, UpdateFieldOperationInput,
    };
    pub use crate::services::fields::{CreateFieldInput, FieldFilter, UpdateFieldInput};
    pub use crate::services::harvests::{CreateHarvestInput, HarvestFilter, UpdateHarvestInput};
    pub use crate::services::plantings::{
        CreatePlantingInput, PlantingFilter, UpdatePlantingInput,
    };
    pub use crate::services::summary::RecordsSummary;
    pub use crate::services::FarmRecords;
    pub use crate::{ListQuery, Paginated, SortDirection};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_and_clamps() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 20);
        assert_eq!(query.sort_order, SortDirection::Asc);

        let query = ListQuery::new(0, 10_000).descending();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(Order::from(query.sort_order), Order::Desc);

        assert_eq!(ListQuery::new(3, 0).limit(), 1);
    }

    #[test]
    fn offset_is_checked() {
        assert_eq!(ListQuery::new(1, 20).offset(), Some(0));
        assert_eq!(ListQuery::new(3, 20).offset(), Some(40));
        assert_eq!(ListQuery::new(u64::MAX, 20).offset(), None);
        assert_eq!(ListQuery::new(u64::MAX, 1).offset(), Some(u64::MAX - 1));
    }
}
