//! Persisted farm records: one sea-orm entity per table.
//!
//! Ownership (cascade-delete direction):
//! enterprise → {field, employee}, field → {planting, field_operation},
//! crop → planting, planting → harvest.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub mod crop;
pub mod employee;
pub mod enterprise;
pub mod field;
pub mod field_operation;
pub mod harvest;
pub mod planting;

/// The seven record types held by the store.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Enterprise,
    Field,
    Crop,
    Planting,
    Harvest,
    FieldOperation,
    Employee,
}

impl RecordKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Enterprise => "enterprises",
            Self::Field => "fields",
            Self::Crop => "crops",
            Self::Planting => "plantings",
            Self::Harvest => "harvests",
            Self::FieldOperation => "field_operations",
            Self::Employee => "employees",
        }
    }

    /// Record types that own this one; empty for roots.
    pub fn owners(&self) -> &'static [RecordKind] {
        match self {
            Self::Enterprise | Self::Crop => &[],
            Self::Field | Self::Employee => &[Self::Enterprise],
            Self::Planting => &[Self::Field, Self::Crop],
            Self::Harvest => &[Self::Planting],
            Self::FieldOperation => &[Self::Field],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn every_owner_precedes_its_dependents_in_declaration_order() {
        let kinds: Vec<RecordKind> = RecordKind::iter().collect();
        for (idx, kind) in kinds.iter().enumerate() {
            for owner in kind.owners() {
                let owner_idx = kinds.iter().position(|k| k == owner).unwrap();
                assert!(owner_idx < idx, "{owner} must be declared before {kind}");
            }
        }
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!(
            RecordKind::from_str("field_operation").unwrap(),
            RecordKind::FieldOperation
        );
        assert_eq!(RecordKind::from_str("Harvest").unwrap(), RecordKind::Harvest);
        assert!(RecordKind::from_str("tractor").is_err());
    }
}
