//! Column-level and row-level checks applied before any write.
//!
//! The database carries the same CHECK and FOREIGN KEY constraints; checking
//! here first turns violations into typed errors naming the entity and column.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::Validate;

use crate::entities::RecordKind;
use crate::errors::ServiceError;

/// A complete, writable record draft for one entity type.
pub trait Constrained: Validate {
    const KIND: RecordKind;

    /// Required-field, numeric-bound and date-order checks.
    fn check_constraints(&self) -> Result<(), ServiceError>;

    /// Runs every check; the first failure wins.
    fn ensure_valid(&self) -> Result<(), ServiceError> {
        self.check_constraints()?;
        self.validate()
            .map_err(|e| ServiceError::from_validation(Self::KIND, e))
    }
}

/// Empty or whitespace-only text counts as absent.
pub fn required_text(
    entity: RecordKind,
    field: &'static str,
    value: &str,
) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::MissingRequiredField { entity, field });
    }
    Ok(())
}

pub fn positive(entity: RecordKind, field: &'static str, value: Decimal) -> Result<(), ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::constraint(
            entity,
            field,
            format!("must be greater than 0 (got {value})"),
        ));
    }
    Ok(())
}

pub fn non_negative(
    entity: RecordKind,
    field: &'static str,
    value: Option<Decimal>,
) -> Result<(), ServiceError> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(ServiceError::constraint(
            entity,
            field,
            format!("must not be negative (got {v})"),
        )),
        _ => Ok(()),
    }
}

pub fn positive_when_present(
    entity: RecordKind,
    field: &'static str,
    value: Option<i32>,
) -> Result<(), ServiceError> {
    match value {
        Some(v) if v <= 0 => Err(ServiceError::constraint(
            entity,
            field,
            format!("must be greater than 0 when set (got {v})"),
        )),
        _ => Ok(()),
    }
}

/// Precision and scale of a `decimal(p, s)` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalColumn {
    pub precision: u32,
    pub scale: u32,
}

pub const DECIMAL_10_2: DecimalColumn = DecimalColumn::new(10, 2);
pub const DECIMAL_12_2: DecimalColumn = DecimalColumn::new(12, 2);

impl DecimalColumn {
    pub const fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    /// True when `value` is stored without rounding or overflow.
    pub fn holds(&self, value: Decimal) -> bool {
        if value.normalize().scale() > self.scale {
            return false;
        }
        let integer_digits = self.precision.saturating_sub(self.scale);
        match 10u64.checked_pow(integer_digits) {
            Some(bound) => value.abs().trunc() < Decimal::from(bound),
            None => true,
        }
    }
}

/// `value`, when present, must fit its `decimal(p, s)` column.
pub fn fits_column(
    entity: RecordKind,
    field: &'static str,
    value: Option<Decimal>,
    column: DecimalColumn,
) -> Result<(), ServiceError> {
    match value {
        Some(v) if !column.holds(v) => Err(ServiceError::constraint(
            entity,
            field,
            format!(
                "{v} does not fit decimal({}, {})",
                column.precision, column.scale
            ),
        )),
        _ => Ok(()),
    }
}

/// `later`, when present, must fall strictly after `earlier`.
pub fn strictly_after(
    entity: RecordKind,
    field: &'static str,
    later: Option<NaiveDate>,
    earlier_field: &'static str,
    earlier: NaiveDate,
) -> Result<(), ServiceError> {
    match later {
        Some(date) if date <= earlier => Err(ServiceError::constraint(
            entity,
            field,
            format!("{date} must be after {earlier_field} {earlier}"),
        )),
        _ => Ok(()),
    }
}

/// Nullable text columns store NULL rather than an empty string.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_required_text_is_missing() {
        assert_matches!(
            required_text(RecordKind::Crop, "name", "   "),
            Err(ServiceError::MissingRequiredField {
                entity: RecordKind::Crop,
                field: "name"
            })
        );
        assert!(required_text(RecordKind::Crop, "name", "Maize").is_ok());
    }

    #[test]
    fn positive_rejects_zero_and_negatives() {
        assert!(positive(RecordKind::Field, "area_hectares", dec!(0.01)).is_ok());
        assert_matches!(
            positive(RecordKind::Field, "area_hectares", Decimal::ZERO),
            Err(ServiceError::ConstraintViolation { field: "area_hectares", .. })
        );
        assert!(positive(RecordKind::Harvest, "yield_kg", dec!(-5)).is_err());
    }

    #[test]
    fn non_negative_allows_zero_and_absent() {
        assert!(non_negative(RecordKind::FieldOperation, "cost", None).is_ok());
        assert!(non_negative(RecordKind::FieldOperation, "cost", Some(Decimal::ZERO)).is_ok());
        assert!(non_negative(RecordKind::FieldOperation, "cost", Some(dec!(-0.01))).is_err());
    }

    #[test]
    fn season_length_must_be_positive_when_set() {
        assert!(positive_when_present(RecordKind::Crop, "growing_season_days", None).is_ok());
        assert!(positive_when_present(RecordKind::Crop, "growing_season_days", Some(90)).is_ok());
        assert!(positive_when_present(RecordKind::Crop, "growing_season_days", Some(0)).is_err());
    }

    #[test]
    fn equal_dates_are_not_strictly_after() {
        let planted = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let check = |later| {
            strictly_after(
                RecordKind::Planting,
                "expected_harvest_date",
                later,
                "planting_date",
                planted,
            )
        };

        assert!(check(None).is_ok());
        assert!(check(NaiveDate::from_ymd_opt(2024, 1, 2)).is_ok());
        assert!(check(Some(planted)).is_err());
        assert!(check(NaiveDate::from_ymd_opt(2023, 12, 31)).is_err());
    }

    #[test]
    fn decimal_columns_bound_scale_and_integer_digits() {
        assert!(DECIMAL_10_2.holds(dec!(12345678.99)));
        assert!(DECIMAL_10_2.holds(dec!(-12345678.99)));
        assert!(DECIMAL_10_2.holds(dec!(25.500)));
        assert!(!DECIMAL_10_2.holds(dec!(100000000)));
        assert!(!DECIMAL_10_2.holds(dec!(0.001)));
        assert!(DECIMAL_12_2.holds(dec!(9999999999.99)));
        assert!(!DECIMAL_12_2.holds(dec!(10000000000)));
    }

    #[test]
    fn oversized_decimal_names_the_column() {
        assert!(fits_column(RecordKind::Harvest, "yield_kg", None, DECIMAL_12_2).is_ok());
        match fits_column(RecordKind::Field, "area_hectares", Some(dec!(10.005)), DECIMAL_10_2) {
            Err(ServiceError::ConstraintViolation { field, message, .. }) => {
                assert_eq!(field, "area_hectares");
                assert!(message.contains("decimal(10, 2)"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_optional_text_becomes_null() {
        assert_eq!(blank_to_none(Some(" ".into())), None);
        assert_eq!(blank_to_none(Some("loam".into())), Some("loam".into()));
        assert_eq!(blank_to_none(None), None);
    }
}
