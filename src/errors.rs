use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;

use crate::entities::RecordKind;

/// Failures reported by the records store.
///
/// Every variant names the record type involved so that callers can report
/// the offending entity and column without parsing messages.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("{entity}: missing required field `{field}`")]
    MissingRequiredField {
        entity: RecordKind,
        field: &'static str,
    },

    #[error("{entity}: constraint violated on `{field}`: {message}")]
    ConstraintViolation {
        entity: RecordKind,
        field: &'static str,
        message: String,
    },

    #[error("{entity}: referential integrity violated: {message}")]
    ReferentialIntegrityViolation { entity: RecordKind, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: RecordKind, id: i32 },

    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn not_found(entity: RecordKind, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn constraint(entity: RecordKind, field: &'static str, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            entity,
            field,
            message: message.into(),
        }
    }

    /// A write referenced a parent row that does not exist.
    pub fn missing_parent(entity: RecordKind, parent: RecordKind, id: i32) -> Self {
        Self::ReferentialIntegrityViolation {
            entity,
            message: format!("{parent} {id} does not exist"),
        }
    }

    /// Normalizes driver errors raised while writing `entity`.
    ///
    /// Foreign-key failures become `ReferentialIntegrityViolation`; anything
    /// else stays a `DatabaseError`.
    pub fn db_error(entity: RecordKind, error: DbErr) -> Self {
        match error.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                Self::ReferentialIntegrityViolation { entity, message }
            }
            _ => Self::DatabaseError(error),
        }
    }

    /// Converts validator output into a `ConstraintViolation` on the first
    /// offending column (alphabetical, so the result is deterministic).
    pub fn from_validation(entity: RecordKind, errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&&'static str> = field_errors.keys().collect();
        fields.sort();

        match fields.first() {
            Some(&&field) => {
                let message = field_errors[field]
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Self::constraint(entity, field, message)
            }
            None => Self::InternalError(format!("{entity}: validation failed: {errors}")),
        }
    }

    /// Stable machine-readable code for consumers of the store.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::ReferentialIntegrityViolation { .. } => "referential_integrity_violation",
            Self::NotFound { .. } => "not_found",
            Self::DatabaseError(_) => "database_error",
            Self::MigrationError(_) => "migration_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// True for failures caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. }
                | Self::ConstraintViolation { .. }
                | Self::ReferentialIntegrityViolation { .. }
                | Self::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn messages_name_entity_and_field() {
        let err = ServiceError::constraint(RecordKind::Field, "area_hectares", "must be > 0");
        assert_eq!(
            err.to_string(),
            "field: constraint violated on `area_hectares`: must be > 0"
        );

        let err = ServiceError::not_found(RecordKind::FieldOperation, 42);
        assert_eq!(err.to_string(), "field_operation 42 not found");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn missing_parent_is_a_referential_violation() {
        let err = ServiceError::missing_parent(RecordKind::Harvest, RecordKind::Planting, 9);
        assert_eq!(err.code(), "referential_integrity_violation");
        assert!(err.to_string().contains("planting 9 does not exist"));
        assert!(err.is_client_error());
    }

    #[test]
    fn validation_errors_pick_first_field_alphabetically() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", ValidationError::new("length"));
        errors.add("email", ValidationError::new("length"));

        match ServiceError::from_validation(RecordKind::Enterprise, errors) {
            ServiceError::ConstraintViolation { field, message, .. } => {
                assert_eq!(field, "email");
                assert_eq!(message, "length");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_database_errors_are_not_client_errors() {
        let err = ServiceError::db_error(RecordKind::Crop, DbErr::Custom("boom".into()));
        assert_eq!(err.code(), "database_error");
        assert!(!err.is_client_error());
    }
}
