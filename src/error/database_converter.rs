use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// Unique violations become `Duplicate`, which the API renders as 409; this
/// is how concurrent registrations racing past the application checks are
/// reported to callers.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let detailed = match info.details() {
            Some(details) => format!("{message}\nDETAIL: {details}"),
            None => message.to_string(),
        };
        let constraint_name = info.constraint_name();

        let parsed = match kind {
            DatabaseErrorKind::UniqueViolation => {
                ConstraintParser::parse_unique_violation(&detailed, constraint_name).map(
                    |(entity, field, value)| AppError::Duplicate {
                        entity,
                        field,
                        value,
                    },
                )
            }
            DatabaseErrorKind::NotNullViolation => {
                ConstraintParser::parse_not_null_violation(&detailed, constraint_name).map(
                    |(entity, field)| AppError::Validation {
                        field,
                        reason: format!("Field is required for {}", entity),
                    },
                )
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                ConstraintParser::parse_foreign_key_violation(&detailed, constraint_name).map(
                    |(entity, field, referenced_value)| AppError::Validation {
                        field,
                        reason: format!(
                            "Invalid reference to {} with value '{}'",
                            entity, referenced_value
                        ),
                    },
                )
            }
            DatabaseErrorKind::CheckViolation => {
                ConstraintParser::parse_check_violation(&detailed, constraint_name).map(
                    |(entity, field)| AppError::Validation {
                        field,
                        reason: format!("Check constraint failed for {} field", entity),
                    },
                )
            }
            _ => None,
        };

        parsed.unwrap_or_else(|| AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(format!("{:?}: {}", kind, message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        details: Option<String>,
        constraint_name: Option<String>,
    }

    impl DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            self.details.as_deref()
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(
        kind: DatabaseErrorKind,
        message: &str,
        details: Option<&str>,
        constraint: Option<&str>,
    ) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                details: details.map(str::to_string),
                constraint_name: constraint.map(str::to_string),
            }),
        )
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn test_unique_violation_on_email_is_duplicate() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
            Some("Key (email)=(test@example.com) already exists."),
            Some("users_email_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Duplicate {
                entity,
                field,
                value,
            } => {
                assert_eq!(entity, "user");
                assert_eq!(field, "email");
                assert_eq!(value, "test@example.com");
            }
            other => panic!("Expected Duplicate error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_on_username_is_duplicate() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_username_key\"",
            Some("Key (username)=(john-doe) already exists."),
            Some("users_username_key"),
        );
        let result = DatabaseErrorConverter::convert_diesel_error(error, "insert user");
        assert!(result.is_duplicate_of("username"));
    }

    #[test]
    fn test_convert_not_null_violation() {
        let error = db_error(
            DatabaseErrorKind::NotNullViolation,
            "null value in column \"email\" of relation \"users\" violates not-null constraint",
            None,
            None,
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "email");
                assert!(reason.contains("required"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_foreign_key_violation() {
        let error = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "insert or update on table \"user_oauth_providers\" violates foreign key constraint \"user_oauth_providers_user_id_fkey\"",
            Some("Key (user_id)=(999) is not present in table \"users\"."),
            Some("user_oauth_providers_user_id_fkey"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "link provider") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "user_id");
                assert!(reason.contains("999"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_check_violation() {
        let error = db_error(
            DatabaseErrorKind::CheckViolation,
            "new row for relation \"users\" violates check constraint \"users_username_lowercase_check\"",
            None,
            Some("users_username_lowercase_check"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "update user") {
            AppError::Validation { field, .. } => assert_eq!(field, "username"),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_error_is_database_error() {
        let error = db_error(
            DatabaseErrorKind::SerializationFailure,
            "could not serialize access",
            None,
            None,
        );
        let result = DatabaseErrorConverter::convert_diesel_error(error, "update user");
        assert!(matches!(result, AppError::Database { operation, .. } if operation == "update user"));
    }
}
