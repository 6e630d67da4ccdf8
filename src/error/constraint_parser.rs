use regex::Regex;
use std::sync::OnceLock;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Constraint names follow `{table}_{column}[_{qualifier}]_{suffix}`; the
/// table and column are resolved against the known schema so multi-word
/// names such as `user_oauth_providers_user_id_fkey` split correctly.
pub struct ConstraintParser;

/// Tables this service owns: (table, entity name, columns).
const KNOWN_TABLES: &[(&str, &str, &[&str])] = &[
    (
        "user_oauth_providers",
        "user_oauth_provider",
        &["user_id", "provider", "created_at"],
    ),
    (
        "users",
        "user",
        &[
            "id",
            "email",
            "username",
            "name",
            "password",
            "picture",
            "confirmed",
            "online_status",
            "default_status",
            "credentials_version",
            "credentials_last_password",
            "credentials_password_updated_at",
            "credentials_updated_at",
        ],
    ),
];

const CONSTRAINT_SUFFIXES: &[&str] = &["_key", "_fkey", "_pkey", "_check", "_idx"];

/// Compiled regex patterns for constraint parsing
struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    relation_name: Regex,
}

fn patterns() -> Option<&'static RegexPatterns> {
    static PATTERNS: OnceLock<Option<RegexPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(RegexPatterns {
                // "Key (field)=(value)" in the DETAIL line
                key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").ok()?,
                column_name: Regex::new(r#"column "([^"]+)""#).ok()?,
                // "table" for foreign keys, "relation" for checks and not-null
                relation_name: Regex::new(r#"(?:table|relation) "([^"]+)""#).ok()?,
            })
        })
        .as_ref()
}

impl ConstraintParser {
    /// Parses a unique violation into (entity, field, value).
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let value = Self::extract_key_value_from_message(message).map(|(_, value)| value);

        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            return Some((entity, field, value.unwrap_or_default()));
        }

        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .map(|table| Self::entity_for_table(&table))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a not-null violation into (entity, field).
    pub fn parse_not_null_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .map(|table| Self::entity_for_table(&table))
            .or_else(|| constraint_name.and_then(Self::parse_constraint_name).map(|(e, _)| e))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a foreign key violation into (entity, field, referenced value).
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let key_value = Self::extract_key_value_from_message(message);

        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = key_value
                .map(|(_, value)| value)
                .unwrap_or_else(|| "invalid_reference".to_string());
            return Some((entity, field, value));
        }

        let (field, value) = key_value?;
        let entity = Self::extract_table_from_message(message)
            .map(|table| Self::entity_for_table(&table))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a check violation into (entity, field).
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        if let Some(parsed) = constraint_name.and_then(Self::parse_constraint_name) {
            return Some(parsed);
        }

        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .map(|table| Self::entity_for_table(&table))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Splits a constraint name into (entity, field).
    ///
    /// - `users_email_key` -> (`user`, `email`)
    /// - `users_email_lowercase_check` -> (`user`, `email`)
    /// - `user_oauth_providers_user_id_fkey` -> (`user_oauth_provider`, `user_id`)
    ///
    /// Unknown tables fall back to splitting on the first underscore.
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let stem = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| constraint_name.strip_suffix(suffix))
            .unwrap_or(constraint_name);

        for (table, entity, columns) in KNOWN_TABLES {
            let Some(rest) = stem
                .strip_prefix(table)
                .and_then(|rest| rest.strip_prefix('_'))
            else {
                continue;
            };
            // Longest column that prefixes the remainder wins
            let field = columns
                .iter()
                .filter(|column| {
                    rest == **column
                        || rest
                            .strip_prefix(**column)
                            .is_some_and(|tail| tail.starts_with('_'))
                })
                .max_by_key(|column| column.len())
                .map(|column| column.to_string())
                .unwrap_or_else(|| rest.to_string());
            return Some((entity.to_string(), field));
        }

        let (table, field) = stem.split_once('_')?;
        if table.is_empty() || field.is_empty() {
            return None;
        }
        Some((table.to_string(), field.to_string()))
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        patterns()?
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        patterns()?
            .relation_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        patterns()?.key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }

    fn entity_for_table(table: &str) -> String {
        KNOWN_TABLES
            .iter()
            .find(|(name, _, _)| *name == table)
            .map(|(_, entity, _)| entity.to_string())
            .unwrap_or_else(|| table.to_string())
    }
}
