//! SQL identifier rules shared by table and field names.

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Why a name is not a usable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierProblem {
    Empty,
    TooLong,
    LeadingDigit,
    InvalidCharacter(char),
}

impl std::fmt::Display for IdentifierProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierProblem::Empty => write!(f, "must not be empty"),
            IdentifierProblem::TooLong => {
                write!(f, "must be at most {} characters", MAX_IDENTIFIER_LEN)
            }
            IdentifierProblem::LeadingDigit => write!(f, "must not start with a digit"),
            IdentifierProblem::InvalidCharacter(c) => write!(
                f,
                "contains '{}'; only letters, digits and underscores are allowed",
                c
            ),
        }
    }
}

/// Check a table or column name: ASCII letters, digits and `_`, not starting
/// with a digit.
pub fn check_identifier(name: &str) -> Result<(), IdentifierProblem> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(IdentifierProblem::Empty)?;
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierProblem::TooLong);
    }
    if first.is_ascii_digit() {
        return Err(IdentifierProblem::LeadingDigit);
    }
    if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(IdentifierProblem::InvalidCharacter(bad));
    }
    Ok(())
}

/// Name of the `updated_at` trigger created for `table`.
pub fn trigger_name(table: &str) -> String {
    format!("update_{table}_updated_at")
}

/// Name of the index created for an indexed field.
pub fn index_name(table: &str, column: &str) -> String {
    format!("idx_{table}_{column}")
}

pub fn is_valid_identifier(name: &str) -> bool {
    check_identifier(name).is_ok()
}

/// `maintenance_checks` -> `MaintenanceChecks`
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// `maintenance_checks` -> `maintenanceChecks`
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["valid_name_1", "_private", "Inspections", "a"] {
            assert!(is_valid_identifier(name), "should accept {name}");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(check_identifier("1invalid"), Err(IdentifierProblem::LeadingDigit));
        assert_eq!(
            check_identifier("has-dash"),
            Err(IdentifierProblem::InvalidCharacter('-'))
        );
        assert_eq!(
            check_identifier("has space"),
            Err(IdentifierProblem::InvalidCharacter(' '))
        );
        assert_eq!(check_identifier(""), Err(IdentifierProblem::Empty));
        assert_eq!(check_identifier(&"x".repeat(64)), Err(IdentifierProblem::TooLong));
        assert!(!is_valid_identifier("naïve"));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_pascal_case("maintenance_checks"), "MaintenanceChecks");
        assert_eq!(to_pascal_case("intake"), "Intake");
        assert_eq!(to_camel_case("maintenance_checks"), "maintenanceChecks");
        assert_eq!(to_pascal_case("form__v2"), "FormV2");
    }
}
