//! Enum types for Tabula entities

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity type discriminator for polymorphic references and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Base,
    Table,
    Column,
    Row,
    Cell,
    View,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Base => "Base",
            EntityType::Table => "Table",
            EntityType::Column => "Column",
            EntityType::Row => "Row",
            EntityType::Cell => "Cell",
            EntityType::View => "View",
        };
        write!(f, "{}", value)
    }
}

// ============================================================================
// COLUMN TYPE
// ============================================================================

/// Data type of a column. Cell values are always stored as strings; the
/// column type constrains which strings are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Number => "NUMBER",
        }
    }

    /// Check that `value` is acceptable for a cell of this column type.
    ///
    /// NUMBER cells accept the empty string (an unset cell) or a finite number.
    pub fn validate_value(&self, value: &str) -> Result<(), ValidationError> {
        match self {
            ColumnType::Text => Ok(()),
            ColumnType::Number => {
                if value.trim().is_empty() || parse_number(value).is_some() {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidValue {
                        field: "value".to_string(),
                        reason: format!("'{}' is not a number", value),
                    })
                }
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = ColumnTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(ColumnType::Text),
            "NUMBER" => Ok(ColumnType::Number),
            _ => Err(ColumnTypeParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid column type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTypeParseError(pub String);

impl fmt::Display for ColumnTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid column type: {}", self.0)
    }
}

impl std::error::Error for ColumnTypeParseError {}

/// Parse a cell value as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

// ============================================================================
// BASE THEME
// ============================================================================

/// Color theme of a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BaseTheme {
    #[default]
    Blue,
    Teal,
    Green,
    Yellow,
    Orange,
    Red,
    Pink,
    Purple,
    Gray,
}

impl fmt::Display for BaseTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            BaseTheme::Blue => "blue",
            BaseTheme::Teal => "teal",
            BaseTheme::Green => "green",
            BaseTheme::Yellow => "yellow",
            BaseTheme::Orange => "orange",
            BaseTheme::Red => "red",
            BaseTheme::Pink => "pink",
            BaseTheme::Purple => "purple",
            BaseTheme::Gray => "gray",
        };
        write!(f, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_column_accepts_numeric_strings() {
        assert!(ColumnType::Number.validate_value("42").is_ok());
        assert!(ColumnType::Number.validate_value(" -3.5 ").is_ok());
        assert!(ColumnType::Number.validate_value("").is_ok());
    }

    #[test]
    fn test_number_column_rejects_text() {
        assert!(ColumnType::Number.validate_value("Alice").is_err());
        assert!(ColumnType::Number.validate_value("NaN").is_err());
        assert!(ColumnType::Number.validate_value("inf").is_err());
    }

    #[test]
    fn test_text_column_accepts_anything() {
        assert!(ColumnType::Text.validate_value("Alice").is_ok());
        assert!(ColumnType::Text.validate_value("").is_ok());
    }

    #[test]
    fn test_column_type_wire_format() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&ColumnType::Number)?, "\"NUMBER\"");
        let parsed: ColumnType = serde_json::from_str("\"TEXT\"")?;
        assert_eq!(parsed, ColumnType::Text);
        Ok(())
    }

    #[test]
    fn test_column_type_from_str_is_case_insensitive() {
        assert_eq!("number".parse::<ColumnType>(), Ok(ColumnType::Number));
        assert!("date".parse::<ColumnType>().is_err());
    }
}
