//! Error types shared across the crate

use thiserror::Error;

use crate::{
    convert::{ConversionError, ConverterBuilderError, Unit, UnitType},
    inventory::NotFoundError,
    nutrition::Macro,
    quantity::QuantityError,
};

/// Malformed input to a constructor or to an ingestion function
///
/// The variants name the offending field or text so the message can be shown
/// as is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid magnitude '{0}': expected a finite number")]
    InvalidMagnitude(String),

    #[error("Unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("Unit '{unit}' is {actual}, but {expected} was given")]
    UnitTypeMismatch {
        unit: Unit,
        expected: UnitType,
        actual: UnitType,
    },

    #[error("Invalid shelf life '{0}'")]
    InvalidShelfLife(String),

    #[error("'{field}' cannot be empty")]
    EmptyCollection { field: &'static str },

    #[error("Missing field '{field}'")]
    MissingField { field: String },

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("An item needs an expiration date or a shelf life")]
    MissingExpiration,

    #[error("Invalid price {0}: expected a finite non-negative number")]
    InvalidPrice(f64),

    #[error("Macro '{macro_kind}' must be {expected}, found '{found}'")]
    MacroUnitType {
        macro_kind: Macro,
        expected: UnitType,
        found: Unit,
    },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("Serving size must be positive, found '{0}'")]
    InvalidServingSize(String),

    #[error("Invalid scale factor {0}: expected a finite positive number")]
    InvalidScaleFactor(f64),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("'{field}' lists '{entry}' more than once")]
    Duplicate { field: String, entry: String },
}

impl ValidationError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
        }
    }
}

/// Any error produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    ConverterBuilder(#[from] ConverterBuilderError),

    #[cfg(feature = "config_files")]
    #[error(transparent)]
    InventoryFile(#[from] crate::inventory::file::InventoryFileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            ValidationError::missing("merchant").to_string(),
            "Missing field 'merchant'"
        );
        assert_eq!(
            ValidationError::wrong_type("items", "a list").to_string(),
            "Field 'items' must be a list"
        );
        assert_eq!(
            ValidationError::EmptyCollection {
                field: "instructions"
            }
            .to_string(),
            "'instructions' cannot be empty"
        );
    }

    #[test]
    fn crate_error_is_transparent() {
        let err: Error = ConversionError {
            from: Unit::Teaspoons,
            to: Unit::Cups,
        }
        .into();
        assert_eq!(err.to_string(), "No conversion from 'tsp' to 'cup'");
        assert!(matches!(err, Error::Conversion(_)));
    }
}
