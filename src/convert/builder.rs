use std::collections::HashMap;

use thiserror::Error;

use super::{conversions_file::ConversionsFile, lookup_unit, Converter, Unit, UnitType};

/// Builder to create a custom [`Converter`]
///
/// Factors can come from the bundled table, from code or from one or more
/// [`ConversionsFile`]s. Order matters: a factor added later for the same
/// `(from, to)` pair overwrites the one before.
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    factors: HashMap<(Unit, Unit), f64>,
}

impl ConverterBuilder {
    /// New empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the bundled factors to the builder
    pub fn with_bundled(mut self) -> Self {
        self.add_bundled();
        self
    }

    /// Add the bundled factors to the builder
    pub fn add_bundled(&mut self) -> &mut Self {
        for (from, to, factor) in Converter::bundled().factors() {
            self.factors.insert((from, to), factor);
        }
        self
    }

    /// Add a single `(from, to)` factor
    pub fn with_factor(
        mut self,
        from: Unit,
        to: Unit,
        factor: f64,
    ) -> Result<Self, ConverterBuilderError> {
        self.add_factor(from, to, factor)?;
        Ok(self)
    }

    /// Add a single `(from, to)` factor
    ///
    /// The factor has to be a finite positive number and both units have to
    /// share the same [`UnitType`].
    pub fn add_factor(
        &mut self,
        from: Unit,
        to: Unit,
        factor: f64,
    ) -> Result<&mut Self, ConverterBuilderError> {
        check_factor(from, to, factor)?;
        self.factors.insert((from, to), factor);
        Ok(self)
    }

    /// Add a factor and its inverse for the reverse direction
    ///
    /// Nothing is added unless both directions are valid.
    pub fn add_reversible(
        &mut self,
        from: Unit,
        to: Unit,
        factor: f64,
    ) -> Result<&mut Self, ConverterBuilderError> {
        check_factor(from, to, factor)?;
        check_factor(to, from, 1.0 / factor)?;
        self.factors.insert((from, to), factor);
        self.factors.insert((to, from), 1.0 / factor);
        Ok(self)
    }

    /// Add a [`ConversionsFile`] to the builder
    pub fn with_conversions_file(
        mut self,
        file: ConversionsFile,
    ) -> Result<Self, ConverterBuilderError> {
        self.add_conversions_file(file)?;
        Ok(self)
    }

    /// Add a [`ConversionsFile`] to the builder
    ///
    /// Units in the file are looked up strictly: a name that is not a known
    /// unit is an error instead of falling back to [`Unit::None`].
    pub fn add_conversions_file(
        &mut self,
        file: ConversionsFile,
    ) -> Result<&mut Self, ConverterBuilderError> {
        if file.bundled {
            self.add_bundled();
        }
        for entry in file.conversions {
            let from = lookup_unit(&entry.from)
                .ok_or_else(|| ConverterBuilderError::UnknownUnit(entry.from.clone()))?;
            let to = lookup_unit(&entry.to)
                .ok_or_else(|| ConverterBuilderError::UnknownUnit(entry.to.clone()))?;
            if entry.reversible {
                self.add_reversible(from, to, entry.factor)?;
            } else {
                self.add_factor(from, to, entry.factor)?;
            }
        }
        Ok(self)
    }

    /// Consumes the builder and returns the final [`Converter`]
    pub fn finish(self) -> Converter {
        Converter::from_factors(self.factors)
    }
}

fn check_factor(from: Unit, to: Unit, factor: f64) -> Result<(), ConverterBuilderError> {
    if from == to {
        return Err(ConverterBuilderError::SameUnit { unit: from });
    }
    if from.unit_type() != to.unit_type() {
        return Err(ConverterBuilderError::MixedUnitTypes {
            from,
            to,
            from_type: from.unit_type(),
            to_type: to.unit_type(),
        });
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ConverterBuilderError::InvalidFactor { from, to, factor });
    }
    Ok(())
}

/// Errors generated by [`ConverterBuilder`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConverterBuilderError {
    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Conversion from '{unit}' to itself is implicit")]
    SameUnit { unit: Unit },

    #[error("Cannot convert between a {from_type} unit '{from}' and a {to_type} unit '{to}'")]
    MixedUnitTypes {
        from: Unit,
        to: Unit,
        from_type: UnitType,
        to_type: UnitType,
    },

    #[error("Invalid factor from '{from}' to '{to}': {factor}. It has to be finite and positive")]
    InvalidFactor { from: Unit, to: Unit, factor: f64 },
}
