//! Unit system and **configurable** unit conversion
//!
//! This includes:
//! - The known [`Unit`]s and their [`UnitType`] families.
//! - A lenient parser for free-form unit text, [`parse_unit`].
//! - A sparse table of conversion factors, [`Converter`].
//!
//! The table is keyed by `(from, to)` pairs. It does not need to be symmetric
//! or transitively closed. Asking for a pair that is not in the table is a
//! [`ConversionError`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::quantity::Quantity;

pub use builder::{ConverterBuilder, ConverterBuilderError};
pub use conversions_file::{ConversionEntry, ConversionsFile};
pub use units::{lookup_unit, parse_unit, unit_type_of, Unit, UnitType};

mod builder;
pub mod conversions_file;
mod units;

pub(crate) const GRAMS_PER_KILOGRAM: f64 = 1000.0;
pub(crate) const GRAMS_PER_POUND: f64 = 453.592_37;
pub(crate) const GRAMS_PER_OUNCE: f64 = 28.349_523_125;

pub(crate) const MILLILITERS_PER_LITER: f64 = 1000.0;
pub(crate) const MILLILITERS_PER_GALLON: f64 = 3_785.411_784;
pub(crate) const MILLILITERS_PER_FLUID_OUNCE: f64 = 29.573_529_562_5;
pub(crate) const MILLILITERS_PER_CUP: f64 = 236.588_236_5;
pub(crate) const MILLILITERS_PER_TABLESPOON: f64 = 14.786_764_781_25;
pub(crate) const MILLILITERS_PER_TEASPOON: f64 = 4.928_921_593_75;

/// Weight units with their size in grams. Every pair between them is bundled.
const BUNDLED_WEIGHTS: [(Unit, f64); 4] = [
    (Unit::Grams, 1.0),
    (Unit::Kilograms, GRAMS_PER_KILOGRAM),
    (Unit::Pounds, GRAMS_PER_POUND),
    (Unit::Ounces, GRAMS_PER_OUNCE),
];

/// Volume units with their size in millilitres. Only pairs with millilitres
/// are bundled.
const BUNDLED_VOLUMES: [(Unit, f64); 6] = [
    (Unit::Liters, MILLILITERS_PER_LITER),
    (Unit::Gallons, MILLILITERS_PER_GALLON),
    (Unit::FluidOunces, MILLILITERS_PER_FLUID_OUNCE),
    (Unit::Cups, MILLILITERS_PER_CUP),
    (Unit::Tablespoons, MILLILITERS_PER_TABLESPOON),
    (Unit::Teaspoons, MILLILITERS_PER_TEASPOON),
];

static BUNDLED: Lazy<Converter> = Lazy::new(Converter::bundled);

/// Main struct to perform conversions
///
/// This holds the conversion factors between pairs of units. Converting `value`
/// from `a` to `b` is `value * factor(a, b)`.
///
/// To create a custom one use [`Converter::builder`].
///
/// [`Converter::default`] is [`Converter::bundled`].
#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    factors: HashMap<(Unit, Unit), f64>,
}

impl Converter {
    /// Start to create a new [`Converter`]
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    /// Empty converter
    ///
    /// It can only perform identity conversions.
    pub fn empty() -> Self {
        Self {
            factors: HashMap::new(),
        }
    }

    /// Converter with the bundled conversion factors
    ///
    /// - Every pair between grams, kilograms, pounds and ounces.
    /// - Millilitres to and from litres, gallons, fluid ounces, cups,
    ///   tablespoons and teaspoons.
    ///
    /// Energy is never converted.
    pub fn bundled() -> Self {
        let mut factors = HashMap::new();
        for &(from, from_grams) in &BUNDLED_WEIGHTS {
            for &(to, to_grams) in &BUNDLED_WEIGHTS {
                if from != to {
                    factors.insert((from, to), from_grams / to_grams);
                }
            }
        }
        for &(unit, ml) in &BUNDLED_VOLUMES {
            factors.insert((unit, Unit::Milliliters), ml);
            factors.insert((Unit::Milliliters, unit), 1.0 / ml);
        }
        Self { factors }
    }

    /// Shared instance of [`Converter::bundled`]
    pub fn global() -> &'static Converter {
        &BUNDLED
    }

    pub(crate) fn from_factors(factors: HashMap<(Unit, Unit), f64>) -> Self {
        Self { factors }
    }

    /// Number of `(from, to)` pairs in the table
    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    /// Iterate over all the `(from, to, factor)` entries. No order is
    /// guaranteed.
    pub fn factors(&self) -> impl Iterator<Item = (Unit, Unit, f64)> + '_ {
        self.factors
            .iter()
            .map(|(&(from, to), &factor)| (from, to, factor))
    }

    /// Get the factor to convert from one unit to another
    ///
    /// The identity pair is always `1.0`, even if it is not in the table.
    pub fn factor(&self, from: Unit, to: Unit) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(1.0);
        }
        self.factors
            .get(&(from, to))
            .copied()
            .ok_or(ConversionError { from, to })
    }

    /// Check if a conversion between two units is possible
    pub fn can_convert(&self, from: Unit, to: Unit) -> bool {
        from == to || self.factors.contains_key(&(from, to))
    }

    /// Convert the magnitude of a quantity to another unit
    ///
    /// If the quantity is already in `to`, the magnitude is returned
    /// untouched.
    pub fn convert(&self, quantity: &Quantity, to: Unit) -> Result<f64, ConversionError> {
        self.convert_f64(quantity.magnitude(), quantity.unit(), to)
    }

    /// Convert a raw value between two units
    #[tracing::instrument(level = "trace", skip(self), ret)]
    pub fn convert_f64(&self, value: f64, from: Unit, to: Unit) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(value);
        }
        Ok(value * self.factor(from, to)?)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Convert the magnitude of a quantity with the bundled factors.
///
/// Shorthand for `Converter::global().convert(quantity, to)`.
pub fn convert(quantity: &Quantity, to: Unit) -> Result<f64, ConversionError> {
    Converter::global().convert(quantity, to)
}

/// Error when the conversion table has no factor for a pair of units
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("No conversion from '{from}' to '{to}'")]
pub struct ConversionError {
    pub from: Unit,
    pub to: Unit,
}
