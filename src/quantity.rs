//! Quantity model

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    convert::{parse_unit, ConversionError, Converter, Unit, UnitType},
    error::ValidationError,
};

/// An amount of something: a magnitude, its unit and the unit's family
///
/// The unit type always agrees with the unit. Quantities are values, every
/// operation returns a new one.
///
/// The [`Display`] implementation rounds the magnitude to 3 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
    unit_type: UnitType,
}

/// Unvalidated form of a [`Quantity`], as found in external records
///
/// The magnitude may be a number or text, the unit is free text and the unit
/// type is optional. The field names `quantity` and `type` are also accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawQuantity {
    #[serde(alias = "quantity")]
    pub magnitude: RawMagnitude,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "type")]
    pub unit_type: Option<String>,
}

/// Magnitude of a [`RawQuantity`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMagnitude {
    Number(f64),
    Text(String),
}

/// Error from quantity arithmetic
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantityError {
    #[error("Incompatible unit types: {left} and {right}")]
    IncompatibleUnitTypes { left: UnitType, right: UnitType },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Quantity),

    #[error("Cannot take {requested}, only {available} available")]
    Insufficient {
        requested: Quantity,
        available: Quantity,
    },
}

/// Parse magnitude text. Surrounding whitespace is ignored and the number has
/// to be finite.
pub fn parse_magnitude_field(text: &str) -> Result<f64, ValidationError> {
    let magnitude = text
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidMagnitude(text.to_string()))?;
    check_magnitude(magnitude)
}

/// Parse unit text. Never fails, see [`parse_unit`].
pub fn parse_unit_field(text: &str) -> Unit {
    parse_unit(text)
}

/// Parse unit type text. Strict, see [`UnitType`].
pub fn parse_unit_type_field(text: &str) -> Result<UnitType, ValidationError> {
    text.parse()
        .map_err(|_| ValidationError::UnknownUnitType(text.to_string()))
}

fn check_magnitude(magnitude: f64) -> Result<f64, ValidationError> {
    if magnitude.is_finite() {
        Ok(magnitude)
    } else {
        Err(ValidationError::InvalidMagnitude(magnitude.to_string()))
    }
}

impl Quantity {
    /// Creates a new quantity, inferring the unit type
    pub fn new(magnitude: f64, unit: Unit) -> Result<Self, ValidationError> {
        Ok(Self {
            magnitude: check_magnitude(magnitude)?,
            unit,
            unit_type: unit.unit_type(),
        })
    }

    /// Creates a new quantity with an explicit unit type
    ///
    /// The type has to agree with the unit.
    pub fn with_type(
        magnitude: f64,
        unit: Unit,
        unit_type: UnitType,
    ) -> Result<Self, ValidationError> {
        if unit.unit_type() != unit_type {
            return Err(ValidationError::UnitTypeMismatch {
                unit,
                expected: unit_type,
                actual: unit.unit_type(),
            });
        }
        Self::new(magnitude, unit)
    }

    /// Creates a quantity from text fields
    ///
    /// The unit text is lenient and the unit type text is strict.
    ///
    /// ```
    /// # use larder::{quantity::Quantity, convert::Unit};
    /// let q = Quantity::parse("1.5", "Pounds", Some("WEIGHT")).unwrap();
    /// assert_eq!(q.unit(), Unit::Pounds);
    /// assert!(Quantity::parse("1.5", "Pounds", Some("VOLUME")).is_err());
    /// ```
    pub fn parse(
        magnitude_text: &str,
        unit_text: &str,
        unit_type_text: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let magnitude = parse_magnitude_field(magnitude_text)?;
        let unit = parse_unit_field(unit_text);
        match unit_type_text {
            Some(text) => Self::with_type(magnitude, unit, parse_unit_type_field(text)?),
            None => Self::new(magnitude, unit),
        }
    }

    /// A zero quantity in the given unit
    pub const fn zero(unit: Unit) -> Self {
        Self {
            magnitude: 0.0,
            unit,
            unit_type: unit.unit_type(),
        }
    }

    /// One of the given unit
    pub const fn one(unit: Unit) -> Self {
        Self {
            magnitude: 1.0,
            unit,
            unit_type: unit.unit_type(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0.0
    }

    fn with_magnitude(&self, magnitude: f64) -> Self {
        Self {
            magnitude,
            ..*self
        }
    }

    fn check_compatible(&self, rhs: &Self) -> Result<(), QuantityError> {
        if self.unit_type != rhs.unit_type {
            return Err(QuantityError::IncompatibleUnitTypes {
                left: self.unit_type,
                right: rhs.unit_type,
            });
        }
        Ok(())
    }

    /// Magnitude of `rhs` expressed in `self`'s unit
    fn rhs_magnitude(&self, rhs: &Self, converter: &Converter) -> Result<f64, QuantityError> {
        self.check_compatible(rhs)?;
        Ok(converter.convert(rhs, self.unit)?)
    }

    /// Adds two quantities
    ///
    /// `rhs` is converted to `self`'s unit, so the result is always in the
    /// unit of the left operand.
    ///
    /// ```
    /// # use larder::{quantity::Quantity, convert::{Converter, Unit}};
    /// let converter = Converter::bundled();
    /// let kg = Quantity::new(1.0, Unit::Kilograms).unwrap();
    /// let g = Quantity::new(500.0, Unit::Grams).unwrap();
    /// assert_eq!(kg.add(&g, &converter).unwrap().to_string(), "1.5 kg");
    /// assert_eq!(g.add(&kg, &converter).unwrap().to_string(), "1500 g");
    /// ```
    pub fn add(&self, rhs: &Self, converter: &Converter) -> Result<Self, QuantityError> {
        let rhs = self.rhs_magnitude(rhs, converter)?;
        Ok(self.with_magnitude(self.magnitude + rhs))
    }

    /// Subtracts `rhs` from `self`. The result is in `self`'s unit.
    pub fn subtract(&self, rhs: &Self, converter: &Converter) -> Result<Self, QuantityError> {
        let rhs = self.rhs_magnitude(rhs, converter)?;
        Ok(self.with_magnitude(self.magnitude - rhs))
    }

    /// Multiplies the magnitudes. The result is in `self`'s unit.
    pub fn multiply(&self, rhs: &Self, converter: &Converter) -> Result<Self, QuantityError> {
        let rhs = self.rhs_magnitude(rhs, converter)?;
        Ok(self.with_magnitude(self.magnitude * rhs))
    }

    /// Divides the magnitudes. The result is in `self`'s unit.
    ///
    /// For the dimensionless ratio between two amounts use [`Quantity::ratio`].
    pub fn divide(&self, rhs: &Self, converter: &Converter) -> Result<Self, QuantityError> {
        let rhs = self.rhs_magnitude(rhs, converter)?;
        if rhs == 0.0 {
            return Err(QuantityError::DivisionByZero);
        }
        Ok(self.with_magnitude(self.magnitude / rhs))
    }

    /// How many `reference`s fit in `self`
    ///
    /// `self` is converted to the reference unit first.
    ///
    /// ```
    /// # use larder::{quantity::Quantity, convert::{Converter, Unit}};
    /// let converter = Converter::bundled();
    /// let needed = Quantity::new(8.0, Unit::Ounces).unwrap();
    /// let serving = Quantity::new(4.0, Unit::Ounces).unwrap();
    /// assert_eq!(needed.ratio(&serving, &converter).unwrap(), 2.0);
    /// ```
    pub fn ratio(&self, reference: &Self, converter: &Converter) -> Result<f64, QuantityError> {
        reference.check_compatible(self)?;
        if reference.magnitude == 0.0 {
            return Err(QuantityError::DivisionByZero);
        }
        let magnitude = converter.convert(self, reference.unit)?;
        Ok(magnitude / reference.magnitude)
    }

    /// Multiplies the magnitude by a scalar
    pub fn scale(&self, factor: f64) -> Self {
        self.with_magnitude(self.magnitude * factor)
    }

    /// Converts to another unit of the same type
    pub fn convert_to(&self, unit: Unit, converter: &Converter) -> Result<Self, QuantityError> {
        let target = Self::zero(unit);
        let magnitude = target.rhs_magnitude(self, converter)?;
        Ok(target.with_magnitude(magnitude))
    }

    /// Compares two quantities after converting `rhs` to `self`'s unit
    pub fn compare(&self, rhs: &Self, converter: &Converter) -> Result<Ordering, QuantityError> {
        let rhs = self.rhs_magnitude(rhs, converter)?;
        Ok(self.magnitude.total_cmp(&rhs))
    }
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = ValidationError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        let magnitude = match raw.magnitude {
            RawMagnitude::Number(n) => check_magnitude(n)?,
            RawMagnitude::Text(t) => parse_magnitude_field(&t)?,
        };
        let unit = raw
            .unit
            .as_deref()
            .map(parse_unit_field)
            .unwrap_or(Unit::None);
        match raw.unit_type.as_deref() {
            Some(text) => Self::with_type(magnitude, unit, parse_unit_type_field(text)?),
            None => Self::new(magnitude, unit),
        }
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    /// Parses `"<number>%<unit>"`, `"<number> <unit>"`, `"<number><unit>"` or
    /// just `"<number>"`, which is dimensionless.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::InvalidQuantity(s.to_string()));
        }
        let (magnitude, unit) = match s.split_once('%') {
            Some(parts) => parts,
            None => match s.find(|c: char| c.is_alphabetic()) {
                Some(pos) => s.split_at(pos),
                None => (s, ""),
            },
        };
        let magnitude = parse_magnitude_field(magnitude)?;
        let unit = if unit.trim().is_empty() {
            Unit::None
        } else {
            parse_unit_field(unit)
        };
        Self::new(magnitude, unit)
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let magnitude = (self.magnitude * 1000.0).round() / 1000.0;
        write!(f, "{magnitude}")?;
        if self.unit != Unit::None {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn q(magnitude: f64, unit: Unit) -> Quantity {
        Quantity::new(magnitude, unit).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn unit_type_is_inferred() {
        assert_eq!(q(1.0, Unit::Cups).unit_type(), UnitType::Volume);
        assert_eq!(Quantity::zero(Unit::Kilocalories).unit_type(), UnitType::Energy);
    }

    #[test]
    fn explicit_unit_type() {
        assert!(Quantity::with_type(1.0, Unit::Grams, UnitType::Weight).is_ok());
        assert_eq!(
            Quantity::with_type(1.0, Unit::Grams, UnitType::Volume),
            Err(ValidationError::UnitTypeMismatch {
                unit: Unit::Grams,
                expected: UnitType::Volume,
                actual: UnitType::Weight,
            })
        );
        // an unknown unit degrades to none, which no longer matches
        assert!(Quantity::parse("1", "bushel", Some("VOLUME")).is_err());
        assert!(Quantity::parse("1", "bushel", Some("NONE")).is_ok());
    }

    #[test_case("abc" ; "garbage")]
    #[test_case("" ; "empty")]
    #[test_case("NaN" ; "nan")]
    #[test_case("inf" ; "infinite")]
    fn invalid_magnitude(text: &str) {
        assert!(matches!(
            Quantity::parse(text, "g", None),
            Err(ValidationError::InvalidMagnitude(_))
        ));
    }

    #[test]
    fn non_finite_number() {
        assert!(Quantity::new(f64::INFINITY, Unit::Grams).is_err());
        assert!(Quantity::new(f64::NAN, Unit::Grams).is_err());
    }

    #[test]
    fn strict_unit_type() {
        assert_eq!(
            Quantity::parse("1", "g", Some("Weight")),
            Err(ValidationError::UnknownUnitType("Weight".into()))
        );
    }

    #[test]
    fn add_in_left_unit() {
        let converter = Converter::bundled();
        let sum = q(5.43, Unit::Kilograms)
            .add(&q(1000.0, Unit::Grams), &converter)
            .unwrap();
        assert_eq!(sum.unit(), Unit::Kilograms);
        assert!(approx(sum.magnitude(), 6.43));

        let sum = q(1.0, Unit::Kilograms)
            .add(&q(500.0, Unit::Grams), &converter)
            .unwrap();
        assert!(approx(sum.magnitude(), 1.5));
        assert_eq!(sum.unit_type(), UnitType::Weight);
    }

    #[test]
    fn subtract_multiply_divide() {
        let converter = Converter::bundled();
        let a = q(2.0, Unit::Pounds);
        let b = q(16.0, Unit::Ounces);
        assert!(approx(a.subtract(&b, &converter).unwrap().magnitude(), 1.0));
        assert!(approx(a.multiply(&b, &converter).unwrap().magnitude(), 2.0));
        assert!(approx(a.divide(&b, &converter).unwrap().magnitude(), 2.0));
        assert_eq!(a.divide(&b, &converter).unwrap().unit(), Unit::Pounds);
    }

    #[test]
    fn incompatible_types() {
        let converter = Converter::bundled();
        let weight = q(1.0, Unit::Grams);
        let volume = q(1.0, Unit::Milliliters);
        let expected = Err(QuantityError::IncompatibleUnitTypes {
            left: UnitType::Weight,
            right: UnitType::Volume,
        });
        assert_eq!(weight.add(&volume, &converter), expected);
        assert_eq!(weight.subtract(&volume, &converter), expected);
        assert_eq!(weight.multiply(&volume, &converter), expected);
        assert_eq!(weight.divide(&volume, &converter), expected);
    }

    #[test]
    fn missing_conversion() {
        let converter = Converter::bundled();
        let err = q(1.0, Unit::Cups)
            .add(&q(1.0, Unit::Teaspoons), &converter)
            .unwrap_err();
        assert_eq!(
            err,
            QuantityError::Conversion(ConversionError {
                from: Unit::Teaspoons,
                to: Unit::Cups
            })
        );
    }

    #[test]
    fn division_by_zero() {
        let converter = Converter::bundled();
        let zero = Quantity::zero(Unit::Grams);
        assert_eq!(
            q(1.0, Unit::Kilograms).divide(&zero, &converter),
            Err(QuantityError::DivisionByZero)
        );
        assert_eq!(
            q(1.0, Unit::Kilograms).ratio(&zero, &converter),
            Err(QuantityError::DivisionByZero)
        );
    }

    #[test]
    fn ratio_and_scale() {
        let converter = Converter::bundled();
        let servings = q(1.5, Unit::Pounds)
            .ratio(&q(4.0, Unit::Ounces), &converter)
            .unwrap();
        assert!(approx(servings, 6.0));
        let scaled = q(31.0, Unit::Grams).scale(servings);
        assert!(approx(scaled.magnitude(), 186.0));
        assert_eq!(scaled.unit(), Unit::Grams);
    }

    #[test]
    fn convert_and_compare() {
        let converter = Converter::bundled();
        let lb = q(1.0, Unit::Pounds).convert_to(Unit::Ounces, &converter).unwrap();
        assert!(approx(lb.magnitude(), 16.0));
        assert_eq!(lb.unit(), Unit::Ounces);
        assert_eq!(
            q(3.0, Unit::Pounds)
                .compare(&q(195.0, Unit::Grams), &converter)
                .unwrap(),
            Ordering::Greater
        );
        assert!(q(1.0, Unit::Cups)
            .convert_to(Unit::Grams, &converter)
            .is_err());
    }

    #[test_case("500%g" => (500.0, Unit::Grams))]
    #[test_case("1.5 lb" => (1.5, Unit::Pounds))]
    #[test_case("2kg" => (2.0, Unit::Kilograms))]
    #[test_case("8 fl oz" => (8.0, Unit::FluidOunces))]
    #[test_case("3" => (3.0, Unit::None))]
    #[test_case(" 2 cloves " => (2.0, Unit::None))]
    fn from_str(s: &str) -> (f64, Unit) {
        let q: Quantity = s.parse().unwrap();
        (q.magnitude(), q.unit())
    }

    #[test]
    fn from_str_errors() {
        assert!("".parse::<Quantity>().is_err());
        assert!("lots%g".parse::<Quantity>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(q(1.0 / 3.0, Unit::Cups).to_string(), "0.333 cup");
        assert_eq!(q(3.0, Unit::None).to_string(), "3");
        assert_eq!(q(8.0, Unit::FluidOunces).to_string(), "8 fl oz");
    }

    #[test]
    fn serde() {
        let q = q(1.5, Unit::Pounds);
        let json = serde_json::to_value(q).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "magnitude": 1.5, "unit": "lb", "unit_type": "weight" })
        );
        let back: Quantity = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);

        let raw: Quantity = serde_json::from_str(
            r#"{ "quantity": "4", "unit": "ounces", "type": "WEIGHT" }"#,
        )
        .unwrap();
        assert_eq!(raw, Quantity::new(4.0, Unit::Ounces).unwrap());

        let no_unit: Quantity = serde_json::from_str(r#"{ "magnitude": 2 }"#).unwrap();
        assert_eq!(no_unit.unit(), Unit::None);

        assert!(serde_json::from_str::<Quantity>(
            r#"{ "magnitude": 1, "unit": "g", "unit_type": "VOLUME" }"#
        )
        .is_err());
        assert!(serde_json::from_str::<Quantity>(r#"{ "magnitude": "many", "unit": "g" }"#)
            .is_err());
    }
}
