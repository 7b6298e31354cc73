//! Known units, their families and the free-form unit dictionary

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A measurement unit
///
/// The [`Display`](std::fmt::Display) implementation writes the canonical
/// symbol, like `kg` or `fl oz`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
    enum_map::Enum,
)]
pub enum Unit {
    #[serde(rename = "g")]
    #[strum(serialize = "g")]
    Grams,
    #[serde(rename = "kg")]
    #[strum(serialize = "kg")]
    Kilograms,
    #[serde(rename = "lb")]
    #[strum(serialize = "lb")]
    Pounds,
    #[serde(rename = "oz")]
    #[strum(serialize = "oz")]
    Ounces,
    #[serde(rename = "kcal")]
    #[strum(serialize = "kcal")]
    Kilocalories,
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Liters,
    #[serde(rename = "ml")]
    #[strum(serialize = "ml")]
    Milliliters,
    #[serde(rename = "gal")]
    #[strum(serialize = "gal")]
    Gallons,
    #[serde(rename = "fl oz")]
    #[strum(serialize = "fl oz")]
    FluidOunces,
    #[serde(rename = "cup")]
    #[strum(serialize = "cup")]
    Cups,
    #[serde(rename = "tsp")]
    #[strum(serialize = "tsp")]
    Teaspoons,
    #[serde(rename = "tbsp")]
    #[strum(serialize = "tbsp")]
    Tablespoons,
    /// Dimensionless, used for counts
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    None,
}

/// The family a [`Unit`] belongs to
///
/// Parsing is strict: only the exact names (`WEIGHT`, `VOLUME`, `ENERGY`,
/// `NONE`) or their lowercase canonical form are accepted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    enum_map::Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    #[strum(to_string = "weight", serialize = "WEIGHT")]
    Weight,
    #[strum(to_string = "volume", serialize = "VOLUME")]
    Volume,
    #[strum(to_string = "energy", serialize = "ENERGY")]
    Energy,
    #[strum(to_string = "none", serialize = "NONE")]
    None,
}

impl Unit {
    /// Get the [`UnitType`] of the unit
    pub const fn unit_type(self) -> UnitType {
        match self {
            Unit::Grams | Unit::Kilograms | Unit::Pounds | Unit::Ounces => UnitType::Weight,
            Unit::Kilocalories => UnitType::Energy,
            Unit::Liters
            | Unit::Milliliters
            | Unit::Gallons
            | Unit::FluidOunces
            | Unit::Cups
            | Unit::Teaspoons
            | Unit::Tablespoons => UnitType::Volume,
            Unit::None => UnitType::None,
        }
    }

    /// Canonical symbol of the unit
    ///
    /// ```
    /// # use larder::convert::Unit;
    /// assert_eq!(Unit::FluidOunces.symbol(), "fl oz");
    /// ```
    pub fn symbol(self) -> &'static str {
        self.into()
    }
}

/// Get the [`UnitType`] of a unit.
///
/// Same as [`Unit::unit_type`].
pub const fn unit_type_of(unit: Unit) -> UnitType {
    unit.unit_type()
}

static UNIT_ALIASES: Lazy<HashMap<&'static str, Unit>> = Lazy::new(|| {
    use Unit::*;
    [
        // weight
        ("g", Grams),
        ("gr", Grams),
        ("gram", Grams),
        ("grams", Grams),
        ("gramme", Grams),
        ("grammes", Grams),
        ("kg", Kilograms),
        ("kgs", Kilograms),
        ("kilo", Kilograms),
        ("kilos", Kilograms),
        ("kilogram", Kilograms),
        ("kilograms", Kilograms),
        ("lb", Pounds),
        ("lbs", Pounds),
        ("pound", Pounds),
        ("pounds", Pounds),
        ("oz", Ounces),
        ("ozs", Ounces),
        ("ounce", Ounces),
        ("ounces", Ounces),
        // energy
        ("kcal", Kilocalories),
        ("kcals", Kilocalories),
        ("cal", Kilocalories),
        ("cals", Kilocalories),
        ("calorie", Kilocalories),
        ("calories", Kilocalories),
        ("kilocalorie", Kilocalories),
        ("kilocalories", Kilocalories),
        // volume
        ("l", Liters),
        ("liter", Liters),
        ("liters", Liters),
        ("litre", Liters),
        ("litres", Liters),
        ("ml", Milliliters),
        ("mls", Milliliters),
        ("milliliter", Milliliters),
        ("milliliters", Milliliters),
        ("millilitre", Milliliters),
        ("millilitres", Milliliters),
        ("gal", Gallons),
        ("gallon", Gallons),
        ("gallons", Gallons),
        ("fl oz", FluidOunces),
        ("floz", FluidOunces),
        ("fluid ounce", FluidOunces),
        ("fluid ounces", FluidOunces),
        ("cup", Cups),
        ("cups", Cups),
        ("tsp", Teaspoons),
        ("tsps", Teaspoons),
        ("teaspoon", Teaspoons),
        ("teaspoons", Teaspoons),
        ("tbsp", Tablespoons),
        ("tbsps", Tablespoons),
        ("tbs", Tablespoons),
        ("tablespoon", Tablespoons),
        ("tablespoons", Tablespoons),
        // counts
        ("none", None),
        ("each", None),
        ("ea", None),
        ("count", None),
        ("unit", None),
        ("units", None),
        ("piece", None),
        ("pieces", None),
        ("pc", None),
        ("pcs", None),
        ("whole", None),
        ("clove", None),
        ("cloves", None),
        ("pinch", None),
        ("pinches", None),
        ("dash", None),
        ("dashes", None),
    ]
    .into_iter()
    .collect()
});

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|part| part.replace('.', ""))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Find a unit by any of its names, symbols or abbreviations.
///
/// Returns [`None`](Option::None) if the text is not a known unit. See
/// [`parse_unit`] for the lenient version.
pub fn lookup_unit(text: &str) -> Option<Unit> {
    UNIT_ALIASES.get(normalize(text).as_str()).copied()
}

/// Parse free-form unit text.
///
/// Case, plurals, surrounding whitespace and dots are ignored. Text that is not
/// a known unit resolves to [`Unit::None`] instead of failing, because unit
/// strings usually come from noisy extraction output.
///
/// ```
/// # use larder::convert::{parse_unit, Unit};
/// assert_eq!(parse_unit("Grams"), Unit::Grams);
/// assert_eq!(parse_unit(" Fl. Oz "), Unit::FluidOunces);
/// assert_eq!(parse_unit("handful"), Unit::None);
/// ```
pub fn parse_unit(text: &str) -> Unit {
    match lookup_unit(text) {
        Some(unit) => unit,
        None => {
            if !text.trim().is_empty() {
                tracing::debug!(unit = text, "unknown unit, using dimensionless");
            }
            Unit::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    #[test_case("g" => Unit::Grams)]
    #[test_case("gram" => Unit::Grams)]
    #[test_case("GRAMS" => Unit::Grams)]
    #[test_case("Kilograms" => Unit::Kilograms)]
    #[test_case("lbs" => Unit::Pounds)]
    #[test_case("oz." => Unit::Ounces)]
    #[test_case("fluid  ounces" => Unit::FluidOunces)]
    #[test_case("L" => Unit::Liters)]
    #[test_case("Tablespoons" => Unit::Tablespoons)]
    #[test_case("calories" => Unit::Kilocalories)]
    #[test_case("cloves" => Unit::None)]
    #[test_case("" => Unit::None ; "empty")]
    #[test_case("bushel" => Unit::None ; "unknown")]
    fn parse(text: &str) -> Unit {
        parse_unit(text)
    }

    #[test]
    fn lookup_is_strict() {
        assert_eq!(lookup_unit("kg"), Some(Unit::Kilograms));
        assert_eq!(lookup_unit("bushel"), Option::None);
    }

    #[test]
    fn every_symbol_parses_back() {
        for unit in Unit::iter() {
            assert_eq!(parse_unit(unit.symbol()), unit, "{unit}");
        }
    }

    #[test]
    fn unit_types() {
        assert_eq!(unit_type_of(Unit::Ounces), UnitType::Weight);
        assert_eq!(unit_type_of(Unit::Cups), UnitType::Volume);
        assert_eq!(unit_type_of(Unit::Kilocalories), UnitType::Energy);
        assert_eq!(unit_type_of(Unit::None), UnitType::None);
    }

    #[test_case("WEIGHT" => Some(UnitType::Weight))]
    #[test_case("weight" => Some(UnitType::Weight))]
    #[test_case("ENERGY" => Some(UnitType::Energy))]
    #[test_case("none" => Some(UnitType::None))]
    #[test_case("Weight" => Option::<UnitType>::None ; "mixed case")]
    #[test_case("mass" => Option::<UnitType>::None ; "unknown")]
    fn unit_type_parse_is_strict(text: &str) -> Option<UnitType> {
        text.parse().ok()
    }
}
