//! Macronutrients and per-serving nutrition tables

use std::{collections::HashMap, ops::Index};

use enum_map::{enum_map, EnumMap};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    convert::{Converter, Unit, UnitType},
    error::ValidationError,
    quantity::{Quantity, QuantityError},
};

/// A tracked macronutrient
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Macro {
    #[serde(alias = "carbs", alias = "carb")]
    #[strum(to_string = "carbohydrate", serialize = "carbs", serialize = "carb")]
    Carbohydrate,
    Fat,
    Protein,
    Sugar,
    Fiber,
    #[serde(alias = "calorie", alias = "kcal")]
    Calories,
}

impl Macro {
    /// Unit the macro is accounted in
    pub const fn unit(self) -> Unit {
        match self {
            Macro::Calories => Unit::Kilocalories,
            _ => Unit::Grams,
        }
    }

    pub const fn unit_type(self) -> UnitType {
        self.unit().unit_type()
    }
}

/// Amount of every [`Macro`]
///
/// The table is always total. Entries that were not given are zero.
/// Every entry has the unit type of its macro: energy for calories and
/// weight for the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MacroTable(EnumMap<Macro, Quantity>);

/// A fresh table with every macro at zero
///
/// Calories are in kcal, everything else in grams.
pub fn default_macro_table() -> MacroTable {
    MacroTable(enum_map! { m => Quantity::zero(Macro::unit(m)) })
}

fn check_entry(macro_kind: Macro, quantity: &Quantity) -> Result<(), ValidationError> {
    if quantity.unit_type() != macro_kind.unit_type() {
        return Err(ValidationError::MacroUnitType {
            macro_kind,
            expected: macro_kind.unit_type(),
            found: quantity.unit(),
        });
    }
    Ok(())
}

impl MacroTable {
    /// Builds a table from some entries, filling the rest with zeros
    pub fn from_partial(
        entries: impl IntoIterator<Item = (Macro, Quantity)>,
    ) -> Result<Self, ValidationError> {
        let mut table = default_macro_table();
        for (macro_kind, quantity) in entries {
            table.set(macro_kind, quantity)?;
        }
        Ok(table)
    }

    pub fn get(&self, macro_kind: Macro) -> &Quantity {
        &self.0[macro_kind]
    }

    /// Sets an entry. The quantity must have the unit type of the macro.
    pub fn set(&mut self, macro_kind: Macro, quantity: Quantity) -> Result<(), ValidationError> {
        check_entry(macro_kind, &quantity)?;
        self.0[macro_kind] = quantity;
        Ok(())
    }

    /// Adds `amount` to an entry, keeping the entry's unit
    pub fn accumulate(
        &mut self,
        macro_kind: Macro,
        amount: &Quantity,
        converter: &Converter,
    ) -> Result<(), QuantityError> {
        self.0[macro_kind] = self.0[macro_kind].add(amount, converter)?;
        Ok(())
    }

    /// Adds `other * factor` to every entry
    pub fn accumulate_scaled(
        &mut self,
        other: &MacroTable,
        factor: f64,
        converter: &Converter,
    ) -> Result<(), QuantityError> {
        for (macro_kind, quantity) in other.iter() {
            self.accumulate(macro_kind, &quantity.scale(factor), converter)?;
        }
        Ok(())
    }

    /// Every entry multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self(enum_map! { m => self.0[m].scale(factor) })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Macro, &Quantity)> + '_ {
        self.0.iter()
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        default_macro_table()
    }
}

impl<'de> Deserialize<'de> for MacroTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let partial = HashMap::<Macro, Quantity>::deserialize(deserializer)?;
        Self::from_partial(partial).map_err(serde::de::Error::custom)
    }
}

impl Index<Macro> for MacroTable {
    type Output = Quantity;

    fn index(&self, index: Macro) -> &Self::Output {
        self.get(index)
    }
}
