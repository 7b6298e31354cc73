//! Inventory items

use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    convert::{Converter, Unit},
    error::ValidationError,
    nutrition::{default_macro_table, Macro, MacroTable},
    quantity::{Quantity, QuantityError},
    shelf_life::{parse_shelf_life, ShelfLife},
};

const CONSUME_TOLERANCE: f64 = 1e-9;

/// Where an item is kept
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
    strum::AsRefStr,
    enum_map::Enum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageType {
    Pantry,
    Fridge,
    Freezer,
}

/// A physical product in the inventory
///
/// Two items are equal when they have the same name and expiration date. The
/// rest of the fields, id included, do not take part in equality or hashing,
/// so two lots of the same product bought on different days are different
/// items.
///
/// Create one with [`Item::builder`].
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    id: Uuid,
    name: String,
    quantity: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merchant: Option<String>,
    per_serving_macros: MacroTable,
    serving_size: Quantity,
    storage: StorageType,
    expiration_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    shelf_life: Option<ShelfLife>,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.expiration_date == other.expiration_date
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.expiration_date.hash(state);
    }
}

impl Item {
    /// Start building a new item
    pub fn builder(name: impl Into<String>, quantity: Quantity, storage: StorageType) -> ItemBuilder {
        ItemBuilder::new(name, quantity, storage)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Amount on hand
    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn merchant(&self) -> Option<&str> {
        self.merchant.as_deref()
    }

    pub fn per_serving_macros(&self) -> &MacroTable {
        &self.per_serving_macros
    }

    pub fn serving_size(&self) -> &Quantity {
        &self.serving_size
    }

    pub fn storage(&self) -> StorageType {
        self.storage
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    /// Shelf life the expiration date was computed from, if any
    pub fn shelf_life(&self) -> Option<ShelfLife> {
        self.shelf_life
    }

    /// Days until the item expires, negative once expired
    ///
    /// Uses the local date at the time of the call.
    pub fn shelf_life_remaining(&self) -> i64 {
        self.shelf_life_remaining_at(crate::today())
    }

    /// Days from `today` until the item expires
    pub fn shelf_life_remaining_at(&self, today: NaiveDate) -> i64 {
        (self.expiration_date - today).num_days()
    }

    /// The item is expired the day after its expiration date
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        self.expiration_date < today
    }

    pub fn is_depleted(&self) -> bool {
        self.quantity.magnitude() <= 0.0
    }

    /// Number of servings on hand
    pub fn servings(&self, converter: &Converter) -> Result<f64, QuantityError> {
        self.quantity.ratio(&self.serving_size, converter)
    }

    /// Takes `amount` out of the on-hand quantity
    ///
    /// The quantity keeps its unit. Taking more than what is available is an
    /// error and leaves the item untouched.
    pub fn consume(&mut self, amount: &Quantity, converter: &Converter) -> Result<(), QuantityError> {
        non_negative(amount)?;
        let left = self.quantity.subtract(amount, converter)?;
        if left.magnitude() < -CONSUME_TOLERANCE {
            return Err(QuantityError::Insufficient {
                requested: *amount,
                available: self.quantity,
            });
        }
        // conversion rounding leaves tiny remainders
        self.quantity = if left.magnitude() < CONSUME_TOLERANCE {
            Quantity::zero(left.unit())
        } else {
            left
        };
        Ok(())
    }

    /// Adds `amount` to the on-hand quantity
    pub fn restock(&mut self, amount: &Quantity, converter: &Converter) -> Result<(), QuantityError> {
        non_negative(amount)?;
        self.quantity = self.quantity.add(amount, converter)?;
        Ok(())
    }
}

fn non_negative(amount: &Quantity) -> Result<(), QuantityError> {
    if amount.magnitude() < 0.0 {
        return Err(QuantityError::NegativeAmount(*amount));
    }
    Ok(())
}

/// Builder for [`Item`]
///
/// An expiration source is required: either [`ItemBuilder::expires_on`] or a
/// shelf life. When both are given, the explicit date wins.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    name: String,
    quantity: Quantity,
    storage: StorageType,
    id: Option<Uuid>,
    price: Option<f64>,
    merchant: Option<String>,
    serving_size: Option<Quantity>,
    macros: MacroTable,
    pending_macros: Vec<(Macro, Quantity)>,
    expiration_date: Option<NaiveDate>,
    shelf_life: Option<ShelfLife>,
    shelf_life_text: Option<String>,
}

impl ItemBuilder {
    pub fn new(name: impl Into<String>, quantity: Quantity, storage: StorageType) -> Self {
        Self {
            name: name.into(),
            quantity,
            storage,
            id: None,
            price: None,
            merchant: None,
            serving_size: None,
            macros: default_macro_table(),
            pending_macros: Vec::new(),
            expiration_date: None,
            shelf_life: None,
            shelf_life_text: None,
        }
    }

    /// Use a known id instead of a fresh one
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn expires_on(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn shelf_life(mut self, shelf_life: ShelfLife) -> Self {
        self.shelf_life = Some(shelf_life);
        self
    }

    /// Shelf life as text, parsed when the item is built
    ///
    /// See [`parse_shelf_life`] for the accepted forms.
    pub fn shelf_life_text(mut self, text: impl Into<String>) -> Self {
        self.shelf_life_text = Some(text.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Defaults to `1` dimensionless
    pub fn serving_size(mut self, serving_size: Quantity) -> Self {
        self.serving_size = Some(serving_size);
        self
    }

    /// Set one per-serving macro. Checked when the item is built.
    pub fn macro_(mut self, macro_kind: Macro, quantity: Quantity) -> Self {
        self.pending_macros.push((macro_kind, quantity));
        self
    }

    /// Replace the whole per-serving table
    pub fn macros(mut self, macros: MacroTable) -> Self {
        self.macros = macros;
        self.pending_macros.clear();
        self
    }

    /// Build the item, computing the expiration date from the local date
    pub fn build(self) -> Result<Item, ValidationError> {
        self.build_on(crate::today())
    }

    /// Build the item as if it was `today`
    pub fn build_on(self, today: NaiveDate) -> Result<Item, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.quantity.magnitude() < 0.0 {
            return Err(ValidationError::InvalidQuantity(self.quantity.to_string()));
        }

        let parsed = self
            .shelf_life_text
            .as_deref()
            .map(parse_shelf_life)
            .transpose()?;
        let shelf_life = self.shelf_life.or(parsed);

        let expiration_date = match (self.expiration_date, shelf_life) {
            (Some(date), _) => date,
            (None, Some(shelf_life)) => shelf_life.expires_from(today).ok_or_else(|| {
                ValidationError::InvalidShelfLife(
                    self.shelf_life_text
                        .clone()
                        .unwrap_or_else(|| shelf_life.to_string()),
                )
            })?,
            (None, None) => return Err(ValidationError::MissingExpiration),
        };

        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::InvalidPrice(price));
            }
        }

        let serving_size = self
            .serving_size
            .unwrap_or(Quantity::one(Unit::None));
        if serving_size.magnitude() <= 0.0 {
            return Err(ValidationError::InvalidServingSize(serving_size.to_string()));
        }

        let mut macros = self.macros;
        for (macro_kind, quantity) in self.pending_macros {
            macros.set(macro_kind, quantity)?;
        }

        Ok(Item {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: name.to_string(),
            quantity: self.quantity,
            price: self.price,
            merchant: self.merchant,
            per_serving_macros: macros,
            serving_size,
            storage: self.storage,
            expiration_date,
            shelf_life,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn q(magnitude: f64, unit: Unit) -> Quantity {
        Quantity::new(magnitude, unit).unwrap()
    }

    fn chicken() -> ItemBuilder {
        Item::builder("Chicken Breast", q(1.5, Unit::Pounds), StorageType::Fridge)
            .price(11.99)
            .merchant("Trader Joe's")
            .serving_size(q(4.0, Unit::Ounces))
            .macro_(Macro::Protein, q(31.0, Unit::Grams))
            .macro_(Macro::Fat, q(3.6, Unit::Grams))
            .macro_(Macro::Calories, q(165.0, Unit::Kilocalories))
    }

    #[test]
    fn expiration_from_shelf_life() {
        let item = chicken()
            .shelf_life_text("P2W")
            .build_on(date(2024, 3, 1))
            .unwrap();
        assert_eq!(item.expiration_date(), date(2024, 3, 15));
        assert_eq!(item.shelf_life(), Some(ShelfLife::from_days(14)));
        assert_eq!(item.shelf_life_remaining_at(date(2024, 3, 10)), 5);
        assert_eq!(item.shelf_life_remaining_at(date(2024, 3, 20)), -5);
        assert!(!item.is_expired_at(date(2024, 3, 15)));
        assert!(item.is_expired_at(date(2024, 3, 16)));
    }

    #[test]
    fn explicit_date_wins() {
        let item = chicken()
            .expires_on(date(2024, 3, 3))
            .shelf_life(ShelfLife::from_days(30))
            .build_on(date(2024, 3, 1))
            .unwrap();
        assert_eq!(item.expiration_date(), date(2024, 3, 3));
    }

    #[test]
    fn shelf_life_text_is_checked_even_with_date() {
        let err = chicken()
            .expires_on(date(2024, 3, 3))
            .shelf_life_text("a while")
            .build_on(date(2024, 3, 1))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidShelfLife("a while".into()));
    }

    #[test]
    fn validation() {
        let today = date(2024, 3, 1);
        assert_eq!(
            chicken().build_on(today).unwrap_err(),
            ValidationError::MissingExpiration
        );
        assert_eq!(
            Item::builder("  ", q(1.0, Unit::None), StorageType::Pantry)
                .shelf_life(ShelfLife::from_days(1))
                .build_on(today)
                .unwrap_err(),
            ValidationError::EmptyName
        );
        assert_eq!(
            chicken()
                .expires_on(today)
                .price(-1.0)
                .build_on(today)
                .unwrap_err(),
            ValidationError::InvalidPrice(-1.0)
        );
        assert!(matches!(
            chicken()
                .expires_on(today)
                .macro_(Macro::Calories, q(165.0, Unit::Grams))
                .build_on(today),
            Err(ValidationError::MacroUnitType { .. })
        ));
        assert!(matches!(
            chicken()
                .expires_on(today)
                .serving_size(Quantity::zero(Unit::Ounces))
                .build_on(today),
            Err(ValidationError::InvalidServingSize(_))
        ));
        assert!(matches!(
            Item::builder("rice", q(-1.0, Unit::Kilograms), StorageType::Pantry)
                .expires_on(today)
                .build_on(today),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn defaults() {
        let item = Item::builder("eggs", q(12.0, Unit::None), StorageType::Fridge)
            .shelf_life(ShelfLife::from_days(21))
            .build_on(date(2024, 3, 1))
            .unwrap();
        assert_eq!(item.serving_size(), &Quantity::one(Unit::None));
        assert_eq!(item.per_serving_macros(), &default_macro_table());
        assert_eq!(item.price(), None);
        assert_eq!(item.shelf_life_remaining_at(date(2024, 3, 1)), 21);
        assert_eq!(item.expiration_date(), date(2024, 3, 22));
    }

    #[test]
    fn shelf_life_past_the_calendar() {
        let today = date(2024, 1, 1);
        assert_eq!(
            Item::builder("salt", q(1.0, Unit::Kilograms), StorageType::Pantry)
                .shelf_life_text("P1000000Y")
                .build_on(today),
            Err(ValidationError::InvalidShelfLife("P1000000Y".into()))
        );
        assert!(matches!(
            Item::builder("salt", q(1.0, Unit::Kilograms), StorageType::Pantry)
                .shelf_life(ShelfLife::from_days(i64::MAX))
                .build_on(today),
            Err(ValidationError::InvalidShelfLife(_))
        ));
    }

    #[test]
    fn identity() {
        let today = date(2024, 3, 1);
        let a = chicken().expires_on(today).build_on(today).unwrap();
        let b = Item::builder("Chicken Breast", q(3.0, Unit::Kilograms), StorageType::Freezer)
            .expires_on(today)
            .build_on(today)
            .unwrap();
        let c = chicken()
            .expires_on(date(2024, 3, 2))
            .build_on(today)
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn consume_and_restock() {
        let converter = Converter::bundled();
        let today = date(2024, 3, 1);
        let mut item = chicken().expires_on(today).build_on(today).unwrap();
        assert!((item.servings(&converter).unwrap() - 6.0).abs() < 1e-9);

        item.consume(&q(8.0, Unit::Ounces), &converter).unwrap();
        assert_eq!(item.quantity().unit(), Unit::Pounds);
        assert!((item.quantity().magnitude() - 1.0).abs() < 1e-9);

        let err = item.consume(&q(1.0, Unit::Kilograms), &converter).unwrap_err();
        assert!(matches!(err, QuantityError::Insufficient { .. }));
        assert!((item.quantity().magnitude() - 1.0).abs() < 1e-9);

        item.consume(&q(16.0, Unit::Ounces), &converter).unwrap();
        assert!(item.is_depleted());
        assert!(item.quantity().magnitude() >= 0.0);

        item.restock(&q(453.592_37, Unit::Grams), &converter).unwrap();
        assert!((item.quantity().magnitude() - 1.0).abs() < 1e-9);

        assert!(matches!(
            item.consume(&q(1.0, Unit::Cups), &converter),
            Err(QuantityError::IncompatibleUnitTypes { .. })
        ));

        assert_eq!(
            item.consume(&q(-5.0, Unit::Grams), &converter),
            Err(QuantityError::NegativeAmount(q(-5.0, Unit::Grams)))
        );
        assert_eq!(
            item.restock(&q(-10.0, Unit::Kilograms), &converter),
            Err(QuantityError::NegativeAmount(q(-10.0, Unit::Kilograms)))
        );
        assert!((item.quantity().magnitude() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn storage_names() {
        assert_eq!("FRIDGE".parse::<StorageType>().unwrap(), StorageType::Fridge);
        assert_eq!(StorageType::Freezer.to_string(), "freezer");
    }
}
