//! Inventory file parser
//!
//! Items are grouped in one section per [`StorageType`]. An item is either
//! just a quantity or a table with more attributes.
//!
//! ## Format
//!
//! ```toml
//! # used by items that give neither `expire` nor `shelf_life`
//! default_shelf_life = "P1W"
//!
//! [pantry]
//! rice = "2%kg"
//! beans = { quantity = "500%g", shelf_life = "1 year", price = 1.99, protein = "9%g" }
//!
//! [fridge]
//! milk = { quantity = "1%gal", expire = "2024-05-10", merchant = "Corner Shop" }
//! ```
//!
//! Table attributes are `quantity`, `expire` (ISO date), `shelf_life`,
//! `price`, `merchant`, `serving_size` and the per-serving macros
//! `carbohydrate`, `fat`, `protein`, `sugar`, `fiber` and `calories`.
//!
//! This module is only available with the `config_files` feature.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::{
    convert::Unit,
    error::ValidationError,
    item::{Item, StorageType},
    nutrition::Macro,
    quantity::Quantity,
    shelf_life::{parse_shelf_life, ShelfLife},
};

const DEFAULT_SHELF_LIFE_KEY: &str = "default_shelf_life";

/// Error generated by [`parse`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InventoryFileError {
    #[error("Error parsing input: {message}")]
    Parse { message: String },

    #[error("Invalid 'default_shelf_life': {0}")]
    DefaultShelfLife(ValidationError),

    #[error("Unknown section '{0}': expected pantry, fridge or freezer")]
    UnknownSection(String),

    #[error("Invalid value for '{item}' in [{section}]: expected a quantity string or a table")]
    InvalidItem { section: String, item: String },

    #[error("Unknown field '{field}' in item '{item}'")]
    UnknownField { item: String, field: String },

    #[error("Invalid item '{item}' in [{section}]: {source}")]
    Item {
        section: String,
        item: String,
        #[source]
        source: ValidationError,
    },
}

/// Items parsed by [`parse_lenient`] and the problems found
#[derive(Debug, Clone, Default)]
pub struct LenientParse {
    pub items: Vec<Item>,
    pub warnings: Vec<InventoryFileError>,
}

impl LenientParse {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct Context<'a> {
    today: NaiveDate,
    default_shelf_life: Option<ShelfLife>,
    warnings: Option<&'a mut Vec<InventoryFileError>>,
}

impl Context<'_> {
    /// Records the error as a warning in lenient mode, returns it otherwise
    fn fail(&mut self, err: InventoryFileError) -> Result<(), InventoryFileError> {
        match self.warnings.as_mut() {
            Some(warnings) => {
                tracing::warn!("{err}");
                warnings.push(err);
                Ok(())
            }
            None => Err(err),
        }
    }
}

/// Parse an inventory file
///
/// Items with a shelf life expire counting from the local date.
pub fn parse(input: &str) -> Result<Vec<Item>, InventoryFileError> {
    parse_on(input, crate::today())
}

/// Parse an inventory file as if it was `today`
pub fn parse_on(input: &str, today: NaiveDate) -> Result<Vec<Item>, InventoryFileError> {
    parse_core(input, today, None)
}

/// Parse an inventory file, skipping invalid items
///
/// Problems with single items or fields are collected as warnings. The input
/// not being valid TOML is still an error.
///
/// ```
/// let file = r#"
/// default_shelf_life = "10 days"
///
/// [pantry]
/// rice = "2%kg"
/// flour = "lots"
/// "#;
///
/// let parsed = larder::inventory::file::parse_lenient(file).unwrap();
/// assert_eq!(parsed.items.len(), 1);
/// assert_eq!(parsed.warnings.len(), 1);
/// ```
pub fn parse_lenient(input: &str) -> Result<LenientParse, InventoryFileError> {
    parse_lenient_on(input, crate::today())
}

/// [`parse_lenient`] as if it was `today`
pub fn parse_lenient_on(input: &str, today: NaiveDate) -> Result<LenientParse, InventoryFileError> {
    let mut warnings = Vec::new();
    let items = parse_core(input, today, Some(&mut warnings))?;
    Ok(LenientParse { items, warnings })
}

fn parse_core(
    input: &str,
    today: NaiveDate,
    warnings: Option<&mut Vec<InventoryFileError>>,
) -> Result<Vec<Item>, InventoryFileError> {
    let table: toml::Table = toml::from_str(input).map_err(|e| InventoryFileError::Parse {
        message: format!("TOML parse error: {e}"),
    })?;

    let default_shelf_life = match table.get(DEFAULT_SHELF_LIFE_KEY) {
        None => None,
        Some(toml::Value::String(text)) => {
            Some(parse_shelf_life(text).map_err(InventoryFileError::DefaultShelfLife)?)
        }
        Some(_) => {
            return Err(InventoryFileError::DefaultShelfLife(
                ValidationError::wrong_type(DEFAULT_SHELF_LIFE_KEY, "a string"),
            ))
        }
    };

    let mut ctx = Context {
        today,
        default_shelf_life,
        warnings,
    };
    let mut items = Vec::new();

    for (section_name, section_value) in &table {
        if section_name == DEFAULT_SHELF_LIFE_KEY {
            continue;
        }
        let storage = match section_name.parse::<StorageType>() {
            Ok(storage) => storage,
            Err(_) => {
                ctx.fail(InventoryFileError::UnknownSection(section_name.clone()))?;
                continue;
            }
        };
        let Some(section_table) = section_value.as_table() else {
            ctx.fail(InventoryFileError::Parse {
                message: format!("Section '{section_name}' must be a table"),
            })?;
            continue;
        };

        for (item_name, item_value) in section_table {
            match parse_item(section_name, storage, item_name, item_value, &mut ctx) {
                Ok(item) => items.push(item),
                Err(err) => ctx.fail(err)?,
            }
        }
    }

    Ok(items)
}

fn parse_item(
    section: &str,
    storage: StorageType,
    name: &str,
    value: &toml::Value,
    ctx: &mut Context<'_>,
) -> Result<Item, InventoryFileError> {
    let item_err = |source: ValidationError| InventoryFileError::Item {
        section: section.to_string(),
        item: name.to_string(),
        source,
    };

    let builder = match value {
        toml::Value::String(quantity) => {
            let quantity = quantity.parse::<Quantity>().map_err(item_err)?;
            let builder = Item::builder(name, quantity, storage);
            match ctx.default_shelf_life {
                Some(shelf_life) => builder.shelf_life(shelf_life),
                None => builder,
            }
        }
        toml::Value::Table(attrs) => {
            let quantity = attrs
                .get("quantity")
                .ok_or_else(|| item_err(ValidationError::missing("quantity")))?;
            let quantity = quantity_value("quantity", quantity).map_err(item_err)?;
            let mut builder = Item::builder(name, quantity, storage);
            let mut has_expiration = false;

            for (key, value) in attrs {
                builder = match key.as_str() {
                    "quantity" => builder,
                    "expire" => {
                        has_expiration = true;
                        builder.expires_on(date_value(key, value).map_err(item_err)?)
                    }
                    "shelf_life" => {
                        has_expiration = true;
                        match value {
                            toml::Value::String(text) => builder.shelf_life_text(text.as_str()),
                            toml::Value::Integer(days) if *days >= 0 => builder
                                .shelf_life(ShelfLife::try_from(*days).map_err(item_err)?),
                            _ => {
                                return Err(item_err(ValidationError::wrong_type(
                                    key,
                                    "a shelf life string or a number of days",
                                )))
                            }
                        }
                    }
                    "price" => builder.price(number_value(key, value).map_err(item_err)?),
                    "merchant" => match value {
                        toml::Value::String(merchant) => builder.merchant(merchant.as_str()),
                        _ => return Err(item_err(ValidationError::wrong_type(key, "a string"))),
                    },
                    "serving_size" => {
                        builder.serving_size(quantity_value(key, value).map_err(item_err)?)
                    }
                    other => match other.parse::<Macro>() {
                        Ok(macro_kind) => builder.macro_(
                            macro_kind,
                            macro_value(macro_kind, key, value).map_err(item_err)?,
                        ),
                        Err(_) => {
                            ctx.fail(InventoryFileError::UnknownField {
                                item: name.to_string(),
                                field: key.clone(),
                            })?;
                            builder
                        }
                    },
                };
            }

            match (has_expiration, ctx.default_shelf_life) {
                (false, Some(shelf_life)) => builder.shelf_life(shelf_life),
                _ => builder,
            }
        }
        _ => {
            return Err(InventoryFileError::InvalidItem {
                section: section.to_string(),
                item: name.to_string(),
            })
        }
    };

    builder.build_on(ctx.today).map_err(item_err)
}

fn quantity_value(field: &str, value: &toml::Value) -> Result<Quantity, ValidationError> {
    match value {
        toml::Value::String(text) => text.parse(),
        toml::Value::Integer(n) => Quantity::new(*n as f64, Unit::None),
        toml::Value::Float(n) => Quantity::new(*n, Unit::None),
        _ => Err(ValidationError::wrong_type(field, "a quantity")),
    }
}

/// Bare numbers are in the macro's own unit
fn macro_value(
    macro_kind: Macro,
    field: &str,
    value: &toml::Value,
) -> Result<Quantity, ValidationError> {
    match value {
        toml::Value::Integer(n) => Quantity::new(*n as f64, macro_kind.unit()),
        toml::Value::Float(n) => Quantity::new(*n, macro_kind.unit()),
        _ => quantity_value(field, value),
    }
}

fn number_value(field: &str, value: &toml::Value) -> Result<f64, ValidationError> {
    match value {
        toml::Value::Integer(n) => Ok(*n as f64),
        toml::Value::Float(n) => Ok(*n),
        _ => Err(ValidationError::wrong_type(field, "a number")),
    }
}

fn date_value(field: &str, value: &toml::Value) -> Result<NaiveDate, ValidationError> {
    let text = match value {
        toml::Value::String(text) => text.clone(),
        toml::Value::Datetime(datetime) => datetime.to_string(),
        _ => return Err(ValidationError::wrong_type(field, "an ISO date")),
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::wrong_type(field, "an ISO date"))
}

#[derive(Debug, Serialize)]
struct FileItem {
    quantity: String,
    expire: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serving_size: Option<String>,
    #[serde(flatten)]
    macros: BTreeMap<String, String>,
}

fn format_quantity(quantity: &Quantity) -> String {
    match quantity.unit() {
        Unit::None => quantity.magnitude().to_string(),
        unit => format!("{}%{}", quantity.magnitude(), unit),
    }
}

impl From<&Item> for FileItem {
    fn from(item: &Item) -> Self {
        let serving_size = item.serving_size();
        Self {
            quantity: format_quantity(item.quantity()),
            expire: item.expiration_date().format("%Y-%m-%d").to_string(),
            price: item.price(),
            merchant: item.merchant().map(str::to_string),
            serving_size: (*serving_size != Quantity::one(Unit::None))
                .then(|| format_quantity(serving_size)),
            macros: item
                .per_serving_macros()
                .iter()
                .filter(|(_, q)| !q.is_zero())
                .map(|(m, q)| (m.to_string(), format_quantity(q)))
                .collect(),
        }
    }
}

/// Write items in the inventory file format
///
/// Every item is written with its expiration date. If more than one item in
/// the same storage has the same name, only the last one is kept.
pub fn to_string<'a>(items: impl IntoIterator<Item = &'a Item>) -> Result<String, toml::ser::Error> {
    let mut sections: BTreeMap<String, BTreeMap<String, FileItem>> = BTreeMap::new();
    for item in items {
        sections
            .entry(item.storage().to_string())
            .or_default()
            .insert(item.name().to_string(), FileItem::from(item));
    }
    toml::to_string_pretty(&sections)
}

/// Write items in the inventory file format to a writer
pub fn write<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    mut write: impl std::io::Write,
) -> std::io::Result<()> {
    let toml_string = to_string(items).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    write.write_all(toml_string.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn find<'a>(items: &'a [Item], name: &str) -> &'a Item {
        items.iter().find(|i| i.name() == name).unwrap()
    }

    #[test]
    fn basic_inventory() {
        let input = indoc! {r#"
            default_shelf_life = "P1W"

            [pantry]
            rice = "2%kg"
            beans = { quantity = "500%g", shelf_life = "1 year", price = 1.99, protein = "9%g", calories = 110 }

            [fridge]
            milk = { quantity = "1%gal", expire = "2024-05-10", merchant = "Corner Shop" }

            [freezer]
            peas = { quantity = "1 lb", expire = 2024-12-01, serving_size = "85%g" }
        "#};
        let items = parse_on(input, today()).unwrap();
        assert_eq!(items.len(), 4);

        let rice = find(&items, "rice");
        assert_eq!(rice.storage(), StorageType::Pantry);
        assert_eq!(rice.quantity(), &Quantity::new(2.0, Unit::Kilograms).unwrap());
        assert_eq!(
            rice.expiration_date(),
            NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()
        );

        let beans = find(&items, "beans");
        assert_eq!(beans.shelf_life(), Some(ShelfLife::from_days(365)));
        assert_eq!(beans.price(), Some(1.99));
        assert_eq!(beans.per_serving_macros()[Macro::Protein].magnitude(), 9.0);
        assert_eq!(
            beans.per_serving_macros()[Macro::Calories],
            Quantity::new(110.0, Unit::Kilocalories).unwrap()
        );

        let milk = find(&items, "milk");
        assert_eq!(milk.storage(), StorageType::Fridge);
        assert_eq!(milk.merchant(), Some("Corner Shop"));
        assert_eq!(
            milk.expiration_date(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );

        let peas = find(&items, "peas");
        assert_eq!(peas.storage(), StorageType::Freezer);
        assert_eq!(peas.serving_size().unit(), Unit::Grams);
        assert_eq!(
            peas.expiration_date(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
    }

    #[test]
    fn empty_file() {
        assert!(parse_on("", today()).unwrap().is_empty());
    }

    #[test]
    fn string_item_needs_shelf_life() {
        let err = parse_on("[pantry]\nrice = \"2%kg\"", today()).unwrap_err();
        assert_eq!(
            err,
            InventoryFileError::Item {
                section: "pantry".into(),
                item: "rice".into(),
                source: ValidationError::MissingExpiration,
            }
        );
    }

    #[test]
    fn strict_errors() {
        assert!(matches!(
            parse_on("[cellar]\nwine = \"1%L\"", today()),
            Err(InventoryFileError::UnknownSection(_))
        ));
        assert!(matches!(
            parse_on("[pantry]\nrice = 2", today()),
            Err(InventoryFileError::InvalidItem { .. })
        ));
        assert!(matches!(
            parse_on(
                "[pantry]\nrice = { quantity = \"1%kg\", expire = \"2024-06-01\", color = \"white\" }",
                today()
            ),
            Err(InventoryFileError::UnknownField { .. })
        ));
        assert!(matches!(
            parse_on("default_shelf_life = \"soon\"", today()),
            Err(InventoryFileError::DefaultShelfLife(_))
        ));
        assert!(matches!(
            parse_on("[pantry", today()),
            Err(InventoryFileError::Parse { .. })
        ));
        assert!(matches!(
            parse_on(
                "[pantry]\nrice = { quantity = \"1%kg\", expire = \"01.06.2024\" }",
                today()
            ),
            Err(InventoryFileError::Item {
                source: ValidationError::WrongType { .. },
                ..
            })
        ));
        assert!(matches!(
            parse_on(
                "[pantry]\nrice = { expire = \"2024-06-01\" }",
                today()
            ),
            Err(InventoryFileError::Item {
                source: ValidationError::MissingField { .. },
                ..
            })
        ));
    }

    #[test]
    fn shelf_life_past_the_calendar() {
        for input in [
            "[pantry]\nsalt = { quantity = \"1%kg\", shelf_life = 3000000000 }",
            "[pantry]\nsalt = { quantity = \"1%kg\", shelf_life = 2000000000 }",
            "default_shelf_life = \"P1000000Y\"\n[pantry]\nsalt = \"1%kg\"",
        ] {
            assert!(matches!(
                parse_on(input, today()),
                Err(InventoryFileError::Item {
                    source: ValidationError::InvalidShelfLife(_),
                    ..
                })
            ));
        }
    }

    #[test]
    fn lenient_collects_warnings() {
        let input = indoc! {r#"
            default_shelf_life = "10"

            [pantry]
            rice = "2%kg"
            flour = "lots"
            sugar = { quantity = "1%kg", color = "white", texture = "fine" }

            [cellar]
            wine = "1%L"
        "#};
        let parsed = parse_lenient_on(input, today()).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert!(parsed.has_warnings());
        // flour, color, texture and cellar
        assert_eq!(parsed.warnings.len(), 4);
    }

    #[test]
    fn roundtrip() {
        let input = indoc! {r#"
            [pantry]
            beans = { quantity = "500%g", expire = "2025-05-01", price = 1.99, protein = "9%g", calories = "110%kcal", serving_size = "45%g" }
            eggs = { quantity = "12", expire = "2024-05-20" }

            [fridge]
            milk = { quantity = "1%gal", expire = "2024-05-10", merchant = "Corner Shop" }
            cream = { quantity = "8%fl oz", expire = "2024-05-12" }
        "#};
        let items = parse_on(input, today()).unwrap();
        let serialized = to_string(&items).unwrap();
        let again = parse_on(&serialized, today()).unwrap();
        assert_eq!(items.len(), again.len());
        for item in &items {
            let other = find(&again, item.name());
            assert_eq!(item, other);
            assert_eq!(item.quantity(), other.quantity());
            assert_eq!(item.storage(), other.storage());
            assert_eq!(item.price(), other.price());
            assert_eq!(item.merchant(), other.merchant());
            assert_eq!(item.serving_size(), other.serving_size());
            assert_eq!(item.per_serving_macros(), other.per_serving_macros());
        }

        let mut buffer = Vec::new();
        write(&items, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), serialized);
    }
}
