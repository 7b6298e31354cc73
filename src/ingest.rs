//! Records from external agents
//!
//! The receipt extractor and the recipe generator answer with untyped JSON.
//! Nothing here trusts its shape: every field is checked on its own and the
//! errors name the offending field.
//!
//! A `null` in an optional field is the same as the field not being there.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    convert::{Converter, Unit},
    error::ValidationError,
    item::{Item, StorageType},
    nutrition::Macro,
    quantity::{Quantity, RawQuantity},
    receipt::{Receipt, ReceiptItem, ReceiptLine},
    recipe::{Instructions, RecipeRequest, RecipeRequestParts},
    shelf_life::{parse_shelf_life, ShelfLife},
};

type Object = Map<String, Value>;

/// What a user wants from a generated recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub dietary_restrictions: Vec<String>,
    pub favorite_cuisines: Vec<String>,
    pub favorite_recipes: Vec<String>,
    pub kitchen_appliances: Vec<String>,
    pub number_of_people: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            favorite_cuisines: Vec::new(),
            favorite_recipes: Vec::new(),
            kitchen_appliances: Vec::new(),
            number_of_people: 1,
        }
    }
}

/// Turns a picture of a receipt into a receipt record
pub trait ReceiptExtractor {
    fn extract(&self, image: &[u8]) -> anyhow::Result<Value>;
}

impl<F> ReceiptExtractor for F
where
    F: Fn(&[u8]) -> anyhow::Result<Value>,
{
    fn extract(&self, image: &[u8]) -> anyhow::Result<Value> {
        self(image)
    }
}

/// Proposes a recipe record for the available items
pub trait RecipeGenerator {
    fn generate(&self, items: &[Item], preferences: &UserPreferences) -> anyhow::Result<Value>;
}

impl<F> RecipeGenerator for F
where
    F: Fn(&[Item], &UserPreferences) -> anyhow::Result<Value>,
{
    fn generate(&self, items: &[Item], preferences: &UserPreferences) -> anyhow::Result<Value> {
        self(items, preferences)
    }
}

/// Error talking to an agent
#[derive(Debug, Error)]
pub enum IngestError {
    /// The agent itself failed
    #[error("Agent failed: {0:#}")]
    Agent(anyhow::Error),
    /// The agent answered with an invalid record
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Extracts a receipt from an image and validates it
#[tracing::instrument(level = "debug", skip_all, fields(image_len = image.len()))]
pub fn ingest_receipt(
    extractor: &impl ReceiptExtractor,
    image: &[u8],
) -> Result<Receipt, IngestError> {
    let value = extractor.extract(image).map_err(IngestError::Agent)?;
    let receipt = receipt_from_value(&text_payload(value)?).map_err(|err| {
        tracing::warn!("invalid receipt from extractor: {err}");
        err
    })?;
    tracing::debug!(
        merchant = receipt.merchant(),
        lines = receipt.items().len(),
        "receipt ingested"
    );
    Ok(receipt)
}

/// Asks for a recipe with the given items and validates it
///
/// The nutrition of the returned request is not computed, use
/// [`RecipeRequest::update_nutritional_facts`] with the same items.
#[tracing::instrument(level = "debug", skip_all, fields(items = items.len()))]
pub fn generate_recipe(
    generator: &impl RecipeGenerator,
    items: &[Item],
    preferences: &UserPreferences,
) -> Result<RecipeRequest, IngestError> {
    let value = generator
        .generate(items, preferences)
        .map_err(IngestError::Agent)?;
    let recipe = recipe_request_from_value(&text_payload(value)?).map_err(|err| {
        tracing::warn!("invalid recipe from generator: {err}");
        err
    })?;
    tracing::debug!(recipe = recipe.name(), "recipe generated");
    Ok(recipe)
}

/// Agents sometimes answer with the JSON document as a string
fn text_payload(value: Value) -> Result<Value, ValidationError> {
    match value {
        Value::String(text) => parse_json(&text),
        other => Ok(other),
    }
}

/// One line per item, as given to the recipe generator
///
/// ```
/// # use larder::{convert::Unit, item::{Item, StorageType}, nutrition::Macro, quantity::Quantity};
/// let rice = Item::builder("rice", Quantity::new(2.0, Unit::Kilograms).unwrap(), StorageType::Pantry)
///     .shelf_life_text("1 year")
///     .macro_(Macro::Protein, Quantity::new(2.6, Unit::Grams).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(
///     larder::ingest::describe_for_prompt(&[rice]),
///     "rice: 2 kg, (per serving: 0 calories, 2.6g protein, 0g carbs, 0g fat)"
/// );
/// ```
pub fn describe_for_prompt(items: &[Item]) -> String {
    let grams = |m: Macro, item: &Item| {
        let q = item.per_serving_macros()[m];
        let grams = q
            .convert_to(Unit::Grams, Converter::global())
            .unwrap_or(q)
            .magnitude();
        round3(grams)
    };
    items
        .iter()
        .map(|item| {
            format!(
                "{}: {}, (per serving: {} calories, {}g protein, {}g carbs, {}g fat)",
                item.name(),
                item.quantity(),
                round3(item.per_serving_macros()[Macro::Calories].magnitude()),
                grams(Macro::Protein, item),
                grams(Macro::Carbohydrate, item),
                grams(Macro::Fat, item),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn round3(n: f64) -> f64 {
    (n * 1000.0).round() / 1000.0
}

/// Extracts the JSON document from an agent answer
///
/// Answers are sometimes wrapped in a markdown code block.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let body = if let Some(start) = text.find("```json") {
        &text[start + "```json".len()..]
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn parse_json(text: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// [`receipt_from_value`] from JSON text
pub fn receipt_from_json(text: &str) -> Result<Receipt, ValidationError> {
    receipt_from_value(&parse_json(text)?)
}

/// [`item_from_value`] from JSON text
pub fn item_from_json(text: &str) -> Result<Item, ValidationError> {
    item_from_value(&parse_json(text)?)
}

/// [`recipe_request_from_value`] from JSON text
pub fn recipe_request_from_json(text: &str) -> Result<RecipeRequest, ValidationError> {
    recipe_request_from_value(&parse_json(text)?)
}

fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Object, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type(field, "an object"))
}

/// `null` is the same as absent
fn optional<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn optional_any<'a>(obj: &'a Object, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| optional(obj, key).map(|value| (*key, value)))
}

fn required<'a>(obj: &'a Object, key: &str) -> Result<&'a Value, ValidationError> {
    optional(obj, key).ok_or_else(|| ValidationError::missing(key))
}

fn string_value<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::wrong_type(field, "a string"))
}

fn number_value(field: &str, value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| ValidationError::wrong_type(field, "a number"))
}

fn date_value(field: &str, value: &Value) -> Result<NaiveDate, ValidationError> {
    let text = string_value(field, value)?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::wrong_type(field, "an ISO date"))
}

fn uuid_value(field: &str, value: &Value) -> Result<Uuid, ValidationError> {
    let text = string_value(field, value)?;
    Uuid::parse_str(text.trim()).map_err(|_| ValidationError::wrong_type(field, "a UUID"))
}

/// A quantity object, a quantity string like `"1.5 lb"` or a bare number in
/// `default_unit`
fn quantity_value(field: &str, value: &Value, default_unit: Unit) -> Result<Quantity, ValidationError> {
    match value {
        Value::String(text) => text.parse(),
        Value::Number(_) => Quantity::new(number_value(field, value)?, default_unit),
        Value::Object(_) => {
            let raw = RawQuantity::deserialize(value)
                .map_err(|_| ValidationError::wrong_type(field, "a quantity"))?;
            Quantity::try_from(raw)
        }
        _ => Err(ValidationError::wrong_type(field, "a quantity")),
    }
}

/// Validates a shelf life from an untyped record
///
/// Only text is accepted, see [`parse_shelf_life`]. Numbers and `null` are
/// rejected.
pub fn shelf_life_from_value(value: &Value) -> Result<ShelfLife, ValidationError> {
    match value {
        Value::String(text) => parse_shelf_life(text),
        other => Err(ValidationError::InvalidShelfLife(other.to_string())),
    }
}

/// Validates an item record
///
/// Required fields are `name`, `quantity` and `storage`, plus one of
/// `expiration_date` and `shelf_life`. The optional ones are `id`, `price`,
/// `merchant`, `serving_size` and `per_serving_macros` (or `nutrition`).
pub fn item_from_value(value: &Value) -> Result<Item, ValidationError> {
    item_from_value_on(value, crate::today())
}

/// [`item_from_value`] as if it was `today`
pub fn item_from_value_on(value: &Value, today: NaiveDate) -> Result<Item, ValidationError> {
    let obj = as_object(value, "item")?;
    item_from_object(obj, today, None)
}

/// Defaults for items found in a receipt line
struct LineDefaults<'a> {
    price: f64,
    merchant: &'a str,
}

fn item_from_object(
    obj: &Object,
    today: NaiveDate,
    line: Option<&LineDefaults>,
) -> Result<Item, ValidationError> {
    let name = string_value("name", required(obj, "name")?)?;
    let quantity = quantity_value("quantity", required(obj, "quantity")?, Unit::None)?;
    let storage = string_value("storage", required(obj, "storage")?)?
        .parse::<StorageType>()
        .map_err(|_| ValidationError::wrong_type("storage", "pantry, fridge or freezer"))?;

    let mut builder = Item::builder(name, quantity, storage);

    if let Some(id) = optional_any(obj, &["id", "item_id"]) {
        builder = builder.id(uuid_value(id.0, id.1)?);
    }
    match optional(obj, "price") {
        Some(price) => builder = builder.price(number_value("price", price)?),
        None => {
            if let Some(line) = line {
                builder = builder.price(line.price);
            }
        }
    }
    match optional(obj, "merchant") {
        Some(merchant) => builder = builder.merchant(string_value("merchant", merchant)?),
        None => {
            if let Some(line) = line {
                builder = builder.merchant(line.merchant);
            }
        }
    }
    if let Some(serving_size) = optional(obj, "serving_size") {
        builder = builder.serving_size(quantity_value("serving_size", serving_size, Unit::None)?);
    }
    if let Some((field, macros)) = optional_any(obj, &["per_serving_macros", "nutrition"]) {
        for (key, value) in as_object(macros, field)? {
            if value.is_null() {
                continue;
            }
            let macro_kind = key
                .parse::<Macro>()
                .map_err(|_| ValidationError::wrong_type(format!("{field}.{key}"), "a macro"))?;
            let quantity = quantity_value(&format!("{field}.{key}"), value, macro_kind.unit())?;
            builder = builder.macro_(macro_kind, quantity);
        }
    }
    if let Some(date) = optional(obj, "expiration_date") {
        builder = builder.expires_on(date_value("expiration_date", date)?);
    }
    if let Some(shelf_life) = obj.get("shelf_life") {
        // a present null is absent, other non text values are invalid
        if !shelf_life.is_null() {
            builder = builder.shelf_life(shelf_life_from_value(shelf_life)?);
        }
    }

    builder.build_on(today)
}

/// Validates a receipt record
///
/// `merchant` must be a string and `items` a list. Every line has a `price`
/// and an `item`, which is either a full item record or just a name. Items
/// without their own price or merchant take the ones of the line.
///
/// The receipt is dated with the record's `date` if any, today otherwise.
pub fn receipt_from_value(value: &Value) -> Result<Receipt, ValidationError> {
    receipt_from_value_on(value, crate::today())
}

/// [`receipt_from_value`] as if it was `today`
pub fn receipt_from_value_on(value: &Value, today: NaiveDate) -> Result<Receipt, ValidationError> {
    let obj = as_object(value, "receipt")?;
    let merchant = string_value("merchant", required(obj, "merchant")?)?;
    let lines = required(obj, "items")?
        .as_array()
        .ok_or_else(|| ValidationError::wrong_type("items", "a list"))?;
    let date = optional(obj, "date")
        .map(|d| date_value("date", d))
        .transpose()?
        .unwrap_or(today);

    let mut items = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let field = |name: &str| format!("items[{index}].{name}");
        let line = line
            .as_object()
            .ok_or_else(|| ValidationError::wrong_type(format!("items[{index}]"), "an object"))?;
        let price = optional(line, "price")
            .ok_or_else(|| ValidationError::missing(field("price")))?
            .as_f64()
            .ok_or_else(|| ValidationError::wrong_type(field("price"), "a number"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::InvalidPrice(price));
        }
        let line = match optional(line, "item") {
            Some(Value::Object(item)) => {
                let defaults = LineDefaults { price, merchant };
                ReceiptLine::Item(item_from_object(item, today, Some(&defaults))?)
            }
            Some(Value::String(name)) if !name.trim().is_empty() => ReceiptLine::Bare {
                name: name.trim().to_string(),
                quantity: optional(line, "quantity")
                    .map(|q| quantity_value(&field("quantity"), q, Unit::None))
                    .transpose()?,
            },
            Some(Value::String(_)) => return Err(ValidationError::EmptyName),
            Some(_) => return Err(ValidationError::wrong_type(field("item"), "an object or a name")),
            None => return Err(ValidationError::missing(field("item"))),
        };
        items.push(ReceiptItem { price, line });
    }

    Ok(Receipt::new_on(merchant, items, date))
}

/// Validates a recipe record
///
/// Keys are `name`, `description`, `instructions` and `ingredients`, with an
/// optional `recipe_` prefix. Instructions are an object of numbered steps or
/// a list, numbered from 1. Ingredients are an object from name to quantity
/// or a list of `{ "name", "quantity" }`.
///
/// Nutrition in the record is ignored, it is computed from the inventory.
pub fn recipe_request_from_value(value: &Value) -> Result<RecipeRequest, ValidationError> {
    let obj = as_object(value, "recipe")?;

    let id = optional_any(obj, &["id", "recipe_id"])
        .map(|(field, v)| uuid_value(field, v))
        .transpose()?;
    let name = match optional_any(obj, &["name", "recipe_name"]) {
        Some((field, v)) => string_value(field, v)?,
        None => return Err(ValidationError::missing("name")),
    };
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let description = optional_any(obj, &["description", "recipe_description"])
        .map(|(field, v)| string_value(field, v))
        .transpose()?
        .unwrap_or_default();
    let instructions = match optional_any(obj, &["instructions", "recipe_instructions"]) {
        Some((field, v)) => instructions_value(field, v)?,
        None => return Err(ValidationError::missing("instructions")),
    };
    let ingredients = match optional_any(obj, &["ingredients", "recipe_ingredients"]) {
        Some((field, v)) => ingredients_value(field, v)?,
        None => return Err(ValidationError::missing("ingredients")),
    };

    RecipeRequest::new(RecipeRequestParts {
        id,
        name: name.trim().to_string(),
        description: description.to_string(),
        instructions,
        ingredients,
    })
}

fn instructions_value(field: &str, value: &Value) -> Result<Instructions, ValidationError> {
    let mut instructions = Instructions::new();
    let mut push = |number: u32, text: &Value| -> Result<(), ValidationError> {
        let text = string_value(&format!("{field}.{number}"), text)?;
        if instructions.insert(number, text.to_string()).is_some() {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                entry: format!("step {number}"),
            });
        }
        Ok(())
    };
    match value {
        Value::Object(steps) => {
            for (key, text) in steps {
                let number = key
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ValidationError::wrong_type(field, "numbered steps"))?;
                push(number, text)?;
            }
        }
        Value::Array(steps) => {
            for (text, number) in steps.iter().zip(1u32..) {
                push(number, text)?;
            }
        }
        _ => return Err(ValidationError::wrong_type(field, "numbered steps")),
    }
    Ok(instructions)
}

fn ingredients_value(field: &str, value: &Value) -> Result<IndexMap<String, Quantity>, ValidationError> {
    let mut ingredients: IndexMap<String, Quantity> = IndexMap::new();
    let mut push = |name: &str, quantity: Quantity| -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        // names match ignoring case when checked against the inventory
        let key = name.to_lowercase();
        if ingredients.keys().any(|other| other.to_lowercase() == key) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                entry: name.to_string(),
            });
        }
        ingredients.insert(name.to_string(), quantity);
        Ok(())
    };
    match value {
        Value::Object(entries) => {
            for (name, quantity) in entries {
                push(
                    name,
                    quantity_value(&format!("{field}.{name}"), quantity, Unit::None)?,
                )?;
            }
        }
        Value::Array(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                let entry_field = format!("{field}[{index}]");
                let entry = as_object(entry, &entry_field)?;
                let name = string_value(
                    &format!("{entry_field}.name"),
                    required(entry, "name")
                        .map_err(|_| ValidationError::missing(format!("{entry_field}.name")))?,
                )?;
                let quantity = required(entry, "quantity")
                    .map_err(|_| ValidationError::missing(format!("{entry_field}.quantity")))?;
                push(
                    name,
                    quantity_value(&format!("{entry_field}.quantity"), quantity, Unit::None)?,
                )?;
            }
        }
        _ => return Err(ValidationError::wrong_type(field, "an object or a list")),
    }
    Ok(ingredients)
}
