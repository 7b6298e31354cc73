//! Recipes, their nutrition and whether they can be cooked
//!
//! There are two flavours:
//! - [`Recipe`] holds the actual [`Item`]s. Its nutrition is computed once,
//!   when it is created.
//! - [`RecipeRequest`] only names its ingredients, like the output of a
//!   recipe generator. Names are resolved against an inventory when asked.

use std::{cmp::Ordering, collections::BTreeMap, fmt::Display};

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    convert::Converter,
    error::{Error, ValidationError},
    inventory::Inventory,
    item::Item,
    nutrition::{default_macro_table, MacroTable},
    quantity::{Quantity, QuantityError},
};

/// Numbered steps of a recipe
pub type Instructions = BTreeMap<u32, String>;

/// Everything needed to create a [`Recipe`]
#[derive(Debug, Clone, Default)]
pub struct RecipeParts {
    /// A fresh one is generated if not given
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub instructions: Instructions,
    /// Required amount of every item
    pub ingredients: IndexMap<Item, Quantity>,
}

/// A recipe made with known inventory items
#[derive(Debug, Clone)]
pub struct Recipe {
    id: Uuid,
    name: String,
    description: String,
    instructions: Instructions,
    ingredients: IndexMap<Item, Quantity>,
    nutritional_facts: MacroTable,
}

/// Everything needed to create a [`RecipeRequest`]
#[derive(Debug, Clone, Default)]
pub struct RecipeRequestParts {
    /// A fresh one is generated if not given
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub instructions: Instructions,
    /// Required amount by ingredient name
    pub ingredients: IndexMap<String, Quantity>,
}

/// A recipe that references its ingredients by name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRequest {
    id: Uuid,
    name: String,
    description: String,
    instructions: Instructions,
    ingredients: IndexMap<String, Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nutritional_facts: Option<MacroTable>,
}

/// Result of checking if a recipe can be cooked
///
/// A recipe is feasible when every ingredient is covered. This is a value, a
/// recipe that cannot be cooked is not an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feasibility {
    shortfalls: Vec<Shortfall>,
}

/// An ingredient that is not covered
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub ingredient: String,
    pub required: Quantity,
    pub reason: ShortfallReason,
}

/// Why an ingredient is not covered
#[derive(Debug, Clone, PartialEq)]
pub enum ShortfallReason {
    /// There is some, but not enough
    Insufficient { on_hand: Quantity },
    /// There is none
    Missing,
    /// The amounts cannot be compared
    Unconvertible(QuantityError),
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        self.shortfalls.is_empty()
    }

    pub fn shortfalls(&self) -> &[Shortfall] {
        &self.shortfalls
    }

    pub fn into_shortfalls(self) -> Vec<Shortfall> {
        self.shortfalls
    }

    fn push(&mut self, recipe: &str, shortfall: Shortfall) {
        tracing::warn!(
            recipe,
            ingredient = %shortfall.ingredient,
            required = %shortfall.required,
            reason = %shortfall.reason,
            "ingredient not covered"
        );
        self.shortfalls.push(shortfall);
    }
}

impl Display for ShortfallReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortfallReason::Insufficient { on_hand } => write!(f, "only {on_hand} on hand"),
            ShortfallReason::Missing => write!(f, "not in the inventory"),
            ShortfallReason::Unconvertible(err) => write!(f, "{err}"),
        }
    }
}

impl Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.ingredient, self.required, self.reason)
    }
}

/// `None` when `on_hand` covers `required`
fn cover(on_hand: &Quantity, required: &Quantity, converter: &Converter) -> Option<ShortfallReason> {
    match on_hand.compare(required, converter) {
        Ok(Ordering::Less) => Some(ShortfallReason::Insufficient { on_hand: *on_hand }),
        Ok(_) => None,
        Err(err) => Some(ShortfallReason::Unconvertible(err)),
    }
}

/// Adds up the lots that can be measured against `required`
///
/// The total is in the unit of the first counted lot. `Ok(None)` when there
/// are no lots, an error when none of them could be counted.
fn sum_lots<'a>(
    ingredient: &str,
    lots: impl Iterator<Item = &'a Item>,
    required: &Quantity,
    converter: &Converter,
) -> Result<Option<Quantity>, QuantityError> {
    let mut total: Option<Quantity> = None;
    let mut skipped = None;
    for lot in lots {
        let counted = match total {
            None => lot.quantity().compare(required, converter).map(|_| *lot.quantity()),
            Some(total) => total.add(lot.quantity(), converter),
        };
        match counted {
            Ok(quantity) => total = Some(quantity),
            Err(err) => {
                tracing::debug!(ingredient, lot = %lot.quantity(), "lot not counted: {err}");
                skipped.get_or_insert(err);
            }
        }
    }
    match (total, skipped) {
        (None, Some(err)) => Err(err),
        (total, _) => Ok(total),
    }
}

fn check_parts(instructions: &Instructions, ingredients_empty: bool) -> Result<(), ValidationError> {
    if instructions.is_empty() {
        return Err(ValidationError::EmptyCollection {
            field: "instructions",
        });
    }
    if ingredients_empty {
        return Err(ValidationError::EmptyCollection {
            field: "ingredients",
        });
    }
    Ok(())
}

fn check_scale_factor(factor: f64) -> Result<(), ValidationError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ValidationError::InvalidScaleFactor(factor));
    }
    Ok(())
}

/// Sums the per-serving macros of every item times the servings required
fn compute_nutrition<'a>(
    ingredients: impl IntoIterator<Item = (&'a Item, &'a Quantity)>,
    converter: &Converter,
) -> Result<MacroTable, QuantityError> {
    let mut table = default_macro_table();
    for (item, required) in ingredients {
        let servings = required.ratio(item.serving_size(), converter)?;
        table.accumulate_scaled(item.per_serving_macros(), servings, converter)?;
    }
    Ok(table)
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Recipe {
    /// Creates a new recipe and computes its nutrition
    ///
    /// Instructions and ingredients cannot be empty. Errors computing the
    /// nutrition, like a requirement that cannot be compared to the item's
    /// serving size, are returned.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %parts.name))]
    pub fn new(parts: RecipeParts, converter: &Converter) -> Result<Self, Error> {
        check_parts(&parts.instructions, parts.ingredients.is_empty())?;
        let nutritional_facts = compute_nutrition(&parts.ingredients, converter)?;
        Ok(Self {
            id: parts.id.unwrap_or_else(Uuid::new_v4),
            name: parts.name,
            description: parts.description,
            instructions: parts.instructions,
            ingredients: parts.ingredients,
            nutritional_facts,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    pub fn ingredients(&self) -> &IndexMap<Item, Quantity> {
        &self.ingredients
    }

    /// Nutrition of the whole recipe
    pub fn nutritional_facts(&self) -> &MacroTable {
        &self.nutritional_facts
    }

    /// Checks every ingredient against the item's on-hand quantity
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %self.name))]
    pub fn feasibility(&self, converter: &Converter) -> Feasibility {
        let mut feasibility = Feasibility::default();
        for (item, required) in &self.ingredients {
            if let Some(reason) = cover(item.quantity(), required, converter) {
                feasibility.push(
                    &self.name,
                    Shortfall {
                        ingredient: item.name().to_string(),
                        required: *required,
                        reason,
                    },
                );
            }
        }
        feasibility
    }

    /// `true` if every ingredient is covered
    pub fn is_feasible(&self, converter: &Converter) -> bool {
        self.feasibility(converter).is_feasible()
    }

    /// Same recipe with every requirement multiplied by `factor`
    ///
    /// The nutrition is computed again. The id is kept.
    pub fn scaled(&self, factor: f64, converter: &Converter) -> Result<Self, Error> {
        check_scale_factor(factor)?;
        let ingredients: IndexMap<Item, Quantity> = self
            .ingredients
            .iter()
            .map(|(item, q)| (item.clone(), q.scale(factor)))
            .collect();
        let nutritional_facts = compute_nutrition(&ingredients, converter)?;
        Ok(Self {
            ingredients,
            nutritional_facts,
            ..self.clone()
        })
    }
}

impl RecipeRequest {
    /// Creates a new request
    ///
    /// Instructions and ingredients cannot be empty. The nutrition is not
    /// computed, see [`RecipeRequest::update_nutritional_facts`].
    pub fn new(parts: RecipeRequestParts) -> Result<Self, ValidationError> {
        check_parts(&parts.instructions, parts.ingredients.is_empty())?;
        Ok(Self {
            id: parts.id.unwrap_or_else(Uuid::new_v4),
            name: parts.name,
            description: parts.description,
            instructions: parts.instructions,
            ingredients: parts.ingredients,
            nutritional_facts: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    pub fn ingredients(&self) -> &IndexMap<String, Quantity> {
        &self.ingredients
    }

    /// Last computed nutrition, if any
    pub fn nutritional_facts(&self) -> Option<&MacroTable> {
        self.nutritional_facts.as_ref()
    }

    /// Checks every ingredient against the given items
    ///
    /// Names are matched ignoring case. When more than one item matches, the
    /// on-hand quantities of all of them are added up.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %self.name))]
    pub fn check_feasibility<'a>(
        &self,
        items: impl IntoIterator<Item = &'a Item>,
        converter: &Converter,
    ) -> Feasibility {
        let items: Vec<&Item> = items.into_iter().collect();
        let mut feasibility = Feasibility::default();
        for (name, required) in &self.ingredients {
            let lots = items
                .iter()
                .copied()
                .filter(|item| same_name(item.name(), name));
            let reason = match sum_lots(name, lots, required, converter) {
                Ok(Some(on_hand)) => cover(&on_hand, required, converter),
                Ok(None) => Some(ShortfallReason::Missing),
                Err(err) => Some(ShortfallReason::Unconvertible(err)),
            };
            if let Some(reason) = reason {
                feasibility.push(
                    &self.name,
                    Shortfall {
                        ingredient: name.clone(),
                        required: *required,
                        reason,
                    },
                );
            }
        }
        feasibility
    }

    /// [`RecipeRequest::check_feasibility`] with the items of an [`Inventory`]
    pub fn check_feasibility_in(
        &self,
        inventory: &impl Inventory,
        converter: &Converter,
    ) -> Feasibility {
        self.check_feasibility(inventory.list_items(), converter)
    }

    /// `true` if every ingredient is covered by the given items
    pub fn is_feasible<'a>(
        &self,
        items: impl IntoIterator<Item = &'a Item>,
        converter: &Converter,
    ) -> bool {
        self.check_feasibility(items, converter).is_feasible()
    }

    /// Computes the nutrition with the given items and stores it
    ///
    /// The first item matching each ingredient name provides the per-serving
    /// macros and serving size. Ingredients with no matching item are skipped.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %self.name))]
    pub fn update_nutritional_facts<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a Item>,
        converter: &Converter,
    ) -> Result<(), Error> {
        let items: Vec<&Item> = items.into_iter().collect();
        let mut resolved = Vec::with_capacity(self.ingredients.len());
        for (name, required) in &self.ingredients {
            match items.iter().find(|item| same_name(item.name(), name)) {
                Some(item) => resolved.push((*item, required)),
                None => tracing::warn!(
                    recipe = %self.name,
                    ingredient = %name,
                    "ingredient not in the inventory, skipped for nutrition"
                ),
            }
        }
        self.nutritional_facts = Some(compute_nutrition(resolved, converter)?);
        Ok(())
    }

    /// Same request with every requirement multiplied by `factor`
    ///
    /// The stored nutrition is dropped because it no longer applies.
    pub fn scaled(&self, factor: f64) -> Result<Self, ValidationError> {
        check_scale_factor(factor)?;
        Ok(Self {
            ingredients: self
                .ingredients
                .iter()
                .map(|(name, q)| (name.clone(), q.scale(factor)))
                .collect(),
            nutritional_facts: None,
            ..self.clone()
        })
    }
}
