//! Where items are kept
//!
//! [`Inventory`] is the read side and [`InventoryStore`] the write side of a
//! per-user item store. Items are addressed by name, ignoring case.
//!
//! [`MemoryInventory`] is an in-memory implementation. Its keys follow the
//! `"{user_id}/{name}"` layout of the document store.

use std::convert::Infallible;

use chrono::NaiveDate;
use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    convert::Converter,
    error::Error,
    item::Item,
    quantity::Quantity,
};

#[cfg(feature = "config_files")]
pub mod file;

/// Read access to the items of a user
pub trait Inventory {
    /// Find an item by name, ignoring case
    fn get_item_by_name(&self, name: &str) -> Result<&Item, NotFoundError>;

    /// Every item
    fn list_items(&self) -> Vec<&Item>;
}

/// Write access to the items of a user
///
/// Both operations are idempotent: saving the same item twice leaves one copy
/// and deleting a missing item is not an error.
pub trait InventoryStore: Inventory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert or replace the item with the same name
    fn save_item(&mut self, item: Item) -> Result<(), Self::Error>;

    /// Remove the item with this name, if any
    fn delete_item(&mut self, name: &str) -> Result<(), Self::Error>;
}

/// Error when an item is not in the inventory
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Item '{name}' not found")]
pub struct NotFoundError {
    pub name: String,
}

/// In-memory [`InventoryStore`] for a single user
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    user_id: String,
    items: IndexMap<String, Item>,
}

impl MemoryInventory {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: IndexMap::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Storage key of an item name
    pub fn key_for(&self, name: &str) -> String {
        format!("{}/{}", self.user_id, name.trim().to_lowercase())
    }

    /// Every storage key, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Takes `amount` from the item with this name
    pub fn consume(
        &mut self,
        name: &str,
        amount: &Quantity,
        converter: &Converter,
    ) -> Result<&Item, Error> {
        let key = self.key_for(name);
        let item = self.items.get_mut(&key).ok_or_else(|| NotFoundError {
            name: name.to_string(),
        })?;
        item.consume(amount, converter)?;
        Ok(&*item)
    }

    /// Removes and returns the items expired at `today`
    pub fn remove_expired(&mut self, today: NaiveDate) -> Vec<Item> {
        self.remove_where(|item| item.is_expired_at(today))
    }

    /// Removes and returns the items with nothing left
    pub fn remove_depleted(&mut self) -> Vec<Item> {
        self.remove_where(Item::is_depleted)
    }

    fn remove_where(&mut self, mut pred: impl FnMut(&Item) -> bool) -> Vec<Item> {
        let mut removed = Vec::new();
        self.items.retain(|key, item| {
            if pred(&*item) {
                tracing::debug!(key = %key, "removing item");
                removed.push(item.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

impl Inventory for MemoryInventory {
    fn get_item_by_name(&self, name: &str) -> Result<&Item, NotFoundError> {
        self.items.get(&self.key_for(name)).ok_or_else(|| NotFoundError {
            name: name.to_string(),
        })
    }

    fn list_items(&self) -> Vec<&Item> {
        self.items.values().collect()
    }
}

impl InventoryStore for MemoryInventory {
    type Error = Infallible;

    fn save_item(&mut self, item: Item) -> Result<(), Self::Error> {
        let key = self.key_for(item.name());
        tracing::debug!(key = %key, "saving item");
        self.items.insert(key, item);
        Ok(())
    }

    fn delete_item(&mut self, name: &str) -> Result<(), Self::Error> {
        let key = self.key_for(name);
        if self.items.shift_remove(&key).is_some() {
            tracing::debug!(key = %key, "deleted item");
        }
        Ok(())
    }
}

impl Extend<Item> for MemoryInventory {
    fn extend<T: IntoIterator<Item = Item>>(&mut self, iter: T) {
        for item in iter {
            let key = self.key_for(item.name());
            self.items.insert(key, item);
        }
    }
}
