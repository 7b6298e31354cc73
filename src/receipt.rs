//! Purchase receipts

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{item::Item, quantity::Quantity};

/// A purchase at a merchant
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    receipt_id: Uuid,
    merchant: String,
    date: NaiveDate,
    items: Vec<ReceiptItem>,
}

/// A line of a [`Receipt`] with its price
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptItem {
    pub price: f64,
    pub line: ReceiptLine,
}

/// What was bought
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptLine {
    /// A full inventory item
    Item(Item),
    /// Just a name and, maybe, an amount
    Bare {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        quantity: Option<Quantity>,
    },
}

impl ReceiptLine {
    pub fn name(&self) -> &str {
        match self {
            ReceiptLine::Item(item) => item.name(),
            ReceiptLine::Bare { name, .. } => name,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ReceiptLine::Item(item) => Some(item),
            ReceiptLine::Bare { .. } => None,
        }
    }
}

impl Receipt {
    /// New receipt dated today with a fresh id
    pub fn new(merchant: impl Into<String>, items: Vec<ReceiptItem>) -> Self {
        Self::new_on(merchant, items, crate::today())
    }

    /// New receipt with a fresh id
    pub fn new_on(merchant: impl Into<String>, items: Vec<ReceiptItem>, date: NaiveDate) -> Self {
        Self {
            receipt_id: Uuid::new_v4(),
            merchant: merchant.into(),
            date,
            items,
        }
    }

    pub fn receipt_id(&self) -> Uuid {
        self.receipt_id
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn items(&self) -> &[ReceiptItem] {
        &self.items
    }

    /// Sum of the line prices
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }

    /// The lines that carry a full [`Item`], ready to be stored
    pub fn items_for_inventory(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().filter_map(|i| i.line.as_item())
    }

    /// Consumes the receipt, returning the lines that carry a full [`Item`]
    pub fn into_inventory_items(self) -> Vec<Item> {
        self.items
            .into_iter()
            .filter_map(|i| match i.line {
                ReceiptLine::Item(item) => Some(item),
                ReceiptLine::Bare { .. } => None,
            })
            .collect()
    }
}
