//! Food inventory with unit-aware quantities, nutrition and recipes.
//!
//! Includes:
//! - Weight, volume and energy [`Quantity`]s with a configurable
//!   [`Converter`].
//! - Inventory [`Item`]s with per-serving nutrition and expiration dates.
//! - [`Recipe`]s, their nutrition and whether the inventory can cover them.
//! - [`Receipt`]s and validation of records produced by external agents, see
//!   [`ingest`].
//! - A TOML inventory file format, see [`inventory::file`].
//!
//! # Basic usage
//!
//! ```rust
//! # use larder::{Converter, Item, StorageType, Quantity, Unit, Macro};
//! # use larder::recipe::{RecipeRequest, RecipeRequestParts};
//! let converter = Converter::default();
//!
//! let rice = Item::builder("rice", Quantity::new(3.0, Unit::Pounds)?, StorageType::Pantry)
//!     .shelf_life_text("1 year")
//!     .serving_size(Quantity::new(195.0, Unit::Grams)?)
//!     .macro_(Macro::Protein, Quantity::new(2.6, Unit::Grams)?)
//!     .build()?;
//!
//! let request = RecipeRequest::new(RecipeRequestParts {
//!     name: "Plain rice".into(),
//!     instructions: [(1, "Boil it".to_string())].into(),
//!     ingredients: [("Rice".to_string(), Quantity::new(500.0, Unit::Grams)?)].into(),
//!     ..Default::default()
//! })?;
//! assert!(request.is_feasible([&rice], &converter));
//! # Ok::<(), larder::error::Error>(())
//! ```

#![warn(rustdoc::broken_intra_doc_links, clippy::doc_markdown)]

#[cfg(doc)]
pub mod _features {
    //! This lib has 1 feature, enabled by default:
    //! - `config_files`. Enables the TOML [inventory file](crate::inventory::file)
    //!   format and loading conversion factors from TOML with
    //!   [`ConversionsFile::parse`](crate::convert::ConversionsFile::parse).
}

pub mod convert;
pub mod error;
pub mod ingest;
pub mod inventory;
pub mod item;
pub mod nutrition;
pub mod quantity;
pub mod receipt;
pub mod recipe;
pub mod shelf_life;

use chrono::NaiveDate;

pub use convert::{Converter, Unit, UnitType};
pub use error::{Error, ValidationError};
pub use inventory::{Inventory, InventoryStore, MemoryInventory};
pub use item::{Item, ItemBuilder, StorageType};
pub use nutrition::{default_macro_table, Macro, MacroTable};
pub use quantity::{Quantity, QuantityError};
pub use receipt::{Receipt, ReceiptItem, ReceiptLine};
pub use recipe::{Feasibility, Recipe, RecipeRequest, Shortfall, ShortfallReason};
pub use shelf_life::{parse_shelf_life, ShelfLife};

/// The local date, used when a date is not given
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
