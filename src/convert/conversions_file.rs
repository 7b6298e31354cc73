//! Configuration data structures used in [`ConverterBuilder`](super::ConverterBuilder)

use serde::Deserialize;

/// Extra conversion factors for [`ConverterBuilder`](super::ConverterBuilder)
///
/// This structure is designed for deserializing [TOML](https://toml.io/en/),
/// but you can try other formats supported by serde.
///
/// ```toml
/// bundled = true
///
/// [[conversion]]
/// from = "cup"
/// to = "tbsp"
/// factor = 16
/// reversible = true
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConversionsFile {
    /// Start from the bundled factors before adding the entries
    #[serde(default)]
    pub bundled: bool,
    /// Conversion pairs
    #[serde(default, rename = "conversion")]
    pub conversions: Vec<ConversionEntry>,
}

/// A single conversion pair in a [`ConversionsFile`]
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConversionEntry {
    /// Source unit, any name known to [`lookup_unit`](super::lookup_unit)
    pub from: String,
    /// Target unit, any name known to [`lookup_unit`](super::lookup_unit)
    pub to: String,
    /// `value_in_to = value_in_from * factor`
    pub factor: f64,
    /// Also add `1 / factor` from `to` to `from`
    #[serde(default)]
    pub reversible: bool,
}

impl ConversionsFile {
    /// Parse a TOML conversions file
    #[cfg(feature = "config_files")]
    pub fn parse(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}
