//! Attribute extraction
//!
//! Splits a block body into its top-level `key = value` attributes and
//! decomposes map-literal values one level deep. Values are classified but
//! never evaluated.

pub mod extractor;
pub mod types;

pub use extractor::{decompose_map, extract_attributes, extract_from_range};
pub use types::{find, Attribute, MapEntry, MapLiteral, ValueKind};
