//! Type system for routing data
//!
//! This module contains the dynamic value type used by attribute maps,
//! entity maps, metadata and condition comparison values.

pub mod value;

pub use value::Value;
