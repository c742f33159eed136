//! Shared types and domain logic for the brewery directory
//!
//! Hours encoding, rating aggregation, fuzzy matching and the search
//! pipeline live here so the backend and the WASM helpers agree on them.

pub mod fuzzy;
pub mod hours;
pub mod models;
pub mod search;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
