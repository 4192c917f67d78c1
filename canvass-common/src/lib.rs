//! # Canvass Common Library
//!
//! Shared code for the canvassing dashboard crates:
//! - Address record types (raw and normalized)
//! - Static precinct reference table and ZIP/street-number rules
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod model;
pub mod precincts;

pub use error::{Error, Result};
pub use model::{Address, AddressRecord, PropertyUse, Section, SupportLevel};
pub use precincts::Precinct;
