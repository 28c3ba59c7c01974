//! In-memory database model: tables with their rows, constraints, routines,
//! table types, and full-text catalogs

pub(crate) mod builder;
pub mod data_type;
mod database_model;
mod elements;
pub mod name;
pub mod value;

pub use data_type::{DataType, TypeLength};
pub use database_model::Database;
pub use elements::*;
pub use name::Name;
pub use value::{SqlValue, ValueKey};
