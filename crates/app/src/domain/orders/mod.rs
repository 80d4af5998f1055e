//! Orders

pub mod data;
pub mod errors;
pub mod memory;
pub mod records;
mod repository;
pub mod store;

pub use errors::OrdersServiceError;
pub use store::*;
