//! Product catalog

pub mod data;
pub mod errors;
pub mod memory;
pub mod records;
mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
