//! Carts

pub mod actions;
pub mod errors;
pub mod locks;
pub mod memory;
pub mod mutator;
pub mod records;
mod repositories;
pub mod service;
pub mod store;
pub mod view;

pub use errors::CartsServiceError;
pub use service::*;
