//! Checkout

pub mod errors;
pub mod memory;
pub mod records;
mod repository;
pub mod service;
pub mod store;

pub use errors::{CheckoutAttemptsError, CheckoutError};
pub use service::*;
