//! Payments

pub mod errors;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod records;

pub use errors::PaymentGatewayError;
pub use gateway::*;
