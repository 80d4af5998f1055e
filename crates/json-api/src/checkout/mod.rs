//! Checkout

mod errors;
mod handlers;

pub(crate) use errors::{into_status_error, outcome_of};
pub(crate) use handlers::*;
