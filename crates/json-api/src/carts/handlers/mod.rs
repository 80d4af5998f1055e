//! Cart Handlers

pub(crate) mod get;
pub(crate) mod payment_status;
