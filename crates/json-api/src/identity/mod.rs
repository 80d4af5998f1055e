//! Caller identity
//!
//! Users are authenticated upstream; the gateway forwards the resolved user id
//! in the `X-User-Uuid` header.

pub(crate) mod middleware;
