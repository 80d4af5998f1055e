//! Users
//!
//! Identity is resolved outside this crate; the only thing the shop needs is a
//! stable identifier threaded through every cart and checkout call.

use crate::uuids::TypedUuid;

/// Marker for user identifiers.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
