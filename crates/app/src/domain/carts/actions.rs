//! Cart actions

use std::{fmt, str::FromStr};

use crate::domain::carts::errors::CartsServiceError;

/// A requested change to one product's quantity in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit.
    Plus,

    /// Remove one unit, if any.
    Minus,

    /// Remove every unit.
    Delete,
}

impl CartAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for CartAction {
    type Err = CartsServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plus" => Ok(Self::Plus),
            "minus" => Ok(Self::Minus),
            "delete" => Ok(Self::Delete),
            _ => Err(CartsServiceError::InvalidAction(value.to_string())),
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
