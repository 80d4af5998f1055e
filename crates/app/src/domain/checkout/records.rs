//! Checkout Attempt Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{carts::records::CartUuid, orders::records::OrderUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Checkout attempt UUID, also sent to the payment service as the idempotency key.
pub type AttemptUuid = TypedUuid<CheckoutAttemptRecord>;

/// Where a checkout attempt has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptState {
    /// Validated and recorded; no payment sent yet.
    Pending,

    /// Payment accepted; the order is not yet durable.
    Paid,

    /// Order persisted but the cart still holds the ordered lines.
    Uncleared,

    /// Order persisted and the cart cleared.
    Committed,

    /// Payment declined; no money moved.
    Declined,

    /// The payment call failed in transit, so the debit may or may not have happened.
    Unconfirmed,

    /// Payment refunded after a later step failed.
    Compensated,

    /// Payment taken, order not persisted and the refund failed.
    ReconciliationRequired,
}

impl AttemptState {
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Paid,
        Self::Uncleared,
        Self::Committed,
        Self::Declined,
        Self::Unconfirmed,
        Self::Compensated,
        Self::ReconciliationRequired,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Uncleared => "uncleared",
            Self::Committed => "committed",
            Self::Declined => "declined",
            Self::Unconfirmed => "unconfirmed",
            Self::Compensated => "compensated",
            Self::ReconciliationRequired => "reconciliation_required",
        }
    }

    /// No further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Declined | Self::Compensated)
    }

    /// Attempts only ever move forward.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::Paid => matches!(
                next,
                Self::Uncleared
                    | Self::Committed
                    | Self::Compensated
                    | Self::ReconciliationRequired
            ),
            Self::Uncleared => next == Self::Committed,
            Self::Unconfirmed | Self::ReconciliationRequired => next == Self::Compensated,
            Self::Committed | Self::Declined | Self::Compensated => false,
        }
    }

    /// Money may have moved without a durable order. An operator may settle
    /// the attempt; a `pending` one only once its checkout has gone quiet.
    #[must_use]
    pub fn needs_compensation(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Paid | Self::Unconfirmed | Self::ReconciliationRequired
        )
    }

    /// A saga in this state may have persisted its order before stopping.
    #[must_use]
    pub fn may_have_order(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown attempt state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown checkout attempt state {0:?}")]
pub struct UnknownAttemptState(pub String);

impl FromStr for AttemptState {
    type Err = UnknownAttemptState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");

        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| UnknownAttemptState(value.to_string()))
    }
}

/// Checkout Attempt Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutAttemptRecord {
    pub uuid: AttemptUuid,
    pub user_uuid: UserUuid,
    pub cart_uuid: CartUuid,

    /// Amount sent to the payment service, in minor currency units.
    pub amount: u64,
    pub state: AttemptState,
    pub order_uuid: Option<OrderUuid>,

    /// Last failure message, if any.
    pub detail: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Checkout Attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCheckoutAttempt {
    pub uuid: AttemptUuid,
    pub user_uuid: UserUuid,
    pub cart_uuid: CartUuid,
    pub amount: u64,
}

/// A forward move of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTransition {
    pub state: AttemptState,
    pub order_uuid: Option<OrderUuid>,
    pub detail: Option<String>,
}

impl AttemptTransition {
    #[must_use]
    pub fn to(state: AttemptState) -> Self {
        Self {
            state,
            order_uuid: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderUuid) -> Self {
        self.order_uuid = Some(order);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
