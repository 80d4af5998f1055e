//! Payment Records

use rust_decimal::Decimal;

use crate::domain::{
    checkout::records::AttemptUuid, payments::errors::PaymentGatewayError, users::UserUuid,
};

/// Minor currency units per major unit on the wire.
const MINOR_UNIT_SCALE: u32 = 2;

/// A debit or credit against a user's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub user_uuid: UserUuid,

    /// Amount in minor currency units.
    pub amount: u64,
    pub currency: String,

    /// Replaying a request with the same key must not move money twice.
    pub idempotency_key: AttemptUuid,
}

/// Convert minor units to the decimal major-unit amount sent on the wire.
///
/// # Errors
///
/// Returns [`PaymentGatewayError::InvalidAmount`] if `amount` does not fit a decimal.
pub fn to_major_units(amount: u64) -> Result<Decimal, PaymentGatewayError> {
    i64::try_from(amount)
        .ok()
        .map(|minor| Decimal::new(minor, MINOR_UNIT_SCALE))
        .ok_or(PaymentGatewayError::InvalidAmount(amount))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn minor_units_become_two_decimal_places() -> TestResult {
        assert_eq!(to_major_units(10_00)?.to_string(), "10.00");
        assert_eq!(to_major_units(5)?.to_string(), "0.05");

        Ok(())
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let result = to_major_units(u64::MAX);

        assert!(
            matches!(result, Err(PaymentGatewayError::InvalidAmount(u64::MAX))),
            "expected InvalidAmount, got {result:?}"
        );
    }
}
