//! Order Data

use jiff::{Timestamp, tz::TimeZone};
use rand::{Rng, distributions::Alphanumeric};

use crate::domain::{
    checkout::records::AttemptUuid,
    orders::{errors::OrdersServiceError, records::OrderUuid},
    products::records::ProductUuid,
    users::UserUuid,
};

const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// New Order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub attempt_uuid: AttemptUuid,
    pub number: String,
    pub order_date: Timestamp,
    pub total_sum: u64,
    pub lines: Vec<NewOrderLine>,
}

/// New Order Line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_uuid: ProductUuid,
    pub quantity: u64,
    pub unit_price: u64,
}

impl NewOrder {
    /// Build an order whose `total_sum` is the exact sum of its lines.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersServiceError::InvalidData`] if there are no lines, a
    /// line has zero quantity, or the total overflows.
    pub fn new(
        user: UserUuid,
        attempt: AttemptUuid,
        lines: Vec<NewOrderLine>,
    ) -> Result<Self, OrdersServiceError> {
        if lines.is_empty() || lines.iter().any(|line| line.quantity == 0) {
            return Err(OrdersServiceError::InvalidData);
        }

        let total_sum = lines.iter().try_fold(0_u64, |total, line| {
            line.unit_price
                .checked_mul(line.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or(OrdersServiceError::InvalidData)
        })?;

        let order_date = Timestamp::now();

        Ok(Self {
            uuid: OrderUuid::new(),
            user_uuid: user,
            attempt_uuid: attempt,
            number: order_number(order_date),
            order_date,
            total_sum,
            lines,
        })
    }

    /// Draw a fresh order number, keeping the order date.
    pub fn renumber(&mut self) {
        self.number = order_number(self.order_date);
    }
}

/// `ORD-YYYYMMDD-XXXXXX` with a random upper-case alphanumeric suffix.
fn order_number(order_date: Timestamp) -> String {
    let date = order_date.to_zoned(TimeZone::UTC).strftime("%Y%m%d");

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();

    format!("ORD-{date}-{suffix}")
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn line(quantity: u64, unit_price: u64) -> NewOrderLine {
        NewOrderLine {
            product_uuid: ProductUuid::new(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn total_is_sum_of_lines() -> TestResult {
        let order = NewOrder::new(
            UserUuid::new(),
            AttemptUuid::new(),
            vec![line(2, 5_00), line(1, 10_00)],
        )?;

        assert_eq!(order.total_sum, 20_00);

        Ok(())
    }

    #[test]
    fn empty_order_is_rejected() {
        let result = NewOrder::new(UserUuid::new(), AttemptUuid::new(), Vec::new());

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let result = NewOrder::new(
            UserUuid::new(),
            AttemptUuid::new(),
            vec![line(2, u64::MAX)],
        );

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[test]
    fn order_number_has_date_and_suffix() {
        let number = order_number(Timestamp::UNIX_EPOCH);

        assert!(number.starts_with("ORD-19700101-"), "unexpected {number}");
        assert_eq!(number.len(), "ORD-19700101-".len() + ORDER_NUMBER_SUFFIX_LEN);
    }

    #[test]
    fn renumbering_keeps_the_date() -> TestResult {
        let mut order = NewOrder::new(UserUuid::new(), AttemptUuid::new(), vec![line(1, 1_00)])?;
        let date = order.number.get(..12).map(str::to_string);

        order.number = "ORD-TAKEN".to_string();
        order.renumber();

        assert_ne!(order.number, "ORD-TAKEN");
        assert_eq!(order.number.get(..12).map(str::to_string), date);

        Ok(())
    }
}
