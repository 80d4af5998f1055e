//! In-memory order store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    checkout::records::AttemptUuid,
    orders::{
        data::NewOrder,
        errors::OrdersServiceError,
        records::{OrderLineRecord, OrderRecord, OrderUuid},
        store::OrderStore,
    },
    users::UserUuid,
};

/// Order store held in process memory, used for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<OrderRecord>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders held across all users.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, mut order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let mut orders = self.orders.write().await;

        if orders.iter().any(|existing| {
            existing.uuid == order.uuid || existing.attempt_uuid == order.attempt_uuid
        }) {
            return Err(OrdersServiceError::AlreadyExists);
        }

        while orders.iter().any(|existing| existing.number == order.number) {
            order.renumber();
        }

        let record = OrderRecord {
            uuid: order.uuid,
            user_uuid: order.user_uuid,
            number: order.number,
            order_date: order.order_date,
            total_sum: order.total_sum,
            attempt_uuid: order.attempt_uuid,
            lines: order
                .lines
                .into_iter()
                .map(|line| OrderLineRecord {
                    order_uuid: order.uuid,
                    product_uuid: line.product_uuid,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
        };

        orders.push(record.clone());

        Ok(record)
    }

    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.orders
            .read()
            .await
            .iter()
            .find(|record| record.uuid == order && record.user_uuid == user)
            .cloned()
            .ok_or(OrdersServiceError::NotFound)
    }

    async fn find_by_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .find(|record| record.attempt_uuid == attempt)
            .cloned())
    }

    async fn list_for_user(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut found: Vec<OrderRecord> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|record| record.user_uuid == user)
            .cloned()
            .collect();

        found.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.uuid.cmp(&a.uuid)));

        Ok(found)
    }
}
