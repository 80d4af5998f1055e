//! Order store.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        checkout::records::AttemptUuid,
        orders::{
            data::NewOrder,
            errors::OrdersServiceError,
            records::{OrderLineRecord, OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrderStore {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrderStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }
}

/// Draws of a fresh order number before a collision is reported.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

const ORDER_NUMBER_CONSTRAINT: &str = "orders_number_key";

impl PgOrderStore {
    async fn insert(&self, order: &NewOrder) -> Result<OrderRecord, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let mut record = self.repository.create_order(&mut tx, order).await?;

        for line in &order.lines {
            let line = self
                .repository
                .create_order_line(&mut tx, record.uuid, *line)
                .await?;

            record.lines.push(line);
        }

        tx.commit().await?;

        Ok(record)
    }
}

fn is_number_collision(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|db_error| {
        db_error.is_unique_violation() && db_error.constraint() == Some(ORDER_NUMBER_CONSTRAINT)
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[tracing::instrument(
        name = "orders.store.create_order",
        skip(self, order),
        fields(order_uuid = %order.uuid, attempt_uuid = %order.attempt_uuid),
        err
    )]
    async fn create_order(&self, mut order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        for _ in 1..ORDER_NUMBER_ATTEMPTS {
            match self.insert(&order).await {
                Err(error) if is_number_collision(&error) => {
                    warn!(number = %order.number, "order number already taken, drawing another");

                    order.renumber();
                }
                result => return result.map_err(Into::into),
            }
        }

        self.insert(&order).await.map_err(Into::into)
    }

    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut record = self.repository.get_order(&mut tx, user, order).await?;

        let lines = self.repository.get_order_lines(&mut tx, &[order]).await?;

        tx.commit().await?;

        record.lines.extend(lines);

        Ok(record)
    }

    async fn find_by_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(mut record) = self
            .repository
            .get_order_for_attempt(&mut tx, attempt)
            .await?
        else {
            return Ok(None);
        };

        let lines = self
            .repository
            .get_order_lines(&mut tx, &[record.uuid])
            .await?;

        tx.commit().await?;

        record.lines.extend(lines);

        Ok(Some(record))
    }

    async fn list_for_user(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut orders = self.repository.list_orders_for_user(&mut tx, user).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let lines = self.repository.get_order_lines(&mut tx, &uuids).await?;

        tx.commit().await?;

        attach_lines(&mut orders, lines);

        Ok(orders)
    }
}

fn attach_lines(orders: &mut [OrderRecord], lines: Vec<OrderLineRecord>) {
    let mut by_order: FxHashMap<OrderUuid, Vec<OrderLineRecord>> = FxHashMap::default();

    for line in lines {
        by_order.entry(line.order_uuid).or_default().push(line);
    }

    for order in orders {
        if let Some(lines) = by_order.remove(&order.uuid) {
            order.lines = lines;
        }
    }
}

#[automock]
#[async_trait]
/// Append-only persistence for orders and their lines.
pub trait OrderStore: Send + Sync {
    /// Persist an order header and all of its lines atomically.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve one of the user's orders.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve the order produced by a checkout attempt, if any.
    async fn find_by_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;

    /// List the user's orders, newest first.
    async fn list_for_user(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;
}


#[cfg(test)]
mod pg_tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::{
            orders::data::NewOrderLine,
            products::{ProductCatalog, data::NewProduct, records::ProductUuid},
        },
        test::TestContext,
    };

    async fn new_order(ctx: &TestContext, user: UserUuid) -> TestResult<NewOrder> {
        let product = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: "P2".to_string(),
                price: 5_00,
                description: String::new(),
                image_path: None,
            })
            .await?;

        Ok(NewOrder::new(
            user,
            AttemptUuid::new(),
            vec![NewOrderLine {
                product_uuid: product.uuid,
                quantity: 2,
                unit_price: product.price,
            }],
        )?)
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn order_and_lines_round_trip() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let created = ctx.orders.create_order(new_order(&ctx, user).await?).await?;

        assert_eq!(created.total_sum, 10_00);
        assert_eq!(created.lines.len(), 1);
        assert_eq!(ctx.orders.get_order(user, created.uuid).await?, created);
        assert_eq!(
            ctx.orders.find_by_attempt(created.attempt_uuid).await?,
            Some(created.clone())
        );
        assert_eq!(ctx.orders.list_for_user(user).await?, vec![created]);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn colliding_order_number_is_redrawn() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx
            .orders
            .create_order(new_order(&ctx, UserUuid::new()).await?)
            .await?;

        let mut second = new_order(&ctx, UserUuid::new()).await?;
        second.number.clone_from(&first.number);

        let second = ctx.orders.create_order(second).await?;

        assert_ne!(second.number, first.number);
        assert_eq!(second.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn other_users_cannot_read_an_order() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx
            .orders
            .create_order(new_order(&ctx, UserUuid::new()).await?)
            .await?;

        let result = ctx.orders.get_order(UserUuid::new(), created.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
