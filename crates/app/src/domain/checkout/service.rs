//! Checkout orchestration.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::{Span, error, info, warn};

use crate::domain::{
    carts::{
        locks::{CartGuard, CartLocks},
        mutator::CartMutator,
        records::{CartRecord, CartUuid},
        store::CartStore,
        view::CartAggregator,
    },
    checkout::{
        errors::CheckoutError,
        records::{
            AttemptState, AttemptTransition, AttemptUuid, CheckoutAttemptRecord,
            NewCheckoutAttempt,
        },
        store::CheckoutAttemptStore,
    },
    orders::{
        OrderStore,
        data::{NewOrder, NewOrderLine},
        records::{OrderRecord, OrderUuid},
    },
    payments::{PaymentGateway, records::PaymentRequest},
    products::ProductCatalog,
    users::UserUuid,
};

/// A `pending` attempt untouched for this long is treated as abandoned.
const PENDING_GRACE: SignedDuration = SignedDuration::from_secs(15 * 60);

/// Turns a user's cart into an order, moving money through the payment gateway.
///
/// Each checkout is recorded in the attempt log before payment and walks
/// `pending -> paid -> committed`, or ends `declined`, `unconfirmed`,
/// `compensated` or `reconciliation_required`. An order whose cart could not
/// be cleared parks in `uncleared` until the next checkout of that cart.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    carts: Arc<dyn CartStore>,
    mutator: CartMutator,
    aggregator: CartAggregator,
    orders: Arc<dyn OrderStore>,
    attempts: Arc<dyn CheckoutAttemptStore>,
    gateway: Arc<dyn PaymentGateway>,
    locks: CartLocks,
    currency: String,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrderStore>,
        attempts: Arc<dyn CheckoutAttemptStore>,
        gateway: Arc<dyn PaymentGateway>,
        locks: CartLocks,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            mutator: CartMutator::new(Arc::clone(&carts), Arc::clone(&catalog)),
            aggregator: CartAggregator::new(Arc::clone(&carts), catalog),
            carts,
            orders,
            attempts,
            gateway,
            locks,
            currency: currency.into(),
        }
    }

    fn payment_request(&self, attempt: &CheckoutAttemptRecord) -> PaymentRequest {
        PaymentRequest {
            user_uuid: attempt.user_uuid,
            amount: attempt.amount,
            currency: self.currency.clone(),
            idempotency_key: attempt.uuid,
        }
    }

    /// Pay, persist, then clear, holding the cart lock throughout.
    async fn settle(
        self,
        _guard: CartGuard,
        cart: CartUuid,
        attempt: CheckoutAttemptRecord,
        order: NewOrder,
    ) -> Result<OrderRecord, CheckoutError> {
        let request = self.payment_request(&attempt);

        match self.gateway.make_payment(&request).await {
            Ok(true) => {
                self.record(attempt.uuid, AttemptTransition::to(AttemptState::Paid))
                    .await;
            }
            Ok(false) => {
                info!(attempt_uuid = %attempt.uuid, "payment declined");

                self.record(
                    attempt.uuid,
                    AttemptTransition::to(AttemptState::Declined).with_detail("payment declined"),
                )
                .await;

                return Err(CheckoutError::PaymentDeclined {
                    attempt: attempt.uuid,
                });
            }
            Err(payment_error) => {
                warn!(
                    attempt_uuid = %attempt.uuid,
                    error = %payment_error,
                    "payment outcome unknown, treating as declined"
                );

                self.record(
                    attempt.uuid,
                    AttemptTransition::to(AttemptState::Unconfirmed)
                        .with_detail(payment_error.to_string()),
                )
                .await;

                return Err(CheckoutError::PaymentDeclined {
                    attempt: attempt.uuid,
                });
            }
        }

        let created = match self.orders.create_order(order).await {
            Ok(created) => created,
            Err(persist_error) => {
                return Err(self
                    .compensate(&request, persist_error.to_string())
                    .await);
            }
        };

        if let Err(clear_error) = self.mutator.clear(cart).await {
            return Err(self
                .park_uncleared(attempt.uuid, created.uuid, cart, &clear_error.to_string())
                .await);
        }

        self.record(
            attempt.uuid,
            AttemptTransition::to(AttemptState::Committed).with_order(created.uuid),
        )
        .await;

        info!(
            attempt_uuid = %attempt.uuid,
            order_uuid = %created.uuid,
            total_sum = created.total_sum,
            "checkout committed"
        );

        Ok(created)
    }

    /// Refund a payment whose order could not be saved.
    async fn compensate(&self, request: &PaymentRequest, reason: String) -> CheckoutError {
        let attempt = request.idempotency_key;

        let compensated = match self.gateway.refund(request).await {
            Ok(refunded) => refunded,
            Err(refund_error) => {
                warn!(attempt_uuid = %attempt, error = %refund_error, "refund failed");

                false
            }
        };

        if compensated {
            warn!(attempt_uuid = %attempt, %reason, "order not saved, payment refunded");

            self.record(
                attempt,
                AttemptTransition::to(AttemptState::Compensated).with_detail(reason),
            )
            .await;
        } else {
            error!(
                attempt_uuid = %attempt,
                user_uuid = %request.user_uuid,
                amount = request.amount,
                %reason,
                "order not saved and refund failed, reconciliation required"
            );

            self.record(
                attempt,
                AttemptTransition::to(AttemptState::ReconciliationRequired).with_detail(reason),
            )
            .await;
        }

        CheckoutError::PersistFailure {
            attempt,
            compensated,
        }
    }

    /// Record that `order` is durable while its lines are still in `cart`.
    async fn park_uncleared(
        &self,
        attempt: AttemptUuid,
        order: OrderUuid,
        cart: CartUuid,
        reason: &str,
    ) -> CheckoutError {
        error!(
            attempt_uuid = %attempt,
            order_uuid = %order,
            cart_uuid = %cart,
            %reason,
            "order committed but cart could not be cleared"
        );

        self.record(
            attempt,
            AttemptTransition::to(AttemptState::Uncleared)
                .with_order(order)
                .with_detail(reason),
        )
        .await;

        CheckoutError::CartNotCleared { attempt, order }
    }

    /// Settle an attempt whose order is already durable. The cart is cleared
    /// only while it still holds exactly the ordered lines. Returns the
    /// committed attempt and whether the cart was cleared.
    ///
    /// The caller holds the cart lock.
    async fn finish_ordered(
        &self,
        attempt: &CheckoutAttemptRecord,
        order: &OrderRecord,
    ) -> Result<(CheckoutAttemptRecord, bool), CheckoutError> {
        let cart = self.carts.get_cart(attempt.cart_uuid).await?;

        let cleared = holds_order(&cart, order);

        if cleared {
            if let Err(clear_error) = self.mutator.clear(cart.uuid).await {
                if attempt.state == AttemptState::Uncleared {
                    error!(
                        attempt_uuid = %attempt.uuid,
                        order_uuid = %order.uuid,
                        error = %clear_error,
                        "cart still could not be cleared"
                    );

                    return Err(CheckoutError::CartNotCleared {
                        attempt: attempt.uuid,
                        order: order.uuid,
                    });
                }

                return Err(self
                    .park_uncleared(attempt.uuid, order.uuid, cart.uuid, &clear_error.to_string())
                    .await);
            }
        } else {
            warn!(
                attempt_uuid = %attempt.uuid,
                order_uuid = %order.uuid,
                cart_uuid = %cart.uuid,
                "cart changed since the order was placed, leaving it as is"
            );
        }

        let committed = self
            .attempts
            .transition(
                attempt.uuid,
                AttemptTransition::to(AttemptState::Committed).with_order(order.uuid),
            )
            .await?;

        Ok((committed, cleared))
    }

    /// Finish an earlier checkout of `cart` that saved its order but left the
    /// lines behind. Returns that order when its lines were the cart's contents.
    ///
    /// The caller holds the cart lock.
    async fn finish_uncleared(&self, cart: CartUuid) -> Result<Option<OrderRecord>, CheckoutError> {
        let uncleared = self
            .attempts
            .list_by_state(AttemptState::Uncleared)
            .await?
            .into_iter()
            .filter(|attempt| attempt.cart_uuid == cart);

        for attempt in uncleared {
            let Some(order) = self.orders.find_by_attempt(attempt.uuid).await? else {
                error!(attempt_uuid = %attempt.uuid, "uncleared attempt has no order");

                continue;
            };

            let (_, cleared) = self.finish_ordered(&attempt, &order).await?;

            if cleared {
                info!(
                    attempt_uuid = %attempt.uuid,
                    order_uuid = %order.uuid,
                    "earlier checkout finished, cart cleared"
                );

                return Ok(Some(order));
            }
        }

        Ok(None)
    }

    /// Write a transition. Failures are logged, not returned.
    async fn record(&self, attempt: AttemptUuid, transition: AttemptTransition) {
        let state = transition.state;

        if let Err(record_error) = self.attempts.transition(attempt, transition).await {
            error!(
                attempt_uuid = %attempt,
                %state,
                error = %record_error,
                "failed to record checkout attempt state"
            );
        }
    }
}

#[async_trait]
impl CheckoutService for CheckoutOrchestrator {
    #[tracing::instrument(
        name = "checkout.service.process_order",
        skip(self),
        fields(
            user_uuid = %user,
            cart_uuid = tracing::field::Empty,
            attempt_uuid = tracing::field::Empty,
            amount = tracing::field::Empty
        ),
        err
    )]
    async fn process_order(&self, user: UserUuid) -> Result<OrderRecord, CheckoutError> {
        let cart = self.carts.find_or_create_for_user(user).await?;

        let span = Span::current();

        span.record("cart_uuid", tracing::field::display(cart.uuid));

        let guard = self.locks.lock(cart.uuid).await;

        if let Some(order) = self.finish_uncleared(cart.uuid).await? {
            return Ok(order);
        }

        let view = self.aggregator.get_aggregated(cart.uuid).await?;

        if view.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let attempt_uuid = AttemptUuid::new();

        let lines = view
            .lines
            .iter()
            .map(|line| NewOrderLine {
                product_uuid: line.product.uuid,
                quantity: line.quantity,
                unit_price: line.product.price,
            })
            .collect();

        let order = NewOrder::new(user, attempt_uuid, lines)?;

        let attempt = self
            .attempts
            .create_pending(NewCheckoutAttempt {
                uuid: attempt_uuid,
                user_uuid: user,
                cart_uuid: cart.uuid,
                amount: order.total_sum,
            })
            .await?;

        span.record("attempt_uuid", tracing::field::display(attempt.uuid));
        span.record("amount", attempt.amount);

        let saga = self.clone().settle(guard, cart.uuid, attempt, order);

        tokio::spawn(saga).await.map_err(|join_error| {
            error!(
                attempt_uuid = %attempt_uuid,
                error = %join_error,
                "checkout task ended abnormally"
            );

            CheckoutError::Interrupted {
                attempt: attempt_uuid,
            }
        })?
    }

    #[tracing::instrument(
        name = "checkout.service.compensate_attempt",
        skip(self),
        fields(attempt_uuid = %attempt),
        err
    )]
    async fn compensate_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, CheckoutError> {
        let cart = self.attempts.get_attempt(attempt).await?.cart_uuid;

        // A live checkout of this cart finishes before the attempt is read again.
        let _guard = self.locks.lock(cart).await;

        let record = self.attempts.get_attempt(attempt).await?;

        let abandoned = record.state != AttemptState::Pending
            || record
                .updated_at
                .checked_add(PENDING_GRACE)
                .is_ok_and(|due| due <= Timestamp::now());

        if !record.state.needs_compensation() || !abandoned {
            return Err(CheckoutError::NotCompensable {
                attempt,
                state: record.state,
            });
        }

        if record.state.may_have_order()
            && let Some(order) = self.orders.find_by_attempt(attempt).await?
        {
            let (committed, cleared) = self.finish_ordered(&record, &order).await?;

            info!(
                attempt_uuid = %attempt,
                order_uuid = %order.uuid,
                cart_cleared = cleared,
                "checkout attempt already had an order, marked committed"
            );

            return Ok(committed);
        }

        if !self.gateway.refund(&self.payment_request(&record)).await? {
            return Err(CheckoutError::RefundRefused { attempt });
        }

        let compensated = self
            .attempts
            .transition(
                attempt,
                AttemptTransition::to(AttemptState::Compensated),
            )
            .await?;

        info!(attempt_uuid = %attempt, "checkout attempt compensated");

        Ok(compensated)
    }

    async fn list_attempts(
        &self,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, CheckoutError> {
        self.attempts
            .list_by_state(state)
            .await
            .map_err(Into::into)
    }
}

/// Whether `cart` holds exactly the lines of `order`.
fn holds_order(cart: &CartRecord, order: &OrderRecord) -> bool {
    cart.lines.len() == order.lines.len()
        && order
            .lines
            .iter()
            .all(|line| cart.quantity_of(line.product_uuid) == line.quantity)
}

#[automock]
#[async_trait]
/// Checkout and the operator tooling around its attempt log.
pub trait CheckoutService: Send + Sync {
    /// Convert the user's cart into an order, charging the cart's live total.
    async fn process_order(&self, user: UserUuid) -> Result<OrderRecord, CheckoutError>;

    /// Settle an attempt left with money in doubt: `paid`, `unconfirmed`,
    /// `reconciliation_required`, or `pending` past its grace period.
    ///
    /// An attempt whose order was saved is marked `committed`. Otherwise the
    /// payment is refunded under the attempt's idempotency key and the
    /// attempt marked `compensated`.
    async fn compensate_attempt(
        &self,
        attempt: AttemptUuid,
    ) -> Result<CheckoutAttemptRecord, CheckoutError>;

    /// Attempts currently in `state`, oldest first.
    async fn list_attempts(
        &self,
        state: AttemptState,
    ) -> Result<Vec<CheckoutAttemptRecord>, CheckoutError>;
}
