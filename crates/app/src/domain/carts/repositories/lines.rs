//! Cart Lines Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::try_get_amount,
    domain::{
        carts::records::{CartLineRecord, CartUuid},
        products::records::ProductUuid,
    },
};

const GET_CART_LINES_SQL: &str = include_str!("../sql/get_cart_lines.sql");
const INCREMENT_CART_LINE_SQL: &str = include_str!("../sql/increment_cart_line.sql");
const DECREMENT_CART_LINE_SQL: &str = include_str!("../sql/decrement_cart_line.sql");
const DELETE_LAST_UNIT_SQL: &str = include_str!("../sql/delete_last_cart_line_unit.sql");
const DELETE_CART_LINE_SQL: &str = include_str!("../sql/delete_cart_line.sql");
const CLEAR_CART_LINES_SQL: &str = include_str!("../sql/clear_cart_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartLinesRepository;

impl PgCartLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(GET_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn increment_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let quantity: i64 = query_scalar(INCREMENT_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        quantity_from_i64(quantity)
    }

    /// Decrement a line holding more than one unit. Returns `None` when no
    /// such line exists, which includes lines holding exactly one unit.
    pub(crate) async fn decrement_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<u64>, sqlx::Error> {
        let quantity: Option<i64> = query_scalar(DECREMENT_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        quantity.map(quantity_from_i64).transpose()
    }

    pub(crate) async fn delete_last_unit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(DELETE_LAST_UNIT_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub(crate) async fn delete_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<u64>, sqlx::Error> {
        let quantity: Option<i64> = query_scalar(DELETE_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        quantity.map(quantity_from_i64).transpose()
    }

    pub(crate) async fn clear_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn quantity_from_i64(quantity: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
        index: "quantity".to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for CartLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            cart_uuid: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_amount(row, "quantity")?,
        })
    }
}
