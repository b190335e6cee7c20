//! Cart repository.
//!
//! A customer has at most one active cart. Carts are always returned fully
//! loaded: lines with their products, plus the attached coupon.

use async_trait::async_trait;

use dealshop_core::{
    Cart, CartId, CartLine, CartLineId, CouponId, CustomerId, ProductId,
};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{CouponRepository, PgStore, RepositoryError, corrupt};

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The customer's active cart, if any.
    async fn find_active_cart(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError>;

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Create a new, empty, active cart.
    async fn create_cart(&self, customer_id: CustomerId) -> Result<Cart, RepositoryError>;

    /// Add `quantity` units of a product, merging into an existing line.
    /// A merged line never exceeds [`CartLine::MAX_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or product doesn't exist.
    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError>;

    /// Remove a line. Returns `false` if it was not in this cart.
    async fn remove_line(&self, cart_id: CartId, line_id: CartLineId)
    -> Result<bool, RepositoryError>;

    /// Attach or detach a coupon.
    async fn set_cart_coupon(
        &self,
        cart_id: CartId,
        coupon_id: Option<CouponId>,
    ) -> Result<(), RepositoryError>;

    /// Mark the cart as checked out.
    async fn deactivate_cart(&self, cart_id: CartId) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    customer_id: CustomerId,
    coupon_id: Option<CouponId>,
    active: bool,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    line_id: CartLineId,
    cart_id: CartId,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|e| corrupt("quantity", e))?;
        Ok(Self {
            id: row.line_id,
            cart_id: row.cart_id,
            product: row.product.into(),
            quantity,
        })
    }
}

impl PgStore {
    async fn load_cart(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT l.id AS line_id, l.cart_id, l.quantity, {PRODUCT_COLUMNS}
            FROM storefront.cart_line l
            JOIN storefront.product p ON p.id = l.product_id
            WHERE l.cart_id = $1
            ORDER BY l.id
            "
        ))
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CartLine::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let coupon = match row.coupon_id {
            Some(id) => self.get_coupon(id).await?,
            None => None,
        };

        Ok(Cart {
            id: row.id,
            customer_id: row.customer_id,
            coupon,
            lines,
            active: row.active,
        })
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_active_cart(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, customer_id, coupon_id, active
            FROM storefront.cart
            WHERE customer_id = $1 AND active
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, customer_id, coupon_id, active FROM storefront.cart WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn create_cart(&self, customer_id: CustomerId) -> Result<Cart, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>(
            "INSERT INTO storefront.cart (customer_id) VALUES ($1) RETURNING id",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Cart::new(id, customer_id))
    }

    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);

        sqlx::query(
            r"
            INSERT INTO storefront.cart_line (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = LEAST(storefront.cart_line.quantity + EXCLUDED.quantity, $4)
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(i32::try_from(CartLine::MAX_QUANTITY).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn remove_line(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_line WHERE id = $1 AND cart_id = $2")
            .bind(line_id)
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_cart_coupon(
        &self,
        cart_id: CartId,
        coupon_id: Option<CouponId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.cart SET coupon_id = $1 WHERE id = $2")
            .bind(coupon_id)
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn deactivate_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.cart SET active = FALSE WHERE id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
