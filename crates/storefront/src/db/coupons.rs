//! Coupon repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use dealshop_core::{Coupon, CouponId, DiscountRatio, ProductId};

use super::{PgStore, RepositoryError, conflict_on_unique, corrupt};

/// Input for creating a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub label: String,
    pub discount_ratio: DiscountRatio,
    pub expiry_date: NaiveDate,
    pub is_active: bool,
    pub max_uses: u32,
    pub eligible_products: Vec<ProductId>,
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    async fn create_coupon(&self, new: &NewCoupon) -> Result<Coupon, RepositoryError>;

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError>;

    /// Look up a coupon by its (already normalized) code.
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    label: String,
    discount_ratio: Decimal,
    expiry_date: NaiveDate,
    is_active: bool,
    max_uses: i32,
}

impl CouponRow {
    fn into_coupon(self, eligible_products: Vec<ProductId>) -> Result<Coupon, RepositoryError> {
        let discount_ratio =
            DiscountRatio::new(self.discount_ratio).map_err(|e| corrupt("discount ratio", e))?;
        let max_uses = u32::try_from(self.max_uses).map_err(|e| corrupt("max_uses", e))?;
        Ok(Coupon {
            id: self.id,
            code: self.code,
            label: self.label,
            discount_ratio,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            max_uses,
            eligible_products,
        })
    }
}

const COUPON_COLUMNS: &str = "id, code, label, discount_ratio, expiry_date, is_active, max_uses";

impl PgStore {
    async fn eligible_products(&self, id: CouponId) -> Result<Vec<ProductId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ProductId>(
            r"
            SELECT product_id FROM storefront.coupon_product
            WHERE coupon_id = $1
            ORDER BY product_id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn load_coupon(&self, row: CouponRow) -> Result<Coupon, RepositoryError> {
        let eligible = self.eligible_products(row.id).await?;
        row.into_coupon(eligible)
    }
}

#[async_trait]
impl CouponRepository for PgStore {
    async fn create_coupon(&self, new: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let max_uses = i32::try_from(new.max_uses).unwrap_or(i32::MAX);
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            INSERT INTO storefront.coupon
                (code, label, discount_ratio, expiry_date, is_active, max_uses)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(Coupon::normalize_code(&new.code))
        .bind(&new.label)
        .bind(new.discount_ratio.as_decimal())
        .bind(new.expiry_date)
        .bind(new.is_active)
        .bind(max_uses)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?;

        for product_id in &new.eligible_products {
            sqlx::query(
                r"
                INSERT INTO storefront.coupon_product (coupon_id, product_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(row.id)
            .bind(*product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut eligible = new.eligible_products.clone();
        eligible.sort_unstable();
        eligible.dedup();
        row.into_coupon(eligible)
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_coupon(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_coupon(row).await?)),
            None => Ok(None),
        }
    }
}
