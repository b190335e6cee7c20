//! Customer profile repository.

use async_trait::async_trait;

use dealshop_core::{CustomerId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique};
use crate::models::{Customer, NewCustomer};

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Create the customer profile for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    async fn create_customer(
        &self,
        user_id: UserId,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_customer_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Customer>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    user_id: UserId,
    address: String,
    phone_primary: String,
    phone_secondary: Option<String>,
    city: String,
    country: String,
    active: bool,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            address: row.address,
            phone_primary: row.phone_primary,
            phone_secondary: row.phone_secondary,
            city: row.city,
            country: row.country,
            active: row.active,
        }
    }
}

const CUSTOMER_COLUMNS: &str =
    "id, user_id, address, phone_primary, phone_secondary, city, country, active";

#[async_trait]
impl CustomerRepository for PgStore {
    async fn create_customer(
        &self,
        user_id: UserId,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO storefront.customer
                (user_id, address, phone_primary, phone_secondary, city, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&new.address)
        .bind(&new.phone_primary)
        .bind(&new.phone_secondary)
        .bind(&new.city)
        .bind(&new.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "customer profile"))?;

        Ok(row.into())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn find_customer_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }
}
