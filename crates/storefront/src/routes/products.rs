//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use dealshop_core::{Price, Product, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::CatalogService;
use crate::state::AppState;

/// Product as shown on listings and detail pages, priced for one day.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// What the customer pays today.
    pub price: Price,
    pub base_price: Price,
    pub on_promotion: bool,
    pub promotion_end: Option<NaiveDate>,
    pub in_stock: bool,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, today: NaiveDate) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.effective_unit_price(today),
            base_price: product.base_price,
            on_promotion: product.is_promotion_active(today),
            promotion_end: product.promotion_end,
            in_stock: product.stock > 0,
        }
    }

    /// Percentage saved during the promotion, rounded down.
    #[must_use]
    pub fn savings_percent(&self) -> i64 {
        if !self.on_promotion || self.base_price.is_zero() {
            return 0;
        }
        (self.base_price - self.price).amount() * 100 / self.base_price.amount()
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub user: Option<CurrentUser>,
    pub product: ProductView,
    pub shop_name: Option<String>,
    pub is_favorite: bool,
}

/// Display a product.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.store())
        .product_by_slug(&slug)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let shop_name = state
        .store()
        .get_shop(product.shop_id)
        .await?
        .map(|shop| shop.name);

    let is_favorite = match &user {
        Some(user) => state
            .store()
            .list_favorites(user.id)
            .await?
            .iter()
            .any(|f| f.product_id == product.id),
        None => false,
    };

    Ok(ProductTemplate {
        user,
        product: ProductView::new(&product, Utc::now().date_naive()),
        shop_name,
        is_favorite,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use dealshop_core::{NewProduct, ShopId};

    use super::*;

    fn product(new: NewProduct) -> Product {
        Product {
            id: ProductId::new(1),
            shop_id: new.shop_id,
            category_id: new.category_id,
            name: new.name,
            slug: "p".to_owned(),
            description: new.description,
            base_price: new.base_price,
            promotional_price: new.promotional_price,
            promotion_start: new.promotion_start,
            promotion_end: new.promotion_end,
            stock: 3,
            super_deal: false,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_uses_promotional_price() {
        let today = Utc::now().date_naive();
        let p = product(
            NewProduct::new(ShopId::new(1), "Attiéké", Price::new(6000)).with_promotion(
                Price::new(4500),
                today - Duration::days(1),
                today + Duration::days(30),
            ),
        );

        let view = ProductView::new(&p, today);
        assert!(view.on_promotion);
        assert_eq!(view.price, Price::new(4500));
        assert_eq!(view.savings_percent(), 25);
    }

    #[test]
    fn test_view_without_promotion() {
        let p = product(NewProduct::new(ShopId::new(1), "Garba", Price::new(5000)));
        let view = ProductView::new(&p, Utc::now().date_naive());
        assert!(!view.on_promotion);
        assert_eq!(view.price, Price::new(5000));
        assert_eq!(view.savings_percent(), 0);
    }
}
