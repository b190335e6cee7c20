//! Cart route handlers.
//!
//! Every cart belongs to the logged-in user's customer profile. Mutations
//! redirect back to `/cart`; rejected input comes back as an `error` code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use dealshop_core::{CartLineId, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::routes::found;
use crate::services::{CartError, CartService, CartSummary};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveLineForm {
    pub line_id: CartLineId,
}

/// Coupon form data. An empty code removes the current coupon.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub user: Option<CurrentUser>,
    pub cart: CartSummary,
    pub error: Option<&'static str>,
}

fn message(code: &str) -> &'static str {
    match code {
        "product_not_found" => "Ce produit n'est plus disponible.",
        "line_not_found" => "Cet article n'est plus dans votre panier.",
        "invalid_quantity" => "Quantité invalide.",
        "coupon_not_found" => "Code promo inconnu.",
        "coupon_expired" => "Ce code promo n'est plus valable.",
        "empty" => "Votre panier est vide.",
        _ => "Une erreur est survenue. Veuillez réessayer.",
    }
}

/// Turn a rejected cart operation into a redirect back to the cart.
fn back_with(err: CartError) -> Result<Response> {
    let code = match err {
        CartError::ProductNotFound => "product_not_found",
        CartError::LineNotFound => "line_not_found",
        CartError::InvalidQuantity => "invalid_quantity",
        CartError::CouponNotFound => "coupon_not_found",
        CartError::CouponNotRedeemable(_) => "coupon_expired",
        CartError::EmptyCart => "empty",
        CartError::Repository(e) => return Err(AppError::Database(e)),
    };
    Ok(found(&format!("/cart?error={code}")))
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CartQuery>,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.store())
        .cart_for_user(user.id)
        .await?;

    Ok(CartTemplate {
        user: Some(user),
        cart: CartSummary::of(&cart, Utc::now().date_naive()),
        error: query.error.as_deref().map(message),
    })
}

/// Add a product to the cart.
#[instrument(skip(state, user), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    match CartService::new(state.store())
        .add_product(user.id, form.product_id, form.quantity)
        .await
    {
        Ok(_) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[
                    ("product_id", form.product_id.to_string()),
                    ("quantity", form.quantity.to_string()),
                ],
            );
            Ok(found("/cart"))
        }
        Err(e) => back_with(e),
    }
}

/// Remove a line from the cart.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveLineForm>,
) -> Result<Response> {
    match CartService::new(state.store())
        .remove_line(user.id, form.line_id)
        .await
    {
        Ok(_) => Ok(found("/cart")),
        Err(e) => back_with(e),
    }
}

/// Apply a coupon code, or clear it when the code is blank.
#[instrument(skip(state, user, form))]
pub async fn coupon(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let service = CartService::new(state.store());

    let result = if form.code.trim().is_empty() {
        service.clear_coupon(user.id).await
    } else {
        service
            .apply_coupon(user.id, &form.code, Utc::now().date_naive())
            .await
    };

    match result {
        Ok(cart) => {
            if let Some(coupon) = &cart.coupon {
                add_breadcrumb("cart", "Coupon applied", &[("code", coupon.code.clone())]);
            }
            Ok(found("/cart"))
        }
        Err(e) => back_with(e),
    }
}
