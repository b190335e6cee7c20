//! Favorite route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::instrument;

use dealshop_core::ProductId;

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::routes::found;
use crate::routes::products::ProductView;
use crate::services::FavoriteService;
use crate::state::AppState;

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites.html")]
pub struct FavoritesTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<ProductView>,
}

/// List the user's favorite products.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let products = FavoriteService::new(state.store())
        .list_products(user.id)
        .await?
        .iter()
        .map(|p| ProductView::new(p, today))
        .collect();

    Ok(FavoritesTemplate {
        user: Some(user),
        products,
    })
}

/// Bookmark a product.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    FavoriteService::new(state.store())
        .add(user.id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {product_id}")),
            other => other.into(),
        })?;

    Ok(found("/favorites"))
}

/// Remove a bookmark. Removing a product that isn't a favorite is a no-op.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    FavoriteService::new(state.store())
        .remove(user.id, product_id)
        .await?;

    Ok(found("/favorites"))
}
