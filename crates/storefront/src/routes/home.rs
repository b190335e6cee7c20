//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::routes::products::ProductView;
use crate::services::CatalogService;
use crate::services::catalog::HOME_SUPER_DEALS;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub deals: Vec<ProductView>,
}

/// Display the home page with the current super deals.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let deals = CatalogService::new(state.store())
        .super_deals(HOME_SUPER_DEALS)
        .await?
        .iter()
        .map(|p| ProductView::new(p, today))
        .collect();

    Ok(HomeTemplate { user, deals })
}
