//! Checkout and payment route handlers.
//!
//! `POST /checkout` creates the order and sends the customer to CinetPay.
//! The gateway later reaches us twice: the customer's browser comes back on
//! `/payment/return` and the gateway itself posts to `/payment/notify`. Both
//! re-verify the transaction with the gateway rather than trusting the request.

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

use dealshop_core::{Order, PaymentStatus};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentUser;
use crate::routes::found;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Query string the customer returns with.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub transaction_id: String,
}

/// Notification body posted by CinetPay.
#[derive(Debug, Deserialize)]
pub struct NotifyForm {
    pub cpm_trans_id: String,
    #[serde(default)]
    pub cpm_site_id: Option<String>,
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "payment-result.html")]
pub struct PaymentResultTemplate {
    pub user: Option<CurrentUser>,
    pub order: Order,
}

impl PaymentResultTemplate {
    fn is_paid(&self) -> bool {
        self.order.payment_status == PaymentStatus::Paid
    }

    fn is_pending(&self) -> bool {
        self.order.payment_status == PaymentStatus::Pending
    }
}

fn checkout_service(state: &AppState) -> CheckoutService<'_> {
    let config = state.config();
    CheckoutService::new(
        state.store(),
        state.gateway(),
        config.cinetpay.currency,
        &config.base_url,
    )
}

/// Create an order from the cart and redirect to the payment page.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let started = checkout_service(&state)
        .start(user.id, Utc::now().date_naive())
        .await?;

    add_breadcrumb(
        "checkout",
        "Redirected to payment",
        &[
            ("order_id", started.order.id.to_string()),
            ("total", started.order.total.to_string()),
        ],
    );

    Ok(found(&started.payment_url))
}

/// Customer is back from the payment page.
#[instrument(skip(state, user))]
pub async fn payment_return(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ReturnQuery>,
) -> Result<impl IntoResponse> {
    let order = checkout_service(&state)
        .confirm_payment(&query.transaction_id)
        .await?;

    Ok(PaymentResultTemplate { user, order })
}

/// Server-to-server notification from the gateway.
#[instrument(skip(state, form), fields(transaction_id = %form.cpm_trans_id))]
pub async fn payment_notify(
    State(state): State<AppState>,
    Form(form): Form<NotifyForm>,
) -> Result<&'static str> {
    if let Some(site_id) = &form.cpm_site_id
        && site_id != &state.config().cinetpay.site_id
    {
        tracing::warn!(%site_id, "notification for another site ignored");
        return Ok("OK");
    }

    let order = checkout_service(&state)
        .confirm_payment(&form.cpm_trans_id)
        .await?;

    tracing::info!(order_id = %order.id, status = %order.payment_status, "payment notification handled");
    Ok("OK")
}
