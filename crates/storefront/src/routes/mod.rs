//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page (super deals)
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//!
//! # Auth
//! GET  /login                       - Login page (302 to / when logged in)
//! POST /login                       - Login by username or email
//! GET  /signup                      - Registration page (302 to / when logged in)
//! POST /signup                      - Create account and log in
//! GET|POST /logout                  - Log out, 302 to /login
//! GET  /forgot-password             - Ask for a reset link
//! POST /forgot-password             - Send the reset link
//! GET  /reset-password/{token}      - Choose a new password
//! POST /reset-password/{token}      - Set the new password
//!
//! # Catalog
//! GET  /products/{slug}             - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                        - Cart page
//! POST /cart/add                    - Add a product
//! POST /cart/remove                 - Remove a line
//! POST /cart/coupon                 - Apply or clear a coupon code
//!
//! # Favorites (requires auth)
//! GET  /favorites                   - Favorite products
//! POST /favorites/{product_id}/add
//! POST /favorites/{product_id}/remove
//!
//! # Checkout
//! POST /checkout                    - Create order, 302 to the payment page
//! GET  /payment/return              - Customer comes back from the gateway
//! POST /payment/notify              - Gateway notification
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod home;
pub mod products;

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// `302 Found` redirect.
///
/// `axum::response::Redirect` only offers 303, 307 and 308.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password/{token}",
            get(auth::reset_password_page).post(auth::reset_password),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/coupon", post(cart::coupon))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/{product_id}/add", post(favorites::add))
        .route("/{product_id}/remove", post(favorites::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(auth_routes())
        .route("/products/{slug}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/favorites", favorite_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/payment/return", get(checkout::payment_return))
        .route("/payment/notify", post(checkout::payment_notify))
}
