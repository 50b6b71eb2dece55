//! HTTP route handlers for the store.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (latest albums)
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /store                  - Genre listing
//! GET  /store/genre/{name}     - Albums in a genre
//! GET  /store/album/{id}       - Album detail
//! GET  /store/artists          - Artist listing
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add an album to the cart
//! POST /cart/update            - Update line quantity
//! POST /cart/remove            - Remove a line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Shipping form
//! POST /checkout               - Place order
//! GET  /checkout/complete/{id} - Order confirmation
//!
//! # Account
//! GET  /account/login          - Login page
//! POST /account/login          - Login action
//! GET  /account/register       - Register page
//! POST /account/register       - Register action
//! POST /account/logout         - Logout action
//! GET  /account/confirm-email  - Email confirmation callback
//! GET  /account/forgot-password            - Forgot password page
//! POST /account/forgot-password            - Send reset link
//! GET  /account/forgot-password-confirmation - "Check your email" page
//! GET  /account/reset-password             - Reset form (from emailed link)
//! POST /account/reset-password             - Apply new password
//! GET  /account/reset-password-confirmation - Reset done page
//! GET  /account/access-denied  - Access denied page
//! ```

pub mod account;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store::index))
        .route("/genre/{name}", get(store::genre))
        .route("/album/{id}", get(store::album))
        .route("/artists", get(store::artists))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::form).post(checkout::place_order))
        .route("/complete/{id}", get(checkout::complete))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(account::login_page).post(account::login))
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/logout", post(account::logout))
        .route("/confirm-email", get(account::confirm_email))
        .route(
            "/forgot-password",
            get(account::forgot_password_page).post(account::forgot_password),
        )
        .route(
            "/forgot-password-confirmation",
            get(account::forgot_password_confirmation),
        )
        .route(
            "/reset-password",
            get(account::reset_password_page).post(account::reset_password),
        )
        .route(
            "/reset-password-confirmation",
            get(account::reset_password_confirmation),
        )
        .route("/access-denied", get(account::access_denied))
}

/// Create the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .nest("/store", store_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
}
