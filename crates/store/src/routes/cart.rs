//! Shopping cart route handlers.
//!
//! The cart lives in the database keyed by a session-scoped cart ID, so
//! anonymous visitors keep their cart for as long as their session lives.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use melodex_core::{AlbumId, CartItemId, Price};

use crate::db::cart::CartRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, cart_id};
use crate::models::CurrentUser;
use crate::models::cart::CartItem;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub album_id: i32,
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub item_id: i32,
    pub quantity: i32,
}

/// Remove-line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub item_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub current_user: Option<CurrentUser>,
    pub items: Vec<CartItem>,
    pub total: Price,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    session: Session,
) -> Result<CartTemplate> {
    let cart_id = cart_id(&session).await?;
    let items = CartRepository::new(state.pool()).items(&cart_id).await?;
    let total: Price = items.iter().map(CartItem::line_price).sum();

    Ok(CartTemplate {
        current_user,
        items,
        total,
    })
}

/// Add an album to the cart, then show the cart.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddForm>,
) -> Result<Response> {
    let cart_id = cart_id(&session).await?;

    CartRepository::new(state.pool())
        .add_album(&cart_id, AlbumId::new(form.album_id))
        .await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Update the quantity of a cart line. Zero removes it.
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateForm>,
) -> Result<Response> {
    let cart_id = cart_id(&session).await?;

    CartRepository::new(state.pool())
        .set_quantity(&cart_id, CartItemId::new(form.item_id), form.quantity)
        .await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line from the cart.
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveForm>,
) -> Result<Response> {
    let cart_id = cart_id(&session).await?;

    CartRepository::new(state.pool())
        .remove(&cart_id, CartItemId::new(form.item_id))
        .await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Cart count badge fragment.
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let cart_id = cart_id(&session).await?;
    let count = CartRepository::new(state.pool()).count(&cart_id).await?;

    Ok(CartCountTemplate { count })
}
