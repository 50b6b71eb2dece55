//! Checkout route handlers.
//!
//! Checkout requires a signed-in user. Placing an order snapshots the cart
//! into `orders` / `order_details` in one transaction and empties the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use melodex_core::{OrderId, Price};

use crate::db::cart::CartRepository;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, cart_id};
use crate::models::CurrentUser;
use crate::models::cart::CartItem;
use crate::models::order::{Order, OrderDetail, ShipTo};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Shipping details form data.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub phone: Option<String>,
    pub email: String,
}

impl ShippingForm {
    fn into_ship_to(self) -> ShipTo {
        ShipTo {
            name: self.name,
            address: self.address,
            city: self.city,
            country: self.country,
            postal_code: self.postal_code,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            email: self.email,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Shipping form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/index.html")]
pub struct CheckoutTemplate {
    pub current_user: Option<CurrentUser>,
    pub items: Vec<CartItem>,
    pub total: Price,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CompleteTemplate {
    pub current_user: Option<CurrentUser>,
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the shipping form with an order summary.
pub async fn form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response> {
    let cart_id = cart_id(&session).await?;
    let items = CartRepository::new(state.pool()).items(&cart_id).await?;

    if items.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let total: Price = items.iter().map(CartItem::line_price).sum();

    Ok(CheckoutTemplate {
        current_user: Some(user),
        items,
        total,
        error: None,
    }
    .into_response())
}

/// Place the order and redirect to the confirmation page.
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let cart_id = cart_id(&session).await?;
    let items = CartRepository::new(state.pool()).items(&cart_id).await?;

    if items.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    if form.name.trim().is_empty() || form.address.trim().is_empty() {
        let total: Price = items.iter().map(CartItem::line_price).sum();
        return Ok(CheckoutTemplate {
            current_user: Some(user),
            items,
            total,
            error: Some("Name and address are required".to_owned()),
        }
        .into_response());
    }

    let ship_to = form.into_ship_to();

    let order = OrderRepository::new(state.pool())
        .create(user.id, &cart_id, &ship_to, &items)
        .await?;

    tracing::info!(order_id = %order.id, user_id = %user.id, "Order placed");

    Ok(Redirect::to(&format!("/checkout/complete/{}", order.id)).into_response())
}

/// Display the order confirmation page.
///
/// Orders are scoped to their owner; another user's order ID is a 404.
pub async fn complete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<CompleteTemplate> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get(OrderId::new(id), user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let details = orders.details(order.id).await?;

    Ok(CompleteTemplate {
        current_user: Some(user),
        order,
        details,
    })
}
