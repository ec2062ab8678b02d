use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::domain::cart::{CART_SESSION_KEY, Cart, CartView};
use crate::error::MarketError;
use crate::state::AppState;
use crate::usecase::cart::{AddToCartUseCase, UpdateCartLineUseCase, ViewCartUseCase};

pub async fn load_cart(session: &Session) -> Result<Cart, MarketError> {
    Ok(session
        .get::<Cart>(CART_SESSION_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), MarketError> {
    session.insert(CART_SESSION_KEY, cart).await?;
    Ok(())
}

async fn priced(
    state: &AppState,
    session: &Session,
    mut cart: Cart,
) -> Result<CartView, MarketError> {
    let usecase = ViewCartUseCase {
        products: state.product_repo(),
    };
    let (view, pruned) = usecase.execute(&mut cart).await?;
    if pruned {
        save_cart(session, &cart).await?;
    }
    Ok(view)
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn view_cart(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>, MarketError> {
    let cart = load_cart(&session).await?;
    Ok(Json(priced(&state, &session, cart).await?))
}

// ── POST /cart/items ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: Option<u32>,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartView>, MarketError> {
    let mut cart = load_cart(&session).await?;
    let usecase = AddToCartUseCase {
        products: state.product_repo(),
    };
    usecase
        .execute(&mut cart, body.product_id, body.quantity.unwrap_or(1))
        .await?;
    save_cart(&session, &cart).await?;
    Ok(Json(priced(&state, &session, cart).await?))
}

// ── PATCH /cart/items/{product_id} ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartLineRequest {
    pub quantity: u32,
}

pub async fn update_cart_line(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Json(body): Json<UpdateCartLineRequest>,
) -> Result<Json<CartView>, MarketError> {
    let mut cart = load_cart(&session).await?;
    let usecase = UpdateCartLineUseCase {
        products: state.product_repo(),
    };
    usecase.execute(&mut cart, product_id, body.quantity).await?;
    save_cart(&session, &cart).await?;
    Ok(Json(priced(&state, &session, cart).await?))
}

// ── DELETE /cart/items/{product_id} ──────────────────────────────────────────

pub async fn remove_from_cart(
    session: Session,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /cart ─────────────────────────────────────────────────────────────

pub async fn clear_cart(session: Session) -> Result<StatusCode, MarketError> {
    session.remove::<Cart>(CART_SESSION_KEY).await?;
    Ok(StatusCode::NO_CONTENT)
}
