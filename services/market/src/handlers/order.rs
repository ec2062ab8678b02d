use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::cart::{CART_SESSION_KEY, Cart};
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::handlers::cart::load_cart;
use crate::state::AppState;
use crate::usecase::order::{
    CancelOrderUseCase, CheckoutUseCase, GetOrderUseCase, ListAllOrdersUseCase,
    ListMyOrdersUseCase, ListStoreOrdersUseCase, UpdateOrderStatusUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            line_total: line.line_total(),
            product_id: line.product_id,
            store_id: line.store_id,
            product_name: line.product_name,
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub grand_total: Decimal,
    pub shipping_address: String,
    pub lines: Vec<OrderLineResponse>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            grand_total: order.grand_total,
            shipping_address: order.shipping_address,
            lines: order.lines.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

fn order_list(orders: Vec<Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(Into::into).collect())
}

// ── POST /orders ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
}

pub async fn checkout(
    identity: Identity,
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), MarketError> {
    let cart = load_cart(&session).await?;
    let usecase = CheckoutUseCase {
        orders: state.order_repo(),
    };
    let order = usecase
        .execute(identity.user_id, &cart, &body.shipping_address)
        .await?;
    session.remove::<Cart>(CART_SESSION_KEY).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

// ── GET /users/@me/orders ────────────────────────────────────────────────────

pub async fn list_my_orders(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, MarketError> {
    let usecase = ListMyOrdersUseCase {
        orders: state.order_repo(),
    };
    let orders = usecase
        .execute(identity.user_id, query.page_request())
        .await?;
    Ok(order_list(orders))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

pub async fn get_order(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, MarketError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(&identity, id).await?;
    Ok(Json(order.into()))
}

// ── POST /orders/{id}/cancel ─────────────────────────────────────────────────

pub async fn cancel_order(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = CancelOrderUseCase {
        orders: state.order_repo(),
    };
    usecase.execute(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /users/@me/store/orders ──────────────────────────────────────────────

pub async fn list_store_orders(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, MarketError> {
    let usecase = ListStoreOrdersUseCase {
        orders: state.order_repo(),
        stores: state.store_repo(),
    };
    let orders = usecase
        .execute(identity.user_id, query.page_request())
        .await?;
    Ok(order_list(orders))
}

// ── PATCH /orders/{id}/status ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

pub async fn update_order_status(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<StatusCode, MarketError> {
    let next =
        OrderStatus::parse(&body.status).ok_or(MarketError::InvalidInput("unknown status"))?;
    let usecase = UpdateOrderStatusUseCase {
        orders: state.order_repo(),
        stores: state.store_repo(),
    };
    usecase.execute(&identity, id, next).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /admin/orders ────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OrderListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub status: Option<String>,
}

pub async fn list_all_orders(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderResponse>>, MarketError> {
    let status = query
        .status
        .as_deref()
        .map(|s| OrderStatus::parse(s).ok_or(MarketError::InvalidInput("unknown status")))
        .transpose()?;
    let page = ListQuery {
        per_page: query.per_page,
        page: query.page,
    }
    .page_request();

    let usecase = ListAllOrdersUseCase {
        orders: state.order_repo(),
    };
    Ok(order_list(usecase.execute(&identity, status, page).await?))
}
