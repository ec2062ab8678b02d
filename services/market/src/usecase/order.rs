use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;

use crate::domain::cart::Cart;
use crate::domain::order::{CheckoutLine, Order, OrderStatus};
use crate::domain::repository::{OrderRepository, StoreRepository};
use crate::domain::types::AuditEntry;
use crate::error::MarketError;
use crate::usecase::required_text;

const MAX_ADDRESS_CHARS: usize = 1000;

// ── Checkout ─────────────────────────────────────────────────────────────────

pub struct CheckoutUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> CheckoutUseCase<O> {
    /// Place an order for every cart line. The caller clears the cart on success.
    pub async fn execute(
        &self,
        user_id: Uuid,
        cart: &Cart,
        shipping_address: &str,
    ) -> Result<Order, MarketError> {
        if cart.is_empty() {
            return Err(MarketError::CartEmpty);
        }
        let address = required_text(shipping_address, MAX_ADDRESS_CHARS, "address is too long")?;
        let lines = cart
            .lines
            .iter()
            .map(|l| {
                let quantity = i32::try_from(l.quantity)
                    .map_err(|_| MarketError::InvalidInput("quantity is too large"))?;
                Ok(CheckoutLine {
                    product_id: l.product_id,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, MarketError>>()?;

        let order = self
            .orders
            .place(Uuid::now_v7(), user_id, &address, &lines)
            .await?;
        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.grand_total,
            "order placed"
        );
        Ok(order)
    }
}

// ── ListMyOrders / GetOrder ──────────────────────────────────────────────────

pub struct ListMyOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListMyOrdersUseCase<O> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        self.orders.list_by_user(user_id, page).await
    }
}

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    /// Other users' orders read as not found.
    pub async fn execute(&self, actor: &Identity, id: Uuid) -> Result<Order, MarketError> {
        self.orders
            .find_by_id(id)
            .await?
            .filter(|o| o.user_id == actor.user_id || actor.is_admin())
            .ok_or(MarketError::OrderNotFound)
    }
}

// ── CancelOrder ──────────────────────────────────────────────────────────────

pub struct CancelOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> CancelOrderUseCase<O> {
    /// Owners may cancel while the order is still pending. Stock is restored.
    pub async fn execute(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .filter(|o| o.user_id == actor.user_id)
            .ok_or(MarketError::OrderNotFound)?;
        if order.status != OrderStatus::Pending {
            return Err(MarketError::InvalidStatusTransition);
        }
        if !self
            .orders
            .transition(id, OrderStatus::Pending, OrderStatus::Cancelled, None)
            .await?
        {
            return Err(MarketError::InvalidStatusTransition);
        }
        tracing::info!(order_id = %id, "order cancelled by customer");
        Ok(())
    }
}

// ── Seller / admin views ─────────────────────────────────────────────────────

pub struct ListStoreOrdersUseCase<O: OrderRepository, S: StoreRepository> {
    pub orders: O,
    pub stores: S,
}

impl<O: OrderRepository, S: StoreRepository> ListStoreOrdersUseCase<O, S> {
    pub async fn execute(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let store = self
            .stores
            .find_by_owner(owner_id)
            .await?
            .ok_or(MarketError::StoreNotFound)?;
        self.orders.list_for_store(store.id, page).await
    }
}

pub struct ListAllOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListAllOrdersUseCase<O> {
    pub async fn execute(
        &self,
        actor: &Identity,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        self.orders.list_all(status, page).await
    }
}

// ── UpdateOrderStatus ────────────────────────────────────────────────────────

pub struct UpdateOrderStatusUseCase<O: OrderRepository, S: StoreRepository> {
    pub orders: O,
    pub stores: S,
}

impl<O: OrderRepository, S: StoreRepository> UpdateOrderStatusUseCase<O, S> {
    /// Admins may move any order; sellers only orders containing one of their lines.
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<(), MarketError> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or(MarketError::OrderNotFound)?;
        if !actor.is_admin() {
            let sells_in_order = self
                .stores
                .find_by_owner(actor.user_id)
                .await?
                .is_some_and(|s| order.has_store(s.id));
            if !sells_in_order {
                return Err(MarketError::Forbidden);
            }
        }
        if !order.status.can_transition_to(next) {
            return Err(MarketError::InvalidStatusTransition);
        }

        let audit = actor.is_admin().then(|| {
            AuditEntry::new(actor.user_id, "order.status", "order", id).with_details(format!(
                "{} -> {}",
                order.status.as_str(),
                next.as_str()
            ))
        });
        if !self
            .orders
            .transition(id, order.status, next, audit.as_ref())
            .await?
        {
            return Err(MarketError::InvalidStatusTransition);
        }
        tracing::info!(
            order_id = %id,
            from = order.status.as_str(),
            to = next.as_str(),
            "order status changed"
        );
        Ok(())
    }
}
