use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
    sea_query::{Expr, Query},
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::{order_details, orders, products, stores};

use super::insert_audit;
use super::product::product_status_from_db;
use crate::domain::order::{CheckoutLine, Order, OrderLine, OrderStatus};
use crate::domain::repository::OrderRepository;
use crate::domain::types::{AuditEntry, ProductStatus};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl DbOrderRepository {
    /// Load orders from `query` and attach their lines, optionally only one store's.
    async fn load(
        &self,
        query: Select<orders::Entity>,
        page: PageRequest,
        store_id: Option<Uuid>,
    ) -> Result<Vec<Order>, MarketError> {
        let models = query
            .order_by_desc(orders::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list orders")?;
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut detail_query =
            order_details::Entity::find().filter(order_details::Column::OrderId.is_in(ids));
        if let Some(store_id) = store_id {
            detail_query = detail_query.filter(order_details::Column::StoreId.eq(store_id));
        }
        let details = detail_query
            .all(&self.db)
            .await
            .context("list order lines")?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for detail in details {
            lines_by_order
                .entry(detail.order_id)
                .or_default()
                .push(line_from_model(detail));
        }
        Ok(models
            .into_iter()
            .map(|m| {
                let lines = lines_by_order.remove(&m.id).unwrap_or_default();
                order_from_model(m, lines)
            })
            .collect())
    }
}

impl OrderRepository for DbOrderRepository {
    async fn place(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        shipping_address: &str,
        lines: &[CheckoutLine],
    ) -> Result<Order, MarketError> {
        let now = Utc::now();
        let txn = self.db.begin().await.context("begin checkout")?;

        let mut order_lines = Vec::with_capacity(lines.len());
        let mut grand_total = Decimal::ZERO;
        for line in lines {
            if line.quantity <= 0 {
                return Err(MarketError::InvalidInput("quantity must be at least 1"));
            }
            let product = products::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await
                .context("load product for checkout")?
                .ok_or(MarketError::ProductUnavailable)?;
            if product_status_from_db(&product.status) != ProductStatus::Approved {
                return Err(MarketError::ProductUnavailable);
            }
            let store_active = stores::Entity::find_by_id(product.store_id)
                .one(&txn)
                .await
                .context("load store for checkout")?
                .is_some_and(|s| s.is_active);
            if !store_active {
                return Err(MarketError::ProductUnavailable);
            }

            // Applies only if the product is still approved with enough stock left.
            let decrement = products::Entity::update_many()
                .col_expr(
                    products::Column::Stock,
                    Expr::col(products::Column::Stock).sub(line.quantity),
                )
                .col_expr(products::Column::UpdatedAt, Expr::value(now))
                .filter(products::Column::Id.eq(product.id))
                .filter(products::Column::Status.eq(ProductStatus::Approved.as_str()))
                .filter(products::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await
                .context("decrement stock")?;
            if decrement.rows_affected == 0 {
                return Err(MarketError::InsufficientStock);
            }

            let order_line = OrderLine {
                id: Uuid::now_v7(),
                order_id,
                product_id: product.id,
                store_id: product.store_id,
                product_name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
            };
            grand_total += order_line.line_total();
            order_lines.push(order_line);
        }

        orders::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending.as_str().to_owned()),
            grand_total: Set(grand_total),
            shipping_address: Set(shipping_address.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("insert order")?;

        order_details::Entity::insert_many(order_lines.iter().map(|l| {
            order_details::ActiveModel {
                id: Set(l.id),
                order_id: Set(l.order_id),
                product_id: Set(l.product_id),
                store_id: Set(l.store_id),
                product_name: Set(l.product_name.clone()),
                unit_price: Set(l.unit_price),
                quantity: Set(l.quantity),
            }
        }))
        .exec_without_returning(&txn)
        .await
        .context("insert order lines")?;

        txn.commit().await.context("commit checkout")?;
        Ok(Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            grand_total,
            shipping_address: shipping_address.to_owned(),
            created_at: now,
            updated_at: now,
            lines: order_lines,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, MarketError> {
        let Some(model) = orders::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find order by id")?
        else {
            return Ok(None);
        };
        let details = order_details::Entity::find()
            .filter(order_details::Column::OrderId.eq(id))
            .all(&self.db)
            .await
            .context("list order lines")?;
        let lines = details.into_iter().map(line_from_model).collect();
        Ok(Some(order_from_model(model, lines)))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let query = orders::Entity::find().filter(orders::Column::UserId.eq(user_id));
        self.load(query, page, None).await
    }

    async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let mut query = orders::Entity::find();
        if let Some(status) = status {
            query = query.filter(orders::Column::Status.eq(status.as_str()));
        }
        self.load(query, page, None).await
    }

    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let query = orders::Entity::find().filter(
            orders::Column::Id.in_subquery(
                Query::select()
                    .column(order_details::Column::OrderId)
                    .from(order_details::Entity)
                    .and_where(order_details::Column::StoreId.eq(store_id))
                    .to_owned(),
            ),
        );
        self.load(query, page, Some(store_id)).await
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        audit: Option<&AuditEntry>,
    ) -> Result<bool, MarketError> {
        let now = Utc::now();
        let txn = self.db.begin().await.context("begin order transition")?;
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(to.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(now))
            .filter(orders::Column::Id.eq(id))
            .filter(orders::Column::Status.eq(from.as_str()))
            .exec(&txn)
            .await
            .context("update order status")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        if to == OrderStatus::Cancelled {
            restore_stock(&txn, id).await?;
        }
        if let Some(audit) = audit {
            insert_audit(&txn, audit).await?;
        }
        txn.commit().await.context("commit order transition")?;
        Ok(true)
    }

    async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, MarketError> {
        let count = order_details::Entity::find()
            .inner_join(orders::Entity)
            .filter(order_details::Column::ProductId.eq(product_id))
            .filter(orders::Column::UserId.eq(user_id))
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled.as_str()))
            .count(&self.db)
            .await
            .context("check purchase")?;
        Ok(count > 0)
    }
}

/// Put every line's quantity back on its product.
async fn restore_stock<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<(), MarketError> {
    let details = order_details::Entity::find()
        .filter(order_details::Column::OrderId.eq(order_id))
        .all(conn)
        .await
        .context("load lines to restock")?;
    let now = Utc::now();
    for detail in details {
        products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(detail.quantity),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(now))
            .filter(products::Column::Id.eq(detail.product_id))
            .exec(conn)
            .await
            .context("restore stock")?;
    }
    Ok(())
}

/// Unknown stored statuses read as cancelled, which allows no further transitions.
fn order_status_from_db(value: &str) -> OrderStatus {
    OrderStatus::parse(value).unwrap_or(OrderStatus::Cancelled)
}

fn line_from_model(model: order_details::Model) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        store_id: model.store_id,
        product_name: model.product_name,
        unit_price: model.unit_price,
        quantity: model.quantity,
    }
}

fn order_from_model(model: orders::Model, lines: Vec<OrderLine>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: order_status_from_db(&model.status),
        grand_total: model.grand_total,
        shipping_address: model.shipping_address,
        created_at: model.created_at,
        updated_at: model.updated_at,
        lines,
    }
}
