//! Session cart.
//!
//! The cart only holds product ids and quantities. Prices and availability are
//! resolved against the catalogue whenever the cart is viewed or checked out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MarketError;

/// Session key the cart is stored under.
pub const CART_SESSION_KEY: &str = "cart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

fn check_stock(quantity: u32, stock: i32) -> Result<(), MarketError> {
    if i64::from(quantity) > i64::from(stock.max(0)) {
        return Err(MarketError::InsufficientStock);
    }
    Ok(())
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Add `quantity` on top of any existing line. The combined quantity must fit in `stock`.
    pub fn add(&mut self, product_id: Uuid, quantity: u32, stock: i32) -> Result<(), MarketError> {
        if quantity == 0 {
            return Err(MarketError::InvalidInput("quantity must be at least 1"));
        }
        let combined = self.quantity_of(product_id).saturating_add(quantity);
        check_stock(combined, stock)?;
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = combined,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Replace a line's quantity. Zero removes the line.
    pub fn set(&mut self, product_id: Uuid, quantity: u32, stock: i32) -> Result<(), MarketError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }
        check_stock(quantity, stock)?;
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Returns `true` if a line was removed.
    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Drop lines whose product is not in `available`.
    pub fn retain_available(&mut self, available: &[Uuid]) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| available.contains(&l.product_id));
        self.lines.len() != before
    }
}

/// Cart line resolved against the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub stock: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl CartView {
    pub fn from_lines(lines: Vec<PricedLine>) -> Self {
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        let item_count = lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity));
        Self {
            lines,
            subtotal,
            item_count,
        }
    }
}
