use uuid::Uuid;

use crate::domain::cart::{Cart, CartView, PricedLine};
use crate::domain::repository::ProductRepository;
use crate::domain::types::{Product, ProductStatus};
use crate::error::MarketError;

async fn orderable<P: ProductRepository>(products: &P, id: Uuid) -> Result<Product, MarketError> {
    let product = products
        .find_by_id(id)
        .await?
        .ok_or(MarketError::ProductNotFound)?;
    if product.status != ProductStatus::Approved {
        return Err(MarketError::ProductUnavailable);
    }
    Ok(product)
}

// ── ViewCart ─────────────────────────────────────────────────────────────────

pub struct ViewCartUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> ViewCartUseCase<P> {
    /// Price every line against the catalogue. Lines whose product is gone or no
    /// longer approved are dropped from `cart`; the return flag says whether that
    /// happened so the caller can persist the pruned cart.
    pub async fn execute(&self, cart: &mut Cart) -> Result<(CartView, bool), MarketError> {
        if cart.is_empty() {
            return Ok((CartView::default(), false));
        }
        let products = self.products.find_many(&cart.product_ids()).await?;
        let available: Vec<Uuid> = products
            .iter()
            .filter(|p| p.status == ProductStatus::Approved)
            .map(|p| p.id)
            .collect();
        let pruned = cart.retain_available(&available);

        let lines = cart
            .lines
            .iter()
            .filter_map(|line| {
                let product = products.iter().find(|p| p.id == line.product_id)?;
                Some(PricedLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    image: product.image.clone(),
                    unit_price: product.price,
                    quantity: line.quantity,
                    stock: product.stock,
                    line_total: product.price * rust_decimal::Decimal::from(line.quantity),
                })
            })
            .collect();
        Ok((CartView::from_lines(lines), pruned))
    }
}

// ── AddToCart ────────────────────────────────────────────────────────────────

pub struct AddToCartUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> AddToCartUseCase<P> {
    pub async fn execute(
        &self,
        cart: &mut Cart,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), MarketError> {
        if quantity == 0 {
            return Err(MarketError::InvalidInput("quantity must be at least 1"));
        }
        let product = orderable(&self.products, product_id).await?;
        cart.add(product.id, quantity, product.stock)
    }
}

// ── UpdateCartLine ───────────────────────────────────────────────────────────

pub struct UpdateCartLineUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> UpdateCartLineUseCase<P> {
    pub async fn execute(
        &self,
        cart: &mut Cart,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), MarketError> {
        if quantity == 0 {
            cart.remove(product_id);
            return Ok(());
        }
        let product = orderable(&self.products, product_id).await?;
        cart.set(product.id, quantity, product.stock)
    }
}
