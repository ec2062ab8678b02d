use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use cmse_core::health::{healthz, readyz};
use cmse_core::middleware::with_observability;

use crate::handlers::{
    account::{
        get_me, login, logout, refresh_token, register_customer, register_seller, update_me,
        upload_profile_image,
    },
    audit::list_audit_logs,
    broadcast::{create_broadcast, deactivate_broadcast, list_active_broadcasts, list_broadcasts},
    cart::{add_to_cart, clear_cart, remove_from_cart, update_cart_line, view_cart},
    category::{create_category, delete_category, get_category, list_categories, update_category},
    chat::{conversation, inbox, mark_read, send_message},
    moderation::{
        approve_profile_image, list_pending_profile_images, list_users, reject_profile_image,
        set_user_locked, set_user_role,
    },
    order::{
        cancel_order, checkout, get_order, list_all_orders, list_my_orders, list_store_orders,
        update_order_status,
    },
    page::{create_page, delete_page, get_page, list_pages, update_page},
    product::{
        approve_product, create_product, delete_product, featured_products, get_product,
        list_my_products, list_pending_products, list_products, reject_product, update_product,
        upload_product_image,
    },
    review::{create_review, delete_review, list_reviews},
    store::{
        create_my_store, get_my_store, get_store, list_stores, set_store_active, update_my_store,
    },
    subscription::{
        approve_request, create_tier, list_my_requests, list_requests, list_tiers, quote_upgrade,
        reject_request, request_upgrade, revert_request, set_tier_active, update_tier,
    },
    unlock::{
        approve_unlock_request, list_unlock_requests, reject_unlock_request,
        submit_unlock_request,
    },
};
use crate::state::AppState;

/// Cookie carrying the session id. The cart is the only thing kept in it.
pub const SESSION_COOKIE_NAME: &str = "cmse_session";

/// Idle lifetime of a session, in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn session_layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(true)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES);
    let uploads = ServeDir::new(&state.storage.root);

    let router = Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Accounts
        .route("/auth/register/customer", post(register_customer))
        .route("/auth/register/seller", post(register_seller))
        .route(
            "/auth/token",
            post(login).patch(refresh_token).delete(logout),
        )
        .route("/users/@me", get(get_me).patch(update_me))
        .route("/users/@me/profile-image", put(upload_profile_image))
        // Stores
        .route("/stores", get(list_stores))
        .route("/stores/{slug}", get(get_store))
        .route(
            "/users/@me/store",
            get(get_my_store).post(create_my_store).patch(update_my_store),
        )
        // Categories
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(get_category))
        // Products
        .route("/products", get(list_products).post(create_product))
        .route("/products/featured", get(featured_products))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/{id}/image", put(upload_product_image))
        .route("/users/@me/products", get(list_my_products))
        // Reviews
        .route(
            "/products/{id}/reviews",
            get(list_reviews).post(create_review),
        )
        .route("/reviews/{id}", delete(delete_review))
        // Cart
        .route("/cart", get(view_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route(
            "/cart/items/{product_id}",
            patch(update_cart_line).delete(remove_from_cart),
        )
        // Orders
        .route("/orders", post(checkout))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/users/@me/orders", get(list_my_orders))
        .route("/users/@me/store/orders", get(list_store_orders))
        // Subscriptions
        .route("/tiers", get(list_tiers))
        .route("/tiers/{id}/quote", get(quote_upgrade))
        .route("/subscription-requests", post(request_upgrade))
        .route("/users/@me/subscription-requests", get(list_my_requests))
        // Chat
        .route("/messages", post(send_message))
        .route("/messages/inbox", get(inbox))
        .route("/messages/with/{user_id}", get(conversation))
        .route("/messages/{id}/read", post(mark_read))
        // Pages and broadcasts
        .route("/pages", get(list_pages))
        .route("/pages/{slug}", get(get_page))
        .route("/broadcasts", get(list_active_broadcasts))
        // Unlock requests
        .route("/unlock-requests", post(submit_unlock_request))
        // Admin
        .route("/admin/stores/{id}/active", put(set_store_active))
        .route("/admin/categories", post(create_category))
        .route(
            "/admin/categories/{id}",
            patch(update_category).delete(delete_category),
        )
        .route("/admin/products/pending", get(list_pending_products))
        .route("/admin/products/{id}/approve", post(approve_product))
        .route("/admin/products/{id}/reject", post(reject_product))
        .route("/admin/orders", get(list_all_orders))
        .route("/admin/subscription-requests", get(list_requests))
        .route(
            "/admin/subscription-requests/{id}/approve",
            post(approve_request),
        )
        .route(
            "/admin/subscription-requests/{id}/reject",
            post(reject_request),
        )
        .route("/admin/profile-images", get(list_pending_profile_images))
        .route(
            "/admin/profile-images/{user_id}/approve",
            post(approve_profile_image),
        )
        .route(
            "/admin/profile-images/{user_id}/reject",
            post(reject_profile_image),
        )
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/locked", put(set_user_locked))
        .route("/admin/unlock-requests", get(list_unlock_requests))
        .route(
            "/admin/unlock-requests/{id}/approve",
            post(approve_unlock_request),
        )
        .route(
            "/admin/unlock-requests/{id}/reject",
            post(reject_unlock_request),
        )
        .route("/admin/pages", post(create_page))
        .route(
            "/admin/pages/{id}",
            patch(update_page).delete(delete_page),
        )
        // SuperAdmin
        .route("/superadmin/tiers", post(create_tier))
        .route("/superadmin/tiers/{id}", put(update_tier))
        .route("/superadmin/tiers/{id}/active", put(set_tier_active))
        .route(
            "/superadmin/subscription-requests/{id}/revert",
            post(revert_request),
        )
        .route("/superadmin/users/{id}/role", put(set_user_role))
        .route("/superadmin/audit-logs", get(list_audit_logs))
        .route(
            "/superadmin/broadcasts",
            get(list_broadcasts).post(create_broadcast),
        )
        .route("/superadmin/broadcasts/{id}", delete(deactivate_broadcast))
        // Uploaded files
        .nest_service("/uploads", uploads)
        .layer(session_layer())
        .layer(body_limit)
        .with_state(state);

    with_observability(router)
}
