//! sea-orm entities for the marketplace database.

pub mod audit_logs;
pub mod broadcast_messages;
pub mod categories;
pub mod chat_messages;
pub mod order_details;
pub mod orders;
pub mod pages;
pub mod products;
pub mod reviews;
pub mod stores;
pub mod subscription_requests;
pub mod subscription_tiers;
pub mod unlock_requests;
pub mod user_profiles;
pub mod users;
