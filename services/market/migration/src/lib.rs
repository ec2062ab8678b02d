use sea_orm_migration::prelude::*;

mod m20260101_000001_create_users;
mod m20260101_000002_create_subscription_tiers;
mod m20260101_000003_create_user_profiles;
mod m20260101_000004_create_stores;
mod m20260101_000005_create_categories;
mod m20260101_000006_create_products;
mod m20260101_000007_create_orders;
mod m20260101_000008_create_subscription_requests;
mod m20260101_000009_create_reviews;
mod m20260101_000010_create_chat_messages;
mod m20260101_000011_create_audit_logs;
mod m20260101_000012_create_unlock_requests;
mod m20260101_000013_create_pages;
mod m20260101_000014_create_broadcast_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users::Migration),
            Box::new(m20260101_000002_create_subscription_tiers::Migration),
            Box::new(m20260101_000003_create_user_profiles::Migration),
            Box::new(m20260101_000004_create_stores::Migration),
            Box::new(m20260101_000005_create_categories::Migration),
            Box::new(m20260101_000006_create_products::Migration),
            Box::new(m20260101_000007_create_orders::Migration),
            Box::new(m20260101_000008_create_subscription_requests::Migration),
            Box::new(m20260101_000009_create_reviews::Migration),
            Box::new(m20260101_000010_create_chat_messages::Migration),
            Box::new(m20260101_000011_create_audit_logs::Migration),
            Box::new(m20260101_000012_create_unlock_requests::Migration),
            Box::new(m20260101_000013_create_pages::Migration),
            Box::new(m20260101_000014_create_broadcast_messages::Migration),
        ]
    }
}
