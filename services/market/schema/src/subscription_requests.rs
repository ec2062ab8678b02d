use sea_orm::entity::prelude::*;

/// Tier change request. The `previous_*` columns snapshot the profile at approval
/// time so the change can be reverted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscription_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_tier_id: i32,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub prorated_credit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount_due: Decimal,
    pub note: Option<String>,
    pub previous_tier_id: Option<i32>,
    pub previous_role: Option<i16>,
    pub previous_product_limit: Option<i32>,
    pub previous_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub previous_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::subscription_tiers::Entity",
        from = "Column::RequestedTierId",
        to = "super::subscription_tiers::Column::Id"
    )]
    RequestedTier,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::subscription_tiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestedTier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
