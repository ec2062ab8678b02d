use sea_orm::entity::prelude::*;

/// Per-user profile: contact details, profile images and subscription state.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub pending_profile_image: Option<String>,
    pub tier_id: Option<i32>,
    pub product_limit: i32,
    pub subscription_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub subscription_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
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
        from = "Column::TierId",
        to = "super::subscription_tiers::Column::Id"
    )]
    SubscriptionTier,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::subscription_tiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionTier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
