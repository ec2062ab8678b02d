use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubscriptionRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubscriptionRequests::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(SubscriptionRequests::RequestedTierId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::ProratedCredit)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::AmountDue)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SubscriptionRequests::Note).text().null())
                    .col(
                        ColumnDef::new(SubscriptionRequests::PreviousTierId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::PreviousRole)
                            .small_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::PreviousProductLimit)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::PreviousStartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::PreviousExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SubscriptionRequests::DecidedBy).uuid().null())
                    .col(
                        ColumnDef::new(SubscriptionRequests::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubscriptionRequests::Table, SubscriptionRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                SubscriptionRequests::Table,
                                SubscriptionRequests::RequestedTierId,
                            )
                            .to(SubscriptionTiers::Table, SubscriptionTiers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(SubscriptionRequests::Table)
                    .col(SubscriptionRequests::UserId)
                    .col(SubscriptionRequests::Status)
                    .name("idx_subscription_requests_user_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubscriptionRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SubscriptionRequests {
    Table,
    Id,
    UserId,
    RequestedTierId,
    Status,
    ProratedCredit,
    AmountDue,
    Note,
    PreviousTierId,
    PreviousRole,
    PreviousProductLimit,
    PreviousStartedAt,
    PreviousExpiresAt,
    DecidedBy,
    DecidedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum SubscriptionTiers {
    Table,
    Id,
}
