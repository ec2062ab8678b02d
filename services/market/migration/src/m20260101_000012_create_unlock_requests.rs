use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UnlockRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UnlockRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UnlockRequests::UserId).uuid().not_null())
                    .col(ColumnDef::new(UnlockRequests::Reason).text().not_null())
                    .col(
                        ColumnDef::new(UnlockRequests::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(UnlockRequests::DecidedBy).uuid().null())
                    .col(
                        ColumnDef::new(UnlockRequests::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UnlockRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UnlockRequests::Table, UnlockRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(UnlockRequests::Table)
                    .col(UnlockRequests::Status)
                    .name("idx_unlock_requests_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UnlockRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UnlockRequests {
    Table,
    Id,
    UserId,
    Reason,
    Status,
    DecidedBy,
    DecidedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
