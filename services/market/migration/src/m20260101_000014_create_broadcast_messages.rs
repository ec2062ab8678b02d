use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BroadcastMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BroadcastMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BroadcastMessages::Title)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BroadcastMessages::Body).text().not_null())
                    .col(ColumnDef::new(BroadcastMessages::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(BroadcastMessages::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BroadcastMessages::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BroadcastMessages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BroadcastMessages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BroadcastMessages::Table, BroadcastMessages::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BroadcastMessages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BroadcastMessages {
    Table,
    Id,
    Title,
    Body,
    CreatedBy,
    StartsAt,
    ExpiresAt,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
