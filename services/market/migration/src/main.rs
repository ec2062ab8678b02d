use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(cmse_market_migration::Migrator).await;
}
