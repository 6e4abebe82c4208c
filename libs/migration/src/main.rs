//! Schema CLI for the users database.
//!
//! `DATABASE_URL=postgres://... cargo run -p migration -- up` (also `down`, `status`, `fresh`).

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
