#[tokio::main]
async fn main() -> eyre::Result<()> {
    zerg_users::run().await
}
