use anyhow::Result;
use nova::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
