use anyhow::Result;
use tally_cli::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
