//! ratio-bands - GD30/AL30 Ratio Band Monitor
//!
//! Polls the live bond board and flags band touches of the GD30/AL30 ratio.

use anyhow::Result;

use ratio_bands::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (RATIO_* overrides go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
