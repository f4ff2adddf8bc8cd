use anyhow::Result;

use guestbrief::app::serve;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    serve().await
}
