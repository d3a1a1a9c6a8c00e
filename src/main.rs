#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telldus_sheets_lib::run().await?;
    Ok(())
}
