#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = veriviva::run().await {
        eprintln!("veriviva fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
