use anyhow::Result;
use cotacao::config::ClientConfig;
use env_logger::Env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ClientConfig::from_env()?;
    cotacao::client::run(&config).await;

    Ok(())
}
