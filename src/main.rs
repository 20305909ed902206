use anyhow::Result;
use cotacao::config::ServerConfig;
use env_logger::Env;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    cotacao::server::run(config).await
}
