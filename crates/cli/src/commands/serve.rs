//! `menuforge serve` — start the HTTP gateway.

use menuforge_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config.validate()?;

    menuforge_gateway::start(config).await
}
