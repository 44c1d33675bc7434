//! `menuforge doctor` — diagnose system health.
//!
//! Runs the same probes as the gateway's /health endpoint and prints one
//! line per subsystem.

use menuforge_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!("menuforge doctor");
    println!("  config:    {}", AppConfig::default_path().display());
    println!("  provider:  {} ({})", config.default_provider, config.default_model);
    println!("  inventory: {}", config.inventory.backend);
    println!("  knowledge: {}", config.knowledge.backend);
    println!();

    if let Err(e) = config.validate() {
        println!("  [FAIL] configuration: {e}");
        return Ok(());
    }
    println!("  [ OK ] configuration");

    let state = menuforge_gateway::build_state(config).await?;

    report("provider", state.provider.health_check().await.unwrap_or(false));
    report("inventory", state.inventory.health_check().await.unwrap_or(false));
    report("knowledge", state.knowledge.health_check().await.unwrap_or(false));

    Ok(())
}

fn report(subsystem: &str, healthy: bool) {
    let label = if healthy { "[ OK ]" } else { "[FAIL]" };
    println!("  {label} {subsystem}");
}
