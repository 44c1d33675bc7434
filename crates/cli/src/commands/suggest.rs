//! `menuforge suggest` — run one query through the pipeline.

use menuforge_config::AppConfig;

pub async fn run(query: &str, user: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let state = menuforge_gateway::build_state(config).await?;

    let previous_dishes = match user {
        Some(user_id) => state.history.recent(user_id).await,
        None => Vec::new(),
    };

    let response = state.orchestrator.suggest(query, previous_dishes).await;

    if let Some(user_id) = user {
        let names: Vec<String> = response.items.iter().map(|item| item.name.clone()).collect();
        state.history.record(user_id, &names).await;
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
