mod config;
mod error;
mod intent;
mod llm;
mod pipeline;
mod server;
mod template;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;
use template::TemplateStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    let llm = llm::create_llm(&config)?;
    log::info!("Using LLM provider: {}", config.llm.provider);

    let templates = Arc::new(TemplateStore::new(&config.template_dir));

    let state = server::AppState {
        llm: Arc::from(llm),
        templates,
        system_prompt: config.assistant.system_prompt.clone(),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on {}", addr);

    axum::serve(listener, server::router(state)).await?;
    Ok(())
}
