use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::app::{self, App};
use crate::backend::HttpBackend;
use crate::clipboard::Osc52Clipboard;
use crate::config::Config;
use crate::ui::conversation::{dispatch, ConversationController};

/// Launch the interactive chat screen
pub async fn start_chat(config: Config) -> Result<()> {
    let backend = HttpBackend::new(config.endpoint.clone(), config.request_timeout())?;
    tracing::info!(endpoint = backend.endpoint(), "starting chat");

    let clipboard = Box::new(Osc52Clipboard::new(std::io::stdout()));
    let app = App::new(config, Arc::new(backend), clipboard);

    let mut terminal = app::init_terminal()?;
    let result = app.run(&mut terminal).await;
    app::restore_terminal()?;
    result
}

/// Send one prompt through the conversation and print the agent's answer
pub async fn ask(config: &Config, prompt: String) -> Result<()> {
    let backend = HttpBackend::new(config.endpoint.clone(), config.request_timeout())?;
    let mut controller = ConversationController::from_config(config);

    let Some(request) = controller.submit_text(prompt) else {
        bail!("Nothing to ask: the prompt is empty");
    };
    let (request_id, result) = dispatch(&backend, request).await;
    controller.settle(request_id, result);

    if let Some(reply) = controller.messages().last() {
        println!("{}", reply.content);
    }
    Ok(())
}

/// Write the default configuration to `path`
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Config::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
