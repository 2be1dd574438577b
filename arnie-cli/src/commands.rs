//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use arnie_ml::report::{render_console, write_artifacts};
use arnie_ml::{ExperimentRunner, ModelRegistry, RunConfig};
use std::path::PathBuf;

/// Inputs shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub workspace: PathBuf,
    pub config_path: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

impl Context {
    /// Layered configuration with the `--data` override applied, validated.
    pub fn load_config(&self) -> anyhow::Result<RunConfig> {
        let mut config =
            arnie_ml::load_config(Some(&self.workspace), self.config_path.as_deref())
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Run => handle_run(ctx).await,
        Commands::Models => handle_models(ctx),
        Commands::Config { action } => handle_config(action, ctx),
    }
}

async fn handle_run(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let runner = ExperimentRunner::new(config)?;
    let outcome = runner.run().await?;

    print!("{}", render_console(&outcome));
    write_artifacts(&runner.config().report, &outcome)?;
    Ok(())
}

fn handle_models(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let registry = ModelRegistry::standard().with_config(&config.models)?;
    println!("Registered models ({}):", registry.len());
    for entry in registry.entries() {
        println!(
            "  {:<22} {:<20} {} ({} combinations)",
            entry.id,
            entry.display_name,
            entry.search_space,
            entry.search_space.size()
        );
    }
    Ok(())
}

fn handle_config(action: ConfigAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = ctx.workspace.join(".arnie");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&RunConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = ctx.load_config()?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
