use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use mate_bridge::config::Config;
use mate_bridge::transport::{ClientOptions, Command, DesktopClient};
use mate_bridge::workspace::{project_list, ProjectSettings};
use mate_bridge::{commands, utils};

#[derive(Parser)]
#[command(name = "mate-bridge", version, about = "MavensMate desktop app bridge")]
struct AppCli {
    /// Config file path
    #[arg(short, long, default_value = "config.json", global = true)]
    config: String,

    /// Override the desktop app base URL from the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Project directory whose settings scope dispatched commands
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe whether the desktop app is reachable
    Ping,
    /// Open the desktop app UI for the current project
    OpenUi,
    /// Open the desktop app global settings editor
    OpenSettings,
    /// List projects found in the configured workspaces
    Projects,
}

fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        info!(path = %path, "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn build_client(config: &Config, args: &AppCli) -> Result<DesktopClient> {
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| config.base_url.clone());
    let mut options = ClientOptions::new(base_url);

    if let Some(project_dir) = &args.project {
        let settings = ProjectSettings::read(project_dir)
            .with_context(|| format!("loading project {}", project_dir.display()))?;
        options = options.with_project_id(settings.id);
    }

    Ok(DesktopClient::new(options))
}

async fn dispatch(client: &DesktopClient, command: Command, scoped: bool) -> Result<()> {
    if !command.allows_without_project() && !scoped {
        bail!("command '{}' requires --project", command.id());
    }
    let result = client.send_command(&command).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();
    let config = load_config(&args.config)?;
    let scoped = args.project.is_some();

    match args.command {
        Commands::Ping => {
            let client = build_client(&config, &args)?;
            let available = client.check_availability().await;
            println!("{}", if available { "available" } else { "unavailable" });
        }
        Commands::OpenUi => {
            let client = build_client(&config, &args)?;
            dispatch(&client, commands::open_ui(), scoped).await?;
        }
        Commands::OpenSettings => {
            let client = build_client(&config, &args)?;
            dispatch(&client, commands::open_global_settings(), scoped).await?;
        }
        Commands::Projects => {
            let projects = project_list(&config)?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
    }

    Ok(())
}
