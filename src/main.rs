use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tether::cli::{Cli, Commands, Config, ConfigCommand, Overrides};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Config::default_config_file(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let path = config_path(cli.config)?;

    match cli.command {
        Commands::Connect {
            server,
            nick,
            user,
            realname,
            channels,
        } => {
            let mut config = Config::load_or_create(&path)?;
            config.apply(Overrides {
                server,
                nickname: nick,
                username: user,
                realname,
                channels,
            });
            info!("Using configuration from {}", path.display());
            tether::cli::run(config).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommand::Path => {
                println!("{}", path.display());
            }
            ConfigCommand::Show => {
                let config = if path.exists() {
                    Config::load(&path)?
                } else {
                    Config::default()
                };
                print!("{}", config.to_toml()?);
            }
        },
    }

    Ok(())
}
