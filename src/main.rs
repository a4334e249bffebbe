use std::path::Path;

use clap::Parser;

use dirpane::Settings;
use dirpane::cli::commands::{init, list, watch};
use dirpane::cli::{Cli, Commands};

fn load_settings(path: &Path) -> Settings {
    match Settings::load_from(path) {
        Ok(settings) => {
            dirpane::logging::init_with_config(&settings.logging);
            settings
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Settings::default_path);

    match cli.command {
        Commands::Init { force } => init::run_init(&config_path, force),
        Commands::Config => init::run_config(&load_settings(&config_path), &config_path),
        Commands::List { directory } => list::run_list(&load_settings(&config_path), &directory)?,
        Commands::Watch {
            directories,
            no_watch,
        } => {
            let settings = load_settings(&config_path);
            watch::run_watch(&settings, &directories, no_watch).await?;
        }
    }

    Ok(())
}
