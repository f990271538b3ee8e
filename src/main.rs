use anyhow::{Context, Result};
use clap::Parser;

use sonotag::cli::{Cli, Command};
use sonotag::{audio, batch, config, features, server};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect sonotag.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("sonotag.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("sonotag").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("sonotag").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                config::Config::default()
            }
        },
        None => config::Config::default(),
    };

    match cli.command {
        Command::Analyze { source, pretty } => {
            let waveform = audio::acquire(&source)?;
            let record = features::extract(&waveform)?;
            let json = if pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{json}");
        }

        Command::Batch {
            sources,
            output,
            jobs,
        } => {
            if sources.is_empty() {
                anyhow::bail!("No input sources given");
            }
            let jobs = jobs.or(cfg.batch.jobs);
            let rows = batch::run(&sources, jobs)?;
            log::info!("Analyzed {}/{} sources", rows.len(), sources.len());

            let json = serde_json::to_string_pretty(&rows)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }

        Command::Serve { host, port } => {
            // Merge: config values apply only when CLI is at its default
            let host = if host == "127.0.0.1" { cfg.server.host } else { host };
            let port = if port == 8530 { cfg.server.port } else { port };
            server::serve(&host, port)?;
        }
    }

    Ok(())
}
