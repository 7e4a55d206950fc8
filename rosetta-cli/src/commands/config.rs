//! Inspect and initialize the rosetta config file

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use rosetta_server::RosettaConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective configuration with secrets masked
    Show,
    /// Write a default config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init(args) => run_init(args),
    }
}

fn run_path() -> Result<()> {
    println!("{}", RosettaConfig::config_path().display());
    Ok(())
}

fn run_show() -> Result<()> {
    let config = RosettaConfig::load().context("failed to load configuration")?;
    let rendered = config
        .to_redacted_toml()
        .context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let path = RosettaConfig::config_path();
    if path.exists() && !args.force {
        return Err(anyhow!(
            "Config already exists at {}\n\nUse --force to overwrite",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let rendered = RosettaConfig::default()
        .to_redacted_toml()
        .context("failed to render default configuration")?;
    std::fs::write(&path, rendered)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    Ok(())
}
