//! Config command - show or initialize the configuration file.

use reel_core::Config;
use std::path::Path;

/// Run the config command.
pub fn run(config: Config, path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if init {
        if path.exists() {
            println!("Config file already exists at {}", path.display());
        } else {
            config.save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
