use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{ReloadrError, Result};

pub fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli),
        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
    }
}

fn show(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let content =
            toml::to_string_pretty(&config).map_err(|e| ReloadrError::ConfigError(e.to_string()))?;
        print!("{}", content);
    }

    Ok(())
}
