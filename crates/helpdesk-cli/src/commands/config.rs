//! Config commands

use crate::config::Config;
use crate::output::success;
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::with_defaults()?.save(profile)?;
            success(format!("Configuration written to {}", path.display()));
        }
        ConfigCommands::Show => {
            let config = Config::load(profile)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
