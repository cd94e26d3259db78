//! Config command handlers.

use glasslink_config::{Config, Profile, config_path, load_config_or_default, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: ConfigArgs, _global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = load_config_or_default();
            let rendered =
                toml::to_string_pretty(&cfg).map_err(|e| CliError::Internal(e.to_string()))?;
            print!("{rendered}");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config_path().display());
            Ok(())
        }

        ConfigCommand::Init => {
            let path = config_path();
            if path.exists() {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists", path.display()),
                });
            }
            let mut cfg = Config::default();
            cfg.profiles.insert("default".into(), Profile::default());
            save_config(&cfg)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}
