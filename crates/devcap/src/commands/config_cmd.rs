//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::{self, Report};

/// `config show`: the effective settings, as TOML for humans.
#[derive(serde::Serialize)]
#[serde(transparent)]
struct ConfigReport(Config);

impl Report for ConfigReport {
    fn table(&self, _color: bool) -> String {
        self.plain()
    }

    fn plain(&self) -> String {
        self.0.to_toml().unwrap_or_else(|e| e.to_string())
    }
}

pub fn handle(
    args: ConfigArgs,
    loaded: Result<Config, CliError>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = config::active_config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            let mut starter = Config::default();
            starter.repository.path.clone_from(&global.repository);
            config::save_config(&starter, &path)?;
            if !global.quiet {
                eprintln!("Configuration written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            output::emit(&ConfigReport(loaded?), global);
            Ok(())
        }
    }
}
