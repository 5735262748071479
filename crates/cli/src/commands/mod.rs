mod capabilities;
mod simulate;
mod translate_task;

use std::path::Path;

use hostbridge::BridgeConfig;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = load_config(cli.config.as_deref())?;
	tracing::debug!(?config, "Loaded bridge configuration");

	match cli.command {
		Commands::Capabilities(args) => capabilities::execute(&args, &config),
		Commands::TranslateTask(args) => translate_task::execute(&args, config).await,
		Commands::Simulate(args) => simulate::execute(&args, config).await,
	}
}

/// Reads a [`BridgeConfig`] from a JSON file; defaults when no file is given.
/// Fields missing from the file keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
	let Some(path) = path else {
		return Ok(BridgeConfig::default());
	};
	let raw = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;
	serde_json::from_str(&raw).map_err(|source| CliError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})
}
