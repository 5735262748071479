use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read config {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid {what} JSON")]
	InvalidJson {
		what: &'static str,
		#[source]
		source: serde_json::Error,
	},

	#[error("{what} must be a JSON array")]
	NotAnArray { what: &'static str },

	#[error(transparent)]
	Bridge(#[from] hostbridge::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn invalid_json(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
		move |source| CliError::InvalidJson { what, source }
	}
}
