//! Stderr logging for the CLI. `RUST_LOG` wins over `-v`.

use tracing_subscriber::EnvFilter;

/// Filter directives for a `-v` count.
fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn,hostbridge_runtime=error",
		1 => "info",
		2 => "debug,hostbridge_runtime::transport=info",
		_ => "trace",
	}
}

pub fn init_logging(verbosity: u8) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(colored::control::SHOULD_COLORIZE.should_colorize())
		.with_target(verbosity >= 2)
		.without_time()
		.compact()
		.init();
}
