#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};
use hostbridge_protocol::{FrameContext, HostClientType, HostVersion};

fn help_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.error(AnsiColor::Red.on_default().bold())
}

/// Inspect and simulate the host bridge protocol.
#[derive(Parser, Debug)]
#[command(name = "hostbridge")]
#[command(about = "Inspect and simulate host bridge sessions")]
#[command(version)]
#[command(styles = help_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Bridge configuration file (JSON)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Print the capability table, optionally checked against a context and host version.
	Capabilities(CapabilitiesArgs),
	/// Translate a legacy task-module payload and print the envelope it produces.
	TranslateTask(TranslateTaskArgs),
	/// Queue one call, complete a handshake with a mock host, and print the transcript.
	Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CapabilitiesArgs {
	/// Frame context to evaluate each capability in.
	#[arg(long, value_name = "CTX")]
	pub context: Option<FrameContext>,

	/// Host version to evaluate against (defaults to the configured one).
	#[arg(long, value_name = "VERSION", requires = "context")]
	pub host_version: Option<HostVersion>,
}

#[derive(Args, Debug, Clone)]
pub struct TranslateTaskArgs {
	/// TaskInfo object, e.g. '{"url":"https://app.example","height":"large"}'.
	#[arg(value_name = "JSON")]
	pub task: String,

	/// Translate as a resize (tasks.updateTask) instead of an open.
	#[arg(long)]
	pub update: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
	/// Wire name of the function to call, e.g. location.getLocation.
	#[arg(value_name = "FUNC")]
	pub func: String,

	/// Frame context the mock host reports.
	#[arg(long, value_name = "CTX")]
	pub context: FrameContext,

	/// Client type the mock host reports.
	#[arg(long, value_name = "TYPE", default_value = "desktop")]
	pub client_type: HostClientType,

	/// Host version the mock host reports; omitted from the handshake if unset.
	#[arg(long, value_name = "VERSION")]
	pub host_version: Option<String>,

	/// Call arguments as a JSON array.
	#[arg(long, value_name = "JSON", default_value = "[]")]
	pub args: String,

	/// Response arguments the mock host answers with, as a JSON array.
	#[arg(long, value_name = "JSON", default_value = "[null]")]
	pub respond: String,

	/// Overrides the version announced in the handshake.
	#[arg(long, value_name = "VERSION")]
	pub sdk_version: Option<String>,

	/// How long to wait for each step, in milliseconds.
	#[arg(long, value_name = "MS", default_value_t = 2000)]
	pub timeout_ms: u64,
}
