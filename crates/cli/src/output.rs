//! Terminal rendering for command results.

use std::error::Error as _;

use colored::Colorize;
use hostbridge_protocol::Envelope;
use serde_json::Value;

use crate::error::CliError;

pub fn print_error(err: &CliError) {
	eprintln!("{} {err}", "error:".red().bold());
	let mut source = err.source();
	while let Some(cause) = source {
		eprintln!("  {} {cause}", "caused by:".yellow());
		source = cause.source();
	}
}

pub fn heading(text: &str) {
	println!("{}", text.green().bold());
}

/// One line per envelope, as the host saw it.
pub fn envelope_line(envelope: &Envelope) -> String {
	let id = match envelope.id {
		Some(id) => format!("#{id}"),
		None => "--".to_string(),
	};
	format!(
		"{} {:>4} {} {}",
		"->".cyan(),
		id.dimmed(),
		envelope.func.bold(),
		Value::Array(envelope.args.clone())
	)
}

pub fn response_line(id: u32, args: &[Value]) -> String {
	format!("{} {:>4} {}", "<-".magenta(), format!("#{id}").dimmed(), Value::Array(args.to_vec()))
}

pub fn ok(text: impl std::fmt::Display) -> String {
	format!("{} {text}", "ok".green().bold())
}

pub fn rejected(text: impl std::fmt::Display) -> String {
	format!("{} {text}", "rejected".red().bold())
}

pub fn mark(allowed: bool) -> colored::ColoredString {
	if allowed { "yes".green() } else { "no".red() }
}
