//! End-to-end session against an in-process mock host.
//!
//! The call is issued before the handshake so it takes the queued path, then
//! the mock host completes the handshake, answers the flushed call, and the
//! caller's outcome is reported.

use std::time::Duration;

use anyhow::{Context, anyhow};
use hostbridge::{BridgeConfig, Capability, HostInfo};
use hostbridge_protocol::Envelope;
use hostbridge_runtime::split_error_first;
use hostbridge_runtime::testing::MockHost;
use serde_json::Value;

use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};
use crate::output;

pub struct Transcript {
	pub host: HostInfo,
	/// Every envelope the host received, handshake included.
	pub sent: Vec<Envelope>,
	/// Responses the host sent back, by correlation id.
	pub responses: Vec<(u32, Vec<Value>)>,
	/// What the caller saw, after the error-first convention.
	pub outcome: std::result::Result<Vec<Value>, hostbridge::Error>,
}

fn parse_array(what: &'static str, raw: &str) -> Result<Vec<Value>> {
	match serde_json::from_str(raw).map_err(CliError::invalid_json(what))? {
		Value::Array(values) => Ok(values),
		_ => Err(CliError::NotAnArray { what }),
	}
}

pub async fn run(args: &SimulateArgs, mut config: BridgeConfig) -> Result<Transcript> {
	let call_args = parse_array("--args", &args.args)?;
	let respond_with = parse_array("--respond", &args.respond)?;
	let wait = Duration::from_millis(args.timeout_ms);
	if let Some(version) = &args.sdk_version {
		config.client_sdk_version = version.clone();
	}

	let (connection, mut host) = MockHost::connect_with_config(config);
	let handshake = connection.initialize();

	let issued = match Capability::from_wire_name(&args.func) {
		Some(capability) => connection.call(capability, call_args),
		None => connection.call_raw(&args.func, call_args),
	};
	tracing::info!(func = %args.func, queued = issued.is_ok(), "Issued call before handshake");

	host.complete_handshake(args.context, args.client_type, args.host_version.as_deref())
		.await?;
	let info = tokio::time::timeout(wait, handshake)
		.await
		.context("mock handshake did not complete")??;

	let mut responses = Vec::new();
	let outcome = match issued {
		Err(err) => Err(err),
		Ok(mut call) => loop {
			tokio::select! {
				result = &mut call => break result.and_then(split_error_first),
				message = host.next_message_within(wait) => match message {
					Some(envelope) if envelope.func == args.func => {
						if let Some(id) = envelope.id {
							host.respond(id, respond_with.clone())?;
							responses.push((id, respond_with.clone()));
						}
					}
					Some(_) => {}
					None => return Err(anyhow!("{} did not settle within {}ms", args.func, args.timeout_ms).into()),
				},
			}
		},
	};

	connection.teardown();
	Ok(Transcript {
		host: info,
		sent: host.sent().to_vec(),
		responses,
		outcome,
	})
}

pub async fn execute(args: &SimulateArgs, config: BridgeConfig) -> Result<()> {
	let transcript = run(args, config).await?;

	output::heading("Handshake");
	println!(
		"  context {}, client {}, host version {}",
		transcript.host.frame_context,
		transcript.host.host_client_type,
		transcript.host.host_version.as_str()
	);

	output::heading("Transcript");
	for envelope in &transcript.sent {
		println!("  {}", output::envelope_line(envelope));
		if let Some(id) = envelope.id {
			for (_, args) in transcript.responses.iter().filter(|(rid, _)| *rid == id) {
				println!("  {}", output::response_line(id, args));
			}
		}
	}

	output::heading("Outcome");
	match &transcript.outcome {
		Ok(values) => println!("  {}", output::ok(Value::Array(values.clone()))),
		Err(err) => println!("  {}", output::rejected(err)),
	}
	Ok(())
}
