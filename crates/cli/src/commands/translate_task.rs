//! Runs a legacy task payload through the adapter against a mock host and
//! reports the envelope that reaches the wire.

#![allow(deprecated)]

use std::time::Duration;

use anyhow::Context;
use hostbridge::tasks::{start_task, update_task};
use hostbridge::{BridgeConfig, Capability, FrameContext, HostClientType, TaskInfo};
use hostbridge_protocol::Envelope;
use hostbridge_runtime::testing::MockHost;

use crate::cli::TranslateTaskArgs;
use crate::error::{CliError, Result};
use crate::output;

const WAIT: Duration = Duration::from_secs(2);

pub async fn translate(task: TaskInfo, update: bool, config: BridgeConfig) -> Result<Envelope> {
	// Open is issued from a content page, resize from inside the dialog.
	let (context, capability) = if update {
		(FrameContext::Task, Capability::DialogResize)
	} else {
		(FrameContext::Content, Capability::DialogOpen)
	};

	let (connection, mut host) = MockHost::connect_with_config(config);
	let handshake = connection.initialize();
	host.complete_handshake(context, HostClientType::Desktop, None).await?;
	tokio::time::timeout(WAIT, handshake)
		.await
		.context("mock handshake did not complete")??;

	if update {
		update_task(&connection, task)?;
	} else {
		start_task(&connection, task, |_| {})?;
	}
	let envelope = host.expect_func(capability.wire_name()).await?;
	connection.teardown();
	Ok(envelope)
}

pub async fn execute(args: &TranslateTaskArgs, config: BridgeConfig) -> Result<()> {
	let task: TaskInfo = serde_json::from_str(&args.task).map_err(CliError::invalid_json("task"))?;
	let envelope = translate(task, args.update, config).await?;

	output::heading("Envelope");
	println!("{}", output::envelope_line(&envelope));
	println!("{}", serde_json::to_string_pretty(&envelope).map_err(CliError::invalid_json("envelope"))?);
	Ok(())
}
