use hostbridge::{BridgeConfig, Capability, HostClientType, HostInfo, LifecycleState};
use hostbridge_runtime::capability::{Admission, admit};

use crate::cli::CapabilitiesArgs;
use crate::error::Result;
use crate::output;

struct Row {
	capability: Capability,
	contexts: String,
	min_version: String,
	verdict: Option<std::result::Result<(), hostbridge::Error>>,
}

fn evaluate(capability: Capability, host: &HostInfo) -> std::result::Result<(), hostbridge::Error> {
	match admit(capability, LifecycleState::Initialized, Some(host))? {
		Admission::Allowed | Admission::Deferred => Ok(()),
		Admission::Rejected(err) => Err(err),
	}
}

fn rows(host: Option<&HostInfo>) -> Vec<Row> {
	Capability::ALL
		.into_iter()
		.map(|capability| Row {
			capability,
			contexts: match capability.allowed_contexts() {
				None => "any".to_string(),
				Some(contexts) => contexts.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "),
			},
			min_version: capability
				.min_version()
				.map(|v| v.as_str().to_string())
				.unwrap_or_else(|| "-".to_string()),
			verdict: host.map(|host| evaluate(capability, host)),
		})
		.collect()
}

pub fn execute(args: &CapabilitiesArgs, config: &BridgeConfig) -> Result<()> {
	let host = args.context.map(|frame_context| HostInfo {
		frame_context,
		host_client_type: HostClientType::Unknown,
		host_version: args
			.host_version
			.clone()
			.unwrap_or_else(|| config.default_host_version.clone()),
	});

	match &host {
		Some(host) => output::heading(&format!(
			"Capabilities in {} on host {}",
			host.frame_context,
			host.host_version.as_str()
		)),
		None => output::heading("Capabilities"),
	}

	for row in rows(host.as_ref()) {
		let mut line = format!(
			"  {:<28} {:<8} {}",
			row.capability.wire_name(),
			row.min_version,
			row.contexts
		);
		if let Some(verdict) = &row.verdict {
			let mark = output::mark(verdict.is_ok());
			line = format!("{mark:<4} {}", line.trim_start());
			if let Err(err) = verdict {
				line.push_str(&format!("\n       {err}"));
			}
		}
		println!("{line}");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use hostbridge::{FrameContext, HostVersion};

	use super::*;

	fn host(context: FrameContext, version: &str) -> HostInfo {
		HostInfo {
			frame_context: context,
			host_client_type: HostClientType::Unknown,
			host_version: HostVersion::parse(version).unwrap(),
		}
	}

	#[test]
	fn table_lists_every_capability() {
		let rows = rows(None);
		assert_eq!(rows.len(), Capability::ALL.len());
		assert!(rows.iter().all(|row| row.verdict.is_none()));

		let location = rows
			.iter()
			.find(|row| row.capability == Capability::LocationGetLocation)
			.unwrap();
		assert_eq!(location.contexts, "content, task");
		assert_eq!(location.min_version, "1.9.0");
	}

	#[test]
	fn verdicts_follow_the_gate() {
		let rows = rows(Some(&host(FrameContext::Settings, "1.8.0")));
		let verdict = |capability: Capability| {
			rows.iter()
				.find(|row| row.capability == capability)
				.and_then(|row| row.verdict.as_ref())
				.unwrap()
		};

		assert!(verdict(Capability::GetContext).is_ok());
		assert!(verdict(Capability::SettingsSaveSuccess).is_ok());
		assert!(verdict(Capability::LocationGetLocation).as_ref().unwrap_err().is_context_not_allowed());
	}

	#[test]
	fn old_host_fails_version_check() {
		assert!(evaluate(Capability::LocationShowLocation, &host(FrameContext::Task, "1.8.0"))
			.unwrap_err()
			.is_old_platform());
		assert!(evaluate(Capability::LocationShowLocation, &host(FrameContext::Task, "1.9.0")).is_ok());
	}
}
