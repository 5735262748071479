//! Capability table and the gate that checks every call against it.
//!
//! Each [`Capability`] declares the frame contexts it may be called from and,
//! optionally, the minimum host version it needs. The gate runs before any
//! envelope is built; a rejected call never reaches the transport.
//!
//! Checks, in order:
//!
//! 1. Lifecycle is not `uninitialized` (synchronous [`Error::NotInitialized`])
//! 2. Frame context is in the allowed set (synchronous [`Error::ContextNotAllowed`])
//! 3. Host version satisfies the minimum ([`Error::OldPlatform`], delivered
//!    through the call's result rather than returned from the call site)
//!
//! While the handshake is still in flight the frame context and host version
//! are unknown, so checks 2 and 3 are deferred to the moment the queued call
//! is flushed.

use std::fmt;

use hostbridge_protocol::{FrameContext, HostVersion, LifecycleState};

use crate::error::{Error, Result};
use crate::lifecycle::HostInfo;

use FrameContext::*;

/// Every host operation known to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
	GetContext,
	ExecuteDeepLink,
	SetFrameContext,
	DialogOpen,
	DialogResize,
	DialogSubmit,
	LocationGetLocation,
	LocationShowLocation,
	SettingsSetValidityState,
	SettingsGetSettings,
	SettingsSetSettings,
	SettingsSaveSuccess,
	SettingsSaveFailure,
	SettingsRemoveSuccess,
	SettingsRemoveFailure,
	AuthenticationAuthenticate,
	AuthenticationGetAuthToken,
	ChildWindowPostMessage,
	ParentWindowPostMessage,
}

const LOCATION_MIN_VERSION: &str = "1.9.0";

impl Capability {
	pub const ALL: [Capability; 19] = [
		Capability::GetContext,
		Capability::ExecuteDeepLink,
		Capability::SetFrameContext,
		Capability::DialogOpen,
		Capability::DialogResize,
		Capability::DialogSubmit,
		Capability::LocationGetLocation,
		Capability::LocationShowLocation,
		Capability::SettingsSetValidityState,
		Capability::SettingsGetSettings,
		Capability::SettingsSetSettings,
		Capability::SettingsSaveSuccess,
		Capability::SettingsSaveFailure,
		Capability::SettingsRemoveSuccess,
		Capability::SettingsRemoveFailure,
		Capability::AuthenticationAuthenticate,
		Capability::AuthenticationGetAuthToken,
		Capability::ChildWindowPostMessage,
		Capability::ParentWindowPostMessage,
	];

	/// Function name used on the wire.
	///
	/// Dialog operations keep the task-module names hosts implement.
	pub fn wire_name(&self) -> &'static str {
		match self {
			Capability::GetContext => "getContext",
			Capability::ExecuteDeepLink => "executeDeepLink",
			Capability::SetFrameContext => "setFrameContext",
			Capability::DialogOpen => "tasks.startTask",
			Capability::DialogResize => "tasks.updateTask",
			Capability::DialogSubmit => "tasks.completeTask",
			Capability::LocationGetLocation => "location.getLocation",
			Capability::LocationShowLocation => "location.showLocation",
			Capability::SettingsSetValidityState => "settings.setValidityState",
			Capability::SettingsGetSettings => "settings.getSettings",
			Capability::SettingsSetSettings => "settings.setSettings",
			Capability::SettingsSaveSuccess => "settings.save.success",
			Capability::SettingsSaveFailure => "settings.save.failure",
			Capability::SettingsRemoveSuccess => "settings.remove.success",
			Capability::SettingsRemoveFailure => "settings.remove.failure",
			Capability::AuthenticationAuthenticate => "authentication.authenticate",
			Capability::AuthenticationGetAuthToken => "authentication.getAuthToken",
			Capability::ChildWindowPostMessage => "messageForChild",
			Capability::ParentWindowPostMessage => "messageForParent",
		}
	}

	/// Frame contexts the capability may be called from; `None` means any.
	pub fn allowed_contexts(&self) -> Option<&'static [FrameContext]> {
		match self {
			Capability::GetContext
			| Capability::SetFrameContext
			| Capability::AuthenticationGetAuthToken
			| Capability::ChildWindowPostMessage => None,
			Capability::ExecuteDeepLink => {
				Some(&[Content, SidePanel, Settings, Task, Stage, MeetingStage])
			}
			Capability::DialogOpen => Some(&[Content, SidePanel, MeetingStage]),
			Capability::DialogResize | Capability::DialogSubmit | Capability::ParentWindowPostMessage => {
				Some(&[Task])
			}
			Capability::LocationGetLocation | Capability::LocationShowLocation => {
				Some(&[Content, Task])
			}
			Capability::SettingsSetValidityState => Some(&[Settings, Remove]),
			Capability::SettingsGetSettings => Some(&[Content, Settings, Remove, SidePanel]),
			Capability::SettingsSetSettings => Some(&[Content, Settings, SidePanel]),
			Capability::SettingsSaveSuccess | Capability::SettingsSaveFailure => {
				Some(&[Settings])
			}
			Capability::SettingsRemoveSuccess | Capability::SettingsRemoveFailure => {
				Some(&[Remove])
			}
			Capability::AuthenticationAuthenticate => Some(&[
				Content,
				SidePanel,
				Settings,
				Remove,
				Task,
				Stage,
				MeetingStage,
			]),
		}
	}

	/// Minimum host version, if the capability has one.
	pub fn min_version(&self) -> Option<HostVersion> {
		let raw = match self {
			Capability::LocationGetLocation | Capability::LocationShowLocation => {
				LOCATION_MIN_VERSION
			}
			_ => return None,
		};
		HostVersion::parse(raw).ok()
	}

	/// Looks a capability up by its wire name.
	pub fn from_wire_name(func: &str) -> Option<Capability> {
		Capability::ALL.into_iter().find(|c| c.wire_name() == func)
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.wire_name())
	}
}

/// What the gate decided for a call that passed the synchronous checks.
#[derive(Debug)]
pub enum Admission {
	/// Send (or queue) the envelope.
	Allowed,
	/// Handshake in flight; re-check at flush.
	Deferred,
	/// Do not send; settle the call with this error.
	Rejected(Error),
}

/// Runs the gate for a call issued in the given lifecycle state.
///
/// `Err` is reserved for the synchronous failures (not initialized, context
/// not allowed); a version mismatch comes back as [`Admission::Rejected`].
pub fn admit(
	capability: Capability,
	state: LifecycleState,
	host: Option<&HostInfo>,
) -> Result<Admission> {
	if state == LifecycleState::Uninitialized {
		return Err(Error::NotInitialized);
	}
	let Some(host) = host else {
		return Ok(Admission::Deferred);
	};
	check_context(capability, host.frame_context)?;
	Ok(match check_version(capability, &host.host_version) {
		Ok(()) => Admission::Allowed,
		Err(err) => Admission::Rejected(err),
	})
}

/// Re-runs the context and version checks for a call that was queued before
/// the host's details were known.
pub fn recheck(capability: Capability, host: &HostInfo) -> Result<()> {
	check_context(capability, host.frame_context)?;
	check_version(capability, &host.host_version)
}

fn check_context(capability: Capability, actual: FrameContext) -> Result<()> {
	match capability.allowed_contexts() {
		Some(allowed) if !allowed.contains(&actual) => Err(Error::ContextNotAllowed {
			allowed: allowed.to_vec(),
			actual,
		}),
		_ => Ok(()),
	}
}

fn check_version(capability: Capability, actual: &HostVersion) -> Result<()> {
	match capability.min_version() {
		Some(required) if !actual.satisfies(&required) => Err(Error::OldPlatform {
			required,
			actual: actual.clone(),
		}),
		_ => Ok(()),
	}
}
