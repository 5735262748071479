//! Core enums describing where the application runs and who hosts it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The embedding mode the application is currently running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameContext {
	/// Configuration page shown when the app is added
	Settings,
	/// Regular content page
	Content,
	/// Authentication window
	Authentication,
	/// Page shown when the app is removed
	Remove,
	/// Dialog (task module) content
	Task,
	/// Side panel of a meeting
	SidePanel,
	/// Stage view
	Stage,
	/// Shared meeting stage
	MeetingStage,
}

impl FrameContext {
	/// Every frame context, in declaration order.
	pub const ALL: [FrameContext; 8] = [
		FrameContext::Settings,
		FrameContext::Content,
		FrameContext::Authentication,
		FrameContext::Remove,
		FrameContext::Task,
		FrameContext::SidePanel,
		FrameContext::Stage,
		FrameContext::MeetingStage,
	];

	/// Returns the wire spelling.
	pub fn as_str(&self) -> &'static str {
		match self {
			FrameContext::Settings => "settings",
			FrameContext::Content => "content",
			FrameContext::Authentication => "authentication",
			FrameContext::Remove => "remove",
			FrameContext::Task => "task",
			FrameContext::SidePanel => "sidePanel",
			FrameContext::Stage => "stage",
			FrameContext::MeetingStage => "meetingStage",
		}
	}
}

impl fmt::Display for FrameContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FrameContext {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FrameContext::ALL
			.into_iter()
			.find(|ctx| ctx.as_str() == s)
			.ok_or_else(|| UnknownVariant::new("frame context", s))
	}
}

/// Kind of host client the application is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostClientType {
	Desktop,
	Web,
	Android,
	Ios,
	Ipados,
	Rigel,
	SurfaceHub,
	TeamsRoomsWindows,
	TeamsRoomsAndroid,
	TeamsPhones,
	TeamsDisplays,
	/// Client type not known to this version of the library
	#[serde(other)]
	Unknown,
}

impl HostClientType {
	/// Returns the wire spelling.
	pub fn as_str(&self) -> &'static str {
		match self {
			HostClientType::Desktop => "desktop",
			HostClientType::Web => "web",
			HostClientType::Android => "android",
			HostClientType::Ios => "ios",
			HostClientType::Ipados => "ipados",
			HostClientType::Rigel => "rigel",
			HostClientType::SurfaceHub => "surfaceHub",
			HostClientType::TeamsRoomsWindows => "teamsRoomsWindows",
			HostClientType::TeamsRoomsAndroid => "teamsRoomsAndroid",
			HostClientType::TeamsPhones => "teamsPhones",
			HostClientType::TeamsDisplays => "teamsDisplays",
			HostClientType::Unknown => "unknown",
		}
	}

	/// Returns true for phone and tablet clients.
	pub fn is_mobile(&self) -> bool {
		matches!(
			self,
			HostClientType::Android | HostClientType::Ios | HostClientType::Ipados
		)
	}
}

impl fmt::Display for HostClientType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HostClientType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		serde_json::from_value(serde_json::Value::String(s.to_string()))
			.ok()
			.filter(|t| *t != HostClientType::Unknown)
			.ok_or_else(|| UnknownVariant::new("host client type", s))
	}
}

/// Handshake state of a protocol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
	#[default]
	Uninitialized,
	Initializing,
	Initialized,
}

impl fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LifecycleState::Uninitialized => "uninitialized",
			LifecycleState::Initializing => "initializing",
			LifecycleState::Initialized => "initialized",
		})
	}
}

/// Error returned when parsing an enum from an unrecognized string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
	kind: &'static str,
	value: String,
}

impl UnknownVariant {
	fn new(kind: &'static str, value: &str) -> Self {
		Self {
			kind,
			value: value.to_string(),
		}
	}
}

impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown {}: \"{}\"", self.kind, self.value)
	}
}

impl std::error::Error for UnknownVariant {}
