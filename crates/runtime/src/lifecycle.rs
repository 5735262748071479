//! Handshake state machine and the pre-handshake queue.
//!
//! ```text
//! uninitialized ──initialize()──▶ initializing ──handshake ack──▶ initialized
//!       ▲                              │                              │
//!       └──────── malformed ack ───────┘                              │
//!       └───────────────────────────── teardown() ────────────────────┘
//! ```
//!
//! [`Lifecycle`] is plain data guarded by the connection's lock. It never
//! touches the transport; it only decides whether an envelope goes out now or
//! waits, and hands back the queue when the handshake settles.

use std::collections::VecDeque;

use hostbridge_protocol::{Envelope, FrameContext, HostClientType, HostVersion, LifecycleState};
use serde::Serialize;
use serde_json::Value;

use crate::capability::Capability;
use crate::error::{Error, Result};

/// What the host told us about itself in the handshake response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
	pub frame_context: FrameContext,
	pub host_client_type: HostClientType,
	pub host_version: HostVersion,
}

impl HostInfo {
	/// Parses the handshake response arguments
	/// `[frameContext, hostClientType, hostVersion?]`.
	///
	/// Only an unrecognised frame context is fatal. A missing or unknown client
	/// type maps to [`HostClientType::Unknown`]; a missing or unparsable
	/// version falls back to `default_version`.
	pub fn from_handshake(args: &[Value], default_version: &HostVersion) -> Result<Self> {
		let frame_context = args
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| Error::HandshakeFailed("response carries no frame context".to_string()))?
			.parse::<FrameContext>()
			.map_err(|e| Error::HandshakeFailed(e.to_string()))?;

		let host_client_type = args
			.get(1)
			.and_then(Value::as_str)
			.and_then(|s| s.parse().ok())
			.unwrap_or(HostClientType::Unknown);

		let host_version = match args.get(2).and_then(Value::as_str) {
			Some(raw) => HostVersion::parse(raw).unwrap_or_else(|e| {
				tracing::warn!(%e, "Host reported an unparsable version, assuming default");
				default_version.clone()
			}),
			None => default_version.clone(),
		};

		Ok(Self {
			frame_context,
			host_client_type,
			host_version,
		})
	}
}

/// Snapshot returned by `get_state()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
	pub lifecycle: LifecycleState,
	pub frame_context: Option<FrameContext>,
	pub host_client_type: Option<HostClientType>,
	pub host_version: Option<HostVersion>,
}

/// An envelope waiting for the handshake, with the capability it must be
/// re-gated against (`None` for ungated raw calls).
#[derive(Debug)]
pub(crate) struct QueuedCall {
	pub envelope: Envelope,
	pub capability: Option<Capability>,
}

/// Where [`Lifecycle::route`] sent an envelope.
#[derive(Debug)]
pub(crate) enum Route {
	/// Transmit now.
	Send(Envelope),
	/// Held until the handshake completes.
	Queued { depth: usize },
}

#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
	state: LifecycleState,
	host: Option<HostInfo>,
	queue: VecDeque<QueuedCall>,
	handshake_id: Option<u32>,
}

impl Lifecycle {
	pub fn state(&self) -> LifecycleState {
		self.state
	}

	pub fn host(&self) -> Option<&HostInfo> {
		self.host.as_ref()
	}

	pub fn handshake_id(&self) -> Option<u32> {
		self.handshake_id
	}

	pub fn snapshot(&self) -> BridgeState {
		BridgeState {
			lifecycle: self.state,
			frame_context: self.host.as_ref().map(|h| h.frame_context),
			host_client_type: self.host.as_ref().map(|h| h.host_client_type),
			host_version: self.host.as_ref().map(|h| h.host_version.clone()),
		}
	}

	/// Moves `uninitialized → initializing`. Returns false when a handshake
	/// is already running or finished.
	pub fn begin_handshake(&mut self, id: u32) -> bool {
		if self.state != LifecycleState::Uninitialized {
			return false;
		}
		self.state = LifecycleState::Initializing;
		self.handshake_id = Some(id);
		true
	}

	/// Decides whether `call` goes out now or waits for the handshake.
	///
	/// Callers must have already rejected the `uninitialized` state.
	pub fn route(&mut self, call: QueuedCall) -> Route {
		match self.state {
			LifecycleState::Initialized => Route::Send(call.envelope),
			_ => {
				self.queue.push_back(call);
				Route::Queued {
					depth: self.queue.len(),
				}
			}
		}
	}

	/// Records the host's details and hands back the queue in FIFO order.
	pub fn complete_handshake(&mut self, host: HostInfo) -> Vec<QueuedCall> {
		self.state = LifecycleState::Initialized;
		self.host = Some(host);
		self.handshake_id = None;
		self.queue.drain(..).collect()
	}

	/// Returns to `uninitialized`, handing back whatever was queued.
	///
	/// Used both for a malformed handshake and for teardown.
	pub fn reset(&mut self) -> Vec<QueuedCall> {
		self.state = LifecycleState::Uninitialized;
		self.host = None;
		self.handshake_id = None;
		self.queue.drain(..).collect()
	}

	/// Replaces the frame context reported at handshake.
	pub fn set_frame_context(&mut self, context: FrameContext) -> Result<()> {
		match (self.state, self.host.as_mut()) {
			(LifecycleState::Initialized, Some(host)) => {
				host.frame_context = context;
				Ok(())
			}
			_ => Err(Error::NotInitialized),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn default_version() -> HostVersion {
		HostVersion::parse("2.0.1").unwrap()
	}

	fn queued(func: &str) -> QueuedCall {
		QueuedCall {
			envelope: Envelope::notification(func, vec![]),
			capability: None,
		}
	}

	#[test]
	fn handshake_args_fill_defaults() {
		let info = HostInfo::from_handshake(&[json!("content")], &default_version()).unwrap();
		assert_eq!(info.frame_context, FrameContext::Content);
		assert_eq!(info.host_client_type, HostClientType::Unknown);
		assert_eq!(info.host_version.as_str(), "2.0.1");

		let info =
			HostInfo::from_handshake(&[json!("task"), json!("android"), json!("1.6.0")], &default_version()).unwrap();
		assert_eq!(info.host_client_type, HostClientType::Android);
		assert_eq!(info.host_version.as_str(), "1.6.0");
	}

	#[test]
	fn unknown_frame_context_fails_handshake() {
		let err = HostInfo::from_handshake(&[json!("nowhere")], &default_version()).unwrap_err();
		assert!(matches!(err, Error::HandshakeFailed(_)));
		let err = HostInfo::from_handshake(&[], &default_version()).unwrap_err();
		assert!(matches!(err, Error::HandshakeFailed(_)));
	}

	#[test]
	fn queue_drains_in_issue_order() {
		let mut lifecycle = Lifecycle::default();
		assert!(lifecycle.begin_handshake(0));
		assert!(!lifecycle.begin_handshake(1));

		for func in ["a", "b", "c"] {
			assert!(matches!(lifecycle.route(queued(func)), Route::Queued { .. }));
		}

		let info = HostInfo::from_handshake(&[json!("content")], &default_version()).unwrap();
		let drained: Vec<_> = lifecycle
			.complete_handshake(info)
			.into_iter()
			.map(|c| c.envelope.func)
			.collect();
		assert_eq!(drained, ["a", "b", "c"]);
		assert_eq!(lifecycle.state(), LifecycleState::Initialized);
		assert!(matches!(lifecycle.route(queued("d")), Route::Send(_)));
	}

	#[test]
	fn reset_clears_host_and_queue() {
		let mut lifecycle = Lifecycle::default();
		lifecycle.begin_handshake(0);
		lifecycle.route(queued("a"));
		assert_eq!(lifecycle.reset().len(), 1);
		assert_eq!(lifecycle.snapshot().lifecycle, LifecycleState::Uninitialized);
		assert_eq!(lifecycle.snapshot().frame_context, None);
		assert!(lifecycle.set_frame_context(FrameContext::Task).is_err());
	}
}
