//! Runtime configuration.
//!
//! [`BridgeConfig`] is plain data with serde support so it can be loaded from
//! a JSON file by tools, plus a builder for programmatic use.

use std::time::Duration;

use hostbridge_protocol::{DEFAULT_HOST_VERSION, HostVersion};
use serde::{Deserialize, Serialize};

/// Client protocol version announced in the initialize envelope.
pub const CLIENT_SDK_VERSION: &str = "2.0.0";

/// Default period for polling secondary windows for closure.
pub const DEFAULT_CHILD_POLL_INTERVAL_MS: u64 = 100;

/// Queue length at which a warning is logged.
pub const DEFAULT_QUEUE_WARN_THRESHOLD: usize = 64;

/// Settings that shape a protocol session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
	/// Version string sent with the handshake
	pub client_sdk_version: String,
	/// Host version assumed when the handshake does not report one
	pub default_host_version: HostVersion,
	/// How often open secondary windows are checked for closure, in ms
	pub child_poll_interval_ms: u64,
	/// Log a warning once this many calls are queued before the handshake
	pub queue_warn_threshold: usize,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			client_sdk_version: CLIENT_SDK_VERSION.to_string(),
			default_host_version: default_host_version(),
			child_poll_interval_ms: DEFAULT_CHILD_POLL_INTERVAL_MS,
			queue_warn_threshold: DEFAULT_QUEUE_WARN_THRESHOLD,
		}
	}
}

fn default_host_version() -> HostVersion {
	HostVersion::parse(DEFAULT_HOST_VERSION).expect("DEFAULT_HOST_VERSION is always valid")
}

impl BridgeConfig {
	/// Creates a new builder.
	pub fn builder() -> BridgeConfigBuilder {
		BridgeConfigBuilder::default()
	}

	/// Returns the child closure polling period.
	pub fn child_poll_interval(&self) -> Duration {
		Duration::from_millis(self.child_poll_interval_ms.max(1))
	}
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
	inner: BridgeConfig,
}

impl BridgeConfigBuilder {
	/// Sets the version announced during the handshake.
	pub fn client_sdk_version(mut self, version: impl Into<String>) -> Self {
		self.inner.client_sdk_version = version.into();
		self
	}

	/// Sets the host version assumed when the handshake omits one.
	pub fn default_host_version(mut self, version: HostVersion) -> Self {
		self.inner.default_host_version = version;
		self
	}

	/// Sets the secondary-window polling period.
	pub fn child_poll_interval(mut self, interval: Duration) -> Self {
		self.inner.child_poll_interval_ms = interval.as_millis() as u64;
		self
	}

	/// Sets the queue length warning threshold.
	pub fn queue_warn_threshold(mut self, threshold: usize) -> Self {
		self.inner.queue_warn_threshold = threshold;
		self
	}

	/// Builds the configuration.
	pub fn build(self) -> BridgeConfig {
		self.inner
	}
}
