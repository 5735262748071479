//! Error types for the host bridge runtime.

use hostbridge_protocol::{ErrorCode, FrameContext, HostVersion, InvalidVersion, SdkError};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the host bridge runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// A call was made before `initialize()`.
	#[error("The library has not yet been initialized")]
	NotInitialized,

	/// The current frame context is not one the capability allows.
	#[error(
		"This call is only allowed in following contexts: {}. Current context: \"{}\".",
		format_contexts(.allowed),
		.actual
	)]
	ContextNotAllowed {
		allowed: Vec<FrameContext>,
		actual: FrameContext,
	},

	/// The host reported a version older than the capability requires.
	#[error("Host version {actual} is older than the required {required}")]
	OldPlatform {
		required: HostVersion,
		actual: HostVersion,
	},

	/// The host answered with an error payload (kept verbatim).
	#[error("Host rejected the call: {0}")]
	HostRejected(Value),

	/// The protocol session was torn down while the call was pending.
	#[error("The library was torn down before the call completed")]
	TornDown,

	/// The host's handshake response could not be understood.
	#[error("Handshake failed: {0}")]
	HandshakeFailed(String),

	/// A secondary authentication flow ended without a token.
	#[error("Authentication failed: {0}")]
	AuthenticationFailed(String),

	/// Invalid argument provided to a capability.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Version string that is not dotted integers.
	#[error(transparent)]
	InvalidVersion(#[from] InvalidVersion),

	/// Transport-level error.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// `Connection::run` was called a second time.
	#[error("Connection is already running")]
	AlreadyRunning,

	/// No secondary-window support was installed on the connection.
	#[error("No window opener configured")]
	NoWindowOpener,

	/// Operation needs a tokio runtime but none is running.
	#[error("No async runtime available: {0}")]
	NoRuntime(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

fn format_contexts(contexts: &[FrameContext]) -> String {
	serde_json::to_string(contexts).unwrap_or_default()
}

impl Error {
	/// Returns true if this is a not-initialized error.
	pub fn is_not_initialized(&self) -> bool {
		matches!(self, Error::NotInitialized)
	}

	/// Returns true if this is a context-not-allowed error.
	pub fn is_context_not_allowed(&self) -> bool {
		matches!(self, Error::ContextNotAllowed { .. })
	}

	/// Returns true if the host is too old for the call, whether detected
	/// locally or reported by the host itself.
	pub fn is_old_platform(&self) -> bool {
		match self {
			Error::OldPlatform { .. } => true,
			Error::HostRejected(_) => self.error_code() == Some(ErrorCode::OLD_PLATFORM),
			_ => false,
		}
	}

	/// Returns true if this is a teardown rejection.
	pub fn is_torn_down(&self) -> bool {
		matches!(self, Error::TornDown)
	}

	/// Decodes the host's error payload, if this is a host rejection carrying one.
	pub fn sdk_error(&self) -> Option<SdkError> {
		match self {
			Error::HostRejected(payload) => serde_json::from_value(payload.clone()).ok(),
			_ => None,
		}
	}

	/// Maps this error onto the protocol's numeric error codes.
	pub fn error_code(&self) -> Option<ErrorCode> {
		match self {
			Error::OldPlatform { .. } => Some(ErrorCode::OLD_PLATFORM),
			Error::ContextNotAllowed { .. } => Some(ErrorCode::NOT_SUPPORTED_IN_CURRENT_CONTEXT),
			Error::InvalidArgument(_) => Some(ErrorCode::INVALID_ARGUMENTS),
			Error::HostRejected(_) => self.sdk_error().map(|e| e.error_code),
			_ => None,
		}
	}
}
