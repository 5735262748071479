//! Error payloads carried in the first slot of a response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric error code understood by hosts and applications.
///
/// Kept open-ended so codes introduced by newer hosts survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
	/// API not supported on the current platform.
	pub const NOT_SUPPORTED_ON_PLATFORM: Self = Self(100);
	/// Internal error encountered while performing the required operation.
	pub const INTERNAL_ERROR: Self = Self(500);
	/// API is not supported in the current context.
	pub const NOT_SUPPORTED_IN_CURRENT_CONTEXT: Self = Self(501);
	/// Permissions denied by user.
	pub const PERMISSION_DENIED: Self = Self(1000);
	/// Network issue.
	pub const NETWORK_ERROR: Self = Self(2000);
	/// Underlying hardware doesn't support the capability.
	pub const NO_HW_SUPPORT: Self = Self(3000);
	/// One or more arguments are invalid.
	pub const INVALID_ARGUMENTS: Self = Self(4000);
	/// User is not authorized for this operation.
	pub const UNAUTHORIZED_USER_OPERATION: Self = Self(5000);
	/// Could not complete the operation due to insufficient resources.
	pub const INSUFFICIENT_RESOURCES: Self = Self(6000);
	/// Platform throttled the request because of too many API requests.
	pub const THROTTLE: Self = Self(7000);
	/// User aborted the operation.
	pub const USER_ABORT: Self = Self(8000);
	/// Could not complete the operation in the given time interval.
	pub const OPERATION_TIMED_OUT: Self = Self(8001);
	/// Platform code is old and doesn't implement this API.
	pub const OLD_PLATFORM: Self = Self(9000);
	/// The file specified was not found on the given location.
	pub const FILE_NOT_FOUND: Self = Self(404);
	/// The return value is too big and has exceeded our size boundries.
	pub const SIZE_EXCEEDED: Self = Self(10000);

	/// Returns the symbolic name for well-known codes.
	pub fn name(&self) -> Option<&'static str> {
		Some(match *self {
			Self::NOT_SUPPORTED_ON_PLATFORM => "NOT_SUPPORTED_ON_PLATFORM",
			Self::INTERNAL_ERROR => "INTERNAL_ERROR",
			Self::NOT_SUPPORTED_IN_CURRENT_CONTEXT => "NOT_SUPPORTED_IN_CURRENT_CONTEXT",
			Self::PERMISSION_DENIED => "PERMISSION_DENIED",
			Self::NETWORK_ERROR => "NETWORK_ERROR",
			Self::NO_HW_SUPPORT => "NO_HW_SUPPORT",
			Self::INVALID_ARGUMENTS => "INVALID_ARGUMENTS",
			Self::UNAUTHORIZED_USER_OPERATION => "UNAUTHORIZED_USER_OPERATION",
			Self::INSUFFICIENT_RESOURCES => "INSUFFICIENT_RESOURCES",
			Self::THROTTLE => "THROTTLE",
			Self::USER_ABORT => "USER_ABORT",
			Self::OPERATION_TIMED_OUT => "OPERATION_TIMED_OUT",
			Self::OLD_PLATFORM => "OLD_PLATFORM",
			Self::FILE_NOT_FOUND => "FILE_NOT_FOUND",
			Self::SIZE_EXCEEDED => "SIZE_EXCEEDED",
			_ => return None,
		})
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.name() {
			Some(name) => write!(f, "{name} ({})", self.0),
			None => write!(f, "{}", self.0),
		}
	}
}

/// Structured error reported by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkError {
	pub error_code: ErrorCode,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl SdkError {
	pub fn new(error_code: ErrorCode) -> Self {
		Self {
			error_code,
			message: None,
		}
	}

	pub fn with_message(error_code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			error_code,
			message: Some(message.into()),
		}
	}
}

impl fmt::Display for SdkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.message {
			Some(message) => write!(f, "{}: {}", self.error_code, message),
			None => write!(f, "{}", self.error_code),
		}
	}
}
