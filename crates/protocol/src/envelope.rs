//! Envelope shapes exchanged across the channel.
//!
//! Outbound traffic is always an [`Envelope`]. Inbound traffic is parsed as a
//! [`Message`]: a [`Response`] when it carries an `id`, an [`Event`] when it
//! carries only a `func`, and [`Message::Unknown`] otherwise.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved function name of the handshake request.
pub const INITIALIZE_FUNC: &str = "initialize";

/// A single protocol message.
///
/// `id` is present for requests that expect a response and absent for
/// fire-and-forget notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u32>,
	/// Wire identifier of the requested capability or event
	pub func: String,
	/// Ordered argument list
	#[serde(default)]
	pub args: Vec<Value>,
	/// Unix timestamp in milliseconds at which the envelope was created
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<i64>,
}

impl Envelope {
	/// Creates a request envelope stamped with the current time.
	pub fn request(id: u32, func: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			id: Some(id),
			func: func.into(),
			args,
			timestamp: Some(now_millis()),
		}
	}

	/// Creates a fire-and-forget envelope (no id).
	pub fn notification(func: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			id: None,
			func: func.into(),
			args,
			timestamp: Some(now_millis()),
		}
	}

	/// Returns true if this envelope expects a response.
	pub fn is_request(&self) -> bool {
		self.id.is_some()
	}
}

/// Response to an earlier request, correlated by `id`.
///
/// `args` is conventionally `[error-or-null, result...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	#[serde(default)]
	pub args: Vec<Value>,
}

/// Uncorrelated notification from the other side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub func: String,
	#[serde(default)]
	pub args: Vec<Value>,
}

/// Discriminated union of inbound messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Event message (no `id` field)
	Event(Event),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn now_millis() -> i64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as i64)
		.unwrap_or_default()
}
