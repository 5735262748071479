//! Secondary windows (dialogs, authentication pages).
//!
//! A secondary window runs its own protocol instance and sees the opener as
//! its host. The opener answers the window's handshake itself, serves funcs
//! registered with [`Connection::register_child_handler`], relays everything
//! else to the real host, and posts the host's answer back under the
//! window's own correlation id.
//!
//! A session ends when the window submits a result, reports failure, is
//! closed by either side, or the opener tears down. The result handler given
//! at open time runs at most once, whichever happens first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use hostbridge_protocol::{
	Envelope, ErrorCode, FrameContext, HostClientType, INITIALIZE_FUNC, Response, SdkError,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::capability::{Admission, Capability};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::{ChannelEndpoint, ChannelTransport};

/// Wire name a window uses to report successful authentication.
pub const AUTHENTICATE_SUCCESS_FUNC: &str = "authentication.authenticate.success";
/// Wire name a window uses to report failed authentication.
pub const AUTHENTICATE_FAILURE_FUNC: &str = "authentication.authenticate.failure";

/// Handle to a browsing context opened on behalf of the application.
pub trait ChildWindow: Send + Sync {
	/// Delivers one message to the window.
	fn post(&self, message: Value) -> Result<()>;
	/// Closes the window. Must be safe to call more than once.
	fn close(&self);
	/// Whether the window is gone, for whatever reason.
	fn is_closed(&self) -> bool;
}

/// A freshly opened window and the stream of messages it sends back.
pub struct OpenedWindow {
	pub window: Arc<dyn ChildWindow>,
	pub messages: mpsc::UnboundedReceiver<Value>,
}

/// Platform seam that can open a new browsing context at a URL.
pub trait WindowOpener: Send + Sync {
	fn open(&self, url: &str) -> Result<OpenedWindow>;
}

/// How a secondary window session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildOutcome {
	/// The window submitted a result (argument list as sent).
	Submitted(Vec<Value>),
	/// The window reported failure with this reason.
	Failed(Value),
	/// The window closed without submitting anything.
	Closed,
}

/// Runs once when a session ends.
pub type ChildResultHandler = Box<dyn FnOnce(ChildOutcome) + Send>;

/// Answers a window request locally: receives the request args and returns
/// the response args.
pub type ChildHandlerFn = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

pub(crate) struct ChildSession {
	id: u32,
	url: String,
	context: FrameContext,
	window: Arc<dyn ChildWindow>,
	handler: Mutex<Option<ChildResultHandler>>,
}

impl ChildSession {
	fn is_settled(&self) -> bool {
		self.handler.lock().is_none()
	}

	/// Runs the result handler if nobody has yet. Returns whether this call
	/// was the one that settled the session.
	fn settle(&self, outcome: ChildOutcome) -> bool {
		let Some(handler) = self.handler.lock().take() else {
			return false;
		};
		if !self.window.is_closed() {
			self.window.close();
		}
		handler(outcome);
		true
	}

	fn respond(&self, id: u32, args: Vec<Value>) {
		let message = match serde_json::to_value(Response { id, args }) {
			Ok(message) => message,
			Err(e) => {
				tracing::error!(%e, "Could not encode response for secondary window");
				return;
			}
		};
		if let Err(e) = self.window.post(message) {
			tracing::debug!(child = self.id, id, %e, "Secondary window did not take response");
		}
	}
}

/// Opener-side handle to a secondary window.
pub struct ChildHandle {
	session: Arc<ChildSession>,
	connection: Weak<Connection>,
}

impl ChildHandle {
	/// Correlation id recorded for this session.
	pub fn id(&self) -> u32 {
		self.session.id
	}

	pub fn url(&self) -> &str {
		&self.session.url
	}

	/// False once the session has ended.
	pub fn is_open(&self) -> bool {
		!self.session.is_settled()
	}

	/// Posts a notification to the window.
	pub fn send(&self, func: &str, args: Vec<Value>) -> Result<()> {
		if self.session.is_settled() {
			return Err(Error::ChannelClosed);
		}
		let message = serde_json::to_value(Envelope::notification(func, args))?;
		self.session.window.post(message)
	}

	/// Closes the window. The result handler sees [`ChildOutcome::Closed`]
	/// unless the session already ended.
	pub fn close(&self) {
		match self.connection.upgrade() {
			Some(connection) => connection.finish_child(&self.session, ChildOutcome::Closed),
			None => {
				self.session.settle(ChildOutcome::Closed);
			}
		}
	}
}

impl std::fmt::Debug for ChildHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChildHandle")
			.field("id", &self.session.id)
			.field("url", &self.session.url)
			.field("open", &self.is_open())
			.finish()
	}
}

impl Connection {
	/// Installs the platform seam used by [`open_child`](Self::open_child).
	pub fn set_window_opener(&self, opener: Arc<dyn WindowOpener>) {
		*self.window_opener.lock() = Some(opener);
	}

	/// Serves `func` requests from secondary windows locally instead of
	/// relaying them to the host. A later registration replaces an earlier one.
	pub fn register_child_handler<F>(&self, func: &str, handler: F)
	where
		F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
	{
		self.child_handlers.insert(func.to_string(), Arc::new(handler));
	}

	/// Number of secondary windows currently open.
	pub fn child_count(&self) -> usize {
		self.children.len()
	}

	/// Opens a secondary window at `url` for `capability`.
	///
	/// The capability is gated like a call, but every failure is returned
	/// here since no window is opened. `on_result` runs exactly once when the
	/// session ends.
	pub fn open_child<F>(self: &Arc<Self>, capability: Capability, url: &str, on_result: F) -> Result<ChildHandle>
	where
		F: FnOnce(ChildOutcome) + Send + 'static,
	{
		let runtime = tokio::runtime::Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?;

		match self.admit(capability)? {
			Admission::Allowed => {}
			Admission::Deferred => return Err(Error::NotInitialized),
			Admission::Rejected(err) => return Err(err),
		}

		let opener = self.window_opener.lock().clone().ok_or(Error::NoWindowOpener)?;
		let OpenedWindow { window, messages } = opener.open(url)?;

		let id = self.next_id();
		let handler: ChildResultHandler = Box::new(on_result);
		let session = Arc::new(ChildSession {
			id,
			url: url.to_string(),
			context: child_context(capability),
			window,
			handler: Mutex::new(Some(handler)),
		});
		self.children.insert(id, Arc::clone(&session));
		tracing::info!(id, url, %capability, "Opened secondary window");

		runtime.spawn(watch_child(
			Arc::downgrade(self),
			Arc::clone(&session),
			messages,
			self.config().child_poll_interval(),
		));

		Ok(ChildHandle {
			session,
			connection: Arc::downgrade(self),
		})
	}

	pub(crate) fn finish_child(&self, session: &ChildSession, outcome: ChildOutcome) {
		self.children.remove(&session.id);
		if session.settle(outcome) {
			tracing::info!(id = session.id, "Secondary window session ended");
		}
	}

	pub(crate) fn close_all_children(&self) {
		let sessions: Vec<_> = self.children.iter().map(|entry| Arc::clone(entry.value())).collect();
		self.children.clear();
		for session in sessions {
			session.settle(ChildOutcome::Closed);
		}
	}

	fn handle_child_message(&self, session: &Arc<ChildSession>, message: Value) {
		let envelope: Envelope = match serde_json::from_value(message) {
			Ok(envelope) => envelope,
			Err(e) => {
				tracing::warn!(child = session.id, %e, "Discarding malformed message from secondary window");
				return;
			}
		};
		let func = envelope.func.as_str();
		tracing::debug!(child = session.id, id = ?envelope.id, func, "Message from secondary window");

		if func == Capability::DialogSubmit.wire_name() || func == AUTHENTICATE_SUCCESS_FUNC {
			self.finish_child(session, ChildOutcome::Submitted(envelope.args));
			return;
		}
		if func == AUTHENTICATE_FAILURE_FUNC {
			let reason = envelope.args.into_iter().next().unwrap_or(Value::Null);
			self.finish_child(session, ChildOutcome::Failed(reason));
			return;
		}

		let Some(child_id) = envelope.id else {
			tracing::debug!(child = session.id, func, "Ignoring notification from secondary window");
			return;
		};

		if func == INITIALIZE_FUNC {
			session.respond(child_id, self.child_handshake_args(session));
			return;
		}

		let local = self.child_handlers.get(func).map(|entry| Arc::clone(entry.value()));
		if let Some(handler) = local {
			session.respond(child_id, handler(&envelope.args));
			return;
		}

		let reply_to = Arc::clone(session);
		let relayed = self.call_raw_with_callback(func, envelope.args, move |outcome| {
			let args = outcome.unwrap_or_else(|err| vec![error_payload(&err)]);
			reply_to.respond(child_id, args);
		});
		if let Err(err) = relayed {
			session.respond(child_id, vec![error_payload(&err)]);
		}
	}

	fn child_handshake_args(&self, session: &ChildSession) -> Vec<Value> {
		let (client_type, version) = match self.host_info() {
			Some(host) => (host.host_client_type, host.host_version),
			None => (HostClientType::Unknown, self.config().default_host_version.clone()),
		};
		vec![json!(session.context), json!(client_type), json!(version)]
	}
}

/// Pumps window messages and polls for closure until the session ends.
async fn watch_child(
	connection: Weak<Connection>,
	session: Arc<ChildSession>,
	mut messages: mpsc::UnboundedReceiver<Value>,
	period: Duration,
) {
	let mut ticker = tokio::time::interval(period);
	ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

	loop {
		if session.is_settled() {
			return;
		}
		tokio::select! {
			message = messages.recv() => match (message, connection.upgrade()) {
				(Some(message), Some(connection)) => connection.handle_child_message(&session, message),
				_ => break,
			},
			_ = ticker.tick() => {
				if session.window.is_closed() {
					break;
				}
			}
		}
	}

	tracing::debug!(id = session.id, "Secondary window closed");
	match connection.upgrade() {
		Some(connection) => connection.finish_child(&session, ChildOutcome::Closed),
		None => {
			session.settle(ChildOutcome::Closed);
		}
	}
}

fn child_context(capability: Capability) -> FrameContext {
	match capability {
		Capability::AuthenticationAuthenticate => FrameContext::Authentication,
		_ => FrameContext::Task,
	}
}

fn error_payload(err: &Error) -> Value {
	let code = err.error_code().unwrap_or(ErrorCode::INTERNAL_ERROR);
	json!(SdkError::with_message(code, err.to_string()))
}

/// In-process window backed by a [`ChannelTransport`] pair.
///
/// The returned [`ChannelEndpoint`] is the window's side; a second
/// [`Connection`] built on it behaves exactly like a protocol instance
/// running inside the window.
pub struct ChannelWindow {
	tx: mpsc::UnboundedSender<Value>,
	closed: AtomicBool,
}

impl ChannelWindow {
	pub fn open() -> (OpenedWindow, ChannelEndpoint) {
		let (opener_side, window_side) = ChannelTransport::pair();
		let (tx, messages) = opener_side.split();
		let window = Arc::new(ChannelWindow {
			tx,
			closed: AtomicBool::new(false),
		});
		(OpenedWindow { window, messages }, window_side)
	}
}

impl ChildWindow for ChannelWindow {
	fn post(&self, message: Value) -> Result<()> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}
		self.tx.send(message).map_err(|_| Error::ChannelClosed)
	}

	fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
	}

	fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst) || self.tx.is_closed()
	}
}

#[cfg(test)]
mod tests;
