//! Message channels between a dialog and the page that opened it.
//!
//! [`dialog::open`](crate::dialog::open) hands the opener a
//! [`ChildAppWindow`]; the page inside the dialog reaches back through a
//! [`ParentAppWindow`]. The host relays messages in both directions.

use std::fmt;
use std::sync::Arc;

use hostbridge_runtime::{Capability, Connection, Result, Subscription};
use serde_json::Value;

use crate::{first_arg, status_result};

/// Inbound event carrying a message from the opener to the dialog.
pub const MESSAGE_FOR_CHILD: &str = "messageForChild";
/// Inbound event carrying a message from the dialog to the opener.
pub const MESSAGE_FOR_PARENT: &str = "messageForParent";

/// Sends `message` and waits for the host's `[success, reason]` status.
async fn post(connection: &Connection, capability: Capability, message: Value) -> Result<()> {
	let args = connection.call(capability, vec![message])?.await?;
	status_result(args).map(|_| ())
}

fn listen<F>(connection: &Connection, event: &str, handler: F) -> Subscription
where
	F: Fn(Value) + Send + Sync + 'static,
{
	connection.on(event, move |args| handler(first_arg(args.to_vec())))
}

/// The opener's view of a dialog it opened.
#[derive(Clone)]
pub struct ChildAppWindow {
	connection: Arc<Connection>,
}

impl ChildAppWindow {
	pub(crate) fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}

	/// Sends a message to the page running in the dialog.
	pub async fn post_message(&self, message: Value) -> Result<()> {
		post(&self.connection, Capability::ChildWindowPostMessage, message).await
	}

	/// Runs `handler` for every message the dialog sends back.
	pub fn on_message<F>(&self, handler: F) -> Subscription
	where
		F: Fn(Value) + Send + Sync + 'static,
	{
		listen(&self.connection, MESSAGE_FOR_PARENT, handler)
	}
}

impl fmt::Debug for ChildAppWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChildAppWindow").finish_non_exhaustive()
	}
}

/// A dialog page's view of the page that opened it.
///
/// Only usable from the `task` frame context.
#[derive(Clone)]
pub struct ParentAppWindow {
	connection: Arc<Connection>,
}

impl ParentAppWindow {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}

	/// Sends a message to the opener.
	pub async fn post_message(&self, message: Value) -> Result<()> {
		post(&self.connection, Capability::ParentWindowPostMessage, message).await
	}

	/// Runs `handler` for every message the opener sends.
	///
	/// Fails like [`post_message`](Self::post_message) when called outside
	/// a dialog.
	pub fn on_message<F>(&self, handler: F) -> Result<Subscription>
	where
		F: Fn(Value) + Send + Sync + 'static,
	{
		self.connection.admit(Capability::ParentWindowPostMessage)?;
		Ok(listen(&self.connection, MESSAGE_FOR_CHILD, handler))
	}
}

impl fmt::Debug for ParentAppWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ParentAppWindow").finish_non_exhaustive()
	}
}
