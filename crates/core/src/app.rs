//! Lifecycle and context entry points.

use std::sync::Arc;

use hostbridge_runtime::{BridgeState, Capability, Connection, HostInfo, Result, Subscription};
use serde_json::{Value, json};

use crate::{first_arg, status_result};

/// Event the host sends when the user switches theme.
pub const THEME_CHANGE_EVENT: &str = "themeChange";

/// Entry point for an embedded application.
///
/// Cheap to clone; all clones share one [`Connection`].
#[derive(Clone)]
pub struct App {
	connection: Arc<Connection>,
}

impl App {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}

	/// The underlying protocol instance.
	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}

	/// Performs the handshake (or joins one in flight) and returns what the
	/// host reported.
	pub async fn initialize(&self) -> Result<HostInfo> {
		self.connection.initialize().await
	}

	/// Lifecycle state plus the host's details, once known.
	pub fn state(&self) -> BridgeState {
		self.connection.state()
	}

	/// Asks the host for the full context object.
	pub async fn get_context(&self) -> Result<Value> {
		let args = self.connection.call(Capability::GetContext, vec![])?.await?;
		Ok(first_arg(args))
	}

	/// Asks the host to navigate to a deep link.
	pub async fn execute_deep_link(&self, link: &str) -> Result<()> {
		let args = self
			.connection
			.call(Capability::ExecuteDeepLink, vec![json!(link)])?
			.await?;
		status_result(args).map(|_| ())
	}

	/// Runs `handler` with the new theme name whenever the host switches it.
	pub fn on_theme_change<F>(&self, handler: F) -> Subscription
	where
		F: Fn(&str) + Send + Sync + 'static,
	{
		self.connection.on(THEME_CHANGE_EVENT, move |args| {
			match args.first().and_then(Value::as_str) {
				Some(theme) => handler(theme),
				None => tracing::warn!(?args, "themeChange event without a theme name"),
			}
		})
	}

	/// Ends the session; see [`Connection::teardown`].
	pub fn teardown(&self) -> usize {
		self.connection.teardown()
	}
}

impl std::fmt::Debug for App {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("App").field("state", &self.state()).finish()
	}
}
