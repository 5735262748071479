//! Scripted in-memory host for exercising code built on the runtime.
//!
//! [`MockHost`] owns the far side of a [`ChannelTransport`] pair: it records
//! every envelope the connection sends and lets a test answer, emit events,
//! or complete the handshake with chosen host details.

use std::sync::Arc;
use std::time::Duration;

use hostbridge_protocol::{Envelope, Event, FrameContext, HostClientType, INITIALIZE_FUNC, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::child::{ChannelWindow, ChildWindow, OpenedWindow, WindowOpener};
use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::{ChannelEndpoint, ChannelTransport};

const DEFAULT_WAIT: Duration = Duration::from_secs(2);

/// Host side of an in-memory session.
pub struct MockHost {
	tx: mpsc::UnboundedSender<Value>,
	rx: mpsc::UnboundedReceiver<Value>,
	sent: Vec<Envelope>,
}

impl MockHost {
	/// Builds a connection wired to a new mock host and spawns its run loop.
	///
	/// Must be called inside a tokio runtime.
	pub fn connect() -> (Arc<Connection>, MockHost) {
		Self::connect_with_config(BridgeConfig::default())
	}

	pub fn connect_with_config(config: BridgeConfig) -> (Arc<Connection>, MockHost) {
		let (client, host) = ChannelTransport::pair();
		let connection = Arc::new(Connection::with_config(client.into_transport_parts(), config));

		let runner = Arc::clone(&connection);
		tokio::spawn(async move {
			if let Err(e) = runner.run().await {
				tracing::error!(%e, "Mock session run loop failed");
			}
		});

		(connection, MockHost::from_endpoint(host))
	}

	/// Wraps an endpoint whose peer is a connection, e.g. the window side of
	/// a [`ChannelWindow`].
	pub fn from_endpoint(endpoint: ChannelEndpoint) -> Self {
		let (tx, rx) = endpoint.split();
		Self {
			tx,
			rx,
			sent: Vec::new(),
		}
	}

	/// Waits up to two seconds for the next envelope from the connection.
	pub async fn next_message(&mut self) -> Option<Envelope> {
		self.next_message_within(DEFAULT_WAIT).await
	}

	/// Waits up to `wait` for the next envelope from the connection.
	pub async fn next_message_within(&mut self, wait: Duration) -> Option<Envelope> {
		loop {
			let value = tokio::time::timeout(wait, self.rx.recv()).await.ok()??;
			match serde_json::from_value::<Envelope>(value) {
				Ok(envelope) => {
					self.sent.push(envelope.clone());
					return Some(envelope);
				}
				Err(e) => tracing::warn!(%e, "Mock host received a non-envelope message"),
			}
		}
	}

	/// Returns true if nothing arrives within `wait`.
	pub async fn is_quiet_for(&mut self, wait: Duration) -> bool {
		self.next_message_within(wait).await.is_none()
	}

	/// Reads the next envelope and checks its function name.
	pub async fn expect_func(&mut self, func: &str) -> Result<Envelope> {
		let envelope = self.next_message().await.ok_or(Error::ChannelClosed)?;
		if envelope.func != func {
			return Err(Error::InvalidArgument(format!(
				"expected {func}, connection sent {}",
				envelope.func
			)));
		}
		Ok(envelope)
	}

	/// Every envelope received so far, in arrival order.
	pub fn sent(&self) -> &[Envelope] {
		&self.sent
	}

	/// Most recent received envelope with this function name.
	pub fn find_by_func(&self, func: &str) -> Option<&Envelope> {
		self.sent.iter().rev().find(|envelope| envelope.func == func)
	}

	/// Answers request `id` with a raw argument list.
	pub fn respond(&self, id: u32, args: Vec<Value>) -> Result<()> {
		self.push(serde_json::to_value(Response { id, args })?)
	}

	/// Answers request `id` with `[null, result]`.
	pub fn respond_ok(&self, id: u32, result: Value) -> Result<()> {
		self.respond(id, vec![Value::Null, result])
	}

	/// Sends an event (no id).
	pub fn emit(&self, func: &str, args: Vec<Value>) -> Result<()> {
		self.push(serde_json::to_value(Event {
			func: func.to_string(),
			args,
		})?)
	}

	/// Sends an arbitrary JSON value, well-formed or not.
	pub fn push(&self, message: Value) -> Result<()> {
		self.tx.send(message).map_err(|_| Error::ChannelClosed)
	}

	/// Waits for the `initialize` request and answers it.
	pub async fn complete_handshake(
		&mut self,
		context: FrameContext,
		client_type: HostClientType,
		version: Option<&str>,
	) -> Result<Envelope> {
		let init = self.expect_func(INITIALIZE_FUNC).await?;
		let id = init.id.ok_or_else(|| Error::InvalidArgument("initialize carried no id".to_string()))?;
		let mut args = vec![json!(context), json!(client_type)];
		if let Some(version) = version {
			args.push(json!(version));
		}
		self.respond(id, args)?;
		Ok(init)
	}
}

/// Window opener that hands out [`ChannelWindow`]s and keeps the window side
/// of each for the test to drive.
#[derive(Default)]
pub struct MockWindowOpener {
	opened: Mutex<Vec<MockWindowRecord>>,
}

struct MockWindowRecord {
	url: String,
	window: Arc<dyn ChildWindow>,
	endpoint: Option<ChannelEndpoint>,
}

impl MockWindowOpener {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// URLs opened so far.
	pub fn urls(&self) -> Vec<String> {
		self.opened.lock().iter().map(|record| record.url.clone()).collect()
	}

	/// Takes the window side of the most recently opened window.
	pub fn take_window_side(&self) -> Option<ChannelEndpoint> {
		self.opened.lock().last_mut().and_then(|record| record.endpoint.take())
	}

	/// Opener-side view of the most recently opened window.
	pub fn last_window(&self) -> Option<Arc<dyn ChildWindow>> {
		self.opened.lock().last().map(|record| Arc::clone(&record.window))
	}
}

impl WindowOpener for MockWindowOpener {
	fn open(&self, url: &str) -> Result<OpenedWindow> {
		let (opened, endpoint) = ChannelWindow::open();
		self.opened.lock().push(MockWindowRecord {
			url: url.to_string(),
			window: Arc::clone(&opened.window),
			endpoint: Some(endpoint),
		});
		Ok(opened)
	}
}
