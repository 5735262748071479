//! Protocol session: correlation, lifecycle, and event dispatch.
//!
//! A [`Connection`] owns one protocol instance. Every outbound call passes
//! through the same pipeline:
//!
//! 1. Capability gate (synchronous rejections are returned to the caller)
//! 2. Id allocation and registration of a [`Resolver`] in the pending table
//! 3. Lifecycle routing: transmit now, or queue until the handshake completes
//!
//! Inbound traffic is parsed as a [`Message`]. Responses settle the matching
//! resolver; events fan out to every handler registered for the name;
//! anything else is logged and dropped.
//!
//! All state shared between callers and the dispatch loop sits behind a
//! single lock that is never held while user code runs, so resolvers and
//! event handlers may issue new calls re-entrantly.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use hostbridge_protocol::{
	Envelope, FrameContext, INITIALIZE_FUNC, LifecycleState, Message, Response,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

use crate::capability::{self, Admission, Capability};
use crate::child::{ChildHandlerFn, ChildSession, WindowOpener};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::lifecycle::{BridgeState, HostInfo, Lifecycle, QueuedCall, Route};
use crate::transport::{Transport, TransportParts, TransportReceiver};

mod handlers;
mod pending;

pub use handlers::{EventHandlerFn, HandlerId, Subscription, next_handler_id};
pub use pending::{PendingCall, Resolver, ResponseCallback, split_error_first};

use handlers::{HandlerEntry, HandlerMap, handlers_for};
use pending::PendingTable;

/// State mutated by both callers and the dispatch loop.
#[derive(Debug, Default)]
pub(crate) struct SessionCore {
	pub lifecycle: Lifecycle,
	pub pending: PendingTable,
	handshake_waiters: Vec<oneshot::Sender<Result<HostInfo>>>,
}

/// Future returned by [`Connection::initialize`].
pub struct Handshake {
	rx: oneshot::Receiver<Result<HostInfo>>,
}

impl Future for Handshake {
	type Output = Result<HostInfo>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx)
			.poll(cx)
			.map(|result| result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
	}
}

/// One protocol instance over one transport.
pub struct Connection {
	/// Sequential correlation id counter, never reset
	last_id: AtomicU32,
	config: BridgeConfig,
	core: Arc<Mutex<SessionCore>>,
	handlers: HandlerMap,
	/// Channel for sending outbound messages to the writer task
	outbound_tx: mpsc::UnboundedSender<Value>,
	/// Taken by `run()`
	transport_sender: Mutex<Option<Box<dyn Transport>>>,
	transport_receiver: Mutex<Option<Box<dyn TransportReceiver>>>,
	outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	/// Open secondary windows keyed by their correlation id
	pub(crate) children: DashMap<u32, Arc<ChildSession>>,
	pub(crate) child_handlers: DashMap<String, ChildHandlerFn>,
	pub(crate) window_opener: Mutex<Option<Arc<dyn WindowOpener>>>,
}

impl Connection {
	/// Creates a connection with default configuration.
	pub fn new(parts: TransportParts) -> Self {
		Self::with_config(parts, BridgeConfig::default())
	}

	/// Creates a connection with the given configuration.
	pub fn with_config(parts: TransportParts, config: BridgeConfig) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		Self {
			last_id: AtomicU32::new(0),
			config,
			core: Arc::new(Mutex::new(SessionCore::default())),
			handlers: HandlerMap::default(),
			outbound_tx,
			transport_sender: Mutex::new(Some(sender)),
			transport_receiver: Mutex::new(Some(receiver)),
			outbound_rx: Mutex::new(Some(outbound_rx)),
			message_rx: Mutex::new(Some(message_rx)),
			children: DashMap::new(),
			child_handlers: DashMap::new(),
			window_opener: Mutex::new(None),
		}
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	/// Returns the lifecycle state and whatever the host has reported.
	pub fn state(&self) -> BridgeState {
		self.core.lock().lifecycle.snapshot()
	}

	/// Returns the host details once the handshake has completed.
	pub fn host_info(&self) -> Option<HostInfo> {
		self.core.lock().lifecycle.host().cloned()
	}

	/// Number of calls issued and not yet settled.
	pub fn pending_count(&self) -> usize {
		self.core.lock().pending.len()
	}

	/// Runs the capability gate against the current lifecycle without
	/// issuing anything.
	pub fn admit(&self, capability: Capability) -> Result<Admission> {
		let core = self.core.lock();
		capability::admit(capability, core.lifecycle.state(), core.lifecycle.host())
	}

	pub(crate) fn next_id(&self) -> u32 {
		self.last_id.fetch_add(1, Ordering::SeqCst)
	}

	/// Starts the handshake, or joins the one already in flight.
	///
	/// The returned future resolves with the host's details once the host
	/// answers the `initialize` request. Calling this again after the
	/// handshake completed resolves immediately.
	pub fn initialize(&self) -> Handshake {
		let (tx, rx) = oneshot::channel();
		let mut core = self.core.lock();

		match core.lifecycle.state() {
			LifecycleState::Initialized => {
				let host = core.lifecycle.host().cloned().ok_or(Error::NotInitialized);
				let _ = tx.send(host);
			}
			LifecycleState::Initializing => core.handshake_waiters.push(tx),
			LifecycleState::Uninitialized => {
				let id = self.next_id();
				core.lifecycle.begin_handshake(id);
				core.handshake_waiters.push(tx);

				let envelope = Envelope::request(
					id,
					INITIALIZE_FUNC,
					vec![json!(self.config.client_sdk_version)],
				);
				tracing::info!(id, version = %self.config.client_sdk_version, "Starting handshake");

				if let Err(e) = self.transmit(&envelope) {
					let queued = core.lifecycle.reset();
					let rejected = take_resolvers(&mut core, &queued);
					let waiters = mem::take(&mut core.handshake_waiters);
					drop(core);
					tracing::error!(%e, "Could not send initialize request");
					for resolver in rejected {
						resolver.settle(Err(Error::ChannelClosed));
					}
					for waiter in waiters {
						let _ = waiter.send(Err(Error::ChannelClosed));
					}
				}
			}
		}

		Handshake { rx }
	}

	/// Issues a gated call and returns a future for its raw response.
	///
	/// Fails synchronously with [`Error::NotInitialized`] or
	/// [`Error::ContextNotAllowed`]; a host that is too old is reported
	/// through the returned future.
	pub fn call(&self, capability: Capability, args: Vec<Value>) -> Result<PendingCall> {
		let (tx, rx) = oneshot::channel();
		let id = self.issue(Some(capability), capability.wire_name(), args, Resolver::Channel(tx))?;
		Ok(PendingCall::new(id, rx, Arc::downgrade(&self.core)))
	}

	/// Callback-style [`call`](Self::call). The callback runs exactly once
	/// unless the call is rejected synchronously.
	pub fn call_with_callback<F>(&self, capability: Capability, args: Vec<Value>, callback: F) -> Result<()>
	where
		F: FnOnce(Result<Vec<Value>>) + Send + 'static,
	{
		self.issue(
			Some(capability),
			capability.wire_name(),
			args,
			Resolver::callback(callback),
		)
		.map(|_| ())
	}

	/// Issues a call by wire name, gated only by the lifecycle check.
	pub fn call_raw(&self, func: &str, args: Vec<Value>) -> Result<PendingCall> {
		let (tx, rx) = oneshot::channel();
		let id = self.issue(None, func, args, Resolver::Channel(tx))?;
		Ok(PendingCall::new(id, rx, Arc::downgrade(&self.core)))
	}

	/// Callback-style [`call_raw`](Self::call_raw).
	pub fn call_raw_with_callback<F>(&self, func: &str, args: Vec<Value>, callback: F) -> Result<()>
	where
		F: FnOnce(Result<Vec<Value>>) + Send + 'static,
	{
		self.issue(None, func, args, Resolver::callback(callback)).map(|_| ())
	}

	/// Sends a gated fire-and-forget notification.
	///
	/// There is no result channel, so an old host is reported synchronously.
	pub fn send_event(&self, capability: Capability, args: Vec<Value>) -> Result<()> {
		let mut core = self.core.lock();
		let admission = capability::admit(capability, core.lifecycle.state(), core.lifecycle.host())?;
		if let Admission::Rejected(err) = admission {
			return Err(err);
		}
		let envelope = Envelope::notification(capability.wire_name(), args);
		self.route(&mut core, QueuedCall {
			envelope,
			capability: Some(capability),
		})
	}

	/// Sends an ungated fire-and-forget notification by wire name.
	pub fn send_event_raw(&self, func: &str, args: Vec<Value>) -> Result<()> {
		let mut core = self.core.lock();
		if core.lifecycle.state() == LifecycleState::Uninitialized {
			return Err(Error::NotInitialized);
		}
		let envelope = Envelope::notification(func, args);
		self.route(&mut core, QueuedCall {
			envelope,
			capability: None,
		})
	}

	/// Registers a handler for inbound events named `event`.
	///
	/// Handlers run in registration order and survive teardown; drop the
	/// returned [`Subscription`] to remove the handler.
	pub fn on<F>(&self, event: &str, handler: F) -> Subscription
	where
		F: Fn(&[Value]) + Send + Sync + 'static,
	{
		let id = next_handler_id();
		self.handlers.lock().insert(
			id,
			HandlerEntry {
				event: event.to_string(),
				handler: Arc::new(handler),
			},
		);
		Subscription::new(id, &self.handlers)
	}

	/// Returns true if at least one handler is registered for `event`.
	pub fn has_handler(&self, event: &str) -> bool {
		self.handlers.lock().values().any(|entry| entry.event == event)
	}

	/// Changes the local frame context and tells the host.
	pub fn set_frame_context(&self, context: FrameContext) -> Result<()> {
		self.core.lock().lifecycle.set_frame_context(context)?;
		tracing::info!(%context, "Frame context changed");
		self.send_event(Capability::SetFrameContext, vec![json!(context)])
	}

	/// Ends the protocol session.
	///
	/// Every pending call is rejected with [`Error::TornDown`], queued
	/// envelopes are discarded, open secondary windows are closed, and the
	/// lifecycle returns to `uninitialized`. Returns the number of calls
	/// rejected.
	pub fn teardown(&self) -> usize {
		let mut core = self.core.lock();
		let discarded = core.lifecycle.reset();
		let pending = core.pending.drain();
		let waiters = mem::take(&mut core.handshake_waiters);
		drop(core);

		tracing::info!(
			pending = pending.len(),
			discarded = discarded.len(),
			"Tearing down protocol session"
		);

		let rejected = pending.len();
		for (_, entry) in pending {
			entry.resolver.settle(Err(Error::TornDown));
		}
		for waiter in waiters {
			let _ = waiter.send(Err(Error::TornDown));
		}
		self.close_all_children();
		rejected
	}

	/// Runs the transport and dispatches inbound messages until the inbound
	/// channel closes.
	pub async fn run(self: &Arc<Self>) -> Result<()> {
		let mut transport_receiver = self.transport_receiver.lock().take().ok_or(Error::AlreadyRunning)?;
		let mut transport_sender = self.transport_sender.lock().take().ok_or(Error::AlreadyRunning)?;
		let mut outbound_rx = self.outbound_rx.lock().take().ok_or(Error::AlreadyRunning)?;
		let mut message_rx = self.message_rx.lock().take().ok_or(Error::AlreadyRunning)?;

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = transport_receiver.run().await {
				tracing::error!("Transport read error: {}", e);
			}
		});

		let writer_handle = tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = transport_sender.send(message).await {
					tracing::error!("Transport write error: {}", e);
					break;
				}
			}
		});

		while let Some(message) = message_rx.recv().await {
			self.dispatch(message);
		}

		tracing::debug!("Inbound channel closed, stopping dispatch loop");
		let _ = reader_handle.await;
		writer_handle.abort();
		Ok(())
	}

	/// Handles one inbound message.
	///
	/// Malformed and unmatched traffic is logged and dropped.
	pub fn dispatch(&self, message: Value) {
		let message = match serde_json::from_value::<Message>(message) {
			Ok(message) => message,
			Err(e) => {
				tracing::warn!(%e, "Discarding malformed inbound message");
				return;
			}
		};

		match message {
			Message::Response(response) => self.handle_response(response),
			Message::Event(event) => {
				let handlers = handlers_for(&self.handlers, &event.func);
				tracing::debug!(func = %event.func, handlers = handlers.len(), "Dispatching event");
				for handler in handlers {
					handler(&event.args);
				}
			}
			Message::Unknown(value) => {
				tracing::warn!(
					"Discarding unrecognised inbound message: {}",
					serde_json::to_string(&value).unwrap_or_else(|_| "<serialization failed>".to_string())
				);
			}
		}
	}

	fn handle_response(&self, response: Response) {
		let mut core = self.core.lock();

		if core.lifecycle.handshake_id() == Some(response.id) {
			self.finish_handshake(core, response.args);
			return;
		}

		let entry = core.pending.remove(response.id);
		drop(core);

		match entry {
			Some(entry) => {
				tracing::debug!(
					id = response.id,
					func = %entry.func,
					elapsed_ms = entry.issued_at.elapsed().as_millis() as u64,
					"Settling call"
				);
				entry.resolver.settle(Ok(response.args));
			}
			None => tracing::warn!(id = response.id, "Discarding response with no matching call"),
		}
	}

	fn finish_handshake(&self, mut core: parking_lot::MutexGuard<'_, SessionCore>, args: Vec<Value>) {
		let host = match HostInfo::from_handshake(&args, &self.config.default_host_version) {
			Ok(host) => host,
			Err(err) => {
				let reason = err.to_string();
				let queued = core.lifecycle.reset();
				let rejected = take_resolvers(&mut core, &queued);
				let waiters = mem::take(&mut core.handshake_waiters);
				drop(core);

				tracing::warn!(%reason, queued = queued.len(), "Handshake failed");
				for resolver in rejected {
					resolver.settle(Err(Error::HandshakeFailed(reason.clone())));
				}
				for waiter in waiters {
					let _ = waiter.send(Err(Error::HandshakeFailed(reason.clone())));
				}
				return;
			}
		};

		let drained = core.lifecycle.complete_handshake(host.clone());
		tracing::info!(
			context = %host.frame_context,
			client = %host.host_client_type,
			version = %host.host_version,
			queued = drained.len(),
			"Handshake complete"
		);

		let mut rejected = Vec::new();
		for call in drained {
			let id = call.envelope.id;
			if id.is_some_and(|id| !core.pending.contains(id)) {
				tracing::debug!(?id, "Skipping queued call abandoned by its caller");
				continue;
			}

			let checked = match call.capability {
				Some(capability) => capability::recheck(capability, &host),
				None => Ok(()),
			};
			let outcome = checked.and_then(|()| self.transmit(&call.envelope));

			if let Err(err) = outcome {
				tracing::debug!(func = %call.envelope.func, %err, "Queued call not sent");
				match id.and_then(|id| core.pending.remove(id)) {
					Some(entry) => rejected.push((entry.resolver, err)),
					None => tracing::warn!(func = %call.envelope.func, %err, "Dropping queued notification"),
				}
			}
		}

		let waiters = mem::take(&mut core.handshake_waiters);
		drop(core);

		for waiter in waiters {
			let _ = waiter.send(Ok(host.clone()));
		}
		for (resolver, err) in rejected {
			resolver.settle(Err(err));
		}
	}

	/// Gate, register, and route one call. Returns the correlation id, or
	/// `None` if the gate settled the call without sending anything.
	fn issue(
		&self,
		capability: Option<Capability>,
		func: &str,
		args: Vec<Value>,
		resolver: Resolver,
	) -> Result<Option<u32>> {
		let mut core = self.core.lock();

		let admission = match capability {
			Some(capability) => capability::admit(capability, core.lifecycle.state(), core.lifecycle.host())?,
			None if core.lifecycle.state() == LifecycleState::Uninitialized => {
				return Err(Error::NotInitialized);
			}
			None => Admission::Allowed,
		};

		if let Admission::Rejected(err) = admission {
			drop(core);
			tracing::debug!(func, %err, "Call rejected by capability gate");
			resolver.settle(Err(err));
			return Ok(None);
		}

		let id = self.next_id();
		core.pending.insert(id, func, resolver);
		let envelope = Envelope::request(id, func, args);

		if let Err(e) = self.route(&mut core, QueuedCall { envelope, capability }) {
			core.pending.remove(id);
			return Err(e);
		}
		Ok(Some(id))
	}

	fn route(&self, core: &mut SessionCore, call: QueuedCall) -> Result<()> {
		match core.lifecycle.route(call) {
			Route::Send(envelope) => self.transmit(&envelope),
			Route::Queued { depth } => {
				tracing::debug!(depth, "Queued call until handshake completes");
				if depth == self.config.queue_warn_threshold {
					tracing::warn!(depth, "Pre-handshake queue is growing; is the host answering?");
				}
				Ok(())
			}
		}
	}

	pub(crate) fn transmit(&self, envelope: &Envelope) -> Result<()> {
		let value = serde_json::to_value(envelope)?;
		tracing::debug!(id = ?envelope.id, func = %envelope.func, "Sending envelope");
		if self.outbound_tx.send(value).is_err() {
			tracing::error!("Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}
		Ok(())
	}
}

fn take_resolvers(core: &mut SessionCore, queued: &[QueuedCall]) -> Vec<Resolver> {
	queued
		.iter()
		.filter_map(|call| call.envelope.id)
		.filter_map(|id| core.pending.remove(id))
		.map(|entry| entry.resolver)
		.collect()
}
