//! Pending-call table and the one-shot resolver every call settles through.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use std::time::Instant;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use super::SessionCore;
use crate::error::{Error, Result};

/// Callback-style settlement function.
pub type ResponseCallback = Box<dyn FnOnce(Result<Vec<Value>>) + Send>;

/// Completes a call exactly once with the raw response arguments.
///
/// `settle` consumes the resolver, so a call cannot be settled twice.
pub enum Resolver {
	/// Promise style: the awaiting [`PendingCall`] receives the outcome.
	Channel(oneshot::Sender<Result<Vec<Value>>>),
	/// Callback style: the closure runs with the outcome.
	Callback(ResponseCallback),
}

impl Resolver {
	pub fn callback<F>(f: F) -> Self
	where
		F: FnOnce(Result<Vec<Value>>) + Send + 'static,
	{
		Resolver::Callback(Box::new(f))
	}

	pub fn settle(self, outcome: Result<Vec<Value>>) {
		match self {
			Resolver::Channel(tx) => {
				// Receiver gone means the caller stopped waiting.
				let _ = tx.send(outcome);
			}
			Resolver::Callback(f) => f(outcome),
		}
	}
}

impl std::fmt::Debug for Resolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Resolver::Channel(_) => f.write_str("Resolver::Channel"),
			Resolver::Callback(_) => f.write_str("Resolver::Callback"),
		}
	}
}

#[derive(Debug)]
pub(crate) struct PendingEntry {
	pub func: String,
	pub issued_at: Instant,
	pub resolver: Resolver,
}

/// Calls issued and not yet settled, keyed by correlation id.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
	entries: HashMap<u32, PendingEntry>,
}

impl PendingTable {
	pub fn insert(&mut self, id: u32, func: &str, resolver: Resolver) {
		self.entries.insert(
			id,
			PendingEntry {
				func: func.to_string(),
				issued_at: Instant::now(),
				resolver,
			},
		);
	}

	pub fn remove(&mut self, id: u32) -> Option<PendingEntry> {
		self.entries.remove(&id)
	}

	pub fn contains(&self, id: u32) -> bool {
		self.entries.contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Removes every entry, oldest id first.
	pub fn drain(&mut self) -> Vec<(u32, PendingEntry)> {
		let mut drained: Vec<_> = self.entries.drain().collect();
		drained.sort_by_key(|(id, _)| *id);
		drained
	}
}

/// Removes the table entry when a [`PendingCall`] is dropped unsettled.
struct CancelGuard {
	id: Option<u32>,
	core: Weak<Mutex<SessionCore>>,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		let (Some(id), Some(core)) = (self.id, self.core.upgrade()) else {
			return;
		};
		if core.lock().pending.remove(id).is_some() {
			tracing::debug!(id, "Removed abandoned pending call");
		}
	}
}

/// Future returned by promise-style calls.
///
/// Resolves with the raw response argument list. Dropping it before it
/// resolves abandons the call: a late response is then treated as unmatched.
pub struct PendingCall {
	rx: oneshot::Receiver<Result<Vec<Value>>>,
	guard: CancelGuard,
}

impl PendingCall {
	pub(crate) fn new(
		id: Option<u32>,
		rx: oneshot::Receiver<Result<Vec<Value>>>,
		core: Weak<Mutex<SessionCore>>,
	) -> Self {
		Self {
			rx,
			guard: CancelGuard {
				id,
				core,
				completed: false,
			},
		}
	}

	/// Correlation id, or `None` if the gate settled the call without
	/// sending anything.
	pub fn id(&self) -> Option<u32> {
		self.guard.id
	}

	/// Awaits the response and applies the error-first convention.
	pub async fn result(self) -> Result<Vec<Value>> {
		split_error_first(self.await?)
	}

	/// Awaits the response and decodes the first result argument.
	pub async fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
		let mut rest = self.result().await?;
		let first = if rest.is_empty() {
			Value::Null
		} else {
			rest.swap_remove(0)
		};
		Ok(serde_json::from_value(first)?)
	}
}

impl Future for PendingCall {
	type Output = Result<Vec<Value>>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

impl std::fmt::Debug for PendingCall {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingCall").field("id", &self.guard.id).finish()
	}
}

/// Interprets `[error, result...]`: a non-null first argument is a host
/// rejection carried verbatim, otherwise the remaining arguments are returned.
pub fn split_error_first(mut args: Vec<Value>) -> Result<Vec<Value>> {
	if args.is_empty() {
		return Ok(args);
	}
	let error = args.remove(0);
	if error.is_null() {
		Ok(args)
	} else {
		Err(Error::HostRejected(error))
	}
}
