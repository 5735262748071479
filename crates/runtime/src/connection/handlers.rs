//! Event handler registry and RAII subscriptions.
//!
//! Handlers live in an [`IndexMap`] so removal is O(1) and dispatch order is
//! registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Unique identifier for event handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Handler invoked with an event's argument list.
pub type EventHandlerFn = Arc<dyn Fn(&[Value]) + Send + Sync>;

pub(crate) struct HandlerEntry {
	pub event: String,
	pub handler: EventHandlerFn,
}

pub(crate) type HandlerMap = Arc<Mutex<IndexMap<HandlerId, HandlerEntry>>>;

/// Clones the handlers registered for `event` so they can run unlocked.
pub(crate) fn handlers_for(map: &HandlerMap, event: &str) -> Vec<EventHandlerFn> {
	map.lock()
		.values()
		.filter(|entry| entry.event == event)
		.map(|entry| Arc::clone(&entry.handler))
		.collect()
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the handler map, so dropping it after the
/// connection is gone is a no-op.
pub struct Subscription {
	id: HandlerId,
	map: Option<Weak<Mutex<IndexMap<HandlerId, HandlerEntry>>>>,
}

impl Subscription {
	pub(crate) fn new(id: HandlerId, map: &HandlerMap) -> Self {
		Self {
			id,
			map: Some(Arc::downgrade(map)),
		}
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Keeps the handler registered for the life of the connection.
	pub fn detach(mut self) {
		self.map = None;
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(map) = self.map.take().and_then(|weak| weak.upgrade()) {
			map.lock().shift_remove(&self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.map.is_some())
			.finish()
	}
}
