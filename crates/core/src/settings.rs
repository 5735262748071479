//! Page configuration: settings storage and the save/remove handshake.
//!
//! While the host shows a settings or remove page it sends `settings.save`
//! or `settings.remove`; the page answers with a success or failure
//! notification. [`Settings`] routes those events to the registered handler,
//! or answers success itself when no handler is registered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hostbridge_protocol::{InstanceConfig, SaveParameters};
use hostbridge_runtime::{Capability, Connection, Error, Result, Subscription};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::{first_arg, status_result};

pub const SAVE_EVENT: &str = "settings.save";
pub const REMOVE_EVENT: &str = "settings.remove";

type SaveHandler = Arc<dyn Fn(SaveEvent) + Send + Sync>;
type RemoveHandler = Arc<dyn Fn(RemoveEvent) + Send + Sync>;

#[derive(Default)]
struct Handlers {
	save: Mutex<Option<SaveHandler>>,
	remove: Mutex<Option<RemoveHandler>>,
}

/// One-shot reply to a host notification.
struct Notifier {
	connection: Weak<Connection>,
	success: Capability,
	failure: Capability,
	once_error: &'static str,
	notified: AtomicBool,
}

impl Notifier {
	fn notify(&self, capability: Capability, args: Vec<Value>) -> Result<()> {
		if self.notified.swap(true, Ordering::SeqCst) {
			return Err(Error::InvalidArgument(self.once_error.to_string()));
		}
		let connection = self.connection.upgrade().ok_or(Error::TornDown)?;
		connection.send_event(capability, args)
	}

	fn success(&self) -> Result<()> {
		self.notify(self.success, vec![])
	}

	fn failure(&self, reason: Option<&str>) -> Result<()> {
		self.notify(self.failure, vec![json!(reason)])
	}
}

/// Delivered to the save handler.
pub struct SaveEvent {
	/// What the host sent with the save request.
	pub result: SaveParameters,
	notifier: Notifier,
}

impl SaveEvent {
	/// Tells the host the settings were saved. Only one notify call is allowed.
	pub fn notify_success(&self) -> Result<()> {
		self.notifier.success()
	}

	/// Tells the host saving failed. Only one notify call is allowed.
	pub fn notify_failure(&self, reason: Option<&str>) -> Result<()> {
		self.notifier.failure(reason)
	}
}

/// Delivered to the remove handler.
pub struct RemoveEvent {
	notifier: Notifier,
}

impl RemoveEvent {
	pub fn notify_success(&self) -> Result<()> {
		self.notifier.success()
	}

	pub fn notify_failure(&self, reason: Option<&str>) -> Result<()> {
		self.notifier.failure(reason)
	}
}

/// Settings page API bound to one connection.
///
/// Listens for save/remove events for as long as it lives.
pub struct Settings {
	connection: Arc<Connection>,
	handlers: Arc<Handlers>,
	_save: Subscription,
	_remove: Subscription,
}

impl Settings {
	pub fn new(connection: Arc<Connection>) -> Self {
		let handlers = Arc::new(Handlers::default());

		let weak = Arc::downgrade(&connection);
		let slot = Arc::clone(&handlers);
		let save = connection.on(SAVE_EVENT, move |args| {
			let event = SaveEvent {
				result: SaveParameters {
					result: args.first().cloned().unwrap_or(Value::Null),
				},
				notifier: Notifier {
					connection: weak.clone(),
					success: Capability::SettingsSaveSuccess,
					failure: Capability::SettingsSaveFailure,
					once_error: "The SaveEvent may only notify success or failure once.",
					notified: AtomicBool::new(false),
				},
			};
			let handler = slot.save.lock().clone();
			match handler {
				Some(handler) => handler(event),
				None => {
					if let Err(e) = event.notify_success() {
						tracing::warn!(%e, "Could not acknowledge settings save");
					}
				}
			}
		});

		let weak = Arc::downgrade(&connection);
		let slot = Arc::clone(&handlers);
		let remove = connection.on(REMOVE_EVENT, move |_| {
			let event = RemoveEvent {
				notifier: Notifier {
					connection: weak.clone(),
					success: Capability::SettingsRemoveSuccess,
					failure: Capability::SettingsRemoveFailure,
					once_error: "The RemoveEvent may only notify success or failure once.",
					notified: AtomicBool::new(false),
				},
			};
			let handler = slot.remove.lock().clone();
			match handler {
				Some(handler) => handler(event),
				None => {
					if let Err(e) = event.notify_success() {
						tracing::warn!(%e, "Could not acknowledge settings remove");
					}
				}
			}
		});

		Self {
			connection,
			handlers,
			_save: save,
			_remove: remove,
		}
	}

	/// Enables or disables the host's save button.
	pub fn set_validity_state(&self, valid: bool) -> Result<()> {
		self.connection
			.send_event(Capability::SettingsSetValidityState, vec![json!(valid)])
	}

	/// Reads the saved configuration of this app instance.
	pub async fn get_settings(&self) -> Result<InstanceConfig> {
		let args = self.connection.call(Capability::SettingsGetSettings, vec![])?.await?;
		Ok(serde_json::from_value(first_arg(args))?)
	}

	/// Saves the configuration of this app instance.
	pub async fn set_settings(&self, config: InstanceConfig) -> Result<()> {
		let args = self
			.connection
			.call(Capability::SettingsSetSettings, vec![json!(config)])?
			.await?;
		status_result(args).map(|_| ())
	}

	/// Replaces the save handler.
	pub fn register_on_save_handler<F>(&self, handler: F)
	where
		F: Fn(SaveEvent) + Send + Sync + 'static,
	{
		*self.handlers.save.lock() = Some(Arc::new(handler));
	}

	/// Replaces the remove handler.
	pub fn register_on_remove_handler<F>(&self, handler: F)
	where
		F: Fn(RemoveEvent) + Send + Sync + 'static,
	{
		*self.handlers.remove.lock() = Some(Arc::new(handler));
	}
}
