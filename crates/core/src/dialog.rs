//! Dialogs: modal surfaces hosting a URL or an adaptive card.
//!
//! The opener calls [`open`]; the page inside the dialog calls [`resize`]
//! and [`submit`] from its own `task` frame context. Messages travel
//! between the two through [`crate::app_window`].

use std::sync::Arc;

use hostbridge_protocol::{AppIds, DialogInfo, DialogSize};
use hostbridge_runtime::{Capability, Connection, Error, Result, split_error_first};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::app_window::ChildAppWindow;
use crate::first_arg;

/// Opens a dialog. `on_submit` runs once with whatever the dialog submitted,
/// or with the host's error if the dialog was dismissed or failed.
///
/// The returned window exchanges messages with the page in the dialog.
pub fn open<F>(connection: &Arc<Connection>, info: DialogInfo, on_submit: F) -> Result<ChildAppWindow>
where
	F: FnOnce(Result<Value>) + Send + 'static,
{
	tracing::debug!(url = ?info.url, title = ?info.title, "Opening dialog");
	connection.call_with_callback(Capability::DialogOpen, vec![json!(info)], move |outcome| {
		on_submit(outcome.and_then(split_error_first).map(first_arg));
	})?;
	Ok(ChildAppWindow::new(Arc::clone(connection)))
}

/// Awaitable [`open`] for openers that only need the submitted result.
pub async fn open_async(connection: &Arc<Connection>, info: DialogInfo) -> Result<Value> {
	let (tx, rx) = oneshot::channel();
	open(connection, info, move |outcome| {
		let _ = tx.send(outcome);
	})?;
	rx.await.map_err(|_| Error::ChannelClosed)?
}

/// Changes the size of the dialog this page is running in.
pub fn resize(connection: &Connection, size: DialogSize) -> Result<()> {
	connection.send_event(Capability::DialogResize, vec![json!(size)])
}

/// Submits a result from inside a dialog and closes it.
///
/// `app_ids` names the apps allowed to receive the result; a single id is
/// sent as a one-element list.
pub fn submit(connection: &Connection, result: Option<Value>, app_ids: impl Into<AppIds>) -> Result<()> {
	let app_ids = app_ids.into().into_vec();
	connection.send_event(
		Capability::DialogSubmit,
		vec![result.unwrap_or(Value::Null), json!(app_ids)],
	)
}
