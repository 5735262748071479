//! Deprecated task-module API.
//!
//! Kept for applications written against it. Payloads are translated to
//! their dialog equivalents and delegated to [`crate::dialog`]; the wire
//! function names are unchanged.

use hostbridge_protocol::{
	AppIds, DialogDimension, DialogInfo, DialogSize, Dimension, TaskDimension, TaskInfo, TaskModuleDimension,
};
use std::sync::Arc;

use hostbridge_runtime::{Connection, Error, Result};
use serde_json::Value;

use crate::app_window::ChildAppWindow;
use crate::dialog;

const UPDATE_TASK_FIELDS_ERROR: &str = "resize requires a dialogInfo argument containing only width and height";

fn dialog_dimension(dimension: TaskDimension) -> Dimension {
	match dimension {
		TaskDimension::Pixels(px) => Dimension::Pixels(px),
		TaskDimension::Named(TaskModuleDimension::Large) => Dimension::Named(DialogDimension::Large),
		TaskDimension::Named(TaskModuleDimension::Medium) => Dimension::Named(DialogDimension::Medium),
		TaskDimension::Named(TaskModuleDimension::Small | TaskModuleDimension::Unrecognized) => {
			Dimension::Named(DialogDimension::Small)
		}
	}
}

/// Translates a task payload to a dialog payload.
///
/// Named sizes map across; names the dialog API does not know become
/// `small`. Pixel sizes pass through.
pub fn dialog_info_from_task_info(task: TaskInfo) -> DialogInfo {
	DialogInfo {
		url: task.url,
		card: task.card,
		height: task.height.map(dialog_dimension),
		width: task.width.map(dialog_dimension),
		title: task.title,
		fallback_url: task.fallback_url,
		completion_bot_id: task.completion_bot_id,
	}
}

/// Opens a task module. See [`dialog::open`].
#[deprecated(note = "use dialog::open")]
pub fn start_task<F>(connection: &Arc<Connection>, task: TaskInfo, on_submit: F) -> Result<ChildAppWindow>
where
	F: FnOnce(Result<Value>) + Send + 'static,
{
	dialog::open(connection, dialog_info_from_task_info(task), on_submit)
}

/// Resizes the current task module. Only `width` and `height` may be set.
#[deprecated(note = "use dialog::resize")]
pub fn update_task(connection: &Connection, task: TaskInfo) -> Result<()> {
	let TaskInfo {
		url,
		card,
		height,
		width,
		title,
		fallback_url,
		completion_bot_id,
	} = task;
	if url.is_some() || card.is_some() || title.is_some() || fallback_url.is_some() || completion_bot_id.is_some() {
		return Err(Error::InvalidArgument(UPDATE_TASK_FIELDS_ERROR.to_string()));
	}
	dialog::resize(
		connection,
		DialogSize {
			width: width.map(dialog_dimension),
			height: height.map(dialog_dimension),
		},
	)
}

/// Submits a result from the current task module. See [`dialog::submit`].
#[deprecated(note = "use dialog::submit")]
pub fn submit_task(connection: &Connection, result: Option<Value>, app_ids: impl Into<AppIds>) -> Result<()> {
	dialog::submit(connection, result, app_ids)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn named_sizes_map_and_unknown_become_small() {
		let task = TaskInfo {
			height: Some(TaskDimension::Named(TaskModuleDimension::Large)),
			width: Some(TaskDimension::Named(TaskModuleDimension::Unrecognized)),
			..TaskInfo::default()
		};
		let info = dialog_info_from_task_info(task);
		assert_eq!(info.height, Some(Dimension::Named(DialogDimension::Large)));
		assert_eq!(info.width, Some(Dimension::Named(DialogDimension::Small)));
	}

	#[test]
	fn pixels_and_other_fields_pass_through() {
		let task = TaskInfo {
			url: Some("https://app.example/task".into()),
			height: Some(TaskDimension::Pixels(300)),
			completion_bot_id: Some("bot".into()),
			..TaskInfo::default()
		};
		let info = dialog_info_from_task_info(task);
		assert_eq!(info.url.as_deref(), Some("https://app.example/task"));
		assert_eq!(info.height, Some(Dimension::Pixels(300)));
		assert_eq!(info.width, None);
		assert_eq!(info.completion_bot_id.as_deref(), Some("bot"));
	}
}
