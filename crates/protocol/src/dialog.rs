//! Dialog payloads and their deprecated task-module equivalents.

use serde::{Deserialize, Serialize};

/// Named dialog size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogDimension {
	Large,
	Medium,
	Small,
}

/// A dialog height or width: either a named size or pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
	Pixels(u32),
	Named(DialogDimension),
}

impl From<DialogDimension> for Dimension {
	fn from(d: DialogDimension) -> Self {
		Dimension::Named(d)
	}
}

impl From<u32> for Dimension {
	fn from(px: u32) -> Self {
		Dimension::Pixels(px)
	}
}

/// Parameters for opening a dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// JSON-encoded adaptive card
	#[serde(skip_serializing_if = "Option::is_none")]
	pub card: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub height: Option<Dimension>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub width: Option<Dimension>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Shown when the client cannot render the dialog
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fallback_url: Option<String>,
	/// Bot that receives the result instead of the opener
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completion_bot_id: Option<String>,
}

impl DialogInfo {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	pub fn card(mut self, card: impl Into<String>) -> Self {
		self.card = Some(card.into());
		self
	}

	pub fn height(mut self, height: impl Into<Dimension>) -> Self {
		self.height = Some(height.into());
		self
	}

	pub fn width(mut self, width: impl Into<Dimension>) -> Self {
		self.width = Some(width.into());
		self
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn fallback_url(mut self, url: impl Into<String>) -> Self {
		self.fallback_url = Some(url.into());
		self
	}

	pub fn completion_bot_id(mut self, id: impl Into<String>) -> Self {
		self.completion_bot_id = Some(id.into());
		self
	}
}

/// New size for an open dialog. Only width and height may be changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSize {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub width: Option<Dimension>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub height: Option<Dimension>,
}

/// Deprecated size names of the task-module API.
///
/// Unrecognized names are accepted and treated as small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskModuleDimension {
	Large,
	Medium,
	Small,
	#[serde(other)]
	Unrecognized,
}

/// A task-module height or width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskDimension {
	Pixels(u32),
	Named(TaskModuleDimension),
}

/// Deprecated parameters for opening a task module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub card: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub height: Option<TaskDimension>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width: Option<TaskDimension>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fallback_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completion_bot_id: Option<String>,
}

/// One app id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppIds {
	One(String),
	Many(Vec<String>),
}

impl AppIds {
	/// Normalizes to a list.
	pub fn into_vec(self) -> Vec<String> {
		match self {
			AppIds::One(id) => vec![id],
			AppIds::Many(ids) => ids,
		}
	}
}

impl From<&str> for AppIds {
	fn from(id: &str) -> Self {
		AppIds::One(id.to_string())
	}
}

impl From<Vec<String>> for AppIds {
	fn from(ids: Vec<String>) -> Self {
		AppIds::Many(ids)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn dialog_info_uses_camel_case_and_skips_missing() {
		let info = DialogInfo::new()
			.url("someUrl")
			.height(DialogDimension::Large)
			.width(400)
			.completion_bot_id("bot");
		assert_eq!(
			serde_json::to_value(&info).unwrap(),
			json!({"url": "someUrl", "height": "large", "width": 400, "completionBotId": "bot"})
		);
	}

	#[test]
	fn task_dimension_accepts_unknown_names() {
		let info: TaskInfo = serde_json::from_value(json!({"height": "huge", "width": 30})).unwrap();
		assert_eq!(info.height, Some(TaskDimension::Named(TaskModuleDimension::Unrecognized)));
		assert_eq!(info.width, Some(TaskDimension::Pixels(30)));
	}

	#[test]
	fn app_ids_normalize_to_list() {
		assert_eq!(AppIds::from("a").into_vec(), vec!["a".to_string()]);
		let many: AppIds = serde_json::from_value(json!(["a", "b"])).unwrap();
		assert_eq!(many.into_vec().len(), 2);
	}
}
