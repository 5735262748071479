//! Settings (page configuration) payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration of an app instance as saved by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub entity_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remove_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suggested_display_name: Option<String>,
}

/// Parameters delivered with a `settings.save` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveParameters {
	/// Host-supplied result, e.g. a webhook url
	#[serde(default)]
	pub result: Value,
}
