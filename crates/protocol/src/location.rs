//! Location capability payloads.

use serde::{Deserialize, Serialize};

/// Options for requesting the user's location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProps {
	/// Let the user pick a location instead of using the current one
	pub allow_choose_location: bool,
	/// Show a map when the location is fixed
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub show_map: Option<bool>,
}

/// A geographic position reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
	/// Accuracy radius in meters; negative when unknown
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub accuracy: Option<f64>,
	/// Unix timestamp in milliseconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<f64>,
}
