//! Geographic location.

use hostbridge_protocol::{Location, LocationProps};
use hostbridge_runtime::capability::recheck;
use hostbridge_runtime::{Admission, Capability, Connection, Error, Result};
use serde_json::json;

/// Error for a call made without its argument.
///
/// The gate still runs first, so a call that would be refused anyway
/// reports that refusal instead.
async fn missing_argument(connection: &Connection, capability: Capability, what: &str) -> Error {
	let refused = match connection.admit(capability) {
		Err(err) | Ok(Admission::Rejected(err)) => Some(err),
		Ok(Admission::Allowed) => None,
		Ok(Admission::Deferred) => match connection.initialize().await {
			Ok(host) => recheck(capability, &host).err(),
			Err(err) => Some(err),
		},
	};
	refused.unwrap_or_else(|| Error::InvalidArgument(format!("{capability} requires {what}")))
}

/// Asks the host for the user's location.
///
/// Needs host version 1.9.0 or later. Missing `props` fails with
/// [`Error::InvalidArgument`] once the call has passed the gate.
pub async fn get_location(connection: &Connection, props: Option<LocationProps>) -> Result<Location> {
	let capability = Capability::LocationGetLocation;
	let Some(props) = props else {
		return Err(missing_argument(connection, capability, "location props").await);
	};
	connection.call(capability, vec![json!(props)])?.into_typed().await
}

/// Shows `location` on a map. Resolves with whether the host showed it.
pub async fn show_location(connection: &Connection, location: Option<Location>) -> Result<bool> {
	let capability = Capability::LocationShowLocation;
	let Some(location) = location else {
		return Err(missing_argument(connection, capability, "a location").await);
	};
	connection.call(capability, vec![json!(location)])?.into_typed().await
}
