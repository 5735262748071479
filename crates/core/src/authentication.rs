//! Sign-in flows.
//!
//! On web clients the application opens the sign-in page itself, as a
//! secondary window that reports back through the opener. Other clients run
//! the flow natively and answer a single host call.

use std::sync::Arc;

use hostbridge_protocol::HostClientType;
use hostbridge_runtime::{Capability, ChildOutcome, Connection, Error, Result};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::status_result;

/// Reason reported when the user closes the sign-in window.
pub const CANCELLED_BY_USER: &str = "CancelledByUser";

/// Where and how to show the sign-in page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthenticateParameters {
	pub url: String,
	pub width: Option<u32>,
	pub height: Option<u32>,
}

impl AuthenticateParameters {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			..Self::default()
		}
	}
}

/// Options for a host-issued token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthTokenRequest {
	pub resources: Vec<String>,
	pub claims: Vec<String>,
	pub silent: bool,
}

fn reason_text(reason: Value) -> String {
	match reason {
		Value::String(s) => s,
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

fn outcome_to_result(outcome: ChildOutcome) -> Result<String> {
	match outcome {
		ChildOutcome::Submitted(args) => Ok(args.into_iter().next().map(reason_text).unwrap_or_default()),
		ChildOutcome::Failed(reason) => Err(Error::AuthenticationFailed(reason_text(reason))),
		ChildOutcome::Closed => Err(Error::AuthenticationFailed(CANCELLED_BY_USER.to_string())),
	}
}

/// Runs a sign-in flow. `on_done` runs once with the page's result.
pub fn authenticate<F>(connection: &Arc<Connection>, params: AuthenticateParameters, on_done: F) -> Result<()>
where
	F: FnOnce(Result<String>) + Send + 'static,
{
	let on_web = connection
		.host_info()
		.is_some_and(|host| host.host_client_type == HostClientType::Web);

	if on_web {
		tracing::debug!(url = %params.url, "Opening sign-in window");
		connection
			.open_child(Capability::AuthenticationAuthenticate, &params.url, move |outcome| {
				on_done(outcome_to_result(outcome))
			})
			.map(|_| ())
	} else {
		connection.call_with_callback(
			Capability::AuthenticationAuthenticate,
			vec![json!(params.url), json!(params.width), json!(params.height)],
			move |outcome| {
				on_done(outcome.and_then(|args| match status_result(args) {
					Ok(result) => Ok(reason_text(result)),
					Err(Error::HostRejected(reason)) => Err(Error::AuthenticationFailed(reason_text(reason))),
					Err(e) => Err(e),
				}))
			},
		)
	}
}

/// Awaitable [`authenticate`].
pub async fn authenticate_async(connection: &Arc<Connection>, params: AuthenticateParameters) -> Result<String> {
	let (tx, rx) = oneshot::channel();
	authenticate(connection, params, move |outcome| {
		let _ = tx.send(outcome);
	})?;
	rx.await.map_err(|_| Error::ChannelClosed)?
}

/// Asks the host for a token for the signed-in user.
pub async fn get_auth_token(connection: &Connection, request: AuthTokenRequest) -> Result<String> {
	let args = connection
		.call(
			Capability::AuthenticationGetAuthToken,
			vec![json!(request.resources), json!(request.claims), json!(request.silent)],
		)?
		.await?;
	match status_result(args) {
		Ok(token) => Ok(reason_text(token)),
		Err(Error::HostRejected(reason)) => Err(Error::AuthenticationFailed(reason_text(reason))),
		Err(e) => Err(e),
	}
}
