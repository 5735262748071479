use std::sync::Arc;
use std::time::Duration;

use hostbridge_protocol::{FrameContext, HostClientType};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::*;
use crate::config::BridgeConfig;
use crate::testing::{MockHost, MockWindowOpener};

async fn opener_session(context: FrameContext) -> (Arc<Connection>, MockHost, Arc<MockWindowOpener>) {
	let config = BridgeConfig::builder()
		.child_poll_interval(Duration::from_millis(10))
		.build();
	let (connection, mut host) = MockHost::connect_with_config(config);
	let handshake = connection.initialize();
	host.complete_handshake(context, HostClientType::Web, Some("2.3.0"))
		.await
		.unwrap();
	handshake.await.unwrap();

	let opener = MockWindowOpener::new();
	connection.set_window_opener(opener.clone());
	(connection, host, opener)
}

fn outcome_channel() -> (
	impl FnOnce(ChildOutcome) + Send + 'static,
	mpsc::UnboundedReceiver<ChildOutcome>,
) {
	let (tx, rx) = mpsc::unbounded_channel();
	(move |outcome| tx.send(outcome).unwrap(), rx)
}

/// Runs a protocol instance on the window side, as the page inside it would.
fn window_connection(opener: &MockWindowOpener) -> Arc<Connection> {
	let endpoint = opener.take_window_side().unwrap();
	let connection = Arc::new(Connection::new(endpoint.into_transport_parts()));
	let runner = Arc::clone(&connection);
	tokio::spawn(async move { runner.run().await });
	connection
}

#[tokio::test]
async fn test_close_without_submit_settles_once() {
	let (connection, _host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, mut outcomes) = outcome_channel();

	let handle = connection
		.open_child(Capability::DialogOpen, "https://app.example/dialog", on_result)
		.unwrap();
	assert_eq!(opener.urls(), ["https://app.example/dialog"]);
	assert_eq!(connection.child_count(), 1);

	handle.close();
	handle.close();

	assert_eq!(outcomes.recv().await.unwrap(), ChildOutcome::Closed);
	assert!(outcomes.recv().await.is_none());
	assert!(!handle.is_open());
	assert!(opener.last_window().unwrap().is_closed());
	assert_eq!(connection.child_count(), 0);
	assert!(handle.send("anything", vec![]).is_err());
}

#[tokio::test]
async fn test_window_closed_by_user_is_detected() {
	let (connection, _host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, mut outcomes) = outcome_channel();

	let handle = connection
		.open_child(Capability::DialogOpen, "https://app.example/dialog", on_result)
		.unwrap();
	drop(opener.take_window_side());

	assert_eq!(outcomes.recv().await.unwrap(), ChildOutcome::Closed);
	assert!(outcomes.recv().await.is_none());
	assert!(!handle.is_open());
}

#[tokio::test]
async fn test_window_protocol_instance_submits_result() {
	let (connection, _host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, mut outcomes) = outcome_channel();

	connection
		.open_child(Capability::DialogOpen, "https://app.example/dialog", on_result)
		.unwrap();
	let window = window_connection(&opener);

	let info = window.initialize().await.unwrap();
	assert_eq!(info.frame_context, FrameContext::Task);
	assert_eq!(info.host_client_type, HostClientType::Web);
	assert_eq!(info.host_version.as_str(), "2.3.0");

	let _submit = window
		.call(Capability::DialogSubmit, vec![json!({"answer": 42}), json!(["app-id"])])
		.unwrap();

	assert_eq!(
		outcomes.recv().await.unwrap(),
		ChildOutcome::Submitted(vec![json!({"answer": 42}), json!(["app-id"])])
	);
	assert_eq!(connection.child_count(), 0);
}

#[tokio::test]
async fn test_window_requests_are_relayed_to_host() {
	let (connection, mut host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, _outcomes) = outcome_channel();

	connection
		.open_child(Capability::DialogOpen, "https://app.example/dialog", on_result)
		.unwrap();
	let window = window_connection(&opener);
	window.initialize().await.unwrap();

	let call = window.call(Capability::LocationGetLocation, vec![json!({"allowChooseLocation": true})]).unwrap();

	let relayed = host.expect_func("location.getLocation").await.unwrap();
	assert_eq!(relayed.args, vec![json!({"allowChooseLocation": true})]);
	host.respond(relayed.id.unwrap(), vec![Value::Null, json!({"latitude": 1.5, "longitude": 2.5})])
		.unwrap();

	assert_eq!(
		call.result().await.unwrap(),
		vec![json!({"latitude": 1.5, "longitude": 2.5})]
	);
}

#[tokio::test]
async fn test_local_child_handler_answers_without_host() {
	let (connection, mut host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, _outcomes) = outcome_channel();

	connection.register_child_handler("getContext", |_| vec![json!({"theme": "dark"})]);
	connection
		.open_child(Capability::DialogOpen, "https://app.example/dialog", on_result)
		.unwrap();
	let window = window_connection(&opener);
	window.initialize().await.unwrap();

	let context = window.call(Capability::GetContext, vec![]).unwrap().await.unwrap();
	assert_eq!(context, vec![json!({"theme": "dark"})]);
	assert!(host.is_quiet_for(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_authentication_failure_reason() {
	let (connection, _host, opener) = opener_session(FrameContext::Content).await;
	let (on_result, mut outcomes) = outcome_channel();

	connection
		.open_child(Capability::AuthenticationAuthenticate, "https://login.example", on_result)
		.unwrap();
	let window = window_connection(&opener);
	let info = window.initialize().await.unwrap();
	assert_eq!(info.frame_context, FrameContext::Authentication);

	window
		.send_event_raw(AUTHENTICATE_FAILURE_FUNC, vec![json!("CancelledByUser")])
		.unwrap();

	assert_eq!(
		outcomes.recv().await.unwrap(),
		ChildOutcome::Failed(json!("CancelledByUser"))
	);
}

#[tokio::test]
async fn test_teardown_closes_children() {
	let (connection, _host, _opener) = opener_session(FrameContext::Content).await;
	let (first, mut first_rx) = outcome_channel();
	let (second, mut second_rx) = outcome_channel();

	connection.open_child(Capability::DialogOpen, "https://a", first).unwrap();
	connection.open_child(Capability::DialogOpen, "https://b", second).unwrap();
	assert_eq!(connection.child_count(), 2);

	connection.teardown();

	assert_eq!(first_rx.recv().await.unwrap(), ChildOutcome::Closed);
	assert_eq!(second_rx.recv().await.unwrap(), ChildOutcome::Closed);
	assert_eq!(connection.child_count(), 0);
}

#[tokio::test]
async fn test_open_child_is_gated() {
	let (connection, _host) = MockHost::connect();
	connection.set_window_opener(MockWindowOpener::new());
	let err = connection
		.open_child(Capability::DialogOpen, "https://a", |_| {})
		.unwrap_err();
	assert!(err.is_not_initialized());

	let (connection, _host, _opener) = opener_session(FrameContext::Task).await;
	let err = connection
		.open_child(Capability::DialogOpen, "https://a", |_| {})
		.unwrap_err();
	assert!(err.is_context_not_allowed());

	let (connection, mut host) = MockHost::connect();
	let handshake = connection.initialize();
	host.complete_handshake(FrameContext::Content, HostClientType::Web, None)
		.await
		.unwrap();
	handshake.await.unwrap();
	let err = connection
		.open_child(Capability::DialogOpen, "https://a", |_| {})
		.unwrap_err();
	assert!(matches!(err, Error::NoWindowOpener));
}
