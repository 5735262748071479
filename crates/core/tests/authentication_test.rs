// Authentication integration tests
//
// Web clients sign in through a secondary window; every other client asks
// the host.

mod mock_session;

use std::sync::Arc;

use hostbridge::authentication::{
	AuthTokenRequest, AuthenticateParameters, authenticate, authenticate_async, get_auth_token,
};
use hostbridge::{Connection, Error, FrameContext, HostClientType};
use hostbridge_runtime::testing::{MockHost, MockWindowOpener};
use mock_session::setup_with;
use serde_json::json;
use tokio::sync::mpsc;

async fn web_session() -> (Arc<Connection>, MockHost, Arc<MockWindowOpener>) {
	let (connection, host) = setup_with(FrameContext::Content, HostClientType::Web, Some("2.3.0")).await;
	let opener = MockWindowOpener::new();
	connection.set_window_opener(opener.clone());
	(connection, host, opener)
}

#[tokio::test]
async fn test_web_sign_in_window_reports_token() {
	let (connection, _host, opener) = web_session().await;
	let (tx, mut rx) = mpsc::unbounded_channel();

	authenticate(
		&connection,
		AuthenticateParameters::new("https://app.example/signin"),
		move |outcome| tx.send(outcome).unwrap(),
	)
	.unwrap();
	assert_eq!(opener.urls(), ["https://app.example/signin"]);

	let window = MockHost::from_endpoint(opener.take_window_side().unwrap());
	window
		.emit("authentication.authenticate.success", vec![json!("token-123")])
		.unwrap();

	assert_eq!(rx.recv().await.unwrap().unwrap(), "token-123");
	assert!(opener.last_window().unwrap().is_closed());
	assert_eq!(connection.child_count(), 0);
}

#[tokio::test]
async fn test_web_sign_in_failure_reason() {
	let (connection, _host, opener) = web_session().await;
	let (tx, mut rx) = mpsc::unbounded_channel();

	authenticate(
		&connection,
		AuthenticateParameters::new("https://app.example/signin"),
		move |outcome| tx.send(outcome).unwrap(),
	)
	.unwrap();
	let window = MockHost::from_endpoint(opener.take_window_side().unwrap());
	window
		.emit("authentication.authenticate.failure", vec![json!("AccessDenied")])
		.unwrap();

	let err = rx.recv().await.unwrap().unwrap_err();
	assert!(matches!(err, Error::AuthenticationFailed(ref reason) if reason == "AccessDenied"));
}

#[tokio::test]
async fn test_closing_sign_in_window_cancels() {
	let (connection, _host, opener) = web_session().await;
	let (tx, mut rx) = mpsc::unbounded_channel();

	authenticate(
		&connection,
		AuthenticateParameters::new("https://app.example/signin"),
		move |outcome| tx.send(outcome).unwrap(),
	)
	.unwrap();
	opener.last_window().unwrap().close();

	let err = rx.recv().await.unwrap().unwrap_err();
	assert_eq!(err.to_string(), "Authentication failed: CancelledByUser");
	assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_native_client_asks_host() {
	let (connection, mut host) = setup_with(FrameContext::Content, HostClientType::Desktop, Some("2.3.0")).await;

	let params = AuthenticateParameters {
		url: "https://app.example/signin".into(),
		width: Some(600),
		height: None,
	};
	let (outcome, _) = tokio::join!(authenticate_async(&connection, params), async {
		let request = host.expect_func("authentication.authenticate").await.unwrap();
		assert_eq!(
			request.args,
			vec![json!("https://app.example/signin"), json!(600), json!(null)]
		);
		host.respond(request.id.unwrap(), vec![json!(true), json!("token-456")])
			.unwrap();
	});

	assert_eq!(outcome.unwrap(), "token-456");
	assert_eq!(connection.child_count(), 0);
}

#[tokio::test]
async fn test_get_auth_token_failure() {
	let (connection, mut host) = setup_with(FrameContext::Task, HostClientType::Ios, Some("2.3.0")).await;

	let request = AuthTokenRequest {
		resources: vec!["https://api.example".into()],
		claims: vec![],
		silent: true,
	};
	let (outcome, _) = tokio::join!(get_auth_token(&connection, request), async {
		let request = host.expect_func("authentication.getAuthToken").await.unwrap();
		assert_eq!(
			request.args,
			vec![json!(["https://api.example"]), json!([]), json!(true)]
		);
		host.respond(request.id.unwrap(), vec![json!(false), json!("FailedToGetToken")])
			.unwrap();
	});

	let err = outcome.unwrap_err();
	assert_eq!(err.to_string(), "Authentication failed: FailedToGetToken");
}
