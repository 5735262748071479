// App lifecycle and context integration tests

mod mock_session;

use hostbridge::{App, Error, FrameContext, HostClientType, LifecycleState};
use hostbridge_runtime::testing::MockHost;
use mock_session::setup;
use serde_json::json;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_initialize_reports_host() {
	let (connection, mut host) = MockHost::connect();
	let app = App::new(connection);
	assert_eq!(app.state().lifecycle, LifecycleState::Uninitialized);

	let (info, _) = tokio::join!(app.initialize(), async {
		host.complete_handshake(FrameContext::Stage, HostClientType::Android, Some("2.1.0"))
			.await
			.unwrap();
	});
	let info = info.unwrap();
	assert_eq!(info.frame_context, FrameContext::Stage);
	assert_eq!(info.host_client_type, HostClientType::Android);

	let state = app.state();
	assert_eq!(state.lifecycle, LifecycleState::Initialized);
	assert_eq!(state.frame_context, Some(FrameContext::Stage));
	assert_eq!(state.host_version.map(|v| v.as_str().to_string()).as_deref(), Some("2.1.0"));
}

#[tokio::test]
async fn test_get_context_returns_host_object() {
	let (connection, mut host) = setup(FrameContext::Content).await;
	let app = App::new(connection);

	let (context, _) = tokio::join!(app.get_context(), async {
		let request = host.expect_func("getContext").await.unwrap();
		host.respond(request.id.unwrap(), vec![json!({"locale": "en-us", "theme": "dark"})])
			.unwrap();
	});
	assert_eq!(context.unwrap()["theme"], "dark");
}

#[tokio::test]
async fn test_deep_link_failure_is_a_rejection() {
	let (connection, mut host) = setup(FrameContext::Content).await;
	let app = App::new(connection);

	let (outcome, _) = tokio::join!(app.execute_deep_link("https://host.example/l/app"), async {
		let request = host.expect_func("executeDeepLink").await.unwrap();
		assert_eq!(request.args, vec![json!("https://host.example/l/app")]);
		host.respond(request.id.unwrap(), vec![json!(false), json!("Invalid link")])
			.unwrap();
	});
	assert!(matches!(outcome.unwrap_err(), Error::HostRejected(reason) if reason == "Invalid link"));
}

#[tokio::test]
async fn test_theme_change_handler() {
	let (connection, host) = setup(FrameContext::Content).await;
	let app = App::new(connection);
	let (tx, mut rx) = mpsc::unbounded_channel();

	let subscription = app.on_theme_change(move |theme| tx.send(theme.to_string()).unwrap());
	host.emit("themeChange", vec![json!("contrast")]).unwrap();
	assert_eq!(rx.recv().await.unwrap(), "contrast");

	drop(subscription);
	host.emit("themeChange", vec![json!("dark")]).unwrap();
	assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_teardown_rejects_outstanding_calls() {
	let (connection, mut host) = setup(FrameContext::Content).await;
	let app = App::new(connection);

	let (context, _) = tokio::join!(app.get_context(), async {
		host.expect_func("getContext").await.unwrap();
		assert_eq!(app.teardown(), 1);
	});
	assert!(context.unwrap_err().is_torn_down());
	assert_eq!(app.state().lifecycle, LifecycleState::Uninitialized);
}
