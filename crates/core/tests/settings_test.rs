// Settings page integration tests
//
// Covers the save/remove handshake and settings storage calls.

mod mock_session;

use hostbridge::settings::Settings;
use hostbridge::{Error, FrameContext, InstanceConfig};
use mock_session::{QUIET, setup};
use serde_json::json;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_save_without_handler_acknowledges() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	let _settings = Settings::new(connection.clone());

	host.emit("settings.save", vec![]).unwrap();

	let ack = host.expect_func("settings.save.success").await.unwrap();
	assert!(ack.args.is_empty());
	assert_eq!(ack.id, None);
}

#[tokio::test]
async fn test_remove_without_handler_acknowledges() {
	let (connection, mut host) = setup(FrameContext::Remove).await;
	let _settings = Settings::new(connection.clone());

	host.emit("settings.remove", vec![]).unwrap();

	let ack = host.expect_func("settings.remove.success").await.unwrap();
	assert!(ack.args.is_empty());
}

#[tokio::test]
async fn test_save_handler_sees_host_result() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	let settings = Settings::new(connection.clone());
	let (tx, mut rx) = mpsc::unbounded_channel();

	settings.register_on_save_handler(move |event| {
		tx.send(event.result.result.clone()).unwrap();
		event.notify_failure(Some("someReason")).unwrap();
	});
	host.emit("settings.save", vec![json!({"webhookUrl": "someWebhookUrl"})])
		.unwrap();

	assert_eq!(rx.recv().await.unwrap(), json!({"webhookUrl": "someWebhookUrl"}));
	let failure = host.expect_func("settings.save.failure").await.unwrap();
	assert_eq!(failure.args, vec![json!("someReason")]);
}

#[tokio::test]
async fn test_later_save_handler_replaces_earlier() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	let settings = Settings::new(connection.clone());
	let (tx, mut rx) = mpsc::unbounded_channel();

	let first = tx.clone();
	settings.register_on_save_handler(move |_| first.send("first").unwrap());
	settings.register_on_save_handler(move |event| {
		tx.send("second").unwrap();
		event.notify_success().unwrap();
	});
	host.emit("settings.save", vec![]).unwrap();

	host.expect_func("settings.save.success").await.unwrap();
	assert_eq!(rx.recv().await.unwrap(), "second");
	assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_save_event_notifies_once() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	let settings = Settings::new(connection.clone());
	let (tx, mut rx) = mpsc::unbounded_channel();

	settings.register_on_save_handler(move |event| {
		event.notify_success().unwrap();
		let again = event.notify_success().unwrap_err().to_string();
		let failure = event.notify_failure(None).unwrap_err().to_string();
		tx.send((again, failure)).unwrap();
	});
	host.emit("settings.save", vec![]).unwrap();

	let (again, failure) = rx.recv().await.unwrap();
	assert!(again.ends_with("The SaveEvent may only notify success or failure once."));
	assert!(failure.ends_with("The SaveEvent may only notify success or failure once."));

	host.expect_func("settings.save.success").await.unwrap();
	assert!(host.is_quiet_for(QUIET).await);
}

#[tokio::test]
async fn test_remove_handler_failure() {
	let (connection, mut host) = setup(FrameContext::Remove).await;
	let settings = Settings::new(connection.clone());

	settings.register_on_remove_handler(|event| {
		event.notify_failure(Some("busy")).unwrap();
		assert!(
			event
				.notify_success()
				.unwrap_err()
				.to_string()
				.ends_with("The RemoveEvent may only notify success or failure once.")
		);
	});
	host.emit("settings.remove", vec![]).unwrap();

	let failure = host.expect_func("settings.remove.failure").await.unwrap();
	assert_eq!(failure.args, vec![json!("busy")]);
}

#[tokio::test]
async fn test_dropping_settings_stops_listening() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	drop(Settings::new(connection.clone()));

	host.emit("settings.save", vec![]).unwrap();
	assert!(host.is_quiet_for(QUIET).await);
}

#[tokio::test]
async fn test_get_and_set_settings() {
	let (connection, mut host) = setup(FrameContext::Settings).await;
	let settings = Settings::new(connection.clone());

	let (config, _) = tokio::join!(settings.get_settings(), async {
		let request = host.expect_func("settings.getSettings").await.unwrap();
		host.respond(
			request.id.unwrap(),
			vec![json!({"entityId": "tab-1", "contentUrl": "https://app.example/tab"})],
		)
		.unwrap();
	});
	let config = config.unwrap();
	assert_eq!(config.entity_id.as_deref(), Some("tab-1"));
	assert_eq!(config.content_url.as_deref(), Some("https://app.example/tab"));

	settings.set_validity_state(true).unwrap();
	let validity = host.expect_func("settings.setValidityState").await.unwrap();
	assert_eq!(validity.args, vec![json!(true)]);

	let update = InstanceConfig {
		entity_id: Some("tab-1".into()),
		..InstanceConfig::default()
	};
	let (saved, _) = tokio::join!(settings.set_settings(update), async {
		let request = host.expect_func("settings.setSettings").await.unwrap();
		assert_eq!(request.args, vec![json!({"entityId": "tab-1"})]);
		host.respond(request.id.unwrap(), vec![json!(false), json!("quota exceeded")])
			.unwrap();
	});
	let err = saved.unwrap_err();
	assert!(matches!(err, Error::HostRejected(ref reason) if reason == "quota exceeded"));
}
