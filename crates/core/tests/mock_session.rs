// Shared setup for the capability wrapper tests: a connection wired to a
// scripted host and already past the handshake.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hostbridge::{Connection, FrameContext, HostClientType};
use hostbridge_runtime::testing::MockHost;

pub const QUIET: Duration = Duration::from_millis(50);

pub async fn setup(context: FrameContext) -> (Arc<Connection>, MockHost) {
	setup_with(context, HostClientType::Desktop, Some("2.3.0")).await
}

pub async fn setup_with(
	context: FrameContext,
	client_type: HostClientType,
	version: Option<&str>,
) -> (Arc<Connection>, MockHost) {
	let (connection, mut host) = MockHost::connect();
	let handshake = connection.initialize();
	host.complete_handshake(context, client_type, version)
		.await
		.expect("handshake was not sent");
	handshake.await.expect("handshake failed");
	(connection, host)
}
