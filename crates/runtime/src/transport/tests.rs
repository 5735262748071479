use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

async fn write_frame(writer: &mut (impl AsyncWriteExt + Unpin), bytes: &[u8]) {
	writer.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
	writer.write_all(bytes).await.unwrap();
	writer.flush().await.unwrap();
}

#[tokio::test]
async fn test_send_writes_length_prefixed_frame() {
	let (mut host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, _host_write) = tokio::io::duplex(1024);

	let (transport, _rx) = PipeTransport::new(client_write, client_read);
	let (mut sender, _receiver) = transport.into_parts();

	let envelope = json!({"id": 0, "func": "initialize", "args": ["2.0.0"]});
	Transport::send(&mut sender, envelope.clone()).await.unwrap();

	let mut len_buf = [0u8; 4];
	host_read.read_exact(&mut len_buf).await.unwrap();
	let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
	host_read.read_exact(&mut body).await.unwrap();

	let received: Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(received, envelope);
}

#[tokio::test]
async fn test_frames_arrive_in_order() {
	let (_host_read, client_write) = tokio::io::duplex(4096);
	let (client_read, mut host_write) = tokio::io::duplex(4096);

	let (mut transport, mut rx) = PipeTransport::new(client_write, client_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let messages = vec![
		json!({"id": 0, "args": [null, "content"]}),
		json!({"func": "themeChange", "args": ["dark"]}),
		json!({"id": 1, "args": [null]}),
	];
	for msg in &messages {
		write_frame(&mut host_write, &serde_json::to_vec(msg).unwrap()).await;
	}

	for expected in &messages {
		assert_eq!(&rx.recv().await.unwrap(), expected);
	}

	drop(host_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_non_json_frame_is_skipped() {
	let (_host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024);

	let (mut transport, mut rx) = PipeTransport::new(client_write, client_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	write_frame(&mut host_write, b"{not json").await;
	write_frame(&mut host_write, br#"{"func":"after"}"#).await;

	assert_eq!(rx.recv().await.unwrap(), json!({"func": "after"}));

	drop(host_write);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_large_frame() {
	let (_host_read, client_write) = tokio::io::duplex(1024 * 1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024 * 1024);

	let (mut transport, mut rx) = PipeTransport::new(client_write, client_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let large = json!({"id": 7, "args": [null, "x".repeat(100_000)]});
	write_frame(&mut host_write, &serde_json::to_vec(&large).unwrap()).await;

	assert_eq!(rx.recv().await.unwrap(), large);

	drop(host_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_truncated_length_prefix() {
	let (_host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(client_write, client_read);

	host_write.write_all(&[0x01, 0x02]).await.unwrap();
	drop(host_write);

	let err = transport.run().await.unwrap_err();
	assert!(err.to_string().contains("Failed to read length prefix"));
}

#[tokio::test]
async fn test_truncated_body() {
	let (_host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(client_write, client_read);

	host_write.write_all(&64u32.to_le_bytes()).await.unwrap();
	host_write.write_all(b"{\"id\":").await.unwrap();
	drop(host_write);

	let err = transport.run().await.unwrap_err();
	assert!(err.to_string().contains("Failed to read message body"));
}

#[tokio::test]
async fn test_oversized_length_prefix_is_refused() {
	let (_host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(client_write, client_read);

	host_write.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
	host_write.write_all(&[b'x'; 512]).await.unwrap();

	let err = transport.run().await.unwrap_err();
	assert!(matches!(err, Error::TransportError(_)), "{err:?}");
	assert_eq!(
		err.to_string(),
		format!("Transport error: Frame of {} bytes exceeds the {MAX_FRAME_LEN} byte limit", u32::MAX)
	);
}

#[tokio::test]
async fn test_custom_frame_limit() {
	let (_host_read, client_write) = tokio::io::duplex(1024);
	let (client_read, mut host_write) = tokio::io::duplex(1024);

	let (transport, mut rx) = PipeTransport::new(client_write, client_read);
	let mut transport = transport.with_max_frame_len(16);

	write_frame(&mut host_write, b"[1,2,3]").await;
	write_frame(&mut host_write, br#"{"id": 1, "args": [null, "too long"]}"#).await;

	let err = transport.run().await.unwrap_err();
	assert!(err.to_string().contains("exceeds the 16 byte limit"), "{err}");
	assert_eq!(rx.recv().await.unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn test_channel_pair_is_crossed() {
	let (left, right) = ChannelTransport::pair();
	let mut parts = left.into_transport_parts();
	let (right_tx, mut right_rx) = right.split();

	parts.sender.send(json!({"func": "ping"})).await.unwrap();
	assert_eq!(right_rx.recv().await.unwrap(), json!({"func": "ping"}));

	right_tx.send(json!({"func": "pong"})).unwrap();
	assert_eq!(parts.message_rx.recv().await.unwrap(), json!({"func": "pong"}));

	parts.receiver.run().await.unwrap();
}

#[tokio::test]
async fn test_channel_send_after_peer_dropped() {
	let (left, right) = ChannelTransport::pair();
	let mut parts = left.into_transport_parts();
	drop(right);

	let err = parts.sender.send(json!({"func": "ping"})).await.unwrap_err();
	assert!(matches!(err, Error::ChannelClosed));
}
