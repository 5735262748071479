//! Transport layer: moves JSON envelopes across the channel boundary.
//!
//! The connection only sees two halves:
//!
//! - [`Transport`]: outbound, one `send` per envelope
//! - [`TransportReceiver`]: an inbound pump that pushes every decoded message
//!   into the `message_rx` channel handed to the connection
//!
//! Two implementations are provided. [`PipeTransport`] frames JSON with a
//! 4-byte little-endian length prefix over any async byte stream (stdio, a
//! socket, a duplex pipe). [`ChannelTransport`] is an in-memory endpoint pair
//! used between an opener and its secondary windows and in tests.

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Default upper bound on an inbound frame body, in bytes.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Outbound half of a transport.
pub trait Transport: Send {
	/// Sends one message.
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>>;
}

/// Inbound half of a transport.
pub trait TransportReceiver: Send {
	/// Pumps inbound messages until the channel closes or fails.
	fn run(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Everything a connection needs from a transport.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Length-prefixed JSON over an async byte stream.
///
/// Frame layout: `[len: u32 LE][len bytes of UTF-8 JSON]`.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: PipeTransportReceiver<R>,
}

/// Writing half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
	writer: W,
}

/// Reading half of a [`PipeTransport`].
pub struct PipeTransportReceiver<R> {
	reader: R,
	message_tx: mpsc::UnboundedSender<Value>,
	max_frame_len: usize,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	/// Creates a transport writing to `writer` and reading from `reader`.
	///
	/// Returns the transport and the receiver that decoded inbound messages
	/// are delivered to.
	pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeTransportSender { writer },
			receiver: PipeTransportReceiver {
				reader,
				message_tx,
				max_frame_len: MAX_FRAME_LEN,
			},
		};
		(transport, message_rx)
	}

	/// Sets the largest inbound frame the pump accepts. A longer length
	/// prefix fails the pump before any body is read.
	pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
		self.receiver.max_frame_len = max_frame_len;
		self
	}

	/// Splits into independently owned halves.
	pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
		(self.sender, self.receiver)
	}

	/// Boxes both halves for [`Connection::new`](crate::Connection::new).
	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		TransportParts {
			sender: Box::new(self.sender),
			receiver: Box::new(self.receiver),
			message_rx,
		}
	}

	/// Sends one framed message.
	pub async fn send(&mut self, message: Value) -> Result<()> {
		self.sender.write_frame(&message).await
	}

	/// Runs the inbound pump.
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.pump().await
	}
}

impl<W> PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	async fn write_frame(&mut self, message: &Value) -> Result<()> {
		let bytes = serde_json::to_vec(message)?;
		let length = u32::try_from(bytes.len())
			.map_err(|_| Error::TransportError(format!("Message too large: {} bytes", bytes.len())))?;

		self.writer
			.write_all(&length.to_le_bytes())
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write length prefix: {e}")))?;
		self.writer
			.write_all(&bytes)
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write message body: {e}")))?;
		self.writer.flush().await?;

		tracing::trace!(bytes = length, "Frame written");
		Ok(())
	}
}

impl<R> PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	async fn pump(&mut self) -> Result<()> {
		loop {
			let mut len_buf = [0u8; 4];
			self.reader
				.read_exact(&mut len_buf)
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read length prefix: {e}")))?;
			let length = u32::from_le_bytes(len_buf) as usize;
			if length > self.max_frame_len {
				return Err(Error::TransportError(format!(
					"Frame of {length} bytes exceeds the {} byte limit",
					self.max_frame_len
				)));
			}

			let mut body = vec![0u8; length];
			self.reader
				.read_exact(&mut body)
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read message body: {e}")))?;

			let message = match serde_json::from_slice::<Value>(&body) {
				Ok(message) => message,
				Err(e) => {
					tracing::warn!(%e, bytes = length, "Skipping frame that is not JSON");
					continue;
				}
			};

			if self.message_tx.send(message).is_err() {
				tracing::debug!("Message receiver dropped, stopping pipe reader");
				return Ok(());
			}
		}
	}
}

impl<W> Transport for PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { self.write_frame(&message).await })
	}
}

impl<R> TransportReceiver for PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	fn run(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(self.pump())
	}
}

/// In-memory transport made of two crossed unbounded channels.
pub struct ChannelTransport;

impl ChannelTransport {
	/// Creates two connected endpoints: what one sends, the other receives.
	pub fn pair() -> (ChannelEndpoint, ChannelEndpoint) {
		let (a_tx, a_rx) = mpsc::unbounded_channel();
		let (b_tx, b_rx) = mpsc::unbounded_channel();
		(
			ChannelEndpoint { tx: a_tx, rx: b_rx },
			ChannelEndpoint { tx: b_tx, rx: a_rx },
		)
	}
}

/// One side of a [`ChannelTransport`] pair.
#[derive(Debug)]
pub struct ChannelEndpoint {
	tx: mpsc::UnboundedSender<Value>,
	rx: mpsc::UnboundedReceiver<Value>,
}

impl ChannelEndpoint {
	/// Splits into the raw outbound sender and inbound receiver.
	pub fn split(self) -> (mpsc::UnboundedSender<Value>, mpsc::UnboundedReceiver<Value>) {
		(self.tx, self.rx)
	}

	/// Wraps this endpoint for [`Connection::new`](crate::Connection::new).
	///
	/// Inbound messages already arrive on a channel, so the receiver half has
	/// nothing to pump.
	pub fn into_transport_parts(self) -> TransportParts {
		TransportParts {
			sender: Box::new(ChannelSender { tx: self.tx }),
			receiver: Box::new(ChannelReceiver),
			message_rx: self.rx,
		}
	}
}

struct ChannelSender {
	tx: mpsc::UnboundedSender<Value>,
}

impl Transport for ChannelSender {
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>> {
		let result = self.tx.send(message).map_err(|_| Error::ChannelClosed);
		Box::pin(async move { result })
	}
}

struct ChannelReceiver;

impl TransportReceiver for ChannelReceiver {
	fn run(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

#[cfg(test)]
mod tests;
