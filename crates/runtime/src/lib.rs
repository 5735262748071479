//! Host bridge runtime: the messaging and lifecycle core.
//!
//! - **Transport**: moves JSON envelopes across the channel boundary
//! - **Connection**: correlation ids, pending calls, event dispatch
//! - **Lifecycle**: the `initialize` handshake and the pre-handshake queue
//! - **Capability gate**: context and host-version checks before anything is sent
//! - **Child sessions**: secondary windows running their own protocol instance
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  hostbridge  │  Capability wrappers (dialog, location, settings, ...)
//! └──────┬───────┘
//!        │ call / send_event / on / open_child
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Gate   │  │  context + version checks
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Conn   │  │  lifecycle, correlation, child relay
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  pipe / in-memory channel
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! Each [`Connection`] is an explicitly constructed protocol instance; there
//! is no global state, so an opener and its secondary windows can each run
//! their own.

pub mod capability;
pub mod child;
pub mod config;
pub mod connection;
pub mod error;
pub mod lifecycle;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use capability::{Admission, Capability};
pub use child::{
	AUTHENTICATE_FAILURE_FUNC, AUTHENTICATE_SUCCESS_FUNC, ChannelWindow, ChildHandle, ChildOutcome, ChildWindow,
	OpenedWindow, WindowOpener,
};
pub use config::{BridgeConfig, BridgeConfigBuilder, CLIENT_SDK_VERSION};
pub use connection::{
	Connection, EventHandlerFn, Handshake, HandlerId, PendingCall, Resolver, Subscription, split_error_first,
};
pub use error::{Error, Result};
pub use lifecycle::{BridgeState, HostInfo};
pub use transport::{
	ChannelEndpoint, ChannelTransport, MAX_FRAME_LEN, PipeTransport, PipeTransportReceiver, PipeTransportSender, Transport,
	TransportParts, TransportReceiver,
};
