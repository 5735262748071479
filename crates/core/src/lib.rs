//! Typed capability wrappers over the host bridge runtime.
//!
//! An application embedded in a host client builds one [`Connection`], wraps
//! it in an [`App`], and calls into the capability modules:
//!
//! - [`dialog`]: open, resize, and submit dialogs
//! - [`app_window`]: messages between a dialog and its opener
//! - [`tasks`]: the deprecated task-module API, translated onto [`dialog`]
//! - [`location`]: get and show a geographic location
//! - [`settings`]: page configuration and the save/remove handshake
//! - [`authentication`]: sign-in windows and host-issued tokens
//!
//! Every wrapper goes through the runtime's capability gate, so calls from
//! the wrong frame context or against an outdated host fail before anything
//! reaches the host.

pub mod app;
pub mod app_window;
pub mod authentication;
pub mod dialog;
pub mod location;
pub mod settings;
pub mod tasks;

use serde_json::Value;

pub use app::App;
pub use app_window::{ChildAppWindow, ParentAppWindow};
pub use hostbridge_protocol::{
	AppIds, DialogDimension, DialogInfo, DialogSize, Dimension, ErrorCode, FrameContext, HostClientType, HostVersion,
	InstanceConfig, LifecycleState, Location, LocationProps, SaveParameters, SdkError, TaskDimension, TaskInfo,
	TaskModuleDimension,
};
pub use hostbridge_runtime::{
	BridgeConfig, BridgeState, Capability, ChildOutcome, Connection, Error, HostInfo, Result, Subscription,
};
pub use settings::{RemoveEvent, SaveEvent, Settings};

/// First element of a response argument list, or `null` when there is none.
pub(crate) fn first_arg(args: Vec<Value>) -> Value {
	args.into_iter().next().unwrap_or(Value::Null)
}

/// Interprets the `[success, detail]` responses some host functions use
/// instead of error-first.
pub(crate) fn status_result(args: Vec<Value>) -> Result<Value> {
	let mut args = args.into_iter();
	let success = args.next().and_then(|v| v.as_bool()).unwrap_or(false);
	let detail = args.next().unwrap_or(Value::Null);
	if success { Ok(detail) } else { Err(Error::HostRejected(detail)) }
}
