//! Wire types for the host bridge protocol.
//!
//! This crate contains the serde-serializable types exchanged between an
//! embedded application and its host over the cross-boundary channel. These
//! types represent the "protocol layer" - the shapes of data as they appear
//! on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization and
//!   trivial conversions
//! - **1:1 with the wire**: Field names and enum spellings match what hosts
//!   send and expect
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Correlation, lifecycle, and gating are built on top of these types in
//! `hostbridge-runtime`.

pub mod dialog;
pub mod envelope;
pub mod location;
pub mod sdk_error;
pub mod settings;
pub mod types;
pub mod version;

pub use dialog::*;
pub use envelope::*;
pub use location::*;
pub use sdk_error::*;
pub use settings::*;
pub use types::*;
pub use version::*;
