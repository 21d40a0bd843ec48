//! # shadow-core
//!
//! Foundation types and pure logic shared by every Shadow RPC crate:
//!
//! - **Model**: [`PresenceUpdate`], [`Link`], [`TimeRange`]
//! - **Normalization**: [`normalize`] turns a raw `/update_rpc` body into a
//!   validated [`PresenceUpdate`]
//! - **Errors**: [`ValidationError`], [`TransmissionError`], [`DispatchError`]
//! - **Seams**: [`PresenceSink`] (the broadcasting client) and [`LogSink`]
//!   (the user-visible log), both injected rather than looked up globally
//! - **Dispatch**: [`Dispatcher`] glues normalization to a sink

#![deny(unsafe_code)]

pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod normalize;
pub mod presence;
pub mod sink;

pub use dispatch::Dispatcher;
pub use errors::{DispatchError, TransmissionError, ValidationError};
pub use normalize::{normalize, normalize_at};
pub use presence::{Link, PresenceUpdate, TimeRange};
pub use sink::{LogSink, NullLogSink, PresenceSink, SerializedSink, TracingPresenceSink};
