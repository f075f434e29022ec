//! # rtvi-client
//!
//! Client side of an RTVI voice-bot session:
//!
//! - **Controller**: [`client::RtviClient`] drives connect/disconnect and
//!   routes inbound messages
//! - **Dispatcher**: [`dispatcher::MessageDispatcher`] correlates requests
//!   with responses and expires stale ones
//! - **Events**: [`hub::EventHub`] delivers to constructor callbacks, then
//!   listeners
//! - **Transport seam**: [`transport::Transport`], with
//!   [`stub::StubTransport`] for tests and demos
//! - **Credentials**: [`credentials`] fetches connection params over HTTP
//!   before connecting
//!
//! ## Crate Position
//!
//! Top of the stack. Depends on `rtvi-core` and `rtvi-settings`.

#![deny(unsafe_code)]

pub mod about;
pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod function_calls;
pub mod hub;
pub mod stub;
pub mod transport;

pub use client::{RtviClient, RtviClientOptions, protocol_version_supported};
pub use credentials::{ConnectParams, ConnectionEndpoint};
pub use dispatcher::{MessageDispatcher, PendingResponse};
pub use function_calls::{FunctionCallCallback, FunctionCallParams};
pub use hub::{EventHub, ListenerId, RtviClientCallbacks};
pub use stub::StubTransport;
pub use transport::{Transport, TransportHandle, TransportOptions, TransportSink};
