//! # rtvi-core
//!
//! Shared vocabulary of the RTVI client SDK:
//!
//! - **Envelope**: [`messages::Message`] with its [`messages::MessageType`] tag
//! - **Payloads**: typed `data` bodies in [`payloads`]
//! - **State**: [`state::TransportState`], the lifecycle the transport advances
//! - **Events**: [`events::Event`] catalog and its [`events::EventKind`] tags
//! - **Errors**: [`errors::RtviError`] via `thiserror`
//! - **IDs**: [`ids::MessageId`] correlation tokens
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `rtvi-client` and `rtvi-settings`.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod media;
pub mod messages;
pub mod payloads;
pub mod state;

pub use errors::RtviError;
pub use events::{Event, EventKind};
pub use ids::MessageId;
pub use messages::{Message, MessageType, RTVI_MESSAGE_LABEL, RTVI_PROTOCOL_VERSION};
pub use state::TransportState;
