//! Platform Protocol (OneBot v11-shaped) types and the action interface the
//! bridge uses to talk back to the chat platform.
//!
//! The bridge never owns the platform connection. Whatever hosts it (the
//! OneBot client in `corelink-onebot`, or a test double) implements
//! [`PlatformActions`] and feeds [`MessageEvent`]s in.

pub mod actions;
pub mod error;
pub mod event;
pub mod segment;

pub use {
    actions::PlatformActions,
    error::{Error, Result},
    event::{MessageBody, MessageEvent, MessageRecord, MessageType, PlatformId, Role, Sender},
    segment::Segment,
};
