//! The two translation directions.
//!
//! [`InboundBridge`] turns platform message events into engine envelopes;
//! [`OutboundBridge`] turns engine envelopes into platform sends. Both are
//! fire-and-forget: failures are logged and the event is dropped.

pub mod inbound;
pub mod outbound;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    inbound::{InboundBridge, permission_level},
    outbound::{Dispatch, OutboundBridge, plan},
};
