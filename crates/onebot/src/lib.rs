//! OneBot v11 client over a forward WebSocket.
//!
//! One socket carries both directions: pushed events (of which only
//! `post_type = "message"` is forwarded) and action calls correlated by
//! `echo`. The client reconnects on its own at a fixed interval.

pub mod client;
pub mod error;
pub mod frame;

pub use {
    client::OneBotClient,
    error::{Error, Result},
    frame::{ActionRequest, ActionResponse, Inbound, classify, numeric_id},
};
