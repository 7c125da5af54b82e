//! Connection lifecycle for the remote automation engine.
//!
//! [`ConnectionManager`] owns exactly one socket at a time, tracks
//! [`ConnectionState`], and reconnects on a fixed interval according to
//! [`ReconnectPolicy`]. The socket itself sits behind the [`Transport`]
//! trait so the state machine can be driven without a network.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    config::{ConnectionConfig, ReconnectPolicy},
    endpoint::{derive_socket_url, display_url},
    error::{Error, Result},
    manager::{ConnectionEvent, ConnectionManager, ConnectionState, Upstream},
    transport::{Transport, TransportEvent, TransportLink, WsTransport},
};
