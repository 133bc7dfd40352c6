//! Core domain types for the wallboard cluster.
//!
//! This crate holds everything the node runtime and the client share:
//! the message model and the per-node wall, the credential store, the
//! line-oriented JSON wire protocol, delivery reports, and the error
//! taxonomy. It performs no network I/O; the runtime lives in
//! `wallboard-node`.

pub mod auth;
pub mod config;
pub mod errors;
pub mod message;
pub mod protocol;
pub mod wall;

pub use auth::CredentialStore;
pub use config::{NodeConfig, PeerDirectory, DEFAULT_PEER_TIMEOUT};
pub use errors::{
    AuthError, ConflictError, ProtocolError, Result, StateError, WallboardError,
};
pub use message::{Message, MessageId, Visibility};
pub use protocol::{DeliveryReport, NodeStatus, Recipient, Request, Response, ResponseStatus};
pub use wall::Wall;
