//! Wallboard node runtime.
//!
//! A node owns its wall and session state behind a single mutex, serves
//! the wire protocol over TCP with one task per connection, and talks to
//! its peers through short-timeout synchronous round trips: `check_status`
//! probes, `sync` pushes, and full `get_messages` pulls on reconnection.

pub mod probe;
pub mod reconcile;
pub mod replication;
pub mod server;
pub mod session;
pub mod state;

pub use probe::{PeerTransport, ProbeOutcome, TcpTransport};
pub use server::NodeServer;
pub use session::LoginGrant;
pub use state::Node;
