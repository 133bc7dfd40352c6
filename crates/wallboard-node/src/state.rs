//! Per-node state and the node handle.
//!
//! Everything a request handler mutates — the activity flags, the current
//! session, the wall — lives behind one async mutex, so concurrent
//! requests on a node serialize instead of racing. Peer round trips are
//! never made while the lock is held.

use std::sync::Arc;

use tokio::sync::Mutex;

use wallboard_core::{CredentialStore, Message, NodeConfig, NodeStatus, Wall};

use crate::probe::{PeerTransport, TcpTransport};

/// Mutable node state, guarded by [`Node::state`].
#[derive(Debug)]
pub struct NodeState {
    /// True only while exactly one user is logged in on this node.
    pub active: bool,
    pub current_user: Option<String>,
    /// Refuse to originate or accept posts/replication traffic, while
    /// still answering liveness probes truthfully.
    pub simulate_offline: bool,
    /// Set when offline simulation is enabled; cleared by a completed
    /// reconciliation sweep.
    pub needs_catch_up: bool,
    pub wall: Wall,
    pub credentials: CredentialStore,
}

impl NodeState {
    fn new(credentials: CredentialStore) -> Self {
        Self {
            active: false,
            current_user: None,
            simulate_offline: false,
            needs_catch_up: false,
            wall: Wall::new(),
            credentials,
        }
    }
}

/// Handle to a running node, shared across connection tasks.
pub struct Node {
    config: NodeConfig,
    pub(crate) state: Mutex<NodeState>,
    pub(crate) transport: Arc<dyn PeerTransport>,
}

impl Node {
    /// Create a node with the seeded user table and the real TCP peer
    /// transport.
    pub fn new(config: NodeConfig) -> Arc<Self> {
        let transport = Arc::new(TcpTransport::new(config.peer_timeout));
        Self::with_parts(config, CredentialStore::with_seed_users(), transport)
    }

    /// Create a node with explicit credentials and transport. Tests use
    /// this to script peer behavior without sockets.
    pub fn with_parts(
        config: NodeConfig,
        credentials: CredentialStore,
        transport: Arc<dyn PeerTransport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(NodeState::new(credentials)),
            transport,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Snapshot of the node's liveness/session/offline-simulation state.
    /// Answered truthfully even while simulating offline, so peers can
    /// tell "down" apart from "simulating failure".
    pub async fn status(&self) -> NodeStatus {
        let state = self.state.lock().await;
        NodeStatus {
            node_id: self.config.node_id.clone(),
            addr: self.config.listen_addr.clone(),
            active: state.active,
            user: state.current_user.clone(),
            simulate_offline: state.simulate_offline,
        }
    }

    /// The local wall in display order, filtered unless the reader is
    /// authenticated or the caller (a reconciliation pull) asked for the
    /// full set.
    pub async fn messages(&self, token: Option<&str>, include_private: bool) -> Vec<Message> {
        let state = self.state.lock().await;
        let authenticated = token
            .map(|t| state.credentials.validate(t).is_some())
            .unwrap_or(false);
        state.wall.list(authenticated || include_private)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("node_id", &self.config.node_id)
            .field("listen_addr", &self.config.listen_addr)
            .finish_non_exhaustive()
    }
}
