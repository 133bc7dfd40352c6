//! Node configuration.
//!
//! The peer set is static configuration, known at startup and never
//! mutated at runtime; cluster state is re-derived by probing on every
//! operation rather than through a membership service.

use std::time::Duration;

/// Default bound on every peer round trip (probe, push, full-sync pull).
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(2);

// ----------------------------------------------------------------------------
// Peer Directory
// ----------------------------------------------------------------------------

/// Immutable list of peer addresses, injected into the session manager and
/// the replication engine.
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    addrs: Vec<String>,
}

impl PeerDirectory {
    pub fn new(addrs: Vec<String>) -> Self {
        Self { addrs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addrs.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl FromIterator<String> for PeerDirectory {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ----------------------------------------------------------------------------
// Node Configuration
// ----------------------------------------------------------------------------

/// Static identity and wiring of a single node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: String,
    pub listen_addr: String,
    pub peers: PeerDirectory,
    pub peer_timeout: Duration,
}

impl NodeConfig {
    pub fn new(
        node_id: impl Into<String>,
        listen_addr: impl Into<String>,
        peers: PeerDirectory,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            listen_addr: listen_addr.into(),
            peers,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }

    pub fn with_peer_timeout(mut self, peer_timeout: Duration) -> Self {
        self.peer_timeout = peer_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_preserves_order_and_length() {
        let peers: PeerDirectory = ["127.0.0.1:8002", "127.0.0.1:8003"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(peers.len(), 2);
        assert_eq!(
            peers.iter().collect::<Vec<_>>(),
            vec!["127.0.0.1:8002", "127.0.0.1:8003"]
        );
    }

    #[test]
    fn config_defaults_to_two_second_peer_timeout() {
        let config = NodeConfig::new("node1", "127.0.0.1:8001", PeerDirectory::default());
        assert_eq!(config.peer_timeout, DEFAULT_PEER_TIMEOUT);
    }
}
