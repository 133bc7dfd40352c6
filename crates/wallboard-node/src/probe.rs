//! Peer transport and the status probe.
//!
//! All peer-to-peer traffic is a bounded-timeout request/response exchange
//! over a fresh TCP connection. A timeout is indistinguishable from the
//! peer being down; both surface as [`ProbeOutcome::Unreachable`] and are
//! never fatal to the caller.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use wallboard_core::{NodeStatus, Request, Response, Result, WallboardError};

use crate::state::Node;

// ----------------------------------------------------------------------------
// Peer Transport
// ----------------------------------------------------------------------------

/// One request/response round trip with a peer. The trait seam lets unit
/// tests drive the session and replication engines with scripted peers.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn exchange(&self, addr: &str, request: &Request) -> Result<Response>;
}

/// The real transport: one JSON line out, one JSON line back, all under a
/// single deadline covering connect, write, and read.
pub struct TcpTransport {
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn exchange(&self, addr: &str, request: &Request) -> Result<Response> {
        let round_trip = async {
            let mut stream = TcpStream::connect(addr).await?;
            let mut line = serde_json::to_string(request)?;
            line.push('\n');
            stream.write_all(line.as_bytes()).await?;

            let mut reader = BufReader::new(stream);
            let mut reply = String::new();
            reader.read_line(&mut reply).await?;
            Ok(serde_json::from_str(&reply)?)
        };

        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| WallboardError::peer_unreachable(addr))?
    }
}

// ----------------------------------------------------------------------------
// Status Probe
// ----------------------------------------------------------------------------

/// Result of probing a peer's status.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    Status(NodeStatus),
    Unreachable,
}

impl Node {
    /// Query a peer's liveness/session/offline-simulation state. Any
    /// failure — connect error, timeout, malformed or error reply — is
    /// reported as `Unreachable`.
    pub(crate) async fn probe(&self, addr: &str) -> ProbeOutcome {
        match self.transport.exchange(addr, &Request::CheckStatus).await {
            Ok(response) if response.is_success() => match response.node_status(addr) {
                Some(status) => ProbeOutcome::Status(status),
                None => ProbeOutcome::Unreachable,
            },
            Ok(_) => ProbeOutcome::Unreachable,
            Err(err) => {
                debug!(peer = %addr, error = %err, "peer probe failed");
                ProbeOutcome::Unreachable
            }
        }
    }

    /// The cluster as visible from here: this node's status plus the
    /// status of every reachable peer.
    pub async fn active_nodes(&self) -> Vec<NodeStatus> {
        let mut nodes = vec![self.status().await];
        for addr in self.config().peers.iter() {
            if let ProbeOutcome::Status(status) = self.probe(addr).await {
                nodes.push(status);
            }
        }
        nodes
    }
}
