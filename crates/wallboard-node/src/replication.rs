//! Replication engine: fire-and-forget push of new posts to peers.
//!
//! A post is appended locally first and always retained, whatever happens
//! to the fan-out. There is no retry queue and no durable outbox; a peer
//! missed here receives the message later through reconciliation, when it
//! reconnects and pulls the full set.

use tracing::{debug, info};

use wallboard_core::{
    AuthError, DeliveryReport, Message, Recipient, Request, Result, StateError, Visibility,
};

use crate::probe::ProbeOutcome;
use crate::state::Node;

impl Node {
    /// Accept a post and replicate it. Preconditions are checked in
    /// order, first failure wins: active, not simulating offline, valid
    /// token.
    pub async fn post(
        &self,
        token: &str,
        content: &str,
        visibility: Visibility,
    ) -> Result<DeliveryReport> {
        let message = {
            let mut state = self.state.lock().await;
            if !state.active {
                return Err(StateError::NodeInactive.into());
            }
            if state.simulate_offline {
                return Err(StateError::NodeOffline.into());
            }
            let author = state
                .credentials
                .validate(token)
                .ok_or(AuthError::InvalidToken)?
                .to_string();

            let message = Message::new(author, content, visibility);
            // Fresh id, so this always inserts.
            state.wall.append(message.clone());
            message
        };
        info!(
            author = %message.author,
            id = %message.id,
            "message accepted"
        );

        Ok(self.replicate(&message).await)
    }

    /// Probe every peer, push to the ones that are active and online, and
    /// fold the per-peer outcomes into a delivery report.
    async fn replicate(&self, message: &Message) -> DeliveryReport {
        let mut online = Vec::new();
        let mut offline = Vec::new();
        for addr in self.config().peers.iter() {
            match self.probe(addr).await {
                ProbeOutcome::Status(status) if status.accepts_replication() => {
                    online.push(status)
                }
                ProbeOutcome::Status(status) if status.simulate_offline => {
                    offline.push(Recipient::from(status))
                }
                ProbeOutcome::Status(status) => {
                    debug!(peer = %status.node_id, "peer inactive, skipped");
                }
                ProbeOutcome::Unreachable => {
                    debug!(peer = %addr, "peer unreachable during replication");
                }
            }
        }

        let push = Request::Sync {
            messages: vec![message.clone()],
        };
        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for peer in online {
            match self.transport.exchange(&peer.addr, &push).await {
                Ok(response) if response.is_success() => delivered.push(Recipient::from(peer)),
                _ => failed.push(Recipient::from(peer)),
            }
        }

        let report = DeliveryReport::classify(delivered, failed, offline);
        info!(id = %message.id, report = %report, "replication finished");
        report
    }

    /// Apply a push from a peer. Unavailable nodes (inactive or simulating
    /// offline) refuse replication traffic. Returns the number of messages
    /// that were new here.
    pub async fn sync_in(&self, messages: Vec<Message>) -> Result<usize> {
        let mut state = self.state.lock().await;
        if !state.active || state.simulate_offline {
            return Err(StateError::NodeUnavailable.into());
        }

        let mut inserted = 0;
        for message in messages {
            if state.wall.append(message) {
                inserted += 1;
            }
        }
        if inserted > 0 {
            info!(count = inserted, "sync applied");
        }
        Ok(inserted)
    }
}
