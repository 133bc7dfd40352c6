//! Reconciliation engine: pull-based anti-entropy after simulated offline.
//!
//! This is the only mechanism that heals missed replication. Each
//! reachable peer is asked for its full message list; everything new is
//! appended, deduplicated by id, and the insert count is reported to the
//! operator.

use std::sync::Arc;

use tracing::{debug, info};

use wallboard_core::Request;

use crate::probe::ProbeOutcome;
use crate::state::Node;

impl Node {
    /// Sweep all reachable peers for messages missed while offline.
    /// Returns the number of messages recovered.
    pub async fn catch_up(&self) -> usize {
        let pull = Request::GetMessages {
            token: None,
            include_private: true,
        };

        let mut recovered = 0;
        for addr in self.config().peers.iter() {
            if matches!(self.probe(addr).await, ProbeOutcome::Unreachable) {
                continue;
            }
            let messages = match self.transport.exchange(addr, &pull).await {
                Ok(response) if response.is_success() => response.messages.unwrap_or_default(),
                _ => {
                    debug!(peer = %addr, "full-sync pull failed");
                    continue;
                }
            };

            let mut state = self.state.lock().await;
            for message in messages {
                if state.wall.append(message) {
                    recovered += 1;
                }
            }
        }

        self.state.lock().await.needs_catch_up = false;
        if recovered > 0 {
            info!(recovered, "recovered messages after reconnect");
        }
        recovered
    }

    /// Flip the simulated-failure flag. Going offline marks a catch-up as
    /// pending; coming back online while active runs it immediately and
    /// returns the recovery count.
    pub async fn toggle_offline(self: &Arc<Self>) -> (bool, Option<usize>) {
        let (now_offline, sweep_now) = {
            let mut state = self.state.lock().await;
            state.simulate_offline = !state.simulate_offline;
            if state.simulate_offline {
                state.needs_catch_up = true;
                (true, false)
            } else {
                (false, state.active)
            }
        };

        if now_offline {
            info!("offline simulation enabled");
            (true, None)
        } else {
            info!("offline simulation disabled");
            if sweep_now {
                let recovered = self.catch_up().await;
                (false, Some(recovered))
            } else {
                (false, None)
            }
        }
    }
}
