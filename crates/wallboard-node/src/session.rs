//! Session manager: single-active-session-per-user across the cluster.
//!
//! The exclusivity check is advisory. Peers are probed before granting a
//! local login, but unreachable peers are silently skipped, and the peer
//! scan runs without the node lock held — two simultaneous logins on two
//! nodes can both succeed. That is the documented weak guarantee, not a
//! defect to fix with invented synchronization.

use std::sync::Arc;

use tracing::{info, warn};

use wallboard_core::{AuthError, Result, WallboardError};

use crate::probe::ProbeOutcome;
use crate::state::Node;

/// What a successful login hands back to the client.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: String,
    pub username: String,
    pub node_id: String,
}

impl Node {
    pub async fn login(self: &Arc<Self>, username: &str, password: &str) -> Result<LoginGrant> {
        {
            let state = self.state.lock().await;
            if state.current_user.as_deref() == Some(username) {
                return Err(WallboardError::already_logged_in_here(username));
            }
        }

        for addr in self.config().peers.iter() {
            if let ProbeOutcome::Status(status) = self.probe(addr).await {
                if status.active && status.user.as_deref() == Some(username) {
                    warn!(
                        username,
                        node = %status.node_id,
                        "login rejected, user already active elsewhere"
                    );
                    return Err(WallboardError::logged_in_elsewhere(username, status.node_id));
                }
            }
        }

        let (token, catch_up_pending) = {
            let mut state = self.state.lock().await;
            let token = state.credentials.authenticate(username, password)?;
            state.active = true;
            state.current_user = Some(username.to_string());
            (token, state.needs_catch_up && !state.simulate_offline)
        };
        info!(username, "login granted");

        // Reactivating after an offline stretch: heal missed replication
        // in the background.
        if catch_up_pending {
            let node = Arc::clone(self);
            tokio::spawn(async move {
                node.catch_up().await;
            });
        }

        Ok(LoginGrant {
            token,
            username: username.to_string(),
            node_id: self.node_id().to_string(),
        })
    }

    /// Invalidate the session and deactivate the node, regardless of
    /// replication state. Returns the username that was logged out.
    pub async fn logout(&self, token: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        let username = state
            .credentials
            .validate(token)
            .map(str::to_string)
            .ok_or(AuthError::InvalidToken)?;
        state.credentials.revoke(token);
        state.active = false;
        state.current_user = None;
        info!(username, "logout");
        Ok(username)
    }
}
