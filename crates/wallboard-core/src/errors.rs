//! Error types for the wallboard cluster.
//!
//! Specific error enums cover each failure category; `WallboardError`
//! unifies them for the request/response boundary. Every error is returned
//! to the caller as a structured response, never propagated across the
//! network, and no error category terminates the node process.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Credential and token failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
}

/// The node is not in a state that permits the requested action.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("node is inactive")]
    NodeInactive,
    #[error("send failed, node connection was lost")]
    NodeOffline,
    #[error("node unavailable")]
    NodeUnavailable,
}

/// Exclusive-login conflicts, local or cluster-wide.
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("user {username} is already logged in on this node")]
    AlreadyLoggedInHere { username: String },
    #[error("user {username} is already logged in on node {node_id}")]
    LoggedInElsewhere { username: String, node_id: String },
}

/// Requests that cannot be understood.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed request: {reason}")]
    Malformed { reason: String },
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WallboardError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout or connection failure talking to a peer. Non-fatal by
    /// contract: callers fold it into probe outcomes and delivery reports.
    #[error("peer {addr} unreachable")]
    PeerUnreachable { addr: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl WallboardError {
    /// Create a malformed-request error with a reason.
    pub fn malformed<T: Into<String>>(reason: T) -> Self {
        WallboardError::Protocol(ProtocolError::Malformed {
            reason: reason.into(),
        })
    }

    /// Create a peer-unreachable error for the given address.
    pub fn peer_unreachable<T: Into<String>>(addr: T) -> Self {
        WallboardError::PeerUnreachable { addr: addr.into() }
    }

    /// Create a cluster-wide login conflict naming the holding node.
    pub fn logged_in_elsewhere<U: Into<String>, N: Into<String>>(username: U, node_id: N) -> Self {
        WallboardError::Conflict(ConflictError::LoggedInElsewhere {
            username: username.into(),
            node_id: node_id.into(),
        })
    }

    /// Create a same-node duplicate login conflict.
    pub fn already_logged_in_here<U: Into<String>>(username: U) -> Self {
        WallboardError::Conflict(ConflictError::AlreadyLoggedInHere {
            username: username.into(),
        })
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, WallboardError>;
