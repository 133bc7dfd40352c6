//! Wire protocol: line-oriented JSON request/response over TCP.
//!
//! One request per connection. Every request carries an `action` tag plus
//! action-specific fields; every response carries `status: success|error`
//! plus a `message` on error or the action payload on success.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::{Message, Visibility};

// ----------------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------------

/// The full action vocabulary a node consumes, from clients and peers alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Login {
        username: String,
        password: String,
    },
    Logout {
        token: String,
    },
    PostMessage {
        token: String,
        content: String,
        #[serde(default)]
        visibility: Visibility,
    },
    GetMessages {
        #[serde(default)]
        token: Option<String>,
        /// Set by the reconciliation pull, which needs the full message
        /// set; ordinary readers gain private visibility through a valid
        /// token instead.
        #[serde(default)]
        include_private: bool,
    },
    CheckStatus,
    GetActiveNodes,
    /// Push-replication payload carrying newly posted messages.
    Sync {
        messages: Vec<Message>,
    },
    ToggleOffline,
}

// ----------------------------------------------------------------------------
// Node Status
// ----------------------------------------------------------------------------

/// A node's liveness/session/offline-simulation snapshot, as answered to
/// `check_status` probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub addr: String,
    pub active: bool,
    pub user: Option<String>,
    pub simulate_offline: bool,
}

impl NodeStatus {
    /// True if the node would accept replication traffic right now.
    pub fn accepts_replication(&self) -> bool {
        self.active && !self.simulate_offline
    }
}

// ----------------------------------------------------------------------------
// Delivery Reports
// ----------------------------------------------------------------------------

/// A peer named in a delivery report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub node_id: String,
    pub addr: String,
    pub user: Option<String>,
}

impl From<NodeStatus> for Recipient {
    fn from(status: NodeStatus) -> Self {
        Self {
            node_id: status.node_id,
            addr: status.addr,
            user: status.user,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{}({})", user, self.node_id),
            None => write!(f, "{}", self.node_id),
        }
    }
}

/// Outcome of a replication fan-out, classified per recipient.
///
/// The message is always retained locally regardless of the outcome; a
/// peer missed here can only receive it later through reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryReport {
    /// No peer was reachable and online, and none was simulating offline.
    NoRecipients,
    /// No peer was reachable and online, but some were simulating offline.
    OfflineRecipients { offline: Vec<Recipient> },
    /// Every reachable-and-online peer acknowledged the push.
    DeliveredToAll { delivered: Vec<Recipient> },
    /// Some pushes succeeded, some failed.
    PartiallyDelivered {
        delivered: Vec<Recipient>,
        failed: Vec<Recipient>,
    },
    /// Every push to a reachable-and-online peer failed.
    DeliveryFailed { failed: Vec<Recipient> },
}

impl DeliveryReport {
    /// Fold per-peer outcomes into a report. `delivered` and `failed`
    /// partition the reachable-and-online peers; `offline` holds reachable
    /// peers that were inactive or simulating offline.
    pub fn classify(
        delivered: Vec<Recipient>,
        failed: Vec<Recipient>,
        offline: Vec<Recipient>,
    ) -> Self {
        match (delivered.is_empty(), failed.is_empty()) {
            (true, true) if offline.is_empty() => Self::NoRecipients,
            (true, true) => Self::OfflineRecipients { offline },
            (false, true) => Self::DeliveredToAll { delivered },
            (true, false) => Self::DeliveryFailed { failed },
            (false, false) => Self::PartiallyDelivered { delivered, failed },
        }
    }
}

fn join(recipients: &[Recipient]) -> String {
    recipients
        .iter()
        .map(Recipient::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecipients => {
                write!(f, "message stored locally, no recipients found")
            }
            Self::OfflineRecipients { offline } => {
                write!(
                    f,
                    "message stored locally, recipients offline: {}",
                    join(offline)
                )
            }
            Self::DeliveredToAll { delivered } => {
                write!(f, "message delivered to all: {}", join(delivered))
            }
            Self::PartiallyDelivered { delivered, failed } => {
                write!(
                    f,
                    "message partially delivered, received by {}; failed for {}",
                    join(delivered),
                    join(failed)
                )
            }
            Self::DeliveryFailed { .. } => {
                write!(f, "message delivery failed to every reachable node")
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Responses
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Response envelope. `status` is always present; payload fields are
/// action-specific and omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_report: Option<DeliveryReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate_offline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovered: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeStatus>>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            token: None,
            username: None,
            node_id: None,
            messages: None,
            delivery_report: None,
            active: None,
            user: None,
            simulate_offline: None,
            recovered: None,
            nodes: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut response = Self::ok();
        response.status = ResponseStatus::Error;
        response.message = Some(message.into());
        response
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_delivery_report(mut self, report: DeliveryReport) -> Self {
        self.delivery_report = Some(report);
        self
    }

    pub fn with_recovered(mut self, recovered: usize) -> Self {
        self.recovered = Some(recovered);
        self
    }

    pub fn with_simulate_offline(mut self, simulate_offline: bool) -> Self {
        self.simulate_offline = Some(simulate_offline);
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeStatus>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Flatten a status snapshot into the envelope, as `check_status`
    /// answers it.
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.node_id = Some(status.node_id);
        self.active = Some(status.active);
        self.user = status.user;
        self.simulate_offline = Some(status.simulate_offline);
        self
    }

    /// Reassemble a status snapshot from a `check_status` answer.
    ///
    /// `dialed` is the address the probe reached the peer at, which is how
    /// later pushes will address it.
    pub fn node_status(&self, dialed: &str) -> Option<NodeStatus> {
        Some(NodeStatus {
            node_id: self.node_id.clone()?,
            addr: dialed.to_string(),
            active: self.active?,
            user: self.user.clone(),
            simulate_offline: self.simulate_offline?,
        })
    }
}

impl From<crate::errors::WallboardError> for Response {
    fn from(err: crate::errors::WallboardError) -> Self {
        Response::error(err.to_string())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
