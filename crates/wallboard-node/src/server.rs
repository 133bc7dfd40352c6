//! TCP request router.
//!
//! One JSON line in, one JSON line out, one request per connection, one
//! task per connection. Errors become structured error responses; only a
//! request that cannot be parsed gets the generic malformed-request reply,
//! and nothing here terminates the node process.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use wallboard_core::{Request, Response, Result, WallboardError};

use crate::state::Node;

pub struct NodeServer {
    node: Arc<Node>,
    listener: TcpListener,
}

impl NodeServer {
    /// Bind the listener named in the node's configuration.
    pub async fn bind(node: Arc<Node>) -> io::Result<Self> {
        let listener = TcpListener::bind(&node.config().listen_addr).await?;
        Ok(Self { node, listener })
    }

    /// Serve on an already-bound listener. Tests bind on port 0 first and
    /// wire the resulting addresses into each node's peer directory.
    pub fn new(node: Arc<Node>, listener: TcpListener) -> Self {
        Self { node, listener }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the task is dropped.
    pub async fn run(self) -> io::Result<()> {
        info!(
            node = self.node.node_id(),
            addr = %self.listener.local_addr()?,
            "node listening"
        );
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let node = Arc::clone(&self.node);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(node, stream).await {
                            warn!(peer = %peer, error = %err, "connection closed with error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            }
        }
    }
}

async fn handle_connection(node: Arc<Node>, stream: TcpStream) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response = match serde_json::from_str::<Request>(&line) {
        Ok(request) => dispatch(&node, request).await,
        Err(err) => Response::from(WallboardError::malformed(err.to_string())),
    };

    let mut reply = serde_json::to_string(&response)?;
    reply.push('\n');
    write_half.write_all(reply.as_bytes()).await?;
    Ok(())
}

/// Route a parsed request to the owning engine and fold the outcome into
/// a response envelope.
pub async fn dispatch(node: &Arc<Node>, request: Request) -> Response {
    match request {
        Request::Login { username, password } => {
            match node.login(&username, &password).await {
                Ok(grant) => Response::ok()
                    .with_token(grant.token)
                    .with_username(grant.username)
                    .with_node_id(grant.node_id),
                Err(err) => err.into(),
            }
        }
        Request::Logout { token } => match node.logout(&token).await {
            Ok(username) => Response::ok().with_message(format!("{username} logged out")),
            Err(err) => err.into(),
        },
        Request::PostMessage {
            token,
            content,
            visibility,
        } => match node.post(&token, &content, visibility).await {
            Ok(report) => {
                let summary = report.to_string();
                Response::ok()
                    .with_message(summary)
                    .with_delivery_report(report)
            }
            Err(err) => err.into(),
        },
        Request::GetMessages {
            token,
            include_private,
        } => {
            let messages = node.messages(token.as_deref(), include_private).await;
            Response::ok()
                .with_messages(messages)
                .with_node_id(node.node_id())
        }
        Request::CheckStatus => Response::ok().with_status(node.status().await),
        Request::GetActiveNodes => Response::ok().with_nodes(node.active_nodes().await),
        Request::Sync { messages } => match node.sync_in(messages).await {
            Ok(_) => Response::ok(),
            Err(err) => err.into(),
        },
        Request::ToggleOffline => {
            let (simulate_offline, recovered) = node.toggle_offline().await;
            let mut response = Response::ok()
                .with_simulate_offline(simulate_offline)
                .with_message(if simulate_offline {
                    "offline simulation enabled"
                } else {
                    "offline simulation disabled"
                });
            if let Some(recovered) = recovered {
                response = response.with_recovered(recovered);
            }
            response
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use wallboard_core::{
        ConflictError, CredentialStore, DeliveryReport, Message, NodeConfig, NodeStatus,
        PeerDirectory, StateError, Visibility,
    };

    use crate::probe::PeerTransport;

    /// Scripted behavior for one peer address.
    #[derive(Default, Clone)]
    struct ScriptedPeer {
        /// `None` means the peer is unreachable.
        status: Option<NodeStatus>,
        sync_ok: bool,
        messages: Vec<Message>,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        peers: HashMap<String, ScriptedPeer>,
    }

    #[async_trait]
    impl PeerTransport for ScriptedTransport {
        async fn exchange(&self, addr: &str, request: &Request) -> Result<Response> {
            let peer = self
                .peers
                .get(addr)
                .ok_or_else(|| WallboardError::peer_unreachable(addr))?;
            let Some(status) = &peer.status else {
                return Err(WallboardError::peer_unreachable(addr));
            };
            Ok(match request {
                Request::CheckStatus => Response::ok().with_status(status.clone()),
                Request::Sync { .. } => {
                    if peer.sync_ok {
                        Response::ok()
                    } else {
                        Response::error("node unavailable")
                    }
                }
                Request::GetMessages { .. } => {
                    Response::ok().with_messages(peer.messages.clone())
                }
                _ => Response::error("unexpected request"),
            })
        }
    }

    fn peer_status(node_id: &str, addr: &str, active: bool, user: Option<&str>) -> NodeStatus {
        NodeStatus {
            node_id: node_id.to_string(),
            addr: addr.to_string(),
            active,
            user: user.map(str::to_string),
            simulate_offline: false,
        }
    }

    fn scripted_node(peers: Vec<(&str, ScriptedPeer)>) -> Arc<Node> {
        let directory: PeerDirectory = peers.iter().map(|(addr, _)| addr.to_string()).collect();
        let config = NodeConfig::new("node1", "127.0.0.1:8001", directory)
            .with_peer_timeout(Duration::from_millis(200));
        let transport = Arc::new(ScriptedTransport {
            peers: peers
                .into_iter()
                .map(|(addr, peer)| (addr.to_string(), peer))
                .collect(),
        });
        Node::with_parts(config, CredentialStore::with_seed_users(), transport)
    }

    async fn activate(node: &Arc<Node>, username: &str, password: &str) -> String {
        node.login(username, password).await.unwrap().token
    }

    #[tokio::test]
    async fn login_rejected_when_user_active_on_reachable_peer() {
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("admin"))),
                ..Default::default()
            },
        )]);

        let err = node.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(
            err,
            WallboardError::Conflict(ConflictError::LoggedInElsewhere { ref node_id, .. })
                if node_id == "node2"
        ));
    }

    #[tokio::test]
    async fn login_succeeds_when_conflicting_peer_is_unreachable() {
        // Advisory exclusivity: a partitioned peer holding the session
        // cannot veto the login.
        let node = scripted_node(vec![("127.0.0.1:8002", ScriptedPeer::default())]);
        let grant = node.login("admin", "admin123").await.unwrap();
        assert_eq!(grant.username, "admin");
        assert_eq!(grant.node_id, "node1");
    }

    #[tokio::test]
    async fn login_rejects_duplicate_on_same_node() {
        let node = scripted_node(vec![]);
        node.login("admin", "admin123").await.unwrap();
        let err = node.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(
            err,
            WallboardError::Conflict(ConflictError::AlreadyLoggedInHere { .. })
        ));
    }

    #[tokio::test]
    async fn logout_deactivates_the_node() {
        let node = scripted_node(vec![]);
        let token = activate(&node, "admin", "admin123").await;
        node.logout(&token).await.unwrap();

        let status = node.status().await;
        assert!(!status.active);
        assert_eq!(status.user, None);
        assert!(node.post(&token, "late", Visibility::Public).await.is_err());
    }

    #[tokio::test]
    async fn post_preconditions_check_in_order() {
        let node = scripted_node(vec![]);

        // Inactive node first, whatever the token.
        let err = node.post("bogus", "hi", Visibility::Public).await.unwrap_err();
        assert!(matches!(
            err,
            WallboardError::State(StateError::NodeInactive)
        ));

        let token = activate(&node, "admin", "admin123").await;

        node.toggle_offline().await;
        let err = node.post(&token, "hi", Visibility::Public).await.unwrap_err();
        assert!(matches!(err, WallboardError::State(StateError::NodeOffline)));
        node.toggle_offline().await;

        let err = node.post("bogus", "hi", Visibility::Public).await.unwrap_err();
        assert!(matches!(err, WallboardError::Auth(_)));
    }

    #[tokio::test]
    async fn post_delivers_to_online_peer() {
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("user1"))),
                sync_ok: true,
                ..Default::default()
            },
        )]);
        let token = activate(&node, "admin", "admin123").await;

        let report = node.post(&token, "hello", Visibility::Public).await.unwrap();
        match report {
            DeliveryReport::DeliveredToAll { delivered } => {
                assert_eq!(delivered.len(), 1);
                assert_eq!(delivered[0].node_id, "node2");
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_names_simulating_offline_peer() {
        let mut status = peer_status("node2", "127.0.0.1:8002", true, Some("user1"));
        status.simulate_offline = true;
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(status),
                ..Default::default()
            },
        )]);
        let token = activate(&node, "admin", "admin123").await;

        let report = node.post(&token, "hello", Visibility::Public).await.unwrap();
        match report {
            DeliveryReport::OfflineRecipients { offline } => {
                assert_eq!(offline[0].node_id, "node2");
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_with_only_inactive_peer_finds_no_recipients() {
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", false, None)),
                ..Default::default()
            },
        )]);
        let token = activate(&node, "admin", "admin123").await;

        let report = node.post(&token, "hello", Visibility::Public).await.unwrap();
        assert_eq!(report, DeliveryReport::NoRecipients);
        // The post itself is retained regardless.
        assert_eq!(node.messages(None, true).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_push_reports_delivery_failed() {
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("user1"))),
                sync_ok: false,
                ..Default::default()
            },
        )]);
        let token = activate(&node, "admin", "admin123").await;

        let report = node.post(&token, "hello", Visibility::Public).await.unwrap();
        assert!(matches!(report, DeliveryReport::DeliveryFailed { .. }));
    }

    #[tokio::test]
    async fn sync_in_is_refused_while_unavailable() {
        let node = scripted_node(vec![]);
        let message = Message::new("admin", "pushed", Visibility::Public);

        let err = node.sync_in(vec![message.clone()]).await.unwrap_err();
        assert!(matches!(
            err,
            WallboardError::State(StateError::NodeUnavailable)
        ));

        activate(&node, "user1", "password1").await;
        assert_eq!(node.sync_in(vec![message.clone()]).await.unwrap(), 1);
        // Duplicate push is absorbed.
        assert_eq!(node.sync_in(vec![message]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn catch_up_counts_only_new_messages() {
        let pulled = vec![
            Message::new("admin", "one", Visibility::Public),
            Message::new("admin", "two", Visibility::Private),
        ];
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("user1"))),
                messages: pulled,
                ..Default::default()
            },
        )]);

        assert_eq!(node.catch_up().await, 2);
        assert_eq!(node.catch_up().await, 0);
        assert_eq!(node.messages(None, true).await.len(), 2);
    }

    #[tokio::test]
    async fn toggle_offline_back_online_while_active_sweeps_immediately() {
        let pulled = vec![Message::new("user1", "missed", Visibility::Public)];
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("user1"))),
                messages: pulled,
                ..Default::default()
            },
        )]);
        activate(&node, "admin", "admin123").await;

        let (offline, recovered) = node.toggle_offline().await;
        assert!(offline);
        assert_eq!(recovered, None);

        let (offline, recovered) = node.toggle_offline().await;
        assert!(!offline);
        assert_eq!(recovered, Some(1));
        assert_eq!(node.messages(None, true).await.len(), 1);
    }

    #[tokio::test]
    async fn login_after_offline_stretch_triggers_background_catch_up() {
        let pulled = vec![Message::new("user1", "missed", Visibility::Public)];
        let node = scripted_node(vec![(
            "127.0.0.1:8002",
            ScriptedPeer {
                status: Some(peer_status("node2", "127.0.0.1:8002", true, Some("user1"))),
                messages: pulled,
                ..Default::default()
            },
        )]);

        // Offline stretch while nobody is logged in: no sweep yet.
        node.toggle_offline().await;
        let (_, recovered) = node.toggle_offline().await;
        assert_eq!(recovered, None);
        assert!(node.messages(None, true).await.is_empty());

        activate(&node, "admin", "admin123").await;
        let mut healed = false;
        for _ in 0..50 {
            if node.messages(None, true).await.len() == 1 {
                healed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(healed, "background catch-up never ran");
    }

    #[tokio::test]
    async fn dispatch_flattens_status_and_reports_errors_as_responses() {
        let node = scripted_node(vec![]);

        let response = dispatch(&node, Request::CheckStatus).await;
        assert!(response.is_success());
        assert_eq!(response.node_id.as_deref(), Some("node1"));
        assert_eq!(response.active, Some(false));
        assert_eq!(response.simulate_offline, Some(false));

        let response = dispatch(
            &node,
            Request::PostMessage {
                token: "bogus".to_string(),
                content: "hi".to_string(),
                visibility: Visibility::Public,
            },
        )
        .await;
        assert!(!response.is_success());
        assert_eq!(response.message.as_deref(), Some("node is inactive"));
    }
}
