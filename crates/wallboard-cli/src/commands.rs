//! Command handlers for the wallboard CLI

use tracing::info;

use wallboard_core::{NodeConfig, NodeStatus, Visibility};
use wallboard_node::{Node, NodeServer};

use crate::cli::{Cli, Commands};
use crate::client::WallboardClient;
use crate::error::{CliError, Result};
use crate::shell::Shell;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli) -> Result<()> {
        let client = WallboardClient::new(cli.node.clone());
        match cli.command {
            Commands::Serve {
                node_id,
                listen,
                peers,
            } => Self::handle_serve(node_id, listen, peers).await,
            Commands::Login { username, password } => {
                Self::handle_login(client, &username, &password).await
            }
            Commands::Logout { token } => Self::handle_logout(client, &token).await,
            Commands::Post {
                token,
                content,
                private,
            } => {
                let visibility = if private {
                    Visibility::Private
                } else {
                    Visibility::Public
                };
                Self::handle_post(client, &token, &content, visibility).await
            }
            Commands::Messages { token } => Self::handle_messages(client, token.as_deref()).await,
            Commands::Status => Self::handle_status(client).await,
            Commands::Nodes => Self::handle_nodes(client).await,
            Commands::ToggleOffline => Self::handle_toggle_offline(client).await,
            Commands::Shell => Shell::new(client).run().await,
        }
    }

    /// Run a node until the process is stopped.
    async fn handle_serve(node_id: String, listen: String, peers: Vec<String>) -> Result<()> {
        if peers.contains(&listen) {
            return Err(CliError::Config(
                "a node cannot list its own address as a peer".to_string(),
            ));
        }

        let config = NodeConfig::new(node_id, listen, peers.into_iter().collect());
        info!(
            node = %config.node_id,
            peers = config.peers.len(),
            "starting node"
        );
        let node = Node::new(config);
        let server = NodeServer::bind(node).await?;
        server.run().await?;
        Ok(())
    }

    async fn handle_login(client: WallboardClient, username: &str, password: &str) -> Result<()> {
        let response = client.login(username, password).await?;
        println!(
            "logged in as {} on node {}",
            response.username.as_deref().unwrap_or(username),
            response.node_id.as_deref().unwrap_or("?")
        );
        if let Some(token) = response.token {
            println!("token: {token}");
        }
        Ok(())
    }

    async fn handle_logout(client: WallboardClient, token: &str) -> Result<()> {
        let response = client.logout(token).await?;
        if let Some(message) = response.message {
            println!("{message}");
        }
        Ok(())
    }

    async fn handle_post(
        client: WallboardClient,
        token: &str,
        content: &str,
        visibility: Visibility,
    ) -> Result<()> {
        let response = client.post(token, content, visibility).await?;
        if let Some(message) = response.message {
            println!("{message}");
        }
        Ok(())
    }

    async fn handle_messages(client: WallboardClient, token: Option<&str>) -> Result<()> {
        let messages = client.messages(token).await?;
        if messages.is_empty() {
            println!("no messages");
        } else {
            for message in messages {
                println!("{message}");
            }
        }
        Ok(())
    }

    async fn handle_status(client: WallboardClient) -> Result<()> {
        let response = client.status().await?;
        println!(
            "node {} at {}",
            response.node_id.as_deref().unwrap_or("?"),
            client.addr()
        );
        println!(
            "  active: {}",
            response.active.map(|a| a.to_string()).unwrap_or_default()
        );
        println!("  user: {}", response.user.as_deref().unwrap_or("-"));
        println!(
            "  simulating offline: {}",
            response
                .simulate_offline
                .map(|s| s.to_string())
                .unwrap_or_default()
        );
        Ok(())
    }

    async fn handle_nodes(client: WallboardClient) -> Result<()> {
        let nodes = client.nodes().await?;
        println!("visible nodes:");
        for node in nodes {
            println!("  {}", describe(&node));
        }
        Ok(())
    }

    async fn handle_toggle_offline(client: WallboardClient) -> Result<()> {
        let response = client.toggle_offline().await?;
        if let Some(message) = response.message {
            println!("{message}");
        }
        if let Some(recovered) = response.recovered {
            println!("recovered {recovered} missed message(s)");
        }
        Ok(())
    }
}

/// One-line rendering of a node's status for listings.
pub(crate) fn describe(node: &NodeStatus) -> String {
    let session = match &node.user {
        Some(user) => format!("user {user}"),
        None => "no session".to_string(),
    };
    let offline = if node.simulate_offline {
        ", simulating offline"
    } else {
        ""
    };
    format!("{} at {} ({session}{offline})", node.node_id, node.addr)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_session_and_offline_simulation() {
        let mut node = NodeStatus {
            node_id: "node2".to_string(),
            addr: "127.0.0.1:8002".to_string(),
            active: true,
            user: Some("user1".to_string()),
            simulate_offline: false,
        };
        assert_eq!(describe(&node), "node2 at 127.0.0.1:8002 (user user1)");

        node.user = None;
        node.simulate_offline = true;
        assert_eq!(
            describe(&node),
            "node2 at 127.0.0.1:8002 (no session, simulating offline)"
        );
    }
}
