//! Typed client for the node wire protocol.
//!
//! Thin wrapper over the peer transport: every method is one
//! request/response round trip, and an error response from the node
//! becomes a [`CliError::Node`].

use wallboard_core::{Message, NodeStatus, Request, Response, Visibility, DEFAULT_PEER_TIMEOUT};
use wallboard_node::{PeerTransport, TcpTransport};

use crate::error::{CliError, Result};

pub struct WallboardClient {
    addr: String,
    transport: TcpTransport,
}

impl WallboardClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            transport: TcpTransport::new(DEFAULT_PEER_TIMEOUT),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn call(&self, request: Request) -> Result<Response> {
        let response = self.transport.exchange(&self.addr, &request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(CliError::Node(
                response
                    .message
                    .unwrap_or_else(|| "node returned an error without a message".to_string()),
            ))
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        self.call(Request::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await
    }

    pub async fn logout(&self, token: &str) -> Result<Response> {
        self.call(Request::Logout {
            token: token.to_string(),
        })
        .await
    }

    pub async fn post(
        &self,
        token: &str,
        content: &str,
        visibility: Visibility,
    ) -> Result<Response> {
        self.call(Request::PostMessage {
            token: token.to_string(),
            content: content.to_string(),
            visibility,
        })
        .await
    }

    pub async fn messages(&self, token: Option<&str>) -> Result<Vec<Message>> {
        let response = self
            .call(Request::GetMessages {
                token: token.map(str::to_string),
                include_private: false,
            })
            .await?;
        Ok(response.messages.unwrap_or_default())
    }

    pub async fn status(&self) -> Result<Response> {
        self.call(Request::CheckStatus).await
    }

    pub async fn nodes(&self) -> Result<Vec<NodeStatus>> {
        let response = self.call(Request::GetActiveNodes).await?;
        Ok(response.nodes.unwrap_or_default())
    }

    pub async fn toggle_offline(&self) -> Result<Response> {
        self.call(Request::ToggleOffline).await
    }
}
