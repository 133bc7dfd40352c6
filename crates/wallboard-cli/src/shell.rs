//! Interactive client session.
//!
//! A small line-oriented shell around [`WallboardClient`]: it holds the
//! session token between commands so a user can log in once and keep
//! posting. Node errors are printed and the shell keeps running.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use wallboard_core::Visibility;

use crate::client::WallboardClient;
use crate::commands::describe;
use crate::error::{CliError, Result};

const HELP: &str = "\
commands:
  login <user> <password>   start a session
  logout                    end the session
  post <text>               post a public message
  postp <text>              post a private message
  messages                  read the wall
  status                    show the node's status
  nodes                     list visible nodes
  offline                   toggle the node's offline simulation
  help                      show this help
  quit                      leave the shell";

/// One parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Login { username: String, password: String },
    Logout,
    Post { content: String },
    PostPrivate { content: String },
    Messages,
    Status,
    Nodes,
    Offline,
    Help,
    Quit,
}

impl ShellCommand {
    /// `None` means the line was empty or not a known command.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb {
            "login" => {
                let mut parts = rest.split_whitespace();
                let username = parts.next()?.to_string();
                let password = parts.next()?.to_string();
                Some(Self::Login { username, password })
            }
            "logout" => Some(Self::Logout),
            "post" if !rest.is_empty() => Some(Self::Post {
                content: rest.to_string(),
            }),
            "postp" if !rest.is_empty() => Some(Self::PostPrivate {
                content: rest.to_string(),
            }),
            "messages" => Some(Self::Messages),
            "status" => Some(Self::Status),
            "nodes" => Some(Self::Nodes),
            "offline" => Some(Self::Offline),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub struct Shell {
    client: WallboardClient,
    token: Option<String>,
    username: Option<String>,
}

impl Shell {
    pub fn new(client: WallboardClient) -> Self {
        Self {
            client,
            token: None,
            username: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("wallboard shell, talking to {}", self.client.addr());
        println!("type 'help' for commands");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.prompt()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            let Some(command) = ShellCommand::parse(&line) else {
                println!("unknown command, type 'help'");
                continue;
            };
            if matches!(command, ShellCommand::Quit) {
                break;
            }
            if let Err(err) = self.execute(command).await {
                println!("error: {err}");
            }
        }
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        match &self.username {
            Some(username) => print!("{username}> "),
            None => print!("> "),
        }
        std::io::stdout().flush()?;
        Ok(())
    }

    fn session(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| CliError::Node("not logged in".to_string()))
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Login { username, password } => {
                let response = self.client.login(&username, &password).await?;
                println!(
                    "logged in as {} on node {}",
                    username,
                    response.node_id.as_deref().unwrap_or("?")
                );
                self.token = response.token;
                self.username = Some(username);
            }
            ShellCommand::Logout => {
                let token = self.session()?.to_string();
                let response = self.client.logout(&token).await?;
                if let Some(message) = response.message {
                    println!("{message}");
                }
                self.token = None;
                self.username = None;
            }
            ShellCommand::Post { content } => {
                self.post(&content, Visibility::Public).await?;
            }
            ShellCommand::PostPrivate { content } => {
                self.post(&content, Visibility::Private).await?;
            }
            ShellCommand::Messages => {
                let messages = self.client.messages(self.token.as_deref()).await?;
                if messages.is_empty() {
                    println!("no messages");
                }
                for message in messages {
                    println!("{message}");
                }
            }
            ShellCommand::Status => {
                let response = self.client.status().await?;
                println!(
                    "node {}: active={}, user={}, simulating offline={}",
                    response.node_id.as_deref().unwrap_or("?"),
                    response.active.unwrap_or(false),
                    response.user.as_deref().unwrap_or("-"),
                    response.simulate_offline.unwrap_or(false)
                );
            }
            ShellCommand::Nodes => {
                for node in self.client.nodes().await? {
                    println!("{}", describe(&node));
                }
            }
            ShellCommand::Offline => {
                let response = self.client.toggle_offline().await?;
                if let Some(message) = response.message {
                    println!("{message}");
                }
                if let Some(recovered) = response.recovered {
                    println!("recovered {recovered} missed message(s)");
                }
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    async fn post(&self, content: &str, visibility: Visibility) -> Result<()> {
        let token = self.session()?;
        let response = self.client.post(token, content, visibility).await?;
        if let Some(message) = response.message {
            println!("{message}");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
