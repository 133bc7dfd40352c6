//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Address of the node to talk to (client commands only)
    #[arg(short, long, default_value = "127.0.0.1:8001", global = true)]
    pub node: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a node
    Serve {
        /// Node identifier, unique within the cluster
        #[arg(long)]
        node_id: String,
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8001")]
        listen: String,
        /// Peer node address; repeat for each peer
        #[arg(long = "peer")]
        peers: Vec<String>,
    },
    /// Log in and print the session token
    Login {
        username: String,
        password: String,
    },
    /// End the session held by a token
    Logout {
        token: String,
    },
    /// Post a message to the wall
    Post {
        token: String,
        content: String,
        /// Post with private visibility
        #[arg(long)]
        private: bool,
    },
    /// Read the wall
    Messages {
        /// Session token; without one only public messages are shown
        token: Option<String>,
    },
    /// Show a node's status
    Status,
    /// List the nodes visible from the contacted node
    Nodes,
    /// Toggle the node's offline simulation
    ToggleOffline,
    /// Start an interactive session
    Shell,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
