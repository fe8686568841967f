//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags override the
//! matching `config.toml` settings, and each flag also reads a `PARLEY_*`
//! environment variable.

pub mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use parley_types::chat::{ChatId, MessageId};
use parley_types::config::{AppConfig, LogFormat};

/// Two-party chat backend: persisted conversations, paging and read receipts.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config.toml (default: {data_dir}/config.toml).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database URL.
    #[arg(long, global = true, env = "PARLEY_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Log level or filter directive (RUST_LOG still wins).
    #[arg(long, global = true, env = "PARLEY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format: text or json.
    #[arg(long, global = true, env = "PARLEY_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Address to bind.
        #[arg(long, env = "PARLEY_HOST")]
        host: Option<String>,

        /// Port to listen on.
        #[arg(short, long, env = "PARLEY_PORT")]
        port: Option<u16>,
    },

    /// Open the chat between two users (returns the existing one if any).
    #[command(name = "create-chat")]
    CreateChat {
        user_a: String,
        user_b: String,
    },

    /// Find the chat between two users.
    #[command(name = "find-chat")]
    FindChat {
        user_a: String,
        user_b: String,
    },

    /// List a user's chats, most recently active first.
    Chats {
        user_id: String,
    },

    /// Send a message into a chat.
    Send {
        chat_id: ChatId,

        /// Sending participant.
        #[arg(long = "from")]
        sender: String,

        content: String,
    },

    /// Show one page of a chat's history, oldest first.
    Messages {
        chat_id: ChatId,

        /// Read as this participant (rejected if not in the chat).
        #[arg(long = "as")]
        viewer: Option<String>,

        /// Page size (clamped to the configured maximum).
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Only messages older than this message id.
        #[arg(long)]
        before: Option<MessageId>,
    },

    /// Mark every message from the counterpart as read.
    #[command(name = "mark-read")]
    MarkRead {
        chat_id: ChatId,
        user_id: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Apply flag and environment overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Commands::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
    }
}
