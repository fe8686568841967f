//! Chat CLI commands: create-chat, find-chat, chats, send, messages, mark-read.
//!
//! Each command goes through `ChatService`, exactly as the HTTP handlers do,
//! and prints either a styled table or pretty JSON (`--json`).

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_types::chat::{Chat, ChatId, MarkReadResult, Message, MessageId};

use crate::state::AppState;

/// Open (or fetch) the chat between two users.
///
/// # Examples
///
/// ```bash
/// parley create-chat alice bob
/// ```
pub async fn create_chat(state: &AppState, user_a: &str, user_b: &str, json: bool) -> Result<()> {
    let chat = state.chat_service.create_chat(user_a, user_b).await?;
    print_chat(&chat, json)
}

/// Show the chat between two users, if there is one.
pub async fn find_chat(state: &AppState, user_a: &str, user_b: &str, json: bool) -> Result<()> {
    let chat = state.chat_service.find_chat(user_a, user_b).await?;
    print_chat(&chat, json)
}

/// List a user's chats with the counterpart and last activity.
///
/// # Examples
///
/// ```bash
/// parley chats alice
/// parley chats alice --json
/// ```
pub async fn list_chats(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let chats = state.chat_service.get_user_chats(user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!(
            "  {} No chats found for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(user_id).cyan(),
            style(format!("parley create-chat {user_id} <other-user>")).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Chat").fg(Color::White),
        Cell::new("With").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for chat in &chats {
        table.add_row(vec![
            Cell::new(chat.id.to_string()).fg(Color::DarkGrey),
            Cell::new(chat.counterpart(user_id).unwrap_or("?")).fg(Color::Cyan),
            Cell::new(format_time(&chat.updated_at)).fg(Color::White),
            Cell::new(format_time(&chat.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Chats for '{}'", style(user_id).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} chat{}",
        style(chats.len()).bold(),
        if chats.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Send a message as one of the chat's participants.
pub async fn send_message(
    state: &AppState,
    chat_id: &ChatId,
    sender_id: &str,
    content: &str,
    json: bool,
) -> Result<()> {
    let message = state
        .chat_service
        .send_message(chat_id, sender_id, content)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Message {} sent to chat {}",
        style("✓").green().bold(),
        style(message.id).dim(),
        style(chat_id).cyan()
    );
    println!();

    Ok(())
}

/// Print one page of history, oldest first.
///
/// # Examples
///
/// ```bash
/// parley messages <chat-id> --as alice --limit 20
/// parley messages <chat-id> --before <message-id>
/// ```
pub async fn list_messages(
    state: &AppState,
    chat_id: &ChatId,
    viewer: Option<&str>,
    limit: Option<i64>,
    before: Option<&MessageId>,
    json: bool,
) -> Result<()> {
    let messages = state
        .chat_service
        .get_chat_messages(chat_id, viewer, limit, before)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  {} No messages.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Sent").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Read").fg(Color::White),
    ]);

    for message in &messages {
        table.add_row(message_row(message));
    }

    println!();
    println!("{table}");
    println!();
    if let Some(oldest) = messages.first() {
        println!(
            "  {} Older messages: {}",
            style("→").dim(),
            style(format!("parley messages {chat_id} --before {}", oldest.id)).yellow()
        );
        println!();
    }

    Ok(())
}

/// Mark the counterpart's messages as read for `user_id`.
pub async fn mark_read(
    state: &AppState,
    chat_id: &ChatId,
    user_id: &str,
    json: bool,
) -> Result<()> {
    let marked = state
        .chat_service
        .mark_messages_as_read(chat_id, user_id)
        .await?;

    if json {
        let result = MarkReadResult {
            chat_id: *chat_id,
            user_id: user_id.to_string(),
            marked,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Marked {} message{} as read",
        style("✓").green().bold(),
        style(marked).bold(),
        if marked == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn print_chat(chat: &Chat, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(chat)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Chat between {} and {}",
        style("💬").bold(),
        style(&chat.user_id1).cyan(),
        style(&chat.user_id2).cyan()
    );
    println!();
    println!("  {}  {}", style("ID:").dim(), chat.id);
    println!("  {}  {}", style("Created:").dim(), format_time(&chat.created_at));
    println!("  {}  {}", style("Last activity:").dim(), format_time(&chat.updated_at));
    println!();

    Ok(())
}

fn message_row(message: &Message) -> Vec<Cell> {
    let read = match message.read_at {
        Some(at) => Cell::new(format_time(&at)).fg(Color::Green),
        None => Cell::new("unread").fg(Color::Yellow),
    };

    vec![
        Cell::new(format_time(&message.created_at)).fg(Color::DarkGrey),
        Cell::new(&message.sender_id).fg(Color::Cyan),
        Cell::new(truncate(&message.content, 60)).fg(Color::White),
        read,
    ]
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shorten `text` to at most `max` characters, ending in "..." when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
