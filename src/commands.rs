//! Commands emitted on the host-wide command bus.
//!
//! The aggregation application listens for these command names and
//! refreshes its views from the attached payloads.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::chat::ChannelMessages;

/// Command name for replacing a channel's messages.
pub const UPDATE_MESSAGES: &str = "chat.updateMessages";
/// Command name announcing a newly joined space.
pub const SPACE_JOINED: &str = "chat.vslsSpaceJoined";
/// Command name for clearing a channel's messages.
pub const CLEAR_MESSAGES: &str = "chat.clearMessages";

/// Payload of [`Command::UpdateMessages`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessagesArgs {
    /// Channel (space name) the messages belong to.
    pub channel_id: String,
    /// Translated messages keyed by timestamp.
    pub messages: ChannelMessages,
    /// Provider tag.
    pub provider: String,
}

/// Payload of [`Command::SpaceJoined`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceJoinedArgs {
    /// Name of the joined space.
    pub name: String,
}

/// Payload of [`Command::ClearMessages`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearMessagesArgs {
    /// Channel (space name) to clear.
    pub channel_id: String,
    /// Provider tag.
    pub provider: String,
}

/// A command for the aggregation application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// New messages arrived in a channel.
    UpdateMessages(UpdateMessagesArgs),
    /// The user joined a space.
    SpaceJoined(SpaceJoinedArgs),
    /// A channel's messages were cleared.
    ClearMessages(ClearMessagesArgs),
}

impl Command {
    /// The bus-level command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateMessages(_) => UPDATE_MESSAGES,
            Self::SpaceJoined(_) => SPACE_JOINED,
            Self::ClearMessages(_) => CLEAR_MESSAGES,
        }
    }

    /// The command payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::UpdateMessages(args) => serde_json::to_value(args),
            Self::SpaceJoined(args) => serde_json::to_value(args),
            Self::ClearMessages(args) => serde_json::to_value(args),
        }
    }
}

/// Fire-and-forget command dispatcher.
pub trait CommandBus: Send + Sync {
    /// Emit a command. Delivery is not acknowledged.
    fn dispatch(&self, command: Command);
}

/// [`CommandBus`] backed by a bounded tokio channel.
///
/// Commands are dropped (and logged) when the receiver lags behind or has
/// gone away.
#[derive(Debug, Clone)]
pub struct ChannelCommandBus {
    tx: mpsc::Sender<Command>,
}

impl ChannelCommandBus {
    /// Create a bus and the receiver that consumes its commands.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl CommandBus for ChannelCommandBus {
    fn dispatch(&self, command: Command) {
        let name = command.name();
        if let Err(e) = self.tx.try_send(command) {
            warn!(command = name, error = %e, "dropping command");
        }
    }
}
