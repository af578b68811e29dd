//! Chat-provider contract consumed by the aggregation application.
//!
//! Defines the [`ChatProvider`] trait every chat backend implements, the
//! shared record types (users, channels, messages) and [`ChatError`].
//!
//! All records serialize to camelCase JSON, matching the shape the
//! application exchanges on its command bus.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::host::HostError;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Presence state shown next to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserPresence {
    /// Online and available.
    Available,
    /// Idle.
    Away,
    /// Notifications paused.
    DoNotDisturb,
    /// Online but hidden.
    Invisible,
    /// Not connected.
    Offline,
    /// Presence is not known.
    Unknown,
}

/// A chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identity key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, when the backend exposes one.
    pub email: Option<String>,
    /// Full name.
    pub full_name: String,
    /// Avatar image URL.
    pub image_url: String,
    /// Small avatar image URL.
    pub small_image_url: String,
    /// Current presence.
    pub presence: UserPresence,
}

/// Users keyed by [`User::id`].
pub type Users = HashMap<String, User>;

/// A team (workspace) the current user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier.
    pub id: String,
    /// Team display name.
    pub name: String,
}

/// The locally authenticated user, as returned by [`ChatProvider::connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Identity key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Teams available to the user.
    pub teams: Vec<Team>,
    /// Currently selected team, if any.
    pub current_team_id: Option<String>,
    /// Tag of the provider that authenticated the user.
    pub provider: String,
}

/// Per-user chat preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Channels the user muted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_channels: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Public channel.
    Channel,
    /// Private group.
    Group,
    /// Direct message.
    Im,
}

/// A chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Channel kind.
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    /// Timestamp of the last read message, if tracked.
    pub read_timestamp: Option<String>,
    /// Unread message count.
    pub unread_count: u32,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A reaction attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReaction {
    /// Emoji name.
    pub name: String,
    /// Number of users who reacted.
    pub count: u32,
    /// Users who reacted.
    pub user_ids: Vec<String>,
}

/// A thread reply attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReply {
    /// Author of the reply.
    pub user_id: String,
    /// Reply timestamp key.
    pub timestamp: String,
    /// Reply text, when loaded.
    pub text: Option<String>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unix-seconds timestamp rendered as a string; doubles as the message key.
    pub timestamp: String,
    /// Author identity key.
    pub user_id: String,
    /// Message text (markdown).
    pub text: String,
    /// Reactions on the message.
    pub reactions: Vec<MessageReaction>,
    /// Thread replies keyed by reply timestamp.
    pub replies: BTreeMap<String, MessageReply>,
}

/// Messages of one channel keyed by [`Message::timestamp`].
///
/// Messages sharing a timestamp key overwrite each other.
pub type ChannelMessages = BTreeMap<String, Message>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by chat providers.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The host extension is not installed.
    #[error("host extension '{id}' is not installed")]
    ExtensionUnavailable {
        /// Extension identifier that was looked up.
        id: String,
    },
    /// The host extension is installed but did not activate in time.
    #[error("host extension '{id}' is not active")]
    ExtensionInactive {
        /// Extension identifier that was looked up.
        id: String,
    },
    /// A call into the host extension failed.
    #[error(transparent)]
    Host(#[from] HostError),
    /// A host message carried a timestamp that is not RFC 3339.
    #[error("invalid message timestamp '{timestamp}': {reason}")]
    InvalidTimestamp {
        /// Raw timestamp.
        timestamp: String,
        /// Parser error.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Interface every chat backend exposes to the aggregation application.
///
/// Backends that lack a feature implement the corresponding method as a
/// no-op that returns an empty result.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Authenticate and return the current user, or `None` when the backend
    /// has no identity yet.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn connect(&self) -> Result<Option<CurrentUser>, ChatError>;

    /// Whether a previous [`connect`](Self::connect) succeeded.
    fn is_connected(&self) -> bool;

    /// Validate stored credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn validate_token(&self) -> Result<Option<CurrentUser>, ChatError>;

    /// Fetch all users visible to the current user.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn fetch_users(&self) -> Result<Users, ChatError>;

    /// Fetch a single user by id.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn fetch_user_info(&self, user_id: &str) -> Result<Option<User>, ChatError>;

    /// Fetch the channels visible to the current user.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn fetch_channels(&self, users: &Users) -> Result<Vec<Channel>, ChatError>;

    /// Refresh a single channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn fetch_channel_info(&self, channel: &Channel) -> Result<Option<Channel>, ChatError>;

    /// Load the message history of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn load_channel_history(&self, channel_id: &str) -> Result<ChannelMessages, ChatError>;

    /// Fetch the current user's preferences.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn get_user_preferences(&self) -> Result<UserPreferences, ChatError>;

    /// Mark a channel as read up to `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn mark_channel(
        &self,
        channel: &Channel,
        timestamp: &str,
    ) -> Result<Option<Channel>, ChatError>;

    /// Fetch the replies of a thread.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn fetch_thread_replies(
        &self,
        channel_id: &str,
        timestamp: &str,
    ) -> Result<Option<Message>, ChatError>;

    /// Send a message to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend rejects the message.
    async fn send_message(
        &self,
        text: &str,
        current_user_id: &str,
        channel_id: &str,
    ) -> Result<(), ChatError>;

    /// Reply in a thread.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend rejects the reply.
    async fn send_thread_reply(
        &self,
        text: &str,
        current_user_id: &str,
        channel_id: &str,
        parent_timestamp: &str,
    ) -> Result<(), ChatError>;

    /// Start receiving presence updates for `users`.
    fn subscribe_presence(&self, users: &Users);

    /// Change the current user's presence.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn update_self_presence(
        &self,
        presence: UserPresence,
        duration_minutes: u32,
    ) -> Result<Option<UserPresence>, ChatError>;

    /// Open a direct-message channel with `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn create_im_channel(&self, user: &User) -> Result<Option<Channel>, ChatError>;

    /// Signal that the current user is typing.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the backend cannot be reached.
    async fn send_typing(&self, current_user_id: &str, channel_id: &str) -> Result<(), ChatError>;

    /// Release backend resources.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when teardown fails.
    async fn destroy(&self) -> Result<(), ChatError>;
}
