//! Host-side collaboration API.
//!
//! The editor host exposes installed extensions through an
//! [`ExtensionRegistry`]. The Spaces extension exports a [`SpacesApi`]
//! once it is active.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Host message type rendered as an italic info line.
pub const INFO_MESSAGE_TYPE: &str = "info_message";

/// A message as reported by the host extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMessage {
    /// Message kind (`"info_message"` or a regular chat type).
    #[serde(rename = "type")]
    pub kind: String,
    /// Message body.
    pub content: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    /// Author identity (email).
    pub sender: String,
}

/// A user as reported by the host extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostUser {
    /// Display name.
    pub name: String,
    /// Email address; the stable identity key.
    pub email: String,
}

/// Payload of the message-received callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceMessages {
    /// Space the messages belong to.
    pub name: String,
    /// New messages in arrival order.
    pub messages: Vec<HostMessage>,
}

/// Failure reported by the host extension.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A host API call failed.
    #[error("host call '{method}' failed: {reason}")]
    Call {
        /// Host method name.
        method: &'static str,
        /// Host-provided reason.
        reason: String,
    },
}

/// Invoked with each batch of newly received messages.
pub type MessageCallback = Box<dyn Fn(SpaceMessages) + Send + Sync>;
/// Invoked with the name of a joined space.
pub type SpaceCallback = Box<dyn Fn(String) + Send + Sync>;
/// Invoked with the name of a space whose messages were cleared.
pub type ClearMessagesCallback = Box<dyn Fn(String) + Send + Sync>;
/// Invoked when the signed-in host user changes.
pub type UserChangedCallback = Box<dyn Fn(HostUser) + Send + Sync>;

/// API exported by the Spaces extension.
#[async_trait]
pub trait SpacesApi: Send + Sync {
    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host call fails.
    async fn user_info(&self) -> Result<Option<HostUser>, HostError>;

    /// All users known to the extension.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host call fails.
    async fn users(&self) -> Result<Vec<HostUser>, HostError>;

    /// Names of the spaces the user has joined.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host call fails.
    async fn spaces(&self) -> Result<Vec<String>, HostError>;

    /// Full message history of a space.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host call fails.
    async fn channel_history(&self, channel_id: &str) -> Result<Vec<HostMessage>, HostError>;

    /// Post a message to a space.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host call fails.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), HostError>;

    /// Register the message-received callback.
    fn set_message_callback(&self, callback: MessageCallback);

    /// Register the space-joined callback.
    fn set_space_callback(&self, callback: SpaceCallback);

    /// Register the messages-cleared callback.
    fn set_clear_messages_callback(&self, callback: ClearMessagesCallback);

    /// Register the user-changed callback.
    fn set_user_changed_callback(&self, callback: UserChangedCallback);
}

/// An installed host extension.
#[derive(Clone)]
pub struct Extension {
    /// Whether the extension finished activating.
    pub active: bool,
    /// Exported API; only meaningful once `active` is set.
    pub exports: Option<Arc<dyn SpacesApi>>,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("active", &self.active)
            .field("exports", &self.exports.is_some())
            .finish()
    }
}

/// Lookup of installed host extensions by identifier.
pub trait ExtensionRegistry: Send + Sync {
    /// Find an extension by its `publisher.name` identifier.
    fn extension(&self, id: &str) -> Option<Extension>;
}
