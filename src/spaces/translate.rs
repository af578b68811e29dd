//! Host record → chat record translation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::chat::{
    Channel, ChannelMessages, ChannelType, ChatError, CurrentUser, Message, User, UserPresence,
};
use crate::config::AvatarConfig;
use crate::host::{HostMessage, HostUser, INFO_MESSAGE_TYPE};

use super::avatar::gravatar_url;

/// Offset-less date-time layouts accepted after RFC 3339.
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert an ISO 8601 timestamp to whole unix seconds, rendered as a string.
///
/// RFC 3339 is tried first. A date-time without an offset, or a bare
/// `YYYY-MM-DD` date, is read as UTC.
///
/// # Errors
///
/// Returns [`ChatError::InvalidTimestamp`] if `raw` matches none of these.
pub fn to_timestamp_key(raw: &str) -> Result<String, ChatError> {
    let rfc3339_err = match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => return Ok(parsed.timestamp().to_string()),
        Err(e) => e,
    };
    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });
    match naive {
        Some(naive) => Ok(naive.and_utc().timestamp().to_string()),
        None => Err(ChatError::InvalidTimestamp {
            timestamp: raw.to_owned(),
            reason: rfc3339_err.to_string(),
        }),
    }
}

/// Translate one host message.
///
/// Info messages are wrapped in `_..._` so they render in italics.
///
/// # Errors
///
/// Returns [`ChatError::InvalidTimestamp`] if the timestamp cannot be parsed.
pub fn to_message(msg: &HostMessage) -> Result<Message, ChatError> {
    let text = if msg.kind == INFO_MESSAGE_TYPE {
        format!("_{}_", msg.content)
    } else {
        msg.content.clone()
    };
    Ok(Message {
        timestamp: to_timestamp_key(&msg.timestamp)?,
        user_id: msg.sender.clone(),
        text,
        reactions: Vec::new(),
        replies: BTreeMap::new(),
    })
}

/// Translate a batch of host messages into a timestamp-keyed map.
///
/// Later messages overwrite earlier ones with the same key. Messages with
/// unparsable timestamps are skipped.
pub fn to_channel_messages(messages: &[HostMessage]) -> ChannelMessages {
    let mut out = ChannelMessages::new();
    for msg in messages {
        match to_message(msg) {
            Ok(translated) => {
                out.insert(translated.timestamp.clone(), translated);
            }
            Err(e) => warn!(sender = %msg.sender, error = %e, "skipping host message"),
        }
    }
    out
}

/// Translate a host user; presence is always reported as available.
pub fn to_user(user: &HostUser, avatar: &AvatarConfig) -> User {
    let image_url = gravatar_url(&user.email, avatar);
    User {
        id: user.email.clone(),
        name: user.name.clone(),
        email: Some(user.email.clone()),
        full_name: user.name.clone(),
        small_image_url: image_url.clone(),
        image_url,
        presence: UserPresence::Available,
    }
}

/// Map a space name to a channel without read-state tracking.
pub fn to_channel(space: &str) -> Channel {
    Channel {
        id: space.to_owned(),
        name: space.to_owned(),
        channel_type: ChannelType::Channel,
        read_timestamp: None,
        unread_count: 0,
    }
}

/// Build the current-user record for a signed-in host user.
pub fn to_current_user(user: &HostUser, provider: &str) -> CurrentUser {
    CurrentUser {
        id: user.email.clone(),
        name: user.name.clone(),
        teams: Vec::new(),
        current_team_id: None,
        provider: provider.to_owned(),
    }
}
