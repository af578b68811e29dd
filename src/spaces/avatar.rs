//! Gravatar URL construction.

use md5::{Digest, Md5};

use crate::config::AvatarConfig;

const SECURE_BASE: &str = "https://secure.gravatar.com/avatar/";
const PLAIN_BASE: &str = "http://www.gravatar.com/avatar/";

/// Build the Gravatar image URL for `email`.
///
/// The email is trimmed and lower-cased before hashing, so addresses that
/// differ only in case or surrounding whitespace share an avatar.
pub fn gravatar_url(email: &str, config: &AvatarConfig) -> String {
    let normalized = email.trim().to_lowercase();
    let hash = hex::encode(Md5::digest(normalized.as_bytes()));
    let base = if config.secure { SECURE_BASE } else { PLAIN_BASE };
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("size", &config.size.to_string())
        .append_pair("d", &config.default_style)
        .finish();
    format!("{base}{hash}?{query}")
}
