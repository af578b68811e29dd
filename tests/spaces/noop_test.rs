//! Contract methods the Spaces extension does not support.

use std::collections::HashMap;

use spaces_bridge::chat::{ChatProvider, UserPreferences, UserPresence};
use spaces_bridge::config::AvatarConfig;
use spaces_bridge::spaces::translate::{to_channel, to_user};

use crate::support::{provider, user};

#[tokio::test]
async fn unsupported_methods_are_inert() {
    // Inactive host: any host access would wait and then fail.
    let (provider, registry, bus) = provider(false);
    let channel = to_channel("rust");
    let target = to_user(&user("Ada", "ada@example.com"), &AvatarConfig::default());

    provider.subscribe_presence(&HashMap::new());
    assert_eq!(
        provider.get_user_preferences().await.expect("preferences"),
        UserPreferences::default()
    );
    assert!(provider.validate_token().await.expect("validate").is_none());
    assert!(provider
        .fetch_channel_info(&channel)
        .await
        .expect("channel info")
        .is_none());
    assert!(provider
        .mark_channel(&channel, "1609459200")
        .await
        .expect("mark")
        .is_none());
    assert!(provider
        .fetch_thread_replies("rust", "1609459200")
        .await
        .expect("replies")
        .is_none());
    provider
        .send_thread_reply("hi", "ada@example.com", "rust", "1609459200")
        .await
        .expect("thread reply");
    assert!(provider
        .update_self_presence(UserPresence::Away, 30)
        .await
        .expect("presence")
        .is_none());
    assert!(provider
        .create_im_channel(&target)
        .await
        .expect("im channel")
        .is_none());
    provider
        .send_typing("ada@example.com", "rust")
        .await
        .expect("typing");
    provider.destroy().await.expect("destroy");

    assert_eq!(registry.lookups(), 0);
    assert_eq!(bus.len(), 0);
    assert!(!provider.is_connected());
}

#[test]
fn empty_preferences_serialize_to_empty_object() {
    let json = serde_json::to_value(UserPreferences::default()).expect("serialize");
    assert_eq!(json, serde_json::json!({}));
}
