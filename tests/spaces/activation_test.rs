//! Waiting for the host extension to activate.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use spaces_bridge::chat::{ChatError, ChatProvider};
use spaces_bridge::commands::CommandBus;
use spaces_bridge::config::{ActivationConfig, ActivationStrategy, BridgeConfig};
use spaces_bridge::host::ExtensionRegistry;
use spaces_bridge::spaces::SpacesProvider;

use crate::support::{provider, FakeRegistry, RecordingBus};

fn backoff_provider(registry: &Arc<FakeRegistry>) -> SpacesProvider {
    let config = BridgeConfig {
        activation: ActivationConfig {
            strategy: ActivationStrategy::Backoff,
            delay_ms: 1_000,
            max_delay_ms: 4_000,
            max_attempts: 3,
        },
        ..BridgeConfig::default()
    };
    SpacesProvider::without_deferred_setup(
        Arc::clone(registry) as Arc<dyn ExtensionRegistry>,
        Arc::new(RecordingBus::default()) as Arc<dyn CommandBus>,
        config,
    )
}

fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected.saturating_add(Duration::from_millis(100)),
        "expected ~{expected:?}, waited {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn active_extension_resolves_without_waiting() {
    let (provider, registry, _bus) = provider(true);
    let start = Instant::now();
    provider.get_api().await.expect("api should resolve");
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(registry.lookups(), 1);
}

#[tokio::test(start_paused = true)]
async fn inactive_extension_waits_once_then_fails() {
    let (provider, registry, _bus) = provider(false);
    let start = Instant::now();

    let result = provider.get_api().await;

    assert!(matches!(
        result,
        Err(ChatError::ExtensionInactive { ref id }) if id == "vsls-contrib.spaces"
    ));
    assert_elapsed(start, Duration::from_secs(5));
    assert_eq!(registry.lookups(), 2);
    assert!(!provider.listeners_ready());
}

#[tokio::test(start_paused = true)]
async fn extension_activating_during_wait_is_used() {
    let (provider, registry, _bus) = provider(false);
    let flip = Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        flip.set_active(true);
    });
    let start = Instant::now();

    provider.get_api().await.expect("api should resolve after wait");

    assert_elapsed(start, Duration::from_secs(5));
    assert!(provider.listeners_ready());
}

#[tokio::test(start_paused = true)]
async fn missing_extension_fails_immediately() {
    let registry = FakeRegistry::new(false, false);
    let provider = SpacesProvider::without_deferred_setup(
        Arc::clone(&registry) as Arc<dyn ExtensionRegistry>,
        Arc::new(RecordingBus::default()) as Arc<dyn CommandBus>,
        BridgeConfig::default(),
    );
    let start = Instant::now();

    let result = provider.connect().await;

    assert!(matches!(result, Err(ChatError::ExtensionUnavailable { .. })));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn extension_uninstalled_during_wait_is_unavailable() {
    let (provider, registry, _bus) = provider(false);
    let flip = Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        flip.set_installed(false);
    });

    let result = provider.get_api().await;

    assert!(matches!(result, Err(ChatError::ExtensionUnavailable { .. })));
    assert_eq!(registry.lookups(), 2);
}

#[tokio::test(start_paused = true)]
async fn extension_reinstalled_during_backoff_is_inactive() {
    let registry = FakeRegistry::new(true, false);
    let provider = backoff_provider(&registry);
    let flip = Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        flip.set_installed(false);
        tokio::time::sleep(Duration::from_secs(2)).await;
        flip.set_installed(true);
    });

    let result = provider.get_api().await;

    assert!(matches!(result, Err(ChatError::ExtensionInactive { .. })));
    assert_eq!(registry.lookups(), 4);
}

#[tokio::test(start_paused = true)]
async fn operations_surface_inactive_extension() {
    let (provider, _registry, _bus) = provider(false);
    assert!(matches!(
        provider.fetch_users().await,
        Err(ChatError::ExtensionInactive { .. })
    ));
    assert!(matches!(
        provider.send_message("hi", "ada@example.com", "rust").await,
        Err(ChatError::ExtensionInactive { .. })
    ));
    assert!(!provider.is_connected());
}

#[tokio::test(start_paused = true)]
async fn backoff_rechecks_after_each_wait() {
    let registry = FakeRegistry::new(true, false);
    let provider = backoff_provider(&registry);
    let start = Instant::now();

    let result = provider.get_api().await;

    assert!(matches!(result, Err(ChatError::ExtensionInactive { .. })));
    assert_elapsed(start, Duration::from_secs(7));
    assert_eq!(registry.lookups(), 4);
}

#[tokio::test(start_paused = true)]
async fn backoff_stops_at_first_active_check() {
    let registry = FakeRegistry::new(true, false);
    let provider = backoff_provider(&registry);
    let flip = Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        flip.set_active(true);
    });
    let start = Instant::now();

    provider.get_api().await.expect("api should resolve");

    assert_elapsed(start, Duration::from_secs(3));
    assert_eq!(registry.lookups(), 3);
}
