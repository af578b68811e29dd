//! Chat provider backed by the Live Share Spaces extension.
//!
//! [`SpacesProvider`] locates the Spaces extension through the host's
//! [`ExtensionRegistry`], waits for it to activate, and forwards its
//! callbacks as [`Command`]s on the application's [`CommandBus`]. Queries
//! are answered by translating the extension's records on every call;
//! nothing is cached except the signed-in user.
//!
//! Read-state, threads, presence and typing are not supported by the
//! extension and are implemented as no-ops.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::chat::{
    Channel, ChannelMessages, ChatError, ChatProvider, CurrentUser, Message, User,
    UserPreferences, UserPresence, Users,
};
use crate::commands::{
    ClearMessagesArgs, Command, CommandBus, SpaceJoinedArgs, UpdateMessagesArgs,
};
use crate::config::BridgeConfig;
use crate::host::{ExtensionRegistry, HostUser, SpaceMessages, SpacesApi};

pub mod activation;
pub mod avatar;
pub mod translate;

use self::activation::ActivationSchedule;
use self::translate::{to_channel, to_channel_messages, to_current_user, to_user};

/// Adapter from the Spaces extension API to [`ChatProvider`].
///
/// Cloning is cheap; clones share the cached user and listener state.
#[derive(Clone)]
pub struct SpacesProvider {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<dyn ExtensionRegistry>,
    bus: Arc<dyn CommandBus>,
    config: BridgeConfig,
    schedule: ActivationSchedule,
    /// Set once the four host callbacks are registered.
    listeners_ready: AtomicBool,
    current_user: RwLock<Option<HostUser>>,
    /// Runtime the provider was built on; host callbacks may fire from
    /// threads that are not part of it.
    runtime: Option<Handle>,
}

/// Outcome of a single extension lookup.
enum Lookup {
    Missing,
    Inactive,
    Ready(Arc<dyn SpacesApi>),
}

impl fmt::Debug for SpacesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpacesProvider")
            .field("extension", &self.inner.config.extension.id)
            .field("listeners_ready", &self.listeners_ready())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl SpacesProvider {
    /// Create the provider and schedule a deferred listener setup after
    /// `extension.startup_delay_ms`.
    ///
    /// The deferred setup runs once on the current tokio runtime; outside a
    /// runtime it is skipped and listeners are registered by the first
    /// successful [`get_api`](Self::get_api) instead.
    pub fn new(
        registry: Arc<dyn ExtensionRegistry>,
        bus: Arc<dyn CommandBus>,
        config: BridgeConfig,
    ) -> Self {
        let provider = Self::without_deferred_setup(registry, bus, config);
        provider.schedule_deferred_setup();
        provider
    }

    /// Create the provider without scheduling the deferred setup.
    pub fn without_deferred_setup(
        registry: Arc<dyn ExtensionRegistry>,
        bus: Arc<dyn CommandBus>,
        config: BridgeConfig,
    ) -> Self {
        let schedule = ActivationSchedule::from_config(&config.activation);
        Self {
            inner: Arc::new(Inner {
                registry,
                bus,
                config,
                schedule,
                listeners_ready: AtomicBool::new(false),
                current_user: RwLock::new(None),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    fn schedule_deferred_setup(&self) {
        let Some(handle) = self.inner.runtime.clone() else {
            debug!("no tokio runtime, skipping deferred listener setup");
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.extension.startup_delay();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                if !inner.setup_listeners() {
                    debug!("deferred listener setup did not register callbacks");
                }
            }
        });
    }

    /// Register the host callbacks if the extension is active.
    ///
    /// Returns `true` only for the call that actually registered them.
    pub fn setup_listeners(&self) -> bool {
        self.inner.setup_listeners()
    }

    /// Resolve the active extension API, waiting for activation if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ExtensionUnavailable`] if the extension is not
    /// installed, or [`ChatError::ExtensionInactive`] if it is still inactive
    /// after the activation schedule.
    pub async fn get_api(&self) -> Result<Arc<dyn SpacesApi>, ChatError> {
        self.inner.get_api().await
    }

    /// Whether the host callbacks have been registered.
    pub fn listeners_ready(&self) -> bool {
        self.inner.listeners_ready.load(Ordering::Acquire)
    }

    /// The cached signed-in host user.
    pub fn current_user(&self) -> Option<HostUser> {
        self.inner
            .current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The configuration this provider was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }
}

impl Inner {
    fn extension_id(&self) -> &str {
        &self.config.extension.id
    }

    fn lookup(&self) -> Lookup {
        match self.registry.extension(self.extension_id()) {
            None => Lookup::Missing,
            Some(ext) => match (ext.active, ext.exports) {
                (true, Some(api)) => Lookup::Ready(api),
                _ => Lookup::Inactive,
            },
        }
    }

    fn setup_listeners(self: &Arc<Self>) -> bool {
        match self.lookup() {
            Lookup::Ready(api) => self.register_listeners(&api),
            Lookup::Inactive | Lookup::Missing => false,
        }
    }

    fn register_listeners(self: &Arc<Self>, api: &Arc<dyn SpacesApi>) -> bool {
        if self
            .listeners_ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let bus = Arc::clone(&self.bus);
        let provider = self.config.provider.clone();
        api.set_message_callback(Box::new(move |data: SpaceMessages| {
            let messages = to_channel_messages(&data.messages);
            bus.dispatch(Command::UpdateMessages(UpdateMessagesArgs {
                channel_id: data.name,
                messages,
                provider: provider.clone(),
            }));
        }));

        let bus = Arc::clone(&self.bus);
        api.set_space_callback(Box::new(move |name: String| {
            bus.dispatch(Command::SpaceJoined(SpaceJoinedArgs { name }));
        }));

        let bus = Arc::clone(&self.bus);
        let provider = self.config.provider.clone();
        api.set_clear_messages_callback(Box::new(move |name: String| {
            bus.dispatch(Command::ClearMessages(ClearMessagesArgs {
                channel_id: name,
                provider: provider.clone(),
            }));
        }));

        let weak = Arc::downgrade(self);
        let runtime = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        api.set_user_changed_callback(Box::new(move |user: HostUser| {
            debug!(email = %user.email, "host user changed");
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Some(handle) = runtime.as_ref() else {
                warn!("no tokio runtime, cannot reconnect after user change");
                return;
            };
            handle.spawn(async move {
                if let Err(e) = inner.connect().await {
                    warn!(error = %e, "reconnect after user change failed");
                }
            });
        }));

        info!(extension = %self.extension_id(), "registered Spaces listeners");
        true
    }

    async fn get_api(self: &Arc<Self>) -> Result<Arc<dyn SpacesApi>, ChatError> {
        match self.lookup() {
            Lookup::Ready(api) => {
                self.register_listeners(&api);
                return Ok(api);
            }
            Lookup::Missing => {
                return Err(ChatError::ExtensionUnavailable {
                    id: self.extension_id().to_owned(),
                })
            }
            Lookup::Inactive => {}
        }

        let mut missing = false;
        for wait in self.schedule.waits() {
            debug!(
                extension = %self.extension_id(),
                wait_ms = wait.as_millis(),
                "waiting for extension to activate"
            );
            tokio::time::sleep(*wait).await;
            match self.lookup() {
                Lookup::Ready(api) => {
                    self.register_listeners(&api);
                    return Ok(api);
                }
                Lookup::Missing => missing = true,
                Lookup::Inactive => missing = false,
            }
        }

        let id = self.extension_id().to_owned();
        warn!(extension = %id, "extension did not activate");
        if missing {
            Err(ChatError::ExtensionUnavailable { id })
        } else {
            Err(ChatError::ExtensionInactive { id })
        }
    }

    async fn connect(self: &Arc<Self>) -> Result<Option<CurrentUser>, ChatError> {
        let api = self.get_api().await?;
        let Some(user) = api.user_info().await? else {
            debug!("Spaces reports no signed-in user");
            return Ok(None);
        };

        let current = to_current_user(&user, &self.config.provider);
        info!(user = %user.email, "connected to Spaces");
        *self
            .current_user
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(user);
        Ok(Some(current))
    }
}

#[async_trait]
impl ChatProvider for SpacesProvider {
    async fn connect(&self) -> Result<Option<CurrentUser>, ChatError> {
        self.inner.connect().await
    }

    fn is_connected(&self) -> bool {
        self.inner
            .current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn validate_token(&self) -> Result<Option<CurrentUser>, ChatError> {
        Ok(None)
    }

    async fn fetch_users(&self) -> Result<Users, ChatError> {
        let api = self.inner.get_api().await?;
        let users: Users = api
            .users()
            .await?
            .iter()
            .map(|u| {
                let user = to_user(u, &self.inner.config.avatar);
                (user.id.clone(), user)
            })
            .collect();
        Ok(users)
    }

    async fn fetch_user_info(&self, user_id: &str) -> Result<Option<User>, ChatError> {
        let mut users = self.fetch_users().await?;
        Ok(users.remove(user_id))
    }

    async fn fetch_channels(&self, _users: &Users) -> Result<Vec<Channel>, ChatError> {
        let api = self.inner.get_api().await?;
        let spaces = api.spaces().await?;
        Ok(spaces.iter().map(|name| to_channel(name)).collect())
    }

    async fn fetch_channel_info(&self, _channel: &Channel) -> Result<Option<Channel>, ChatError> {
        Ok(None)
    }

    async fn load_channel_history(&self, channel_id: &str) -> Result<ChannelMessages, ChatError> {
        let api = self.inner.get_api().await?;
        let history = api.channel_history(channel_id).await?;
        Ok(to_channel_messages(&history))
    }

    async fn get_user_preferences(&self) -> Result<UserPreferences, ChatError> {
        Ok(UserPreferences::default())
    }

    async fn mark_channel(
        &self,
        _channel: &Channel,
        _timestamp: &str,
    ) -> Result<Option<Channel>, ChatError> {
        Ok(None)
    }

    async fn fetch_thread_replies(
        &self,
        _channel_id: &str,
        _timestamp: &str,
    ) -> Result<Option<Message>, ChatError> {
        Ok(None)
    }

    async fn send_message(
        &self,
        text: &str,
        _current_user_id: &str,
        channel_id: &str,
    ) -> Result<(), ChatError> {
        let api = self.inner.get_api().await?;
        api.send_message(channel_id, text).await?;
        Ok(())
    }

    async fn send_thread_reply(
        &self,
        _text: &str,
        _current_user_id: &str,
        _channel_id: &str,
        _parent_timestamp: &str,
    ) -> Result<(), ChatError> {
        Ok(())
    }

    fn subscribe_presence(&self, _users: &Users) {}

    async fn update_self_presence(
        &self,
        _presence: UserPresence,
        _duration_minutes: u32,
    ) -> Result<Option<UserPresence>, ChatError> {
        Ok(None)
    }

    async fn create_im_channel(&self, _user: &User) -> Result<Option<Channel>, ChatError> {
        Ok(None)
    }

    async fn send_typing(
        &self,
        _current_user_id: &str,
        _channel_id: &str,
    ) -> Result<(), ChatError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), ChatError> {
        Ok(())
    }
}
