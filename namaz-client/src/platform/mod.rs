pub mod desktop;
pub mod push;
pub mod webpush;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use namaz_shared::api::{DisplayNotification, PushEvent};
use namaz_shared::{DeliveryToken, NotificationId, PermissionState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::notify::NotifyError;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("http error: {0}")]
    Http(String),
}

/// A notification handed to the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    /// `None` fires immediately.
    pub at: Option<DateTime<Utc>>,
}

/// OS-level notification scheduler.
#[async_trait]
pub trait LocalNotificationBackend: Send + Sync {
    async fn check_permission(&self) -> Result<PermissionState, BackendError>;
    async fn request_permission(&self) -> Result<PermissionState, BackendError>;
    async fn schedule(&self, notification: LocalNotification) -> Result<(), BackendError>;
}

/// Cloud-messaging registration. Emits [`PushEvent`]s to subscribers.
#[async_trait]
pub trait PushRegistrationBackend: Send + Sync {
    async fn check_permission(&self) -> Result<PermissionState, BackendError>;
    async fn request_permission(&self) -> Result<PermissionState, BackendError>;
    /// `Ok(None)` when the service answered without a token.
    async fn register(&self) -> Result<Option<DeliveryToken>, BackendError>;
    fn subscribe(&self) -> broadcast::Receiver<PushEvent>;
}

/// Immediate display surface without scheduling (the Notification API equivalent).
#[async_trait]
pub trait DirectNotificationBackend: Send + Sync {
    async fn permission(&self) -> Result<PermissionState, BackendError>;
    async fn request_permission(&self) -> Result<PermissionState, BackendError>;
    async fn show(&self, notification: &DisplayNotification) -> Result<(), BackendError>;
}

/// A registered service worker that renders notifications on our behalf.
#[async_trait]
pub trait ServiceWorkerBackend: Send + Sync {
    fn is_active(&self) -> bool;
    async fn show_notification(&self, notification: &DisplayNotification)
    -> Result<(), BackendError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    NativeLocal,
    NativePush,
    BrowserDirect,
    BrowserServiceWorker,
}

impl ChannelKind {
    pub fn is_native(self) -> bool {
        matches!(self, ChannelKind::NativeLocal | ChannelKind::NativePush)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelKind::NativeLocal => "native-local",
            ChannelKind::NativePush => "native-push",
            ChannelKind::BrowserDirect => "browser-direct",
            ChannelKind::BrowserServiceWorker => "browser-service-worker",
        };
        f.write_str(s)
    }
}

/// The delivery path selected once at start-up.
#[derive(Clone)]
pub enum NotificationChannel {
    NativeLocal {
        local: Arc<dyn LocalNotificationBackend>,
        push: Option<Arc<dyn PushRegistrationBackend>>,
    },
    NativePush {
        push: Arc<dyn PushRegistrationBackend>,
        display: Arc<dyn DirectNotificationBackend>,
    },
    BrowserDirect {
        display: Arc<dyn DirectNotificationBackend>,
    },
    BrowserServiceWorker {
        worker: Arc<dyn ServiceWorkerBackend>,
        display: Arc<dyn DirectNotificationBackend>,
    },
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("kind", &self.kind())
            .field("push", &self.push().is_some())
            .finish()
    }
}

impl NotificationChannel {
    pub fn kind(&self) -> ChannelKind {
        match self {
            NotificationChannel::NativeLocal { .. } => ChannelKind::NativeLocal,
            NotificationChannel::NativePush { .. } => ChannelKind::NativePush,
            NotificationChannel::BrowserDirect { .. } => ChannelKind::BrowserDirect,
            NotificationChannel::BrowserServiceWorker { .. } => ChannelKind::BrowserServiceWorker,
        }
    }

    pub fn is_native(&self) -> bool {
        self.kind().is_native()
    }

    /// Push registration available alongside this channel, if any.
    pub fn push(&self) -> Option<&Arc<dyn PushRegistrationBackend>> {
        match self {
            NotificationChannel::NativeLocal { push, .. } => push.as_ref(),
            NotificationChannel::NativePush { push, .. } => Some(push),
            _ => None,
        }
    }

    /// Whether the channel owns a scheduler that accepts fire times.
    pub fn local(&self) -> Option<&Arc<dyn LocalNotificationBackend>> {
        match self {
            NotificationChannel::NativeLocal { local, .. } => Some(local),
            _ => None,
        }
    }

    pub async fn check_permission(&self) -> Result<PermissionState, BackendError> {
        match self {
            NotificationChannel::NativeLocal { local, .. } => local.check_permission().await,
            NotificationChannel::NativePush { push, .. } => push.check_permission().await,
            NotificationChannel::BrowserDirect { display }
            | NotificationChannel::BrowserServiceWorker { display, .. } => {
                display.permission().await
            }
        }
    }

    pub async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        match self {
            NotificationChannel::NativeLocal { local, .. } => local.request_permission().await,
            NotificationChannel::NativePush { push, .. } => push.request_permission().await,
            NotificationChannel::BrowserDirect { display }
            | NotificationChannel::BrowserServiceWorker { display, .. } => {
                display.request_permission().await
            }
        }
    }

    /// Show a notification right now through the foreground mechanism.
    /// The service worker is tried first; the direct surface catches its failures.
    pub async fn present(
        &self,
        id: NotificationId,
        notification: &DisplayNotification,
    ) -> Result<(), BackendError> {
        match self {
            NotificationChannel::NativeLocal { local, .. } => {
                local
                    .schedule(LocalNotification {
                        id,
                        title: notification.title.clone(),
                        body: notification.body.clone(),
                        at: None,
                    })
                    .await
            }
            NotificationChannel::NativePush { display, .. }
            | NotificationChannel::BrowserDirect { display } => display.show(notification).await,
            NotificationChannel::BrowserServiceWorker { worker, display } => {
                if worker.is_active() {
                    match worker.show_notification(notification).await {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            warn!(error=%e, "service worker delivery failed; falling back to direct display");
                        }
                    }
                } else {
                    debug!("service worker inactive; using direct display");
                }
                display.show(notification).await
            }
        }
    }
}

/// Backends present in the running environment.
#[derive(Default, Clone)]
pub struct Capabilities {
    /// Running as a native app rather than inside a browser-like host.
    pub native: bool,
    pub local: Option<Arc<dyn LocalNotificationBackend>>,
    pub push: Option<Arc<dyn PushRegistrationBackend>>,
    pub display: Option<Arc<dyn DirectNotificationBackend>>,
    pub worker: Option<Arc<dyn ServiceWorkerBackend>>,
}

/// Pick the delivery path. Native local wins, then native push, then the
/// browser path (with service worker when one is registered).
/// `preferred` forces a specific variant.
pub fn select_channel(
    caps: Capabilities,
    preferred: Option<ChannelKind>,
) -> Result<NotificationChannel, NotifyError> {
    let Capabilities {
        native,
        local,
        push,
        display,
        worker,
    } = caps;

    let native_local = || -> Option<NotificationChannel> {
        Some(NotificationChannel::NativeLocal {
            local: local.clone()?,
            push: push.clone(),
        })
    };
    let native_push = || -> Option<NotificationChannel> {
        Some(NotificationChannel::NativePush {
            push: push.clone()?,
            display: display.clone()?,
        })
    };
    let browser_worker = || -> Option<NotificationChannel> {
        Some(NotificationChannel::BrowserServiceWorker {
            worker: worker.clone()?,
            display: display.clone()?,
        })
    };
    let browser_direct = || -> Option<NotificationChannel> {
        Some(NotificationChannel::BrowserDirect {
            display: display.clone()?,
        })
    };

    let selected = match preferred {
        Some(ChannelKind::NativeLocal) => native_local(),
        Some(ChannelKind::NativePush) => native_push(),
        Some(ChannelKind::BrowserServiceWorker) => browser_worker(),
        Some(ChannelKind::BrowserDirect) => browser_direct(),
        None => native
            .then(native_local)
            .flatten()
            .or_else(|| native.then(native_push).flatten())
            .or_else(browser_worker)
            .or_else(browser_direct),
    };

    selected.ok_or(NotifyError::UnsupportedEnvironment)
}

/// Build the concrete backends described by the config and select a channel.
pub fn detect(cfg: &ClientConfig) -> Result<NotificationChannel, NotifyError> {
    let desktop = Arc::new(desktop::DesktopNotifier::new(cfg.app_name.clone()));
    let display: Arc<dyn DirectNotificationBackend> = desktop.clone();

    let push: Option<Arc<dyn PushRegistrationBackend>> = cfg.push.as_ref().map(|p| {
        Arc::new(push::CloudMessaging::new(p, display.clone())) as Arc<dyn PushRegistrationBackend>
    });
    let worker: Option<Arc<dyn ServiceWorkerBackend>> = cfg
        .web_push
        .as_ref()
        .and_then(webpush::WebPushWorker::from_config)
        .map(|w| Arc::new(w) as Arc<dyn ServiceWorkerBackend>);

    let caps = Capabilities {
        native: cfg.native,
        local: Some(desktop as Arc<dyn LocalNotificationBackend>),
        push,
        display: Some(display),
        worker,
    };
    let channel = select_channel(caps, cfg.channel)?;
    info!(kind=%channel.kind(), push=channel.push().is_some(), "notification channel selected");
    Ok(channel)
}
