use async_trait::async_trait;
use chrono::Utc;
use namaz_shared::PermissionState;
use namaz_shared::api::DisplayNotification;
use tracing::{debug, info, warn};

use super::{BackendError, DirectNotificationBackend, LocalNotification, LocalNotificationBackend};

/// Desktop notifications through the platform notification server.
///
/// Serves both as the native scheduler (fire times are kept by tokio
/// timers inside this process) and as the direct display surface.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    appname: String,
}

impl DesktopNotifier {
    pub fn new(appname: impl Into<String>) -> Self {
        let s = Self {
            appname: appname.into(),
        };
        debug!(appname = %s.appname, "desktop notifier created");
        s
    }

    /// Desktops have no permission prompt: a reachable notification server
    /// counts as granted.
    async fn probe(&self) -> Result<PermissionState, BackendError> {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let info = tokio::task::spawn_blocking(|| {
                notify_rust::get_server_information().map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?
            .map_err(BackendError::Unavailable)?;
            debug!(server = %info.name, vendor = %info.vendor, "notification server reachable");
        }
        Ok(PermissionState::Granted)
    }

    async fn show_now(
        &self,
        id: Option<u32>,
        title: &str,
        body: &str,
    ) -> Result<(), BackendError> {
        debug!(?id, title, "showing desktop notification");
        let n = build_notification(&self.appname, id, title, body);
        deliver(n).await
    }
}

fn build_notification(
    appname: &str,
    id: Option<u32>,
    title: &str,
    body: &str,
) -> notify_rust::Notification {
    let mut n = notify_rust::Notification::new();
    n.appname(appname)
        .summary(title)
        .body(body)
        .timeout(notify_rust::Timeout::Never);
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        n.urgency(notify_rust::Urgency::Critical);
        if let Some(id) = id {
            n.id(id);
        }
    }
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    let _ = id;
    n
}

#[cfg(all(unix, not(target_os = "macos")))]
async fn deliver(n: notify_rust::Notification) -> Result<(), BackendError> {
    n.show_async()
        .await
        .map(|_| ())
        .map_err(|e| BackendError::Rejected(e.to_string()))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
async fn deliver(n: notify_rust::Notification) -> Result<(), BackendError> {
    tokio::task::spawn_blocking(move || n.show().map(|_| ()).map_err(|e| e.to_string()))
        .await
        .map_err(|e| BackendError::Unavailable(e.to_string()))?
        .map_err(BackendError::Rejected)
}

#[async_trait]
impl LocalNotificationBackend for DesktopNotifier {
    async fn check_permission(&self) -> Result<PermissionState, BackendError> {
        self.probe().await
    }

    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        self.probe().await
    }

    async fn schedule(&self, notification: LocalNotification) -> Result<(), BackendError> {
        let LocalNotification { id, title, body, at } = notification;
        let delay = at
            .and_then(|at| (at - Utc::now()).to_std().ok())
            .unwrap_or_default();
        if delay.is_zero() {
            return self.show_now(Some(id.0), &title, &body).await;
        }

        info!(%id, delay_secs = delay.as_secs(), "scheduling desktop notification");
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = this.show_now(Some(id.0), &title, &body).await {
                warn!(error=%e, %id, "scheduled desktop notification failed");
            }
        });
        Ok(())
    }
}

#[async_trait]
impl DirectNotificationBackend for DesktopNotifier {
    async fn permission(&self) -> Result<PermissionState, BackendError> {
        self.probe().await
    }

    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        self.probe().await
    }

    async fn show(&self, notification: &DisplayNotification) -> Result<(), BackendError> {
        self.show_now(None, &notification.title, &notification.body)
            .await
    }
}
