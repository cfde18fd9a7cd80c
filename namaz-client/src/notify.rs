use chrono::{DateTime, Utc};
use namaz_shared::api::{DisplayNotification, PushEvent, click_target};
use namaz_shared::{DeliveryToken, NotificationId, PermissionState, ReminderRequest};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::platform::{LocalNotification, NotificationChannel};
use crate::policy::FallbackPolicy;

pub const NAMAZ_TITLE: &str = "Namaz Time Reminder";
pub const NAMAZ_BODY: &str = "It's time for your prayer (Salah). May Allah accept your prayers.";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification permission not granted")]
    PermissionDenied,
    #[error("permission query failed: {0}")]
    PermissionQuery(String),
    #[error("push registration failed: {0}")]
    Registration(String),
    #[error("scheduling failed: {0}")]
    Scheduling(String),
    #[error("no notification mechanism available in this environment")]
    UnsupportedEnvironment,
}

/// Process-local notification state. Re-derived from the platform on each
/// start; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationContext {
    pub permission: PermissionState,
    pub token: Option<DeliveryToken>,
}

/// How a reminder left the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the native scheduler. `fire_at == None` means "now".
    Scheduled {
        id: NotificationId,
        fire_at: Option<DateTime<Utc>>,
    },
    /// Shown immediately through the foreground mechanism.
    Delivered,
    /// Held by an in-process timer; lost if the process exits first.
    Deferred { fire_at: DateTime<Utc> },
}

/// Time-based id without a collision check.
pub fn next_notification_id() -> NotificationId {
    NotificationId::from_millis(Utc::now().timestamp_millis())
}

/// Wall-clock time `delay_ms` from now, if representable.
fn fire_time(delay_ms: u64) -> Result<DateTime<Utc>, NotifyError> {
    i64::try_from(delay_ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .and_then(|delay| Utc::now().checked_add_signed(delay))
        .ok_or_else(|| NotifyError::Scheduling(format!("delay of {delay_ms} ms is out of range")))
}

/// Reconciles permission state with the selected delivery channel and
/// schedules reminders on it.
#[derive(Debug)]
pub struct NotificationCoordinator {
    channel: NotificationChannel,
    policy: FallbackPolicy,
    ctx: NotificationContext,
}

impl NotificationCoordinator {
    pub fn new(channel: NotificationChannel, policy: FallbackPolicy) -> Self {
        Self::with_context(channel, policy, NotificationContext::default())
    }

    pub fn with_context(
        channel: NotificationChannel,
        policy: FallbackPolicy,
        ctx: NotificationContext,
    ) -> Self {
        Self {
            channel,
            policy,
            ctx,
        }
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn context(&self) -> &NotificationContext {
        &self.ctx
    }

    pub fn into_context(self) -> NotificationContext {
        self.ctx
    }

    pub fn permission(&self) -> PermissionState {
        self.ctx.permission
    }

    pub fn token(&self) -> Option<&DeliveryToken> {
        self.ctx.token.as_ref()
    }

    /// Push events of the channel, if it has a push backend.
    pub fn subscribe_push(&self) -> Option<broadcast::Receiver<PushEvent>> {
        self.channel.push().map(|p| p.subscribe())
    }

    /// Query permission without prompting. Never fails: a broken query is
    /// resolved by the fallback policy.
    pub async fn check_permissions(&mut self) -> PermissionState {
        let state = match self.channel.check_permission().await {
            Ok(state) => state,
            Err(e) => self.recover(NotifyError::PermissionQuery(e.to_string())),
        };
        debug!(kind=%self.channel.kind(), %state, "permission checked");
        self.ctx.permission = state;
        state
    }

    /// Prompt for permission. On native channels a push registration follows
    /// a grant; its failure leaves the token unset but keeps the grant.
    pub async fn request_permissions(&mut self) -> bool {
        let needs_token = self.channel.is_native() && self.channel.push().is_some();
        if self.ctx.permission.is_granted() && (self.ctx.token.is_some() || !needs_token) {
            debug!("permission already granted; nothing to request");
            return true;
        }

        if !self.ctx.permission.is_granted() {
            let state = match self.channel.request_permission().await {
                Ok(state) => state,
                Err(e) => self.recover(NotifyError::PermissionQuery(e.to_string())),
            };
            info!(kind=%self.channel.kind(), %state, "permission requested");
            self.ctx.permission = state;
        }

        if self.ctx.permission.is_granted() && needs_token && self.ctx.token.is_none() {
            self.register_push().await;
        }
        self.ctx.permission.is_granted()
    }

    fn recover(&self, err: NotifyError) -> PermissionState {
        let state = self.policy.on_query_failure(self.channel.is_native());
        warn!(error=%err, kind=%self.channel.kind(), fallback=%state, "permission query failed; applying fallback policy");
        state
    }

    async fn register_push(&mut self) {
        let Some(push) = self.channel.push() else {
            return;
        };
        let err = match push.register().await {
            Ok(Some(token)) => {
                info!("push: delivery token obtained");
                self.ctx.token = Some(token);
                return;
            }
            Ok(None) => NotifyError::Registration("no registration token available".into()),
            Err(e) => NotifyError::Registration(e.to_string()),
        };
        warn!(error=%err, "push registration failed; continuing without a token");
    }

    pub async fn schedule_notification(
        &self,
        title: &str,
        body: &str,
        delay_ms: u64,
    ) -> Result<Delivery, NotifyError> {
        self.schedule(ReminderRequest::new(title, body, delay_ms))
            .await
    }

    pub async fn schedule(&self, req: ReminderRequest) -> Result<Delivery, NotifyError> {
        if !self.ctx.permission.is_granted() {
            return Err(NotifyError::PermissionDenied);
        }

        let id = next_notification_id();
        if let Some(local) = self.channel.local() {
            let fire_at = if req.is_immediate() {
                None
            } else {
                Some(fire_time(req.delay_ms)?)
            };
            local
                .schedule(LocalNotification {
                    id,
                    title: req.title,
                    body: req.body,
                    at: fire_at,
                })
                .await
                .map_err(|e| NotifyError::Scheduling(e.to_string()))?;
            info!(%id, ?fire_at, "reminder scheduled");
            return Ok(Delivery::Scheduled { id, fire_at });
        }

        let shown = DisplayNotification::new(req.title.clone(), req.body.clone());
        if req.is_immediate() {
            self.channel
                .present(id, &shown)
                .await
                .map_err(|e| NotifyError::Scheduling(e.to_string()))?;
            info!(kind=%self.channel.kind(), "reminder delivered");
            return Ok(Delivery::Delivered);
        }

        let delay = req.delay();
        let fire_at = fire_time(req.delay_ms)?;
        let channel = self.channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match channel.present(id, &shown).await {
                Ok(()) => info!(%id, "deferred reminder delivered"),
                Err(e) => warn!(error=%e, %id, "deferred reminder failed"),
            }
        });
        info!(%id, %fire_at, "reminder deferred in-process");
        Ok(Delivery::Deferred { fire_at })
    }

    pub async fn schedule_namaz_reminder(&self, delay_minutes: u64) -> Result<Delivery, NotifyError> {
        let delay_ms = delay_minutes.saturating_mul(60 * 1000);
        self.schedule_notification(NAMAZ_TITLE, NAMAZ_BODY, delay_ms)
            .await
    }

    /// React to an event from the push service while the app is active.
    pub async fn handle_push_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::Registration { token } => {
                if self.ctx.token.as_ref() != Some(&token) {
                    info!("push: delivery token (re)issued");
                    self.ctx.token = Some(token);
                }
            }
            PushEvent::RegistrationError { error } => {
                let err = NotifyError::Registration(error);
                warn!(error=%err, "push: registration error reported");
            }
            PushEvent::NotificationReceived { message } => {
                let shown = DisplayNotification::from_push(&message);
                debug!(title=%shown.title, "push: foreground message received");
                if let Err(e) = self.channel.present(next_notification_id(), &shown).await {
                    warn!(error=%e, "push: failed to surface foreground message");
                }
            }
            PushEvent::ActionPerformed { action_id, .. } => {
                info!(action=%action_id, target=?click_target(Some(action_id.as_str())), "push: notification action performed");
            }
        }
    }
}
