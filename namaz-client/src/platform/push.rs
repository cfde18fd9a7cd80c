use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use namaz_shared::api::{PushEvent, RegistrationReq, rest};
use namaz_shared::{DeliveryToken, PermissionState};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BackendError, DirectNotificationBackend, PushRegistrationBackend};
use crate::config::PushConfig;

const EVENT_BUFFER: usize = 32;
const MAX_BACKOFF_SECS: u64 = 30;

/// Cloud-messaging client: exchanges the VAPID key for a delivery token and
/// listens for push events on the service's event stream while we run.
pub struct CloudMessaging {
    endpoint: String,
    vapid_key: String,
    device_id: String,
    /// Permission for push follows the display surface it ends up on.
    display: Arc<dyn DirectNotificationBackend>,
    events: broadcast::Sender<PushEvent>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl CloudMessaging {
    pub fn new(cfg: &PushConfig, display: Arc<dyn DirectNotificationBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let device_id = cfg
            .device_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            endpoint: crate::config::normalize_url(&cfg.endpoint),
            vapid_key: cfg.vapid_key.clone(),
            device_id,
            display,
            events,
            listener: Mutex::new(None),
        }
    }

    fn emit(&self, event: PushEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// (Re)start the event stream for `token`, replacing any previous listener.
    fn listen(&self, token: DeliveryToken) {
        let handle = spawn_event_listener(self.endpoint.clone(), token, self.events.clone());
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(old) = slot.replace(handle) {
                old.abort();
            }
        }
    }
}

impl Drop for CloudMessaging {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(h) = slot.take() {
                h.abort();
            }
        }
    }
}

#[async_trait]
impl PushRegistrationBackend for CloudMessaging {
    async fn check_permission(&self) -> Result<PermissionState, BackendError> {
        self.display.permission().await
    }

    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        self.display.request_permission().await
    }

    async fn register(&self) -> Result<Option<DeliveryToken>, BackendError> {
        let req = RegistrationReq {
            vapid_key: self.vapid_key.clone(),
            device_id: self.device_id.clone(),
        };
        match rest::register(&self.endpoint, &req).await {
            Ok(resp) => {
                let Some(token) = resp.token else {
                    debug!("push: service answered without a token");
                    return Ok(None);
                };
                info!("push: registration succeeded");
                self.emit(PushEvent::Registration {
                    token: token.clone(),
                });
                self.listen(token.clone());
                Ok(Some(token))
            }
            Err(e) => {
                self.emit(PushEvent::RegistrationError {
                    error: e.to_string(),
                });
                Err(BackendError::Http(e.to_string()))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }
}

fn spawn_event_listener(
    endpoint: String,
    token: DeliveryToken,
    events: broadcast::Sender<PushEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff_secs = 1u64;
        loop {
            match rest::device_events(&endpoint, &token).await {
                Ok(resp) => {
                    info!("push: event stream connected");
                    backoff_secs = 1;
                    let mut stream = resp.bytes_stream().eventsource();
                    while let Some(ev) = stream.next().await {
                        match ev {
                            Ok(msg) if msg.data.is_empty() => {}
                            Ok(msg) => match serde_json::from_str::<PushEvent>(&msg.data) {
                                Ok(event) => {
                                    let _ = events.send(event);
                                }
                                Err(e) => {
                                    debug!(error=%e, kind=%msg.event, "push: ignoring unparsable event");
                                }
                            },
                            Err(e) => {
                                warn!(error=%e, "push: event stream read error");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error=%e, "push: event stream connect failed");
                }
            }
            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            backoff_secs = std::cmp::min(backoff_secs * 2, MAX_BACKOFF_SECS);
        }
    })
}
