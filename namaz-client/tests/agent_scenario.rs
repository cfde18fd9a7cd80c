use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use namaz_client::app::agent::Session;
use namaz_client::notify::{NAMAZ_TITLE, NotificationCoordinator};
use namaz_client::platform::{
    BackendError, DirectNotificationBackend, LocalNotification, LocalNotificationBackend,
    NotificationChannel, PushRegistrationBackend,
};
use namaz_client::policy::FallbackPolicy;
use namaz_client::quotes::QuoteRotator;
use namaz_client::timer::CountdownTimer;
use namaz_shared::api::{DisplayNotification, PushEvent, PushMessage};
use namaz_shared::{DeliveryToken, PermissionState};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Screen {
    shown: Mutex<Vec<String>>,
}

impl Screen {
    fn titles(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectNotificationBackend for Screen {
    async fn permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Granted)
    }
    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Granted)
    }
    async fn show(&self, n: &DisplayNotification) -> Result<(), BackendError> {
        self.shown.lock().unwrap().push(n.title.clone());
        Ok(())
    }
}

struct Cloud {
    events: broadcast::Sender<PushEvent>,
    registrations: Mutex<u32>,
}

impl Cloud {
    fn new(events: broadcast::Sender<PushEvent>) -> Self {
        Self {
            events,
            registrations: Mutex::new(0),
        }
    }
}

/// Desktop-like scheduler: no prompt, always granted.
#[derive(Default)]
struct Scheduler {
    scheduled: Mutex<Vec<LocalNotification>>,
}

#[async_trait]
impl LocalNotificationBackend for Scheduler {
    async fn check_permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Granted)
    }
    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Granted)
    }
    async fn schedule(&self, n: LocalNotification) -> Result<(), BackendError> {
        self.scheduled.lock().unwrap().push(n);
        Ok(())
    }
}

#[async_trait]
impl PushRegistrationBackend for Cloud {
    async fn check_permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Unknown)
    }
    async fn request_permission(&self) -> Result<PermissionState, BackendError> {
        Ok(PermissionState::Granted)
    }
    async fn register(&self) -> Result<Option<DeliveryToken>, BackendError> {
        *self.registrations.lock().unwrap() += 1;
        Ok(Some(DeliveryToken::from("device-1")))
    }
    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }
}

fn session(channel: NotificationChannel, secs: u64) -> Session {
    Session::new(
        NotificationCoordinator::new(channel, FallbackPolicy::default()),
        CountdownTimer::new(secs),
        QuoteRotator::default(),
        Duration::from_secs(15),
    )
}

#[tokio::test(start_paused = true)]
async fn countdown_end_sends_exactly_one_reminder() {
    let screen = Arc::new(Screen::default());
    let channel = NotificationChannel::BrowserDirect {
        display: screen.clone(),
    };
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(session(channel, 3).run(cancel.child_token()));

    tokio::time::sleep(Duration::from_secs(6)).await;
    cancel.cancel();
    let ctx = handle.await.unwrap().unwrap();

    assert_eq!(screen.titles(), vec![NAMAZ_TITLE.to_string()]);
    assert_eq!(ctx.permission, PermissionState::Granted);
    assert!(ctx.token.is_none());
}

#[tokio::test(start_paused = true)]
async fn push_session_registers_and_surfaces_foreground_messages() {
    let (events, _keep) = broadcast::channel(8);
    let screen = Arc::new(Screen::default());
    let channel = NotificationChannel::NativePush {
        push: Arc::new(Cloud::new(events.clone())),
        display: screen.clone(),
    };
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(session(channel, 60).run(cancel.child_token()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    events
        .send(PushEvent::NotificationReceived {
            message: PushMessage::with_notification("Fajr", "Dawn prayer"),
        })
        .unwrap();
    events
        .send(PushEvent::Registration {
            token: DeliveryToken::from("device-2"),
        })
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    let ctx = handle.await.unwrap().unwrap();

    assert_eq!(screen.titles(), vec!["Fajr".to_string()]);
    assert_eq!(ctx.permission, PermissionState::Granted);
    assert_eq!(ctx.token.as_ref().map(|t| t.as_str()), Some("device-2"));
}

#[tokio::test(start_paused = true)]
async fn granted_native_session_still_registers_push() {
    let (events, _keep) = broadcast::channel(8);
    let cloud = Arc::new(Cloud::new(events));
    let scheduler = Arc::new(Scheduler::default());
    let channel = NotificationChannel::NativeLocal {
        local: scheduler.clone(),
        push: Some(cloud.clone()),
    };
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(session(channel, 60).run(cancel.child_token()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    cancel.cancel();
    let ctx = handle.await.unwrap().unwrap();

    assert_eq!(*cloud.registrations.lock().unwrap(), 1);
    assert_eq!(ctx.permission, PermissionState::Granted);
    assert_eq!(ctx.token.as_ref().map(|t| t.as_str()), Some("device-1"));
    assert!(scheduler.scheduled.lock().unwrap().is_empty());
}
