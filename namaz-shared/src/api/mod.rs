use serde::{Deserialize, Serialize};

use crate::domain::DeliveryToken;

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_V1_PREFIX: &str = "/v1";

pub const DEFAULT_PUSH_TITLE: &str = "Namaz Reminder";
pub const DEFAULT_PUSH_BODY: &str = "Time for prayer";
pub const NOTIFICATION_ICON: &str = "/favicon.ico";
pub const NOTIFICATION_TAG: &str = "namaz-reminder";
pub const OPEN_ACTION: &str = "open";
pub const APP_ROOT: &str = "/";

// Token registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationReq {
    pub vapid_key: String,
    pub device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResp {
    pub token: Option<DeliveryToken>,
}

// Push payload as sent by the messaging service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub notification: Option<PushNotification>,
    #[serde(default)]
    pub data: std::collections::BTreeMap<String, String>,
}

impl PushMessage {
    pub fn with_notification(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            notification: Some(PushNotification {
                title: Some(title.into()),
                body: Some(body.into()),
            }),
            data: Default::default(),
        }
    }
}

/// Events emitted by the push-registration service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    Registration { token: DeliveryToken },
    RegistrationError { error: String },
    NotificationReceived { message: PushMessage },
    ActionPerformed {
        action_id: String,
        #[serde(default)]
        message: Option<PushMessage>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// What a service worker renders for an incoming push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

impl DisplayNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            tag: NOTIFICATION_TAG.to_string(),
            require_interaction: true,
            actions: vec![NotificationAction {
                action: OPEN_ACTION.to_string(),
                title: "Open App".to_string(),
            }],
        }
    }

    pub fn from_push(msg: &PushMessage) -> Self {
        let n = msg.notification.clone().unwrap_or_default();
        Self::new(
            n.title.unwrap_or_else(|| DEFAULT_PUSH_TITLE.to_string()),
            n.body.unwrap_or_else(|| DEFAULT_PUSH_BODY.to_string()),
        )
    }

    /// Payload a service worker receives for this notification.
    pub fn to_push(&self) -> PushMessage {
        PushMessage::with_notification(self.title.clone(), self.body.clone())
    }
}

/// Where a click on a displayed notification should lead.
/// `None` means the click only closes the notification.
pub fn click_target(action: Option<&str>) -> Option<&'static str> {
    match action {
        None | Some("") | Some(OPEN_ACTION) => Some(APP_ROOT),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let shown = DisplayNotification::from_push(&PushMessage::default());
        assert_eq!(shown.title, DEFAULT_PUSH_TITLE);
        assert_eq!(shown.body, DEFAULT_PUSH_BODY);
        assert_eq!(shown.tag, NOTIFICATION_TAG);
        assert!(shown.require_interaction);
        assert_eq!(shown.actions.len(), 1);
        assert_eq!(shown.actions[0].action, OPEN_ACTION);
    }

    #[test]
    fn payload_fields_win_over_defaults() {
        let msg = PushMessage {
            notification: Some(PushNotification {
                title: Some("Asr".into()),
                body: None,
            }),
            data: Default::default(),
        };
        let shown = DisplayNotification::from_push(&msg);
        assert_eq!(shown.title, "Asr");
        assert_eq!(shown.body, DEFAULT_PUSH_BODY);
    }

    #[test]
    fn click_opens_app_only_for_open_or_body_click() {
        assert_eq!(click_target(None), Some("/"));
        assert_eq!(click_target(Some("open")), Some("/"));
        assert_eq!(click_target(Some("dismiss")), None);
    }

    #[test]
    fn push_event_wire_format() {
        let raw = r#"{"type":"notification_received","message":{"notification":{"title":"Fajr"}}}"#;
        let ev: PushEvent = serde_json::from_str(raw).unwrap();
        match ev {
            PushEvent::NotificationReceived { message } => {
                assert_eq!(
                    message.notification.and_then(|n| n.title).as_deref(),
                    Some("Fajr")
                );
            }
            other => panic!("unexpected event {other:?}"),
        }

        let raw = r#"{"type":"registration","token":"abc"}"#;
        let ev: PushEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            ev,
            PushEvent::Registration {
                token: DeliveryToken::from("abc")
            }
        );
    }
}
