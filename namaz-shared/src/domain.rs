use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether the user allowed notifications on a delivery path.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Unknown => "unknown",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// Opaque token a cloud-messaging service issues for this client instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryToken(pub String);

impl DeliveryToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DeliveryToken {
    fn from(value: &str) -> Self {
        DeliveryToken(value.to_string())
    }
}

/// Identifier of a scheduled notification. Derived from wall-clock time,
/// so two reminders created in the same millisecond may collide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u32);

impl NotificationId {
    pub fn from_millis(epoch_millis: i64) -> Self {
        NotificationId((epoch_millis & 0x7fff_ffff) as u32)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One reminder to deliver through exactly one delivery path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub delay_ms: u64,
}

impl ReminderRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn is_immediate(&self) -> bool {
        self.delay_ms == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_id_stays_positive() {
        let id = NotificationId::from_millis(i64::MAX);
        assert!(id.0 <= i32::MAX as u32);
        assert_eq!(NotificationId::from_millis(1_234).0, 1_234);
    }

    #[test]
    fn zero_delay_is_immediate() {
        let req = ReminderRequest::new("t", "b", 0);
        assert!(req.is_immediate());
        assert_eq!(ReminderRequest::new("t", "b", 1500).delay(), Duration::from_millis(1500));
    }
}
