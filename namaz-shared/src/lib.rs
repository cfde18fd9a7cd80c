//! Types shared between the reminder agent and the push side: the domain
//! vocabulary, the push payload, and the cloud-messaging REST helpers.

pub mod api;
pub mod domain;

pub use domain::{DeliveryToken, NotificationId, PermissionState, ReminderRequest};
