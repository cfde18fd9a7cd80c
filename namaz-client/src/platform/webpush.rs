use async_trait::async_trait;
use namaz_shared::api::DisplayNotification;
use tracing::{info, warn};
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

use super::{BackendError, ServiceWorkerBackend};
use crate::config::WebPushConfig;

/// Hands notifications to a browser's service worker through Web Push.
/// The worker turns the payload into a system notification.
pub struct WebPushWorker {
    client: HyperWebPushClient,
    subscription: SubscriptionInfo,
    vapid_private: String,
    contact: Option<String>,
}

impl WebPushWorker {
    pub fn from_config(cfg: &WebPushConfig) -> Option<Self> {
        if cfg.endpoint.trim().is_empty()
            || cfg.p256dh.trim().is_empty()
            || cfg.auth.trim().is_empty()
        {
            warn!("web push: incomplete subscription; service worker disabled");
            return None;
        }
        if cfg.vapid_private.trim().is_empty() {
            warn!("web push: missing VAPID private key; service worker disabled");
            return None;
        }

        Some(Self {
            client: HyperWebPushClient::new(),
            subscription: SubscriptionInfo::new(
                cfg.endpoint.clone(),
                cfg.p256dh.clone(),
                cfg.auth.clone(),
            ),
            vapid_private: cfg.vapid_private.clone(),
            contact: cfg.contact.clone(),
        })
    }
}

#[async_trait]
impl ServiceWorkerBackend for WebPushWorker {
    fn is_active(&self) -> bool {
        true
    }

    async fn show_notification(
        &self,
        notification: &DisplayNotification,
    ) -> Result<(), BackendError> {
        let endpoint = &self.subscription.endpoint;
        let payload = serde_json::to_vec(&notification.to_push())
            .map_err(|e| BackendError::Rejected(e.to_string()))?;

        let mut builder = WebPushMessageBuilder::new(&self.subscription);
        builder.set_payload(ContentEncoding::Aes128Gcm, &payload);

        let mut vapid = VapidSignatureBuilder::from_base64(&self.vapid_private, &self.subscription)
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        if let Some(contact) = &self.contact {
            vapid.add_claim("sub", contact.clone());
        }
        let signature = vapid
            .build()
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        builder.set_vapid_signature(signature);

        let message = builder
            .build()
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        match self.client.send(message).await {
            Ok(()) => {
                info!(endpoint = %endpoint, "web push: delivered");
                Ok(())
            }
            Err(err @ (WebPushError::EndpointNotFound(_) | WebPushError::EndpointNotValid(_))) => {
                warn!(endpoint = %endpoint, error = %err, "web push: subscription is gone");
                Err(BackendError::Unavailable(err.to_string()))
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "web push: send failed");
                Err(BackendError::Http(err.to_string()))
            }
        }
    }
}
