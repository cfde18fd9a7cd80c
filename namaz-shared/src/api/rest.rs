//! Minimal REST client helpers for the cloud-messaging service.

use super::endpoints as ep;
use super::*;
use once_cell::sync::OnceCell;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

fn mk_client() -> Result<reqwest::Client, RestError> {
    HTTP_CLIENT
        .get_or_try_init(|| {
            reqwest::Client::builder()
                .tcp_keepalive(Some(Duration::from_secs(180)))
                .pool_max_idle_per_host(4)
                .pool_idle_timeout(Duration::from_secs(180))
                .connect_timeout(Duration::from_secs(30))
                .build()
        })
        .cloned()
        .map_err(|e| RestError::Http(e.to_string()))
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res)
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    ensure_success(res)
        .await?
        .json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

/// Exchange the VAPID public key for a delivery token.
pub async fn register(base: &str, req: &RegistrationReq) -> Result<RegistrationResp, RestError> {
    let client = mk_client()?;
    let url = ep::registrations(base);
    let res = client
        .post(url)
        .timeout(Duration::from_secs(30))
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

/// Open the server-sent event stream carrying `PushEvent`s for a token.
/// The caller consumes the body as a byte stream.
pub async fn device_events(base: &str, token: &DeliveryToken) -> Result<reqwest::Response, RestError> {
    let client = mk_client()?;
    let url = ep::device_events(base, token.as_str());
    let res = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    ensure_success(res).await
}
