use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{self, ClientConfig};
use crate::notify::{Delivery, NotificationCoordinator, NotifyError};
use crate::quotes::QuoteRotator;
use crate::{AppError, platform};

/// Extra time to stay alive after a reminder's fire time.
const FIRE_GRACE: Duration = Duration::from_secs(2);

/// Select the channel and make sure we may notify, prompting if needed.
async fn prepare(cfg: &ClientConfig) -> Result<NotificationCoordinator, AppError> {
    let channel = platform::detect(cfg)?;
    let mut c = NotificationCoordinator::new(channel, cfg.fallback);
    c.check_permissions().await;
    if !c.request_permissions().await {
        println!("Permission required: please allow notifications to receive prayer reminders.");
        return Err(NotifyError::PermissionDenied.into());
    }
    Ok(c)
}

pub async fn remind(cfg: &ClientConfig, minutes: Option<u64>) -> Result<(), AppError> {
    let minutes = minutes.unwrap_or(cfg.reminder_minutes);
    let coordinator = prepare(cfg).await?;
    let delivery = coordinator.schedule_namaz_reminder(minutes).await?;
    match &delivery {
        Delivery::Delivered | Delivery::Scheduled { fire_at: None, .. } => {
            println!("Prayer notification sent. May Allah accept your prayers.");
        }
        Delivery::Scheduled {
            fire_at: Some(at), ..
        }
        | Delivery::Deferred { fire_at: at } => {
            println!("Prayer reminder set: you will be notified in {minutes} min ({at}).");
            wait_until(*at).await;
        }
    }
    Ok(())
}

pub async fn notify(cfg: &ClientConfig) -> Result<(), AppError> {
    remind(cfg, Some(0)).await
}

/// Reminders live in this process; keep it up until they have fired.
async fn wait_until(at: DateTime<Utc>) {
    let left = (at - Utc::now()).to_std().unwrap_or_default() + FIRE_GRACE;
    info!(wait_secs = left.as_secs(), "waiting for reminder to fire");
    tokio::select! {
        _ = tokio::time::sleep(left) => {}
        _ = super::shutdown_signal() => {
            warn!("interrupted; the pending reminder is dropped");
        }
    }
}

pub async fn status(cfg: &ClientConfig) -> Result<(), AppError> {
    let channel = platform::detect(cfg)?;
    let mut c = NotificationCoordinator::new(channel, cfg.fallback);
    let state = c.check_permissions().await;
    println!("channel:    {}", c.channel().kind());
    println!("permission: {}", state);
    println!(
        "push:       {}",
        if c.channel().push().is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}

pub fn quote(cfg: &ClientConfig) {
    let slot = Utc::now().timestamp().max(0) as u64 / cfg.quote_interval_secs.max(1);
    let rotator = QuoteRotator::default().starting_at(slot as usize);
    if let Some(h) = rotator.current() {
        println!("{}\n  - {}", h.text, h.source);
    }
}

pub fn init(path: &Path, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(AppError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config::save_config(path, &ClientConfig::default())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.yaml");
        init(&path, false).unwrap();
        assert!(matches!(init(&path, false), Err(AppError::Config(_))));
        init(&path, true).unwrap();
        let cfg = config::load_config(&path).unwrap();
        assert_eq!(cfg.reminder_minutes, 10);
    }
}
