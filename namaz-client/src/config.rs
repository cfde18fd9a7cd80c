use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppError;
use crate::platform::ChannelKind;
use crate::policy::FallbackPolicy;

pub const ENV_CONFIG: &str = "NAMAZ_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Countdown length for the agent.
    #[serde(default = "default_minutes")]
    pub timer_minutes: u64,
    /// Default delay for `remind`.
    #[serde(default = "default_minutes")]
    pub reminder_minutes: u64,
    #[serde(default = "default_quote_interval")]
    pub quote_interval_secs: u64,
    /// Force a delivery channel. Without it the best available one is picked.
    #[serde(default)]
    pub channel: Option<ChannelKind>,
    /// Running as a native app. `false` selects the browser paths.
    #[serde(default = "default_native")]
    pub native: bool,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(default)]
    pub push: Option<PushConfig>,
    #[serde(default)]
    pub web_push: Option<WebPushConfig>,
}

/// Cloud-messaging service used for push registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub endpoint: String,
    /// VAPID public key of the deployment.
    pub vapid_key: String,
    /// Stable id for this installation; generated per run when absent.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Browser push subscription of a service worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPushConfig {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub vapid_private: String,
    #[serde(default)]
    pub contact: Option<String>,
}

fn default_app_name() -> String {
    "Namaz Time Reminder".to_string()
}

fn default_minutes() -> u64 {
    10
}

fn default_quote_interval() -> u64 {
    15
}

fn default_native() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            timer_minutes: default_minutes(),
            reminder_minutes: default_minutes(),
            quote_interval_secs: default_quote_interval(),
            channel: None,
            native: default_native(),
            fallback: FallbackPolicy::default(),
            push: None,
            web_push: None,
        }
    }
}

impl ClientConfig {
    /// Resolve the config path and load it. A missing file yields defaults.
    pub fn find_and_load(cli_value: Option<PathBuf>) -> Result<(PathBuf, ClientConfig), AppError> {
        let path = resolve_config_path(cli_value)?;
        if !path.exists() {
            info!(path=%path.display(), "config file not found; using defaults");
            return Ok((path, ClientConfig::default()));
        }
        let cfg = load_config(&path)?;
        Ok((path, cfg))
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.quote_interval_secs == 0 {
            return Err(AppError::Config("quote_interval_secs must be positive".into()));
        }
        if let Some(push) = &self.push {
            url::Url::parse(&normalize_url(&push.endpoint))
                .map_err(|e| AppError::Config(format!("invalid push.endpoint: {e}")))?;
            if push.vapid_key.trim().is_empty() {
                return Err(AppError::Config("push.vapid_key is empty".into()));
            }
        }
        Ok(())
    }
}

pub fn resolve_config_path(cli_value: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(p) = cli_value {
        return Ok(p);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(p));
    }
    default_config_path().ok_or_else(|| AppError::Config("could not determine config dir".into()))
}

pub fn default_config_path() -> Option<PathBuf> {
    let pd = ProjectDirs::from("app", "namaz", "namaz-reminder")?;
    Some(pd.config_dir().join("client.yaml"))
}

pub fn load_config(path: &Path) -> Result<ClientConfig, AppError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("read {} failed: {e}", path.display())))?;
    let cfg: ClientConfig = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("parse {} failed: {e}", path.display())))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &ClientConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)
        .map_err(|e| AppError::Config(format!("serialize config failed: {e}")))?;
    std::fs::write(path, data)
        .map_err(|e| AppError::Config(format!("write {} failed: {e}", path.display())))
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", trimmed.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namaz_shared::PermissionState;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: ClientConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.timer_minutes, 10);
        assert_eq!(cfg.reminder_minutes, 10);
        assert_eq!(cfg.quote_interval_secs, 15);
        assert!(cfg.native);
        assert!(cfg.channel.is_none());
        assert_eq!(cfg.fallback, FallbackPolicy::default());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
timer_minutes: 5
channel: browser-service-worker
native: false
fallback:
  native_on_error: denied
push:
  endpoint: push.example.org/
  vapid_key: BPueU
web_push:
  endpoint: https://fcm.googleapis.com/fcm/send/abc
  p256dh: key
  auth: secret
  vapid_private: private
"#;
        let cfg: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.timer_minutes, 5);
        assert_eq!(cfg.channel, Some(ChannelKind::BrowserServiceWorker));
        assert!(!cfg.native);
        assert_eq!(cfg.fallback.native_on_error, PermissionState::Denied);
        assert_eq!(cfg.fallback.browser_on_error, PermissionState::Denied);
        assert_eq!(cfg.push.as_ref().map(|p| p.device_id.is_none()), Some(true));
        assert!(cfg.web_push.is_some());
    }

    #[test]
    fn rejects_empty_vapid_key() {
        let yaml = "push:\n  endpoint: https://push.example.org\n  vapid_key: ' '\n";
        let cfg: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.yaml");
        let cfg = ClientConfig {
            timer_minutes: 3,
            ..ClientConfig::default()
        };
        save_config(&path, &cfg).unwrap();
        let (found, loaded) = ClientConfig::find_and_load(Some(path.clone())).unwrap();
        assert_eq!(found, path);
        assert_eq!(loaded.timer_minutes, 3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (_, cfg) = ClientConfig::find_and_load(Some(dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(cfg.timer_minutes, 10);
    }

    #[test]
    fn normalizes_urls() {
        assert_eq!(normalize_url("push.example.org/"), "https://push.example.org");
        assert_eq!(normalize_url(" http://localhost:8080/ "), "http://localhost:8080");
    }
}
