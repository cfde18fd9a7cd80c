use tracing::info;

pub mod app;
pub mod cli;
pub mod config;
pub mod notify;
pub mod platform;
pub mod policy;
pub mod quotes;
pub mod timer;

pub use cli::{Cli, Command};
pub use config::{ClientConfig, load_config, resolve_config_path};
pub use notify::{NotificationCoordinator, NotifyError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task error: {0}")]
    Task(String),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing();

    if let Some(Command::Init { force }) = cli.command {
        let path = resolve_config_path(cli.config)?;
        return app::commands::init(&path, force);
    }

    let (cfg_path, cfg) = ClientConfig::find_and_load(cli.config)?;
    info!(path=%cfg_path.display(), "loaded config");

    match cli.command {
        None => app::agent::run(cfg, None).await,
        Some(Command::Run { minutes }) => app::agent::run(cfg, minutes).await,
        Some(Command::Remind { minutes }) => app::commands::remind(&cfg, minutes).await,
        Some(Command::Notify) => app::commands::notify(&cfg).await,
        Some(Command::Status) => app::commands::status(&cfg).await,
        Some(Command::Quote) => {
            app::commands::quote(&cfg);
            Ok(())
        }
        Some(Command::Init { .. }) => Ok(()),
    }
}
