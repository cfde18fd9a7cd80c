use std::time::Duration;

use namaz_shared::api::PushEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::notify::{NotificationContext, NotificationCoordinator};
use crate::quotes::QuoteRotator;
use crate::timer::{CountdownClock, CountdownTimer, Tick};
use crate::{AppError, platform};

/// Entry point for the interactive countdown agent.
pub async fn run(cfg: ClientConfig, minutes: Option<u64>) -> Result<(), AppError> {
    let channel = platform::detect(&cfg)?;
    let coordinator = NotificationCoordinator::new(channel, cfg.fallback);
    let minutes = minutes.unwrap_or(cfg.timer_minutes);
    let session = Session::new(
        coordinator,
        CountdownTimer::from_minutes(minutes),
        QuoteRotator::default(),
        Duration::from_secs(cfg.quote_interval_secs),
    );

    let cancel = CancellationToken::new();
    let cancel_child = cancel.child_token();
    let mut handle = tokio::spawn(session.run(cancel_child));

    tokio::select! {
        _ = super::shutdown_signal() => {
            info!("shutdown signal received; stopping agent");
            cancel.cancel();
        }
        res = &mut handle => {
            info!("agent finished");
            return match res {
                Ok(r) => r.map(|_| ()),
                Err(e) => Err(AppError::Task(e.to_string())),
            };
        }
    }

    match tokio::time::timeout(Duration::from_secs(3), handle).await {
        Ok(Ok(res)) => res.map(|_| ()),
        Ok(Err(e)) => Err(AppError::Task(e.to_string())),
        Err(_) => {
            warn!("agent did not stop in time");
            Ok(())
        }
    }
}

/// One countdown session: the timer, the coordinator that reminds when it
/// ends, the quote rotation and the push listener, driven by a single loop.
pub struct Session {
    coordinator: NotificationCoordinator,
    clock: CountdownClock,
    quotes: QuoteRotator,
    quote_interval: Duration,
}

impl Session {
    pub fn new(
        coordinator: NotificationCoordinator,
        timer: CountdownTimer,
        quotes: QuoteRotator,
        quote_interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            clock: CountdownClock::new(timer),
            quotes,
            quote_interval,
        }
    }

    /// Runs until cancelled; returns the notification state it ended with.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<NotificationContext, AppError> {
        let state = self.coordinator.check_permissions().await;
        info!(kind=%self.coordinator.channel().kind(), %state, "notification permission");
        if !self.coordinator.request_permissions().await {
            warn!("notifications not permitted; countdown will run without a reminder");
        }
        let mut push_rx = self.coordinator.subscribe_push();

        if let Some(q) = self.quotes.current() {
            info!(quote=%q, "hadith");
        }
        let mut quote_tick = tokio::time::interval_at(
            tokio::time::Instant::now() + self.quote_interval,
            self.quote_interval,
        );

        self.clock.start();
        info!(
            remaining=%self.clock.timer().formatted(),
            "prayer countdown started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                tick = self.clock.next_tick() => self.on_tick(tick).await,
                _ = quote_tick.tick() => {
                    if let Some(&q) = self.quotes.advance() {
                        let (index, total) = self.quotes.position();
                        info!(quote=%q, n = index + 1, total, "hadith");
                    }
                }
                ev = next_push(&mut push_rx) => match ev {
                    Some(ev) => self.coordinator.handle_push_event(ev).await,
                    None => {
                        debug!("push event stream closed");
                        push_rx = None;
                    }
                },
            }
        }

        self.clock.reset();
        Ok(self.coordinator.into_context())
    }

    async fn on_tick(&mut self, tick: Tick) {
        let timer = self.clock.timer();
        match tick {
            Tick::Idle => {}
            Tick::Counting(remaining) => {
                if remaining % 60 == 0 || remaining <= 10 {
                    info!(
                        remaining=%timer.formatted(),
                        progress = timer.progress().round() as u64,
                        "countdown"
                    );
                } else {
                    debug!(remaining=%timer.formatted(), "countdown");
                }
            }
            Tick::Completed => {
                info!("time for prayer");
                if let Err(e) = self.coordinator.schedule_namaz_reminder(0).await {
                    warn!(error=%e, "failed to send prayer reminder");
                }
            }
        }
    }
}

async fn next_push(rx: &mut Option<broadcast::Receiver<PushEvent>>) -> Option<PushEvent> {
    let Some(rx) = rx.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(ev) => return Some(ev),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed=%n, "push listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
