//! aro-watch - affordable rental availability monitor
//!
//! Periodically fetches a floorplans page, detects when the monitored listing
//! becomes available, and sends e-mail and SMS notifications.

pub mod config;
pub mod email;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod io;
pub mod logging;
pub mod monitor;
pub mod notifier;
pub mod runner;
pub mod schedule;
pub mod sms;
pub mod state;
pub mod status;

pub use config::{load_config, Config};
pub use error::{Result, WatchError};

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::email::EmailNotifier;
use crate::extractor::ListingExtractor;
use crate::fetcher::PageFetcher;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::monitor::AvailabilityResult;
use crate::notifier::Notifier;
use crate::runner::{CycleOutcome, Runner};
use crate::schedule::Ticker;
use crate::sms::SmsNotifier;
use crate::state::{FileStateStore, StateStore};

/// Assembles a [`Watcher`] from configuration, with optional injected parts
pub struct WatcherBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    store: Option<Arc<dyn StateStore>>,
    ticker: Option<Box<dyn Ticker>>,
    cancel: Option<CancellationToken>,
}

impl WatcherBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            notifiers: None,
            store: None,
            ticker: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the configured channels
    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_ticker(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker = Some(ticker);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn configured_notifiers(
        config: &Config,
        http: &Arc<dyn HttpClient>,
    ) -> Result<Vec<Arc<dyn Notifier>>> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

        match EmailNotifier::from_config(&config.notifications.email)? {
            Some(email) => notifiers.push(Arc::new(email)),
            None => tracing::warn!("E-mail notifications disabled: channel off or incomplete"),
        }
        match SmsNotifier::from_config(&config.notifications.sms, Arc::clone(http)) {
            Some(sms) => notifiers.push(Arc::new(sms)),
            None => tracing::warn!("SMS notifications disabled: channel off or incomplete"),
        }

        Ok(notifiers)
    }

    pub fn build(self) -> Result<Watcher> {
        self.config.validate()?;

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::new(
                &self.config.target.user_agent,
                self.config.target.timeout,
            )?),
        };
        let notifiers = match self.notifiers {
            Some(notifiers) => notifiers,
            None => Self::configured_notifiers(&self.config, &http)?,
        };
        if notifiers.is_empty() {
            tracing::warn!("No notification channel is active; changes will only be logged");
        }

        let store: Arc<dyn StateStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStateStore::new(&self.config.state.path)),
        };
        let state = store.load()?;
        tracing::debug!(
            "Loaded state from {} (last available: {:?})",
            store.location(),
            state.last_available()
        );

        let runner = Runner::new(
            PageFetcher::new(&self.config.target.url, http),
            ListingExtractor::new(&self.config.listing)?,
            notifiers,
            store,
            state,
            self.config.schedule.reminder_interval,
            self.config.schedule.alert_after_failures,
        );

        Ok(Watcher {
            runner,
            config: self.config,
            ticker: self.ticker,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A ready-to-run monitor
pub struct Watcher {
    runner: Runner,
    config: Config,
    ticker: Option<Box<dyn Ticker>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("runner", &self.runner)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// One full cycle now
    pub async fn check(&mut self) -> CycleOutcome {
        self.runner.run_cycle(Utc::now()).await
    }

    /// Fetch and parse only
    pub async fn probe(&self) -> Result<AvailabilityResult> {
        self.runner.probe(Utc::now()).await
    }

    /// Run on the schedule until cancelled
    pub async fn start(mut self) -> Result<()> {
        let mut ticker = match self.ticker.take() {
            Some(ticker) => ticker,
            None => schedule::from_config(&self.config.schedule)?,
        };

        tracing::info!(
            "Watching '{}' at {} ({})",
            self.config.listing.name,
            self.config.target.url,
            self.config.schedule.describe()
        );
        self.runner.run(ticker.as_mut(), self.cancel.clone()).await;
        tracing::info!("Watcher stopped");

        Ok(())
    }
}
