//! Runner: drives fetch, parse, compare and notify cycles

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::extractor::ListingExtractor;
use crate::fetcher::PageFetcher;
use crate::monitor::{AvailabilityResult, Transition};
use crate::notifier::{dispatch, Alert, DeliveryRecord, Notifier, Reason};
use crate::schedule::Ticker;
use crate::state::{MonitorState, StateStore};
use crate::WatchError;

/// Where the runner is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Parsing,
    Comparing,
    Notifying,
}

/// What one cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// A notification went out for this observation
    Notified {
        reason: Reason,
        result: AvailabilityResult,
        deliveries: Vec<DeliveryRecord>,
    },
    /// The observation was recorded without notifying
    Recorded {
        transition: Transition,
        result: AvailabilityResult,
    },
    FetchFailed(WatchError),
    ExtractionFailed(WatchError),
}

impl CycleOutcome {
    pub fn notified(&self) -> bool {
        matches!(self, CycleOutcome::Notified { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CycleOutcome::FetchFailed(_) | CycleOutcome::ExtractionFailed(_)
        )
    }

    pub fn result(&self) -> Option<&AvailabilityResult> {
        match self {
            CycleOutcome::Notified { result, .. } | CycleOutcome::Recorded { result, .. } => {
                Some(result)
            }
            _ => None,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Notified {
                reason, deliveries, ..
            } => {
                let delivered = deliveries.iter().filter(|d| d.success).count();
                let label = match reason {
                    Reason::Transition => "transition to available",
                    Reason::Reminder => "reminder",
                };
                write!(
                    f,
                    "{}, {}/{} notification(s) delivered",
                    label,
                    delivered,
                    deliveries.len()
                )
            }
            CycleOutcome::Recorded { transition, .. } => write!(f, "{}", transition),
            CycleOutcome::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            CycleOutcome::ExtractionFailed(e) => write!(f, "extraction failed: {}", e),
        }
    }
}

/// Owns the monitor state; cycles run one at a time through `&mut self`
pub struct Runner {
    listing: String,
    fetcher: PageFetcher,
    extractor: ListingExtractor,
    notifiers: Vec<Arc<dyn Notifier>>,
    store: Arc<dyn StateStore>,
    state: MonitorState,
    reminder_interval: Option<Duration>,
    alert_after_failures: Option<u32>,
    consecutive_failures: u32,
    phase: Phase,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("listing", &self.listing)
            .field("url", &self.fetcher.url())
            .field("phase", &self.phase)
            .finish()
    }
}

impl Runner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: PageFetcher,
        extractor: ListingExtractor,
        notifiers: Vec<Arc<dyn Notifier>>,
        store: Arc<dyn StateStore>,
        state: MonitorState,
        reminder_interval: Option<Duration>,
        alert_after_failures: Option<u32>,
    ) -> Self {
        Self {
            listing: extractor.listing_name().to_string(),
            fetcher,
            extractor,
            notifiers,
            store,
            state,
            reminder_interval,
            alert_after_failures,
            consecutive_failures: 0,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn notifiers(&self) -> &[Arc<dyn Notifier>] {
        &self.notifiers
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Fetch and parse without touching state or sending anything
    pub async fn probe(&self, now: DateTime<Utc>) -> crate::Result<AvailabilityResult> {
        let markup = self.fetcher.fetch().await?;
        self.extractor.evaluate(&markup, now)
    }

    /// Run one full cycle and log its outcome
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        let outcome = self.cycle(now).await;
        self.enter(Phase::Idle);

        if outcome.is_failure() {
            tracing::warn!("Check at {}: {}", now.to_rfc3339(), outcome);
        } else {
            tracing::info!("Check at {}: {}", now.to_rfc3339(), outcome);
        }
        outcome
    }

    async fn cycle(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        self.enter(Phase::Fetching);
        let markup = match self.fetcher.fetch().await {
            Ok(markup) => markup,
            Err(e) => {
                self.record_failure(&e, now).await;
                return CycleOutcome::FetchFailed(e);
            }
        };

        self.enter(Phase::Parsing);
        let result = match self.extractor.evaluate(&markup, now) {
            Ok(result) => result,
            Err(e) => {
                self.record_failure(&e, now).await;
                return CycleOutcome::ExtractionFailed(e);
            }
        };
        self.consecutive_failures = 0;

        self.enter(Phase::Comparing);
        let transition = Transition::classify(self.state.last_available(), result.available);
        let reason = match transition {
            Transition::BecameAvailable => Some(Reason::Transition),
            Transition::StillAvailable if self.reminder_due(now) => Some(Reason::Reminder),
            _ => None,
        };
        tracing::debug!(
            "'{}' {} (available={})",
            self.listing,
            transition,
            result.available
        );

        let mut next = MonitorState {
            last_result: Some(result.clone()),
            last_notified_at: self.state.last_notified_at,
        };

        let outcome = match reason {
            Some(reason) => {
                self.enter(Phase::Notifying);
                let alert = Alert::availability(&self.listing, self.fetcher.url(), &result, reason);
                let deliveries = dispatch(&alert, &self.notifiers).await;
                next.last_notified_at = Some(now);
                CycleOutcome::Notified {
                    reason,
                    result,
                    deliveries,
                }
            }
            None => CycleOutcome::Recorded { transition, result },
        };

        self.commit(next);
        outcome
    }

    fn reminder_due(&self, now: DateTime<Utc>) -> bool {
        let Some(interval) = self.reminder_interval else {
            return false;
        };
        match self.state.last_notified_at {
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed >= interval)
                .unwrap_or(false),
            None => true,
        }
    }

    /// Adopt the new state in memory, then persist it; a failed save is logged only
    fn commit(&mut self, next: MonitorState) {
        self.state = next;
        if let Err(e) = self.store.save(&self.state) {
            tracing::error!(
                "Failed to persist state to {}: {}",
                self.store.location(),
                e
            );
        }
    }

    async fn record_failure(&mut self, error: &WatchError, now: DateTime<Utc>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.alert_after_failures == Some(self.consecutive_failures) {
            self.enter(Phase::Notifying);
            let alert = Alert::monitor_error(
                self.fetcher.url(),
                self.consecutive_failures,
                &error.to_string(),
                now,
            );
            let deliveries = dispatch(&alert, &self.notifiers).await;
            tracing::info!(
                "Operational alert sent after {} failures ({} delivery attempt(s))",
                self.consecutive_failures,
                deliveries.len()
            );
        }
    }

    /// Run a cycle on every tick until the ticker ends or `cancel` fires
    pub async fn run(&mut self, ticker: &mut dyn Ticker, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Runner for '{}' cancelled", self.listing);
                    break;
                }
                ticked = ticker.tick() => {
                    if !ticked {
                        tracing::debug!("Tick source exhausted");
                        break;
                    }
                    self.run_cycle(Utc::now()).await;
                }
            }
        }
    }
}
