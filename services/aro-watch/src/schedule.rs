//! Tick sources that drive check cycles

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::ScheduleConfig;

/// Something that says when the next cycle should start
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick; `false` once the source is exhausted
    async fn tick(&mut self) -> bool;
}

/// Fixed-interval ticks; ticks missed while a cycle runs are skipped
pub struct IntervalTicker {
    interval: tokio::time::Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration, immediate: bool) -> Self {
        let start = if immediate {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + period
        };
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// One tick per day at a local wall-clock time
pub struct DailyTicker {
    at: NaiveTime,
    immediate: bool,
}

impl DailyTicker {
    pub fn new(at: NaiveTime, immediate: bool) -> Self {
        Self { at, immediate }
    }
}

/// Next occurrence of `at` strictly after `now`
pub fn next_daily<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    loop {
        // Skips days where `at` falls in a DST gap
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        date = date.succ_opt().unwrap_or(date);
    }
}

#[async_trait]
impl Ticker for DailyTicker {
    async fn tick(&mut self) -> bool {
        if std::mem::take(&mut self.immediate) {
            return true;
        }
        let now = Local::now();
        let next = next_daily(&now, self.at);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!("Next check at {} (in {:?})", next, wait);
        tokio::time::sleep(wait).await;
        true
    }
}

/// Ticks on demand; exhausted once every sender is dropped
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

impl ManualTicker {
    pub fn new(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Ticker for the configured schedule
pub fn from_config(config: &ScheduleConfig) -> crate::Result<Box<dyn Ticker>> {
    Ok(match config.daily_time()? {
        Some(at) => Box::new(DailyTicker::new(at, config.run_on_start)),
        None => Box::new(IntervalTicker::new(config.interval, config.run_on_start)),
    })
}
