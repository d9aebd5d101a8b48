//! Read-only summary of configuration and persisted state

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::monitor::AvailabilityResult;
use crate::state::StateStore;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub url: String,
    pub listing: String,
    pub schedule: String,
    pub reminder_interval: Option<String>,
    pub email_active: bool,
    pub sms_active: bool,
    pub state_location: String,
    pub log_file: Option<String>,
    pub last_result: Option<AvailabilityResult>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    pub fn gather(config: &Config, store: &dyn StateStore) -> crate::Result<Self> {
        let state = store.load()?;
        Ok(Self {
            url: config.target.url.clone(),
            listing: config.listing.name.clone(),
            schedule: config.schedule.describe(),
            reminder_interval: config
                .schedule
                .reminder_interval
                .map(|d| humantime::format_duration(d).to_string()),
            email_active: config.notifications.email.is_active(),
            sms_active: config.notifications.sms.is_active(),
            state_location: store.location(),
            log_file: config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string()),
            last_result: state.last_result,
            last_notified_at: state.last_notified_at,
        })
    }
}

fn on_off(active: bool) -> &'static str {
    if active {
        "enabled"
    } else {
        "disabled"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target:        {}", self.url)?;
        writeln!(f, "Listing:       {}", self.listing)?;
        writeln!(f, "Schedule:      {}", self.schedule)?;
        match &self.reminder_interval {
            Some(every) => writeln!(f, "Reminders:     every {}", every)?,
            None => writeln!(f, "Reminders:     off")?,
        }
        writeln!(f, "E-mail:        {}", on_off(self.email_active))?;
        writeln!(f, "SMS:           {}", on_off(self.sms_active))?;
        writeln!(f, "State:         {}", self.state_location)?;
        writeln!(
            f,
            "Log file:      {}",
            self.log_file.as_deref().unwrap_or("stdout only")
        )?;

        match &self.last_result {
            Some(result) => writeln!(
                f,
                "Last check:    {} ({}, {} unit(s) listed)",
                result.checked_at.to_rfc3339(),
                if result.available {
                    "available"
                } else {
                    "unavailable"
                },
                result.units.len()
            )?,
            None => writeln!(f, "Last check:    never")?,
        }
        match &self.last_notified_at {
            Some(at) => write!(f, "Last notified: {}", at.to_rfc3339()),
            None => write!(f, "Last notified: never"),
        }
    }
}
