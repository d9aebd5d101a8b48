//! Configuration types for the availability watcher

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The page being watched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

/// What counts as the monitored listing and how its availability is phrased
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Human readable label used in messages
    #[serde(default = "default_listing_name")]
    pub name: String,
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    /// Substrings of the class attribute a container must carry; empty accepts any
    #[serde(default = "default_class_hints")]
    pub class_hints: Vec<String>,
    #[serde(default = "default_unit_keywords")]
    pub unit_keywords: Vec<String>,
    #[serde(default = "default_program_keywords")]
    pub program_keywords: Vec<String>,
    #[serde(default = "default_available_keywords")]
    pub available_keywords: Vec<String>,
    #[serde(default = "default_unavailable_keywords")]
    pub unavailable_keywords: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            name: default_listing_name(),
            container_selector: default_container_selector(),
            class_hints: default_class_hints(),
            unit_keywords: default_unit_keywords(),
            program_keywords: default_program_keywords(),
            available_keywords: default_available_keywords(),
            unavailable_keywords: default_unavailable_keywords(),
        }
    }
}

/// When checks run and how often notifications may repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Local wall-clock time ("HH:MM") for one check per day; overrides `interval`
    #[serde(default)]
    pub daily_at: Option<String>,
    #[serde(default = "default_true")]
    pub run_on_start: bool,
    /// Re-notify while still available once this much time has passed; off by default
    #[serde(default, with = "humantime_serde")]
    pub reminder_interval: Option<Duration>,
    /// Send an operational alert after this many consecutive failed cycles
    #[serde(default)]
    pub alert_after_failures: Option<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            daily_at: None,
            run_on_start: true,
            reminder_interval: None,
            alert_after_failures: None,
        }
    }
}

impl ScheduleConfig {
    /// Parsed `daily_at`, if set
    pub fn daily_time(&self) -> crate::Result<Option<NaiveTime>> {
        self.daily_at
            .as_deref()
            .map(|s| {
                NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| {
                    crate::WatchError::Config(format!("Invalid daily_at '{}': {}", s, e))
                })
            })
            .transpose()
    }

    pub fn describe(&self) -> String {
        match &self.daily_at {
            Some(at) => format!("daily at {}", at),
            None => format!("every {}", humantime::format_duration(self.interval)),
        }
    }
}

/// Where the last known state is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Log output besides stdout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Appended to on every run; `null` logs to stdout only
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

/// Notification channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub sms: SmsConfig,
}

/// SMTP settings for e-mail delivery
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address; falls back to `username`
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
            recipients: Vec::new(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

impl EmailConfig {
    /// Enabled and carrying everything needed to send
    pub fn is_active(&self) -> bool {
        self.enabled
            && self.username.as_deref().is_some_and(|s| !s.is_empty())
            && self.password.as_deref().is_some_and(|s| !s.is_empty())
            && !self.recipients.is_empty()
    }

    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

/// Twilio settings for SMS delivery
#[derive(Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            account_sid: None,
            auth_token: None,
            from_number: None,
            recipients: Vec::new(),
            api_base: default_twilio_api_base(),
        }
    }
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("enabled", &self.enabled)
            .field("account_sid", &self.account_sid)
            .field("from_number", &self.from_number)
            .field("recipients", &self.recipients)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl SmsConfig {
    /// Enabled and carrying everything needed to send
    pub fn is_active(&self) -> bool {
        self.enabled
            && self.account_sid.as_deref().is_some_and(|s| !s.is_empty())
            && self.auth_token.as_deref().is_some_and(|s| !s.is_empty())
            && self.from_number.as_deref().is_some_and(|s| !s.is_empty())
            && !self.recipients.is_empty()
    }
}

fn default_url() -> String {
    "https://www.lincolncommonapartments.com/floorplans".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_listing_name() -> String {
    "ARO one-bedroom".to_string()
}

fn default_container_selector() -> String {
    "div, section, article, li".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_class_hints() -> Vec<String> {
    strings(&["floorplan", "floor-plan", "unit", "apartment", "plan", "listing"])
}

fn default_unit_keywords() -> Vec<String> {
    strings(&[
        "1 bed",
        "1 bedroom",
        "1-bed",
        "1-bedroom",
        "one bed",
        "one bedroom",
        "1br",
        "1 br",
    ])
}

fn default_program_keywords() -> Vec<String> {
    strings(&[
        "aro",
        "affordable rental",
        "affordable housing",
        "rental opportunity",
    ])
}

fn default_available_keywords() -> Vec<String> {
    strings(&["available", "available now", "vacant", "ready"])
}

fn default_unavailable_keywords() -> Vec<String> {
    strings(&[
        "unavailable",
        "not available",
        "no availability",
        "waitlist",
        "wait list",
        "sold out",
        "leased",
        "0 available",
        "0 units available",
        "no units available",
        "none available",
    ])
}

fn default_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_true() -> bool {
    true
}

fn default_state_path() -> PathBuf {
    PathBuf::from("aro-watch-state.json")
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("aro-watch.log"))
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> crate::Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("ARO_WATCH_URL") {
            self.target.url = url;
        }
        if let Some(interval) = get("ARO_WATCH_INTERVAL") {
            self.schedule.interval = humantime::parse_duration(interval.trim()).map_err(|e| {
                crate::WatchError::Config(format!(
                    "Invalid ARO_WATCH_INTERVAL '{}': {}",
                    interval, e
                ))
            })?;
        }
        if let Some(at) = get("ARO_WATCH_CHECK_TIME") {
            self.schedule.daily_at = Some(at);
        }
        if let Some(file) = get("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file.trim()));
        }

        let email = &mut self.notifications.email;
        if let Some(host) = get("EMAIL_SMTP_SERVER") {
            email.smtp_host = host;
        }
        if let Some(port) = get("EMAIL_SMTP_PORT") {
            email.smtp_port = port.trim().parse().map_err(|e| {
                crate::WatchError::Config(format!("Invalid EMAIL_SMTP_PORT '{}': {}", port, e))
            })?;
        }
        if let Some(username) = get("EMAIL_USERNAME") {
            email.username = Some(username);
        }
        if let Some(password) = get("EMAIL_PASSWORD") {
            email.password = Some(password);
        }
        if let Some(from) = get("EMAIL_FROM") {
            email.from = Some(from);
        }
        if let Some(to) = get("EMAIL_TO") {
            email.recipients = split_list(&to);
        }

        let sms = &mut self.notifications.sms;
        if let Some(sid) = get("TWILIO_ACCOUNT_SID") {
            sms.account_sid = Some(sid);
        }
        if let Some(token) = get("TWILIO_AUTH_TOKEN") {
            sms.auth_token = Some(token);
        }
        if let Some(from) = get("TWILIO_FROM_NUMBER") {
            sms.from_number = Some(from);
        }
        if let Some(to) = get("TWILIO_TO_NUMBER") {
            sms.recipients = split_list(&to);
        }

        Ok(())
    }

    /// Reject configurations that could never produce a meaningful check
    pub fn validate(&self) -> crate::Result<()> {
        let url = url::Url::parse(&self.target.url).map_err(|e| {
            crate::WatchError::Config(format!("Invalid target URL '{}': {}", self.target.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::WatchError::Config(format!(
                "Target URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.target.timeout.is_zero() {
            return Err(crate::WatchError::Config(
                "target.timeout must be greater than zero".to_string(),
            ));
        }
        if self.schedule.interval.is_zero() {
            return Err(crate::WatchError::Config(
                "schedule.interval must be greater than zero".to_string(),
            ));
        }
        if self.schedule.alert_after_failures == Some(0) {
            return Err(crate::WatchError::Config(
                "schedule.alert_after_failures must be at least 1".to_string(),
            ));
        }
        if matches!(self.schedule.reminder_interval, Some(d) if d.is_zero()) {
            return Err(crate::WatchError::Config(
                "schedule.reminder_interval must be greater than zero".to_string(),
            ));
        }
        self.schedule.daily_time()?;

        scraper::Selector::parse(&self.listing.container_selector).map_err(|e| {
            crate::WatchError::Config(format!(
                "Invalid container_selector '{}': {}",
                self.listing.container_selector, e
            ))
        })?;
        for (field, list) in [
            ("unit_keywords", &self.listing.unit_keywords),
            ("program_keywords", &self.listing.program_keywords),
            ("available_keywords", &self.listing.available_keywords),
        ] {
            if list.iter().all(|k| k.trim().is_empty()) {
                return Err(crate::WatchError::Config(format!(
                    "listing.{} must contain at least one keyword",
                    field
                )));
            }
        }

        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
