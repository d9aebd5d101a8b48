//! BDD test world for aro-watch

use std::sync::Arc;

use aro_watch::config::Config;
use aro_watch::email::EmailNotifier;
use aro_watch::io::{HttpClient, Mailer};
use aro_watch::monitor::AvailabilityResult;
use aro_watch::notifier::Notifier;
use aro_watch::runner::CycleOutcome;
use aro_watch::sms::SmsNotifier;
use aro_watch::state::{FileStateStore, MemoryStateStore, StateStore};
use aro_watch::{Watcher, WatcherBuilder};
use cucumber::World;

use crate::doubles::{RecordingMailer, ScriptedHttpClient};

#[derive(Debug, Default, World)]
pub struct WatchWorld {
    // Extraction
    pub markup: Option<String>,
    pub evaluation: Option<aro_watch::Result<AvailabilityResult>>,

    // Watcher under test
    pub config: Config,
    pub http: Arc<ScriptedHttpClient>,
    pub mailer: Arc<RecordingMailer>,
    pub state_dir: Option<tempfile::TempDir>,
    pub store: Option<Arc<dyn StateStore>>,
    pub watcher: Option<Watcher>,
    pub outcomes: Vec<CycleOutcome>,

    // Lifecycle
    pub build_error: Option<aro_watch::WatchError>,
    pub stopped_cleanly: Option<bool>,
}

impl WatchWorld {
    fn notifiers(&self) -> Vec<Arc<dyn Notifier>> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

        let email = &self.config.notifications.email;
        if email.enabled && !email.recipients.is_empty() {
            notifiers.push(Arc::new(EmailNotifier::new(
                "watch@example.com".to_string(),
                email.recipients.clone(),
                Arc::clone(&self.mailer) as Arc<dyn Mailer>,
            )));
        }
        if let Some(sms) = SmsNotifier::from_config(
            &self.config.notifications.sms,
            Arc::clone(&self.http) as Arc<dyn HttpClient>,
        ) {
            notifiers.push(Arc::new(sms));
        }

        notifiers
    }

    /// A fresh store over the same backing data each time the watcher is built
    fn state_store(&mut self) -> Arc<dyn StateStore> {
        if let Some(dir) = &self.state_dir {
            let store: Arc<dyn StateStore> =
                Arc::new(FileStateStore::new(dir.path().join("state.json")));
            self.store = Some(Arc::clone(&store));
            return store;
        }
        Arc::clone(
            self.store
                .get_or_insert_with(|| Arc::new(MemoryStateStore::default()) as Arc<dyn StateStore>),
        )
    }

    pub fn builder(&mut self) -> WatcherBuilder {
        let store = self.state_store();
        WatcherBuilder::new(self.config.clone())
            .with_http_client(Arc::clone(&self.http) as Arc<dyn HttpClient>)
            .with_notifiers(self.notifiers())
            .with_state_store(store)
    }

    pub fn watcher(&mut self) -> &mut Watcher {
        if self.watcher.is_none() {
            let watcher = self.builder().build().expect("watcher should build");
            self.watcher = Some(watcher);
        }
        self.watcher.as_mut().expect("watcher was just built")
    }

    /// 1-based, as written in the feature files
    pub fn outcome(&self, check: usize) -> &CycleOutcome {
        self.outcomes
            .get(check - 1)
            .unwrap_or_else(|| panic!("check {} did not run", check))
    }

    pub fn stored_state(&self) -> aro_watch::state::MonitorState {
        self.store
            .as_ref()
            .expect("state store")
            .load()
            .expect("state should load")
    }
}
