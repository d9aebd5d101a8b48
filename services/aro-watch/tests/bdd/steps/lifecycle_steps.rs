//! BDD step definitions for building, restarting and running the watcher

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use aro_watch::schedule::ManualTicker;
use aro_watch::WatchError;

use crate::world::WatchWorld;

#[given(expr = "a watcher e-mailing {string} with a state file")]
fn watcher_with_state_file(world: &mut WatchWorld, recipient: String) {
    world.config.notifications.email.recipients = vec![recipient];
    world.state_dir = Some(tempfile::tempdir().expect("temp dir"));
}

#[given(expr = "the target URL is {string}")]
fn target_url(world: &mut WatchWorld, url: String) {
    world.config.target.url = url;
}

#[when("the watcher restarts")]
fn watcher_restarts(world: &mut WatchWorld) {
    world.watcher = None;
}

#[when("the watcher is built")]
fn watcher_is_built(world: &mut WatchWorld) {
    match world.builder().build() {
        Ok(watcher) => world.watcher = Some(watcher),
        Err(e) => world.build_error = Some(e),
    }
}

#[when(expr = "the watcher runs for {int} ticks")]
async fn watcher_runs_for(world: &mut WatchWorld, ticks: usize) {
    let (tx, ticker) = ManualTicker::new(ticks);
    for _ in 0..ticks {
        tx.send(()).await.expect("ticker receiver alive");
    }
    drop(tx);

    let watcher = world
        .builder()
        .with_ticker(Box::new(ticker))
        .build()
        .expect("watcher should build");
    world.stopped_cleanly = Some(watcher.start().await.is_ok());
}

#[when("the watcher is started already cancelled")]
async fn watcher_started_cancelled(world: &mut WatchWorld) {
    // Sender stays alive so the ticker never ends on its own
    let (_tx, ticker) = ManualTicker::new(1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let watcher = world
        .builder()
        .with_ticker(Box::new(ticker))
        .with_cancellation_token(cancel)
        .build()
        .expect("watcher should build");
    world.stopped_cleanly = Some(watcher.start().await.is_ok());
}

#[then("the build fails with a configuration error")]
fn build_fails_with_config_error(world: &mut WatchWorld) {
    assert!(world.watcher.is_none());
    match &world.build_error {
        Some(WatchError::Config(_)) => {}
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[then("the watcher stopped cleanly")]
fn stopped_cleanly(world: &mut WatchWorld) {
    assert_eq!(world.stopped_cleanly, Some(true));
}

#[then("no page was fetched")]
async fn no_page_fetched(world: &mut WatchWorld) {
    assert!(world.http.gets.read().await.is_empty());
}

#[then("the state file records the listing as available")]
fn state_file_available(world: &mut WatchWorld) {
    let dir = world.state_dir.as_ref().expect("no state file configured");
    let content =
        std::fs::read_to_string(dir.path().join("state.json")).expect("state file written");
    let state: aro_watch::state::MonitorState =
        serde_json::from_str(&content).expect("state file is JSON");
    assert_eq!(state.last_available(), Some(true));
    assert!(state.last_notified_at.is_some());
}
