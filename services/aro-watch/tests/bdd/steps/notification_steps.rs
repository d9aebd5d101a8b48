//! BDD step definitions for notification channels

use std::sync::atomic::Ordering;

use cucumber::{given, then};

use aro_watch::runner::CycleOutcome;

use crate::world::WatchWorld;

fn configure_sms(world: &mut WatchWorld, number: String) {
    let sms = &mut world.config.notifications.sms;
    sms.account_sid = Some("AC0123456789".to_string());
    sms.auth_token = Some("test-token".to_string());
    sms.from_number = Some("+15550000000".to_string());
    sms.recipients = vec![number];
}

#[given(expr = "SMS to {string}")]
fn sms_to(world: &mut WatchWorld, number: String) {
    configure_sms(world, number);
}

#[given("SMS is disabled")]
fn sms_disabled(world: &mut WatchWorld) {
    configure_sms(world, "+15551111111".to_string());
    world.config.notifications.sms.enabled = false;
}

#[given("e-mail is disabled")]
fn email_disabled(world: &mut WatchWorld) {
    world.config.notifications.email.enabled = false;
}

#[given("the SMS gateway rejects messages")]
fn sms_gateway_rejects(world: &mut WatchWorld) {
    world.http.reject_posts.store(true, Ordering::SeqCst);
}

#[given("the mail server rejects messages")]
fn mail_server_rejects(world: &mut WatchWorld) {
    world.mailer.reject.store(true, Ordering::SeqCst);
}

#[then("no SMS was requested")]
async fn no_sms_requested(world: &mut WatchWorld) {
    assert!(world.http.posts.read().await.is_empty());
}

#[then(expr = "an SMS was requested for {string}")]
async fn sms_requested_for(world: &mut WatchWorld, number: String) {
    let posts = world.http.posts.read().await;
    let post = posts
        .iter()
        .find(|p| p.params.iter().any(|(k, v)| k == "To" && *v == number))
        .unwrap_or_else(|| panic!("no SMS to {} in {:?}", number, posts));
    assert!(post.url.ends_with("/Messages.json"), "{}", post.url);
    assert!(post
        .params
        .iter()
        .any(|(k, v)| k == "Body" && v.starts_with("ALERT:")));
}

#[then(expr = "the delivery to {string} on check {int} failed")]
fn delivery_failed(world: &mut WatchWorld, recipient: String, check: usize) {
    let CycleOutcome::Notified { deliveries, .. } = world.outcome(check) else {
        panic!("check {} sent nothing: {:?}", check, world.outcome(check));
    };
    let record = deliveries
        .iter()
        .find(|d| d.recipient == recipient)
        .unwrap_or_else(|| panic!("no delivery to {}", recipient));
    assert!(!record.success);
    assert!(record.error.is_some());
    assert!(
        deliveries.iter().any(|d| d.success),
        "the other channel should still deliver: {:?}",
        deliveries
    );
}
