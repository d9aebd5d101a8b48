//! BDD step definitions for listing extraction

use chrono::Utc;
use cucumber::{given, then, when};

use aro_watch::config::ListingConfig;
use aro_watch::extractor::ListingExtractor;
use aro_watch::WatchError;

use crate::doubles::{card_page, listing_page, page_without_listing};
use crate::world::WatchWorld;

#[given(expr = "a floorplans page listing {string} as {string} at {string}")]
fn page_with_listing(world: &mut WatchWorld, name: String, status: String, price: String) {
    world.markup = Some(listing_page(&name, &status, &price));
}

#[given(expr = "a floorplans card titled {string} with status {string} in a sibling element")]
fn card_with_sibling_status(world: &mut WatchWorld, title: String, status: String) {
    world.markup = Some(card_page(&title, &status));
}

#[given("a floorplans page without the listing")]
fn page_without(world: &mut WatchWorld) {
    world.markup = Some(page_without_listing());
}

#[given(expr = "a floorplans page with only a market-rate one-bedroom {string}")]
fn market_rate_page(world: &mut WatchWorld, status: String) {
    world.markup = Some(listing_page("1 Bedroom - Market Rate", &status, "$2,400"));
}

#[when("the page is evaluated")]
fn page_is_evaluated(world: &mut WatchWorld) {
    let extractor = ListingExtractor::new(&ListingConfig::default()).expect("default listing");
    let markup = world.markup.as_deref().expect("no page given");
    world.evaluation = Some(extractor.evaluate(markup, Utc::now()));
}

#[then("the listing is reported available")]
fn reported_available(world: &mut WatchWorld) {
    let result = world
        .evaluation
        .as_ref()
        .expect("page not evaluated")
        .as_ref()
        .expect("evaluation failed");
    assert!(result.available, "expected available: {:?}", result);
}

#[then("the listing is reported unavailable")]
fn reported_unavailable(world: &mut WatchWorld) {
    let result = world
        .evaluation
        .as_ref()
        .expect("page not evaluated")
        .as_ref()
        .expect("evaluation failed");
    assert!(!result.available, "expected unavailable: {:?}", result);
    assert!(!result.units.is_empty());
}

#[then(expr = "the reported price is {string}")]
fn reported_price(world: &mut WatchWorld, price: String) {
    let result = world
        .evaluation
        .as_ref()
        .expect("page not evaluated")
        .as_ref()
        .expect("evaluation failed");
    let unit = result.available_units().next().expect("no available unit");
    assert_eq!(unit.price.as_deref(), Some(price.as_str()));
}

#[then("evaluation fails with an extraction error")]
fn fails_with_extraction_error(world: &mut WatchWorld) {
    match world.evaluation.as_ref().expect("page not evaluated") {
        Err(WatchError::Extraction(_)) => {}
        other => panic!("expected extraction error, got {:?}", other),
    }
}
