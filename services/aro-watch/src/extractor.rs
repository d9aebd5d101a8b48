//! Locates the monitored listing in floorplan markup
//!
//! A container is a listing when its text names both the unit type and the
//! program. Among nested listings, the innermost one that also carries a
//! status phrase is reported, so a page section wrapping several units does
//! not shadow the units, and a title element does not shadow its card.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ListingConfig;
use crate::monitor::{AvailabilityResult, UnitListing};
use crate::WatchError;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

pub struct ListingExtractor {
    name: String,
    container: Selector,
    heading: Selector,
    class_hints: Vec<String>,
    unit: Regex,
    program: Regex,
    available: Regex,
    unavailable: Option<Regex>,
}

impl std::fmt::Debug for ListingExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingExtractor")
            .field("name", &self.name)
            .finish()
    }
}

/// Case-insensitive alternation of keywords bounded by non-word characters
fn keyword_regex(field: &str, keywords: &[String]) -> crate::Result<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty())
        .map(|k| regex::escape(&k))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)(?:^|\W)(?:{})(?:\W|$)", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| WatchError::Config(format!("listing.{}: {}", field, e)))
}

fn required_regex(field: &str, keywords: &[String]) -> crate::Result<Regex> {
    keyword_regex(field, keywords)?.ok_or_else(|| {
        WatchError::Config(format!("listing.{} must contain at least one keyword", field))
    })
}

fn text_of(element: &ElementRef<'_>) -> String {
    normalize(&element.text().collect::<Vec<_>>().join(" "))
}

/// Whether a class token carries the hint as one of its `-`/`_` separated
/// segments, allowing a plural `s` ("floorplans", "unit-card", "apartment_row")
fn token_has_hint(token: &str, hint: &str) -> bool {
    let token = format!("-{}-", token.to_lowercase().replace('_', "-"));
    token.contains(&format!("-{}-", hint)) || token.contains(&format!("-{}s-", hint))
}

/// Collapse runs of whitespace so keywords match across line breaks
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ListingExtractor {
    pub fn new(config: &ListingConfig) -> crate::Result<Self> {
        let container = Selector::parse(&config.container_selector).map_err(|e| {
            WatchError::Config(format!(
                "Invalid container_selector '{}': {}",
                config.container_selector, e
            ))
        })?;
        let heading = Selector::parse(HEADINGS)
            .map_err(|e| WatchError::Config(format!("Invalid heading selector: {}", e)))?;

        Ok(Self {
            name: config.name.clone(),
            container,
            heading,
            class_hints: config
                .class_hints
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            unit: required_regex("unit_keywords", &config.unit_keywords)?,
            program: required_regex("program_keywords", &config.program_keywords)?,
            available: required_regex("available_keywords", &config.available_keywords)?,
            unavailable: keyword_regex("unavailable_keywords", &config.unavailable_keywords)?,
        })
    }

    pub fn listing_name(&self) -> &str {
        &self.name
    }

    fn has_class_hint(&self, element: &ElementRef<'_>) -> bool {
        if self.class_hints.is_empty() {
            return true;
        }
        element
            .value()
            .attr("class")
            .map(|class| {
                class
                    .split_whitespace()
                    .any(|token| self.class_hints.iter().any(|hint| token_has_hint(token, hint)))
            })
            .unwrap_or(false)
    }

    fn is_listing(&self, element: &ElementRef<'_>) -> bool {
        if !self.has_class_hint(element) {
            return false;
        }
        let text = text_of(element);
        self.unit.is_match(&text) && self.program.is_match(&text)
    }

    fn has_status(&self, element: &ElementRef<'_>) -> bool {
        let text = text_of(element);
        self.available.is_match(&text) || self.says_unavailable(&text)
    }

    fn says_unavailable(&self, text: &str) -> bool {
        self.unavailable
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    fn describe(&self, element: &ElementRef<'_>) -> UnitListing {
        let texts: Vec<String> = element
            .text()
            .map(normalize)
            .filter(|t| !t.is_empty())
            .collect();
        let full = texts.join(" ");

        let name = element
            .select(&self.heading)
            .map(|h| normalize(&h.text().collect::<Vec<_>>().join(" ")))
            .find(|t| !t.is_empty())
            .or_else(|| {
                texts
                    .iter()
                    .find(|t| self.unit.is_match(t) && self.program.is_match(t))
                    .cloned()
            });
        let availability = texts
            .iter()
            .find(|t| self.available.is_match(t) || self.says_unavailable(t))
            .cloned();
        let price = texts.iter().find(|t| t.contains('$')).cloned();
        let sqft = texts
            .iter()
            .find(|t| {
                let lower = t.to_lowercase();
                lower.contains("sq ft") || lower.contains("sqft") || lower.contains("sq. ft")
            })
            .cloned();

        UnitListing {
            name,
            availability,
            price,
            sqft,
            available: self.available.is_match(&full) && !self.says_unavailable(&full),
        }
    }

    /// Every innermost listing on the page, or an extraction error when there is none
    ///
    /// A listing with a status phrase wins over any nested listing without
    /// one; listings with no status anywhere around them are still reported,
    /// as unavailable.
    pub fn extract(&self, markup: &str) -> crate::Result<Vec<UnitListing>> {
        let document = Html::parse_document(markup);

        let candidates: Vec<(ElementRef<'_>, bool)> = document
            .select(&self.container)
            .filter(|e| self.is_listing(e))
            .map(|e| (e, self.has_status(&e)))
            .collect();
        let all: HashSet<_> = candidates.iter().map(|(e, _)| e.id()).collect();
        let with_status: HashSet<_> = candidates
            .iter()
            .filter(|(_, status)| *status)
            .map(|(e, _)| e.id())
            .collect();

        let units: Vec<UnitListing> = candidates
            .iter()
            .filter(|(e, status)| {
                let mut below = e.descendants().skip(1);
                if *status {
                    !below.any(|n| with_status.contains(&n.id()))
                } else {
                    !below.any(|n| all.contains(&n.id()))
                        && !e.ancestors().any(|n| with_status.contains(&n.id()))
                }
            })
            .map(|(e, _)| self.describe(e))
            .collect();

        if units.is_empty() {
            return Err(WatchError::Extraction(format!(
                "no '{}' listing found on the page; its structure may have changed",
                self.name
            )));
        }

        tracing::debug!(
            "Found {} '{}' listing(s), {} available",
            units.len(),
            self.name,
            units.iter().filter(|u| u.available).count()
        );
        Ok(units)
    }

    /// Extract and summarize the page into an availability result
    pub fn evaluate(
        &self,
        markup: &str,
        checked_at: DateTime<Utc>,
    ) -> crate::Result<AvailabilityResult> {
        let units = self.extract(markup)?;
        Ok(AvailabilityResult::from_units(units, checked_at))
    }
}
