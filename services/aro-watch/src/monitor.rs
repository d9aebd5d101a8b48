//! Availability observations and transition classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Details of a single matching listing on the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitListing {
    pub name: Option<String>,
    pub availability: Option<String>,
    pub price: Option<String>,
    pub sqft: Option<String>,
    pub available: bool,
}

impl fmt::Display for UnitListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or("Unnamed unit"))?;
        for part in [&self.availability, &self.price, &self.sqft]
            .into_iter()
            .flatten()
        {
            write!(f, " | {}", part)?;
        }
        Ok(())
    }
}

/// The outcome of one successful check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub units: Vec<UnitListing>,
    pub checked_at: DateTime<Utc>,
}

impl AvailabilityResult {
    /// Build a result from extracted listings, describing only the available ones
    pub fn from_units(units: Vec<UnitListing>, checked_at: DateTime<Utc>) -> Self {
        let open: Vec<String> = units
            .iter()
            .filter(|u| u.available)
            .map(|u| u.to_string())
            .collect();
        let description = if open.is_empty() {
            None
        } else {
            Some(open.join("; "))
        };

        Self {
            available: !open.is_empty(),
            description,
            units,
            checked_at,
        }
    }

    pub fn available_units(&self) -> impl Iterator<Item = &UnitListing> {
        self.units.iter().filter(|u| u.available)
    }
}

/// How one observation relates to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    BecameAvailable,
    StillAvailable,
    BecameUnavailable,
    StillUnavailable,
}

impl Transition {
    /// Classify an observation against the previous one; no previous counts as unavailable
    pub fn classify(previous: Option<bool>, current: bool) -> Self {
        match (previous.unwrap_or(false), current) {
            (false, true) => Transition::BecameAvailable,
            (true, true) => Transition::StillAvailable,
            (true, false) => Transition::BecameUnavailable,
            (false, false) => Transition::StillUnavailable,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::BecameAvailable => write!(f, "became available"),
            Transition::StillAvailable => write!(f, "still available"),
            Transition::BecameUnavailable => write!(f, "became unavailable"),
            Transition::StillUnavailable => write!(f, "still unavailable"),
        }
    }
}
