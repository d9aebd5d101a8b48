//! BDD step definitions for aro-watch

pub mod extraction_steps;
pub mod lifecycle_steps;
pub mod notification_steps;
