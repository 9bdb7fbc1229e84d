//! Seams between the scrape pipeline and the outside world.
//!
//! The engine only talks to a browser, a job store, and a site extractor
//! through these traits, so each can be swapped for a test double.

pub mod browser;
pub mod extractor;
pub mod store;
