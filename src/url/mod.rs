//! URL handling module for Sitemapper
//!
//! This module provides the crawl [`Domain`] and the pure functions that
//! turn raw links into canonical in-domain URLs.

mod domain;
mod normalize;

pub use domain::Domain;
pub use normalize::{ensure_trailing_slash, normalize_url};
