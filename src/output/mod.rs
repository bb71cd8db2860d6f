//! Output module for sitemap generation
//!
//! This module handles:
//! - Rendering a page snapshot as sitemap XML
//! - The fallback document served when rendering fails
//! - Writing the sitemap to disk

mod file;
mod sitemap;

pub use file::write_sitemap;
pub use sitemap::{empty_sitemap, render_sitemap, RenderError, SitemapOptions};
