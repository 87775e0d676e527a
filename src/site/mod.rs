//! Site contexts: per-site configuration, the live content cache and the
//! registry that creates and destroys them.

mod config;
mod context;
pub mod current;
mod registry;

pub use config::{SiteConfig, SiteConfigError};
pub use context::SiteContext;
pub use current::{current, current_config, with_site};
pub use registry::{SiteError, SiteRegistry};
