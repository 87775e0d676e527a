use std::sync::Arc;

use crate::{
    cache::{SiteCacheWarmer, WarmReport},
    site::{SiteRegistry, with_site},
};

use super::error::AppError;

/// Warms site caches on behalf of the binary and upstream handlers.
#[derive(Clone)]
pub struct WarmService {
    registry: Arc<SiteRegistry>,
    warmer: Arc<dyn SiteCacheWarmer>,
}

impl WarmService {
    pub fn new(registry: Arc<SiteRegistry>, warmer: Arc<dyn SiteCacheWarmer>) -> Self {
        Self { registry, warmer }
    }

    /// Warm `site`, creating its context on first access.
    pub async fn warm(&self, site: &str, switch_cache: bool) -> Result<WarmReport, AppError> {
        let context = self.registry.get_or_create(site)?;
        let report = with_site(
            Arc::clone(&context),
            self.warmer.warm_up_cache(&context, switch_cache),
        )
        .await?;
        Ok(report)
    }
}
