use serde::Serialize;

use crate::site::SiteRegistry;

use super::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSummary {
    pub name: String,
    pub fallback: bool,
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitesOverview {
    pub sites: Vec<SiteSummary>,
    /// Site contexts in use, not counting the fallback.
    pub usage: usize,
}

/// Open a context for every site directory under the content root.
pub fn overview(registry: &SiteRegistry) -> Result<SitesOverview, AppError> {
    let mut sites = Vec::new();
    for name in registry.discover()? {
        let context = registry.get_or_create(&name)?;
        sites.push(SiteSummary {
            name,
            fallback: context.is_fallback(),
            configured: !context.config().is_empty(),
        });
    }

    Ok(SitesOverview {
        sites,
        usage: registry.site_usage(),
    })
}
