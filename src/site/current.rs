//! The site context bound to the current request task.
//!
//! Uses `tokio::task_local!` so that code deep inside a request can reach the
//! site being served without threading the context through every call.

use std::{future::Future, sync::Arc};

use super::{config::SiteConfig, context::SiteContext};

tokio::task_local! {
    static CURRENT: Arc<SiteContext>;
}

/// Run `future` with `context` as the current site.
pub async fn with_site<F, R>(context: Arc<SiteContext>, future: F) -> R
where
    F: Future<Output = R>,
{
    CURRENT.scope(context, future).await
}

/// The current site context, if the task runs inside [`with_site`].
pub fn current() -> Option<Arc<SiteContext>> {
    CURRENT.try_with(Arc::clone).ok()
}

/// Configuration of the current site context, if any.
pub fn current_config() -> Option<SiteConfig> {
    CURRENT.try_with(|context| context.config().clone()).ok()
}
