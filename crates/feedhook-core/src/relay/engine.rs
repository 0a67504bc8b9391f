use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::diff;
use super::state::{FeedRegistry, FeedState};
use crate::config::InitFailurePolicy;
use crate::feed::{Feed, FeedSource, Icon, Item};
use crate::notify::{Notifier, WebhookPayload};
use crate::{Error, Result};

/// Counts from one fetch-diff-dispatch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub new_items: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Turns fresh listings into ordered webhook deliveries
pub struct RelayEngine {
    source: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    permalink_base: String,
}

impl RelayEngine {
    pub fn new(
        source: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        permalink_base: impl Into<String>,
    ) -> Self {
        Self {
            source,
            notifier,
            permalink_base: permalink_base.into(),
        }
    }

    /// Record the current newest item without notifying about anything.
    ///
    /// Posts that existed before the relay started watching are never sent.
    pub async fn initialize(&self, state: &mut FeedState) -> Result<()> {
        let items = self
            .source
            .fetch_items(state.name())
            .await
            .map_err(|e| Error::InitialFetch {
                feed: state.name().to_string(),
                source: Box::new(e),
            })?;

        state.advance(items.first().map(|item| item.id.clone()));

        match state.last_seen() {
            Some(id) => info!("Tracking r/{} from post {}", state.name(), id),
            None => info!("Tracking r/{} (currently empty)", state.name()),
        }
        Ok(())
    }

    /// Initialize every feed in order and collect them into a registry
    pub async fn initialize_all(
        &self,
        feeds: Vec<Feed>,
        policy: InitFailurePolicy,
    ) -> Result<FeedRegistry> {
        let mut registry = FeedRegistry::new();

        for feed in feeds {
            let mut state = FeedState::new(feed);
            match self.initialize(&mut state).await {
                Ok(()) => registry.insert(state),
                Err(e) if policy == InitFailurePolicy::Skip => {
                    warn!("Skipping feed: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(registry)
    }

    /// Run one steady-state cycle for `state`.
    ///
    /// A fetch failure returns `Err` and leaves `state` untouched. Delivery
    /// failures are logged and counted; they never stop the cycle.
    pub async fn run_cycle(&self, state: &mut FeedState) -> Result<CycleReport> {
        let items = self.source.fetch_items(state.name()).await?;
        let plan = diff::plan(&items, state.last_seen());

        // The marker moves before dispatch so a failed delivery is never repeated
        state.advance(plan.newest_id);

        let mut report = CycleReport {
            new_items: plan.new_count,
            ..CycleReport::default()
        };

        if plan.new_count == 0 {
            debug!("r/{}: no new posts", state.name());
            return Ok(report);
        }

        info!("r/{}: {} new posts", state.name(), plan.new_count);

        let new_items: Vec<&Item> = diff::oldest_first(&items, plan.new_count).collect();
        let payloads =
            render(self.source.as_ref(), state.name(), new_items, &self.permalink_base).await;

        for payload in &payloads {
            match self.notifier.deliver(state.endpoint(), payload).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    let body = serde_json::to_string(payload).unwrap_or_default();
                    error!("r/{}: failed to send webhook: {}\n Payload: {}", state.name(), e, body);
                }
            }
        }

        Ok(report)
    }

}

/// Render payloads for `items` in the order given, resolving the icon once
pub async fn render<'a, I>(
    source: &dyn FeedSource,
    feed: &str,
    items: I,
    permalink_base: &str,
) -> Vec<WebhookPayload>
where
    I: IntoIterator<Item = &'a Item>,
{
    let items: Vec<&Item> = items.into_iter().collect();
    if items.is_empty() {
        return Vec::new();
    }

    let icon = source.resolve_icon(feed).await;
    if icon == Icon::Missing {
        debug!("r/{}: no icon, sending notifications without one", feed);
    }

    items
        .into_iter()
        .map(|item| WebhookPayload::for_item(feed, item, &icon, permalink_base))
        .collect()
}
