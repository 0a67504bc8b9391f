use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::relay::{FeedRegistry, FeedState, RelayEngine};

/// Polls every registered feed on its own timer until shutdown
pub struct SchedulerService {
    engine: Arc<RelayEngine>,
    period: Duration,
}

impl SchedulerService {
    /// Create a scheduler polling at the configured interval
    pub fn new(engine: Arc<RelayEngine>, sync: &SyncConfig) -> Self {
        Self::with_period(engine, sync.poll_interval())
    }

    pub fn with_period(engine: Arc<RelayEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Run one worker per feed until the shutdown signal flips to `true`.
    ///
    /// Cycles still in flight at shutdown are dropped, not drained.
    pub async fn run(self, registry: FeedRegistry, mut shutdown: watch::Receiver<bool>) {
        if registry.is_empty() {
            info!("No feeds to poll, waiting for shutdown");
            wait_for_shutdown(&mut shutdown).await;
            return;
        }

        info!(
            "Scheduler started: {} feeds, poll interval {}s",
            registry.len(),
            self.period.as_secs()
        );

        let mut workers = JoinSet::new();
        for state in registry.into_states() {
            workers.spawn(poll_feed(
                Arc::clone(&self.engine),
                state,
                self.period,
                shutdown.clone(),
            ));
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!("Feed worker ended abnormally: {}", e);
            }
        }

        info!("Scheduler stopped");
    }
}

/// Worker loop for one feed. Owns the feed's state, so cycles never overlap.
async fn poll_feed(
    engine: Arc<RelayEngine>,
    mut state: FeedState,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // First tick fires at once; each later one lands a full period after the
    // previous cycle finished
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            _ = interval.tick() => {}
        }

        debug!("Polling r/{}", state.name());

        let cycle = AssertUnwindSafe(engine.run_cycle(&mut state)).catch_unwind();
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            outcome = cycle => match outcome {
                Ok(Ok(report)) => {
                    if report.failed > 0 {
                        warn!(
                            "r/{}: {} of {} notifications failed",
                            state.name(),
                            report.failed,
                            report.new_items
                        );
                    }
                }
                Ok(Err(e)) => warn!("Poll of r/{} failed: {}", state.name(), e),
                Err(panic) => error!(
                    "Poll of r/{} panicked: {}",
                    state.name(),
                    panic_message(panic.as_ref())
                ),
            },
        }

        interval.reset();
    }

    debug!("Worker for r/{} stopped", state.name());
}

/// Resolves once the signal is `true` or its sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Feed, FeedSource, Icon, Item};
    use crate::notify::{Notifier, WebhookPayload};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::{timeout, Instant};

    /// Per-feed behaviour: "ok" lists one new post per call, "fail" errors,
    /// "panic-once" panics on its first call, "hang" never answers,
    /// "slow" takes 50s to answer
    #[derive(Default)]
    struct FakeSource {
        modes: HashMap<String, &'static str>,
        calls: Mutex<HashMap<String, usize>>,
        started: Mutex<Vec<Instant>>,
    }

    impl FakeSource {
        fn new(modes: &[(&str, &'static str)]) -> Self {
            Self {
                modes: modes.iter().map(|(f, m)| (f.to_string(), *m)).collect(),
                ..Self::default()
            }
        }

        fn calls(&self, feed: &str) -> usize {
            self.calls.lock().unwrap().get(feed).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl FeedSource for FakeSource {
        async fn fetch_items(&self, feed: &str) -> Result<Vec<Item>> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(feed.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            self.started.lock().unwrap().push(Instant::now());

            match self.modes.get(feed).copied().unwrap_or("ok") {
                "fail" => Err(Error::Fetch {
                    feed: feed.to_string(),
                    reason: "HTTP 500".into(),
                }),
                "panic-once" if call == 1 => panic!("listing decoder blew up"),
                "hang" => std::future::pending::<Result<Vec<Item>>>().await,
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(50)).await;
                    Ok(Vec::new())
                }
                _ => Ok(vec![Item {
                    id: format!("{}-{}", feed, call),
                    ..Item::default()
                }]),
            }
        }

        async fn resolve_icon(&self, _feed: &str) -> Icon {
            Icon::Missing
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn deliver(&self, _endpoint: &str, _payload: &WebhookPayload) -> Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry(names: &[&str]) -> FeedRegistry {
        let mut registry = FeedRegistry::new();
        for name in names {
            registry.insert(FeedState::new(Feed::new(*name, "https://example.com/hook")));
        }
        registry
    }

    fn scheduler(source: Arc<FakeSource>, notifier: Arc<CountingNotifier>) -> SchedulerService {
        let engine = Arc::new(RelayEngine::new(source, notifier, "https://reddit.com"));
        SchedulerService::with_period(engine, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_then_periodic() {
        let source = Arc::new(FakeSource::new(&[]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source.clone(), notifier.clone()).run(registry(&["rust"]), shutdown_rx),
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // Ticks at 0s, 60s and 120s
        assert_eq!(source.calls("rust"), 3);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_waits_full_period_after_finishing() {
        let source = Arc::new(FakeSource::new(&[("slow", "slow")]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source.clone(), notifier.clone()).run(registry(&["slow"]), shutdown_rx),
        );

        // Cycles start at 0s, 110s and 220s: 50s of work plus a 60s pause each
        tokio::time::sleep(Duration::from_secs(250)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let started = source.started.lock().unwrap().clone();
        assert_eq!(started.len(), 3);
        let gaps: Vec<Duration> = started.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![Duration::from_secs(110); 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_feed_does_not_affect_others() {
        let source = Arc::new(FakeSource::new(&[("broken", "fail")]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source.clone(), notifier.clone())
                .run(registry(&["broken", "rust"]), shutdown_rx),
        );

        tokio::time::sleep(Duration::from_secs(90)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // The broken feed keeps being retried on schedule
        assert_eq!(source.calls("broken"), 2);
        assert_eq!(source.calls("rust"), 2);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_cycle_keeps_worker_alive() {
        let source = Arc::new(FakeSource::new(&[("rust", "panic-once")]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source.clone(), notifier.clone()).run(registry(&["rust"]), shutdown_rx),
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(source.calls("rust"), 3);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_in_flight_cycle() {
        let source = Arc::new(FakeSource::new(&[("slow", "hang")]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source.clone(), notifier.clone()).run(registry(&["slow"]), shutdown_rx),
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls("slow"), 1);

        shutdown_tx.send(true).unwrap();
        let result = timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_registry_waits_for_shutdown() {
        let source = Arc::new(FakeSource::new(&[]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle =
            tokio::spawn(scheduler(source, notifier).run(FeedRegistry::new(), shutdown_rx));

        shutdown_tx.send(true).unwrap();
        let result = timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_scheduler() {
        let source = Arc::new(FakeSource::new(&[]));
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            scheduler(source, notifier).run(registry(&["rust"]), shutdown_rx),
        );

        drop(shutdown_tx);
        let result = timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
