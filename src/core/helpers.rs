//! # Background helpers with ordered shutdown.
//!
//! A helper is a periodic job (e.g. draining the result queue into a sink).
//! Each runs on its own tokio task with its own [`CancellationToken`].
//!
//! ```text
//! spawn(name, delay, pass):
//!   loop { pass().await; select!(cancelled → break, sleep(delay)) }
//!   pass().await                                        // final pass
//!
//! stop_all():
//!   sort by delay ascending
//!   for each: cancel → join → publish HelperStopped
//! ```
//!
//! ## Rules
//! - Fast-polling helpers are confirmed stopped before slow ones.
//! - Every helper runs one last pass after it is signalled, so nothing it
//!   was responsible for is left behind.
//! - A panicking helper does not prevent the others from being stopped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::extract::ResultSink;
use crate::scheduler::ResultQueue;

struct Helper {
    name: Arc<str>,
    poll_delay: Duration,
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Owned set of running helpers.
pub struct HelperSet {
    helpers: Vec<Helper>,
    bus: Bus,
}

impl HelperSet {
    /// Creates an empty set publishing stop events on `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            helpers: Vec::new(),
            bus,
        }
    }

    /// Spawns a helper running `pass` every `poll_delay`.
    pub fn spawn<F, Fut>(&mut self, name: impl Into<Arc<str>>, poll_delay: Duration, mut pass: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let stop = token.clone();
        let join = tokio::spawn(async move {
            loop {
                pass().await;
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(poll_delay) => {}
                }
            }
            pass().await;
        });
        self.helpers.push(Helper {
            name: name.into(),
            poll_delay,
            token,
            join,
        });
    }

    /// Number of helpers.
    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    /// True if no helper was spawned.
    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Helper names in the order [`stop_all`](Self::stop_all) will stop them.
    pub fn stop_order(&self) -> Vec<&str> {
        let mut refs: Vec<&Helper> = self.helpers.iter().collect();
        refs.sort_by_key(|h| h.poll_delay);
        refs.into_iter().map(|h| &*h.name).collect()
    }

    /// Stops every helper, fastest poller first: cancel, then join.
    ///
    /// Returns the first [`RuntimeError::HelperPanicked`], if any.
    pub async fn stop_all(self) -> Result<(), RuntimeError> {
        let mut helpers = self.helpers;
        helpers.sort_by_key(|h| h.poll_delay);

        let mut first_err = None;
        for h in helpers {
            h.token.cancel();
            match h.join.await {
                Ok(()) => self.bus.publish(
                    Event::new(EventKind::HelperStopped)
                        .with_task(Arc::clone(&h.name))
                        .with_delay(h.poll_delay),
                ),
                Err(e) if e.is_panic() => {
                    first_err.get_or_insert(RuntimeError::HelperPanicked {
                        name: h.name.to_string(),
                    });
                }
                Err(_) => {}
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Builds a helper pass that moves every queued result into `sink`.
///
/// Persistence failures are published as `TaskFailed` for `"persist"` and the
/// result is dropped.
pub fn persist_results(
    results: ResultQueue,
    sink: Arc<dyn ResultSink>,
    bus: Bus,
) -> impl FnMut() -> BoxFuture<'static, ()> + Send + 'static {
    move || {
        let results = results.clone();
        let sink = Arc::clone(&sink);
        let bus = bus.clone();
        async move {
            while let Some(result) = results.try_dequeue() {
                let source = result.source_name.clone();
                if let Err(e) = sink.persist(result).await {
                    bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task("persist")
                            .with_source(source)
                            .with_reason(e.as_message()),
                    );
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionResult, ResultTable, WorkItem};
    use crate::testkit::MemorySink;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn stops_in_ascending_delay_order() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let mut set = HelperSet::new(bus);
        set.spawn("slow", Duration::from_millis(500), || async {});
        set.spawn("fast", Duration::from_millis(10), || async {});
        set.spawn("mid", Duration::from_millis(100), || async {});
        assert_eq!(set.stop_order(), vec!["fast", "mid", "slow"]);

        set.stop_all().await.unwrap();

        let mut stopped = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::HelperStopped {
                stopped.push(ev.task.unwrap().to_string());
            }
        }
        assert_eq!(stopped, vec!["fast", "mid", "slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_final_pass_after_stop() {
        let passes = Arc::new(Mutex::new(0u32));
        let mut set = HelperSet::new(Bus::new(8));
        let p = passes.clone();
        set.spawn("count", Duration::from_secs(3600), move || {
            let p = p.clone();
            async move {
                *p.lock().unwrap() += 1;
            }
        });
        tokio::task::yield_now().await;
        set.stop_all().await.unwrap();
        assert_eq!(*passes.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn panicking_helper_is_reported_and_others_still_stop() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let mut set = HelperSet::new(bus);
        set.spawn("bad", Duration::from_millis(1), || async {
            panic!("sink gone");
        });
        set.spawn("good", Duration::from_millis(5), || async {});

        let err = set.stop_all().await.unwrap_err();
        assert!(matches!(err, RuntimeError::HelperPanicked { ref name } if name == "bad"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::HelperStopped);
        assert_eq!(ev.task.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn persist_pass_drains_results_into_sink() {
        let results = ResultQueue::new();
        let item = WorkItem::new("a.xlsx", "/in/a.xlsx");
        results
            .enqueue(ExtractionResult::new(ResultTable::new(["name"]), &item))
            .unwrap();
        results
            .enqueue(ExtractionResult::new(ResultTable::new(["name"]), &item))
            .unwrap();

        let sink = Arc::new(MemorySink::default());
        let mut pass = persist_results(results.clone(), sink.clone(), Bus::new(8));
        pass().await;

        assert!(results.is_empty());
        assert_eq!(sink.persisted().len(), 2);
        assert_eq!(sink.persisted()[0].source_name, "a.xlsx");
    }
}
