//! # Resumable two-level extraction loop.
//!
//! Walks every record of every unit of an [`ExtractionPlan`], surviving
//! transient failures by discarding the session and resuming from the
//! preserved [`Cursor`].
//!
//! ```text
//! run()
//!  loop:
//!    from = cursor
//!    resume(from) ──► Ok            → return table
//!                 ──► Err(transient) → close session, backoff, loop
//!                 ──► Err(fatal)     → return Err
//!
//! resume(from):
//!   tab = handed-in tab (first pass) or Tab::open(browser)
//!   for unit in from.unit..:
//!     enter_unit; is_logged_out(probe)?  → SessionExpired
//!     for record in cursor.record..:
//!       lookup → Found | NotFound        → commit row, cursor.record += 1
//!     cursor = next_unit
//!     remaining_time < threshold && more units → SessionExpired
//! ```
//!
//! ## Rules
//! - The cursor only moves after a record is fully read and committed, so a
//!   record interrupted mid-read is revisited and never half-written.
//! - `NotFound` is committed with the sentinel and never restarts the session.
//! - The remaining-time probe runs after the cursor has moved past the
//!   finished unit, so a proactive restart never repeats that unit.
//! - `restarts` counts consecutive restarts without progress; any committed
//!   record or finished unit resets it.

use std::sync::Arc;
use std::time::Duration;

use crate::core::Config;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;

use super::browser::{Browser, Tab};
use super::cursor::Cursor;
use super::portal::{Portal, RecordOutcome};
use super::table::ResultTable;
use super::work::ExtractionPlan;

/// Tunables of the restart loop, usually taken from [`Config`].
#[derive(Clone, Debug)]
pub struct ExtractionSettings {
    /// Restart proactively when fewer seconds than this remain.
    pub min_session_remaining: Duration,
    /// Timeout handed to `Session::is_logged_out` after entering a unit.
    pub logout_probe: Duration,
    /// Delay before each replacement session.
    pub restart_backoff: BackoffPolicy,
    /// Consecutive non-progress restarts allowed; `None` = unlimited.
    pub restart_limit: Option<u32>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ExtractionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            min_session_remaining: cfg.min_session_remaining,
            logout_probe: cfg.logout_probe,
            restart_backoff: cfg.restart_backoff.clone(),
            restart_limit: cfg.restart_limit(),
        }
    }
}

/// One extraction run over one work item.
pub struct ExtractionLoop {
    browser: Arc<dyn Browser>,
    portal: Arc<dyn Portal>,
    plan: ExtractionPlan,
    settings: ExtractionSettings,

    bus: Option<Bus>,
    task: Option<Arc<str>>,

    cursor: Cursor,
    table: ResultTable,
    tab: Option<Tab>,
    restarts: u32,
}

impl ExtractionLoop {
    /// Creates a loop positioned at [`Cursor::START`].
    pub fn new(
        browser: Arc<dyn Browser>,
        portal: Arc<dyn Portal>,
        plan: ExtractionPlan,
        settings: ExtractionSettings,
    ) -> Self {
        let table = ResultTable::new(plan.columns.iter().cloned());
        Self {
            browser,
            portal,
            plan,
            settings,
            bus: None,
            task: None,
            cursor: Cursor::START,
            table,
            tab: None,
            restarts: 0,
        }
    }

    /// Uses `tab` for the first pass instead of opening a new session.
    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.tab = Some(tab);
        self
    }

    /// Publishes progress events on `bus` under `task`.
    pub fn with_bus(mut self, bus: Bus, task: impl Into<Arc<str>>) -> Self {
        self.bus = Some(bus);
        self.task = Some(task.into());
        self
    }

    /// Current resumption point.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Rows committed so far.
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Consecutive restarts without progress.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Runs to completion, restarting the session on transient failures.
    ///
    /// Returns the accumulated table once every unit is exhausted.
    pub async fn run(mut self) -> Result<ResultTable, TaskError> {
        loop {
            let from = self.cursor;
            match self.resume(from).await {
                Ok(()) => return Ok(self.table),
                Err(e) if e.is_transient() => self.schedule_restart(e).await?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Walks the plan from `from` in a single session.
    ///
    /// Uses the handed-in tab if one is pending, otherwise opens a new
    /// session. The session is closed before returning, whatever the outcome.
    pub async fn resume(&mut self, from: Cursor) -> Result<(), TaskError> {
        self.cursor = from;
        if self.cursor.is_done(self.plan.units.len()) {
            if let Some(tab) = self.tab.take() {
                tab.close().await;
            }
            return Ok(());
        }

        let tab = match self.tab.take() {
            Some(tab) => tab,
            None => Tab::open(self.browser.as_ref()).await?,
        };
        let res = self.walk(&tab).await;
        tab.close().await;
        res
    }

    async fn walk(&mut self, tab: &Tab) -> Result<(), TaskError> {
        let units = self.plan.units.len();
        while !self.cursor.is_done(units) {
            let unit = self.plan.units[self.cursor.unit].clone();

            self.portal.enter_unit(tab, &unit).await?;
            if tab.session.is_logged_out(self.settings.logout_probe).await? {
                return Err(TaskError::session_expired(format!(
                    "logged out after entering unit {unit}"
                )));
            }
            self.publish(
                Event::new(EventKind::UnitEntered)
                    .with_cursor(self.cursor.unit, self.cursor.record),
            );

            while self.cursor.record < self.plan.records.len() {
                let record = self.plan.records[self.cursor.record].clone();
                let outcome = self.portal.lookup(tab, &unit, &record).await?;
                if let RecordOutcome::NotFound = outcome {
                    self.publish(
                        Event::new(EventKind::RecordNotFound)
                            .with_cursor(self.cursor.unit, self.cursor.record)
                            .with_reason(record.as_str()),
                    );
                }
                self.table.commit(self.cursor, unit.as_str(), record, outcome);
                self.cursor = self.cursor.next_record();
                self.restarts = 0;
            }

            self.publish(Event::new(EventKind::UnitCompleted).with_unit(self.cursor.unit));
            let finished = self.cursor.unit;
            self.cursor = self.cursor.next_unit();
            self.restarts = 0;

            if self.cursor.is_done(units) {
                break;
            }
            let remaining = tab.session.remaining_time_secs().await?;
            let threshold = i64::try_from(self.settings.min_session_remaining.as_secs())
                .unwrap_or(i64::MAX);
            if remaining < threshold {
                self.publish(
                    Event::new(EventKind::SessionProbeLow)
                        .with_unit(finished)
                        .with_reason(format!("{remaining}s")),
                );
                return Err(TaskError::session_expired(format!(
                    "remaining session time {remaining}s below {threshold}s"
                )));
            }
        }
        Ok(())
    }

    async fn schedule_restart(&mut self, cause: TaskError) -> Result<(), TaskError> {
        if let Some(limit) = self.settings.restart_limit {
            if self.restarts >= limit {
                return Err(TaskError::fatal(format!(
                    "gave up after {limit} restarts without progress: {cause}"
                )));
            }
        }

        let delay = self.settings.restart_backoff.next(self.restarts);
        self.restarts += 1;
        self.publish(
            Event::new(EventKind::SessionRestartScheduled)
                .with_cursor(self.cursor.unit, self.cursor.record)
                .with_attempt(self.restarts)
                .with_delay(delay)
                .with_reason(cause.as_message()),
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            let ev = match &self.task {
                Some(task) => ev.with_task(Arc::clone(task)),
                None => ev,
            };
            bus.publish(ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FakeBrowser, ScriptedPortal};

    fn plan(units: usize, records: usize) -> ExtractionPlan {
        ExtractionPlan {
            units: (0..units).map(|u| format!("org-{u}")).collect(),
            records: (0..records).map(|r| format!("p-{r}")).collect(),
            columns: vec!["name".into()],
        }
    }

    fn settings() -> ExtractionSettings {
        ExtractionSettings {
            min_session_remaining: Duration::from_secs(120),
            logout_probe: Duration::from_secs(2),
            restart_backoff: BackoffPolicy::immediate(),
            restart_limit: None,
        }
    }

    fn extraction(
        browser: &Arc<FakeBrowser>,
        portal: &Arc<ScriptedPortal>,
        p: ExtractionPlan,
    ) -> ExtractionLoop {
        ExtractionLoop::new(browser.clone(), portal.clone(), p, settings())
    }

    #[tokio::test]
    async fn transient_failure_resumes_at_preserved_record() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        portal.fail_once("org-0", "p-3", TaskError::session_expired("kicked"));

        let table = extraction(&browser, &portal, plan(1, 10)).run().await.unwrap();

        let visits = portal.committed_records("org-0");
        assert_eq!(visits, (0..10).map(|r| format!("p-{r}")).collect::<Vec<_>>());
        assert_eq!(portal.attempts("org-0", "p-3"), 2);
        assert_eq!(portal.attempts("org-0", "p-4"), 1);
        assert_eq!(portal.attempts("org-0", "p-0"), 1);
        assert_eq!(table.len(), 10);
        assert_eq!(portal.entries("org-0"), 2);
        assert_eq!(browser.sessions_opened(), 2);
        assert_eq!(browser.sessions_closed(), 2);
    }

    #[tokio::test]
    async fn not_found_is_recorded_without_restart() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        portal.missing("org-0", "p-2");
        portal.missing("org-1", "p-0");

        let table = extraction(&browser, &portal, plan(2, 4)).run().await.unwrap();

        assert_eq!(table.len(), 8);
        assert_eq!(table.not_found_count(), 2);
        assert!(table.get(Cursor::new(0, 2)).unwrap().outcome.is_not_found());
        assert_eq!(portal.attempts("org-0", "p-2"), 1);
        assert_eq!(browser.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn low_remaining_time_restarts_before_next_unit() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        browser.set_remaining_secs(30);
        let portal = Arc::new(ScriptedPortal::new());

        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let table = extraction(&browser, &portal, plan(3, 2))
            .with_bus(bus, "chromium#1")
            .run()
            .await
            .unwrap();

        assert_eq!(table.len(), 6);
        // One session per unit, each unit entered exactly once.
        assert_eq!(browser.sessions_opened(), 3);
        for u in 0..3 {
            assert_eq!(portal.entries(&format!("org-{u}")), 1);
        }

        let mut probes = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SessionProbeLow {
                probes += 1;
                assert_eq!(ev.task.as_deref(), Some("chromium#1"));
            }
        }
        assert_eq!(probes, 2);
    }

    #[tokio::test]
    async fn logged_out_after_entry_is_transient() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        browser.logged_out_once();
        let portal = Arc::new(ScriptedPortal::new());

        let table = extraction(&browser, &portal, plan(1, 3)).run().await.unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(portal.entries("org-0"), 2);
        assert_eq!(portal.attempts("org-0", "p-0"), 1);
    }

    #[tokio::test]
    async fn fatal_error_aborts_and_closes_session() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        portal.fail_once("org-0", "p-1", TaskError::fatal("layout changed"));

        let err = extraction(&browser, &portal, plan(1, 3)).run().await.unwrap_err();

        assert!(matches!(err, TaskError::Fatal { .. }));
        assert_eq!(browser.sessions_closed(), 1);
        assert_eq!(portal.attempts("org-0", "p-2"), 0);
    }

    #[tokio::test]
    async fn restart_cap_turns_fatal_without_progress() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        portal.always_fail("org-0", "p-0", TaskError::session_expired("down"));

        let mut s = settings();
        s.restart_limit = Some(3);
        let err = ExtractionLoop::new(browser.clone(), portal.clone(), plan(1, 2), s)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Fatal { .. }));
        assert_eq!(portal.attempts("org-0", "p-0"), 4);
        assert_eq!(browser.sessions_opened(), 4);
        assert_eq!(browser.sessions_closed(), 4);
    }

    #[test]
    fn settings_take_restart_limit_from_config() {
        let capped = Config {
            max_restarts: 2,
            ..Config::default()
        };
        assert_eq!(ExtractionSettings::from(&capped).restart_limit, Some(2));
        assert_eq!(ExtractionSettings::default().restart_limit, None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_for_backoff() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        portal.fail_once("org-0", "p-0", TaskError::NavigationTimeout {
            timeout: Duration::from_secs(5),
        });

        let mut s = settings();
        s.restart_backoff = BackoffPolicy {
            first: Duration::from_millis(500),
            ..BackoffPolicy::default()
        };
        let started = tokio::time::Instant::now();
        ExtractionLoop::new(browser.clone(), portal.clone(), plan(1, 1), s)
            .run()
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn resume_is_callable_from_an_explicit_cursor() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());

        let mut lp = extraction(&browser, &portal, plan(2, 3));
        lp.resume(Cursor::new(1, 2)).await.unwrap();

        assert_eq!(lp.cursor(), Cursor::new(2, 0));
        assert_eq!(lp.table().len(), 1);
        assert_eq!(portal.entries("org-0"), 0);
        assert_eq!(portal.committed_records("org-1"), vec!["p-2".to_string()]);
    }

    #[tokio::test]
    async fn handed_in_tab_is_used_for_first_pass() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let portal = Arc::new(ScriptedPortal::new());
        let tab = Tab::open(browser.as_ref()).await.unwrap();

        extraction(&browser, &portal, plan(1, 2))
            .with_tab(tab)
            .run()
            .await
            .unwrap();
        assert_eq!(browser.sessions_opened(), 1);
        assert_eq!(browser.sessions_closed(), 1);
    }
}
