//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::extract::{
    Browser, ExtractionPlan, ExtractionResult, Fields, Locator, Page, PlanSource, Portal,
    RecordOutcome, ResultSink, Session, Tab, WorkItem,
};
use crate::subscribers::Subscribe;
use crate::ui::UiSurface;

/// Subscriber remembering every event it saw.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[derive(Default)]
struct BrowserState {
    opened: AtomicUsize,
    closed: AtomicUsize,
    fail_session: AtomicBool,
    fail_page: AtomicBool,
    logged_out: AtomicBool,
    remaining: AtomicI64,
    visited: Mutex<Vec<String>>,
}

/// Browser handing out in-memory sessions.
pub(crate) struct FakeBrowser {
    kind: String,
    state: Arc<BrowserState>,
}

impl FakeBrowser {
    pub(crate) fn new(kind: &str) -> Self {
        let state = BrowserState::default();
        state.remaining.store(3600, Ordering::SeqCst);
        Self {
            kind: kind.to_string(),
            state: Arc::new(state),
        }
    }

    pub(crate) fn fail_next_session(&self) {
        self.state.fail_session.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_page(&self) {
        self.state.fail_page.store(true, Ordering::SeqCst);
    }

    /// Next `is_logged_out` probe reports true.
    pub(crate) fn logged_out_once(&self) {
        self.state.logged_out.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_remaining_secs(&self, secs: i64) {
        self.state.remaining.store(secs, Ordering::SeqCst);
    }

    pub(crate) fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn new_session(&self) -> Result<Arc<dyn Session>, TaskError> {
        if self.state.fail_session.swap(false, Ordering::SeqCst) {
            return Err(TaskError::NavigationTimeout {
                timeout: Duration::from_secs(30),
            });
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeSession {
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        }))
    }
}

struct FakeSession {
    state: Arc<BrowserState>,
    closed: AtomicBool,
}

#[async_trait]
impl Session for FakeSession {
    async fn new_page(&self) -> Result<Arc<dyn Page>, TaskError> {
        if self.state.fail_page.swap(false, Ordering::SeqCst) {
            return Err(TaskError::fatal("page refused"));
        }
        Ok(Arc::new(FakePage {
            state: Arc::clone(&self.state),
        }))
    }

    async fn remaining_time_secs(&self) -> Result<i64, TaskError> {
        Ok(self.state.remaining.load(Ordering::SeqCst))
    }

    async fn is_logged_out(&self, _timeout: Duration) -> Result<bool, TaskError> {
        Ok(self.state.logged_out.swap(false, Ordering::SeqCst))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct FakePage {
    state: Arc<BrowserState>,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<(), TaskError> {
        self.state.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn click(&self, _target: &Locator) -> Result<(), TaskError> {
        Ok(())
    }

    async fn type_text(&self, _target: &Locator, _text: &str) -> Result<(), TaskError> {
        Ok(())
    }

    async fn read_text(&self, _target: &Locator) -> Result<Option<String>, TaskError> {
        Ok(None)
    }
}

fn clone_err(e: &TaskError) -> TaskError {
    match e {
        TaskError::SessionExpired { reason } => TaskError::session_expired(reason.clone()),
        TaskError::NavigationTimeout { timeout } => {
            TaskError::NavigationTimeout { timeout: *timeout }
        }
        TaskError::Fatal { error } => TaskError::fatal(error.clone()),
        TaskError::Step(s) => TaskError::Step(s.clone()),
    }
}

type Key = (String, String);

struct Failure {
    err: TaskError,
    remaining: Option<usize>,
}

#[derive(Default)]
struct PortalState {
    failures: HashMap<Key, Failure>,
    missing: HashSet<Key>,
    attempts: HashMap<Key, usize>,
    committed: HashMap<String, Vec<String>>,
    entries: HashMap<String, usize>,
}

/// Portal whose per-record outcomes are scripted up front.
#[derive(Default)]
pub(crate) struct ScriptedPortal {
    state: Mutex<PortalState>,
}

impl ScriptedPortal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_once(&self, unit: &str, record: &str, err: TaskError) {
        self.script(unit, record, err, Some(1));
    }

    pub(crate) fn always_fail(&self, unit: &str, record: &str, err: TaskError) {
        self.script(unit, record, err, None);
    }

    pub(crate) fn missing(&self, unit: &str, record: &str) {
        let mut st = self.state.lock().unwrap();
        st.missing.insert((unit.to_string(), record.to_string()));
    }

    /// Lookups attempted for a record, failed ones included.
    pub(crate) fn attempts(&self, unit: &str, record: &str) -> usize {
        let st = self.state.lock().unwrap();
        st.attempts
            .get(&(unit.to_string(), record.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Records of `unit` that completed a lookup, in order.
    pub(crate) fn committed_records(&self, unit: &str) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.committed.get(unit).cloned().unwrap_or_default()
    }

    pub(crate) fn entries(&self, unit: &str) -> usize {
        let st = self.state.lock().unwrap();
        st.entries.get(unit).copied().unwrap_or(0)
    }

    fn script(&self, unit: &str, record: &str, err: TaskError, remaining: Option<usize>) {
        let mut st = self.state.lock().unwrap();
        st.failures
            .insert((unit.to_string(), record.to_string()), Failure { err, remaining });
    }
}

#[async_trait]
impl Portal for ScriptedPortal {
    async fn enter_unit(&self, _tab: &Tab, unit: &str) -> Result<(), TaskError> {
        let mut st = self.state.lock().unwrap();
        *st.entries.entry(unit.to_string()).or_default() += 1;
        Ok(())
    }

    async fn lookup(
        &self,
        _tab: &Tab,
        unit: &str,
        record: &str,
    ) -> Result<RecordOutcome, TaskError> {
        let key = (unit.to_string(), record.to_string());
        let mut st = self.state.lock().unwrap();
        *st.attempts.entry(key.clone()).or_default() += 1;

        if let Some(f) = st.failures.get_mut(&key) {
            match &mut f.remaining {
                None => return Err(clone_err(&f.err)),
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return Err(clone_err(&f.err));
                }
            }
        }

        st.committed
            .entry(unit.to_string())
            .or_default()
            .push(record.to_string());
        if st.missing.contains(&key) {
            return Ok(RecordOutcome::NotFound);
        }
        let mut fields = Fields::new();
        fields.insert("name".to_string(), format!("{unit}/{record}"));
        Ok(RecordOutcome::Found(fields))
    }
}

/// Plan source returning the same plan for every item.
pub(crate) struct StaticPlans {
    plan: Result<ExtractionPlan, String>,
}

impl StaticPlans {
    pub(crate) fn new<const U: usize, const R: usize>(
        units: [&str; U],
        records: [&str; R],
    ) -> Self {
        Self {
            plan: Ok(ExtractionPlan {
                units: units.iter().map(|s| s.to_string()).collect(),
                records: records.iter().map(|s| s.to_string()).collect(),
                columns: vec!["name".to_string()],
            }),
        }
    }

    pub(crate) fn failing(msg: &str) -> Self {
        Self {
            plan: Err(msg.to_string()),
        }
    }
}

impl PlanSource for StaticPlans {
    fn load(&self, _item: &WorkItem) -> Result<ExtractionPlan, TaskError> {
        self.plan.clone().map_err(TaskError::fatal)
    }
}

/// Sink keeping results in memory.
#[derive(Default)]
pub(crate) struct MemorySink {
    results: Mutex<Vec<ExtractionResult>>,
}

impl MemorySink {
    pub(crate) fn persisted(&self) -> Vec<ExtractionResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn persist(&self, result: ExtractionResult) -> Result<(), TaskError> {
        self.results.lock().unwrap().push(result);
        Ok(())
    }
}

/// UI surface that can be closed on demand or after a number of pumps.
pub(crate) struct FakeUi {
    open: AtomicBool,
    pumped: AtomicUsize,
    close_after: AtomicUsize,
}

impl FakeUi {
    pub(crate) fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            pumped: AtomicUsize::new(0),
            close_after: AtomicUsize::new(usize::MAX),
        }
    }

    pub(crate) fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Reports closed once `n` batches have been pumped.
    pub(crate) fn close_after(&self, n: usize) {
        self.close_after.store(n, Ordering::SeqCst);
    }

    pub(crate) fn pumped(&self) -> usize {
        self.pumped.load(Ordering::SeqCst)
    }
}

impl UiSurface for FakeUi {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
            && self.pumped.load(Ordering::SeqCst) < self.close_after.load(Ordering::SeqCst)
    }

    fn pump_events(&self) {
        self.pumped.fetch_add(1, Ordering::SeqCst);
    }
}
