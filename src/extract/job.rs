//! # Task bodies the scheduler runs.
//!
//! - [`ExtractionJob`]: loads the plan for the work item, runs the resumable
//!   [`ExtractionLoop`] and enqueues the finished table.
//! - [`PipelineJob`]: runs named steps through a [`PipelineExecutor`] with the
//!   task's resources in the [`ExecutionContext`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::pipeline::{ExecutionContext, PipelineExecutor};
use crate::scheduler::{TaskBody, TaskContext};

use super::extraction::{ExtractionLoop, ExtractionSettings};
use super::portal::Portal;
use super::work::{ExtractionResult, PlanSource};

/// Context field names [`PipelineJob`] provides.
pub mod fields {
    /// `Arc<dyn Browser>`.
    pub const BROWSER: &str = "browser";
    /// `Arc<dyn Session>`.
    pub const SESSION: &str = "session";
    /// `Arc<dyn Page>`.
    pub const PAGE: &str = "page";
    /// `WorkItem`.
    pub const WORK_ITEM: &str = "work_item";
    /// `ResultQueue`.
    pub const RESULTS: &str = "results";
    /// `TaskId`.
    pub const TASK_ID: &str = "task_id";
}

/// Resumable extraction over one work item per task.
pub struct ExtractionJob {
    plans: Arc<dyn PlanSource>,
    portal: Arc<dyn Portal>,
    settings: ExtractionSettings,
}

impl ExtractionJob {
    /// Creates the job.
    pub fn new(
        plans: Arc<dyn PlanSource>,
        portal: Arc<dyn Portal>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            plans,
            portal,
            settings,
        }
    }
}

#[async_trait]
impl TaskBody for ExtractionJob {
    fn name(&self) -> &str {
        "extraction"
    }

    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError> {
        let plan = match self.plans.load(&ctx.item) {
            Ok(plan) => plan,
            Err(e) => {
                ctx.tab.close().await;
                return Err(e);
            }
        };

        let table = ExtractionLoop::new(
            ctx.browser,
            Arc::clone(&self.portal),
            plan,
            self.settings.clone(),
        )
        .with_tab(ctx.tab)
        .with_bus(ctx.bus, ctx.id.label())
        .run()
        .await?;

        ctx.results
            .enqueue(ExtractionResult::new(table, &ctx.item))
            .map_err(|e| TaskError::fatal(e.as_message()))
    }
}

/// Runs `names` through the executor for every task.
pub struct PipelineJob {
    executor: PipelineExecutor,
    names: Vec<String>,
}

impl PipelineJob {
    /// Creates the job.
    pub fn new<I, S>(executor: PipelineExecutor, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executor,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the execution context a task's steps see.
    pub fn context(ctx: &TaskContext) -> ExecutionContext {
        ExecutionContext::new()
            .with(fields::BROWSER, Arc::clone(&ctx.browser))
            .with(fields::SESSION, Arc::clone(&ctx.tab.session))
            .with(fields::PAGE, Arc::clone(&ctx.tab.page))
            .with(fields::WORK_ITEM, ctx.item.clone())
            .with(fields::RESULTS, ctx.results.clone())
            .with(fields::TASK_ID, ctx.id.clone())
            .with_bus(ctx.bus.clone(), Some(ctx.id.as_str()))
    }
}

#[async_trait]
impl TaskBody for PipelineJob {
    fn name(&self) -> &str {
        "pipeline"
    }

    async fn run(&self, ctx: TaskContext) -> Result<(), TaskError> {
        let ectx = Self::context(&ctx);
        let res = self.executor.execute_in_order(&ectx, &self.names).await;
        ctx.tab.close().await;
        res.map(|_outcomes| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use crate::extract::{Page, Tab, WorkItem};
    use crate::pipeline::{Step, StepRegistry};
    use crate::scheduler::{ResultQueue, TaskId};
    use crate::testkit::{FakeBrowser, ScriptedPortal, StaticPlans};

    async fn task_ctx(browser: &Arc<FakeBrowser>, results: &ResultQueue) -> TaskContext {
        TaskContext {
            id: TaskId::new("chromium", 1),
            item: WorkItem::new("a.xlsx", "/in/a.xlsx"),
            browser: browser.clone(),
            tab: Tab::open(browser.as_ref()).await.unwrap(),
            results: results.clone(),
            bus: Bus::new(64),
        }
    }

    #[tokio::test]
    async fn extraction_job_enqueues_tagged_table() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let results = ResultQueue::new();
        let job = ExtractionJob::new(
            Arc::new(StaticPlans::new(["org-0", "org-1"], ["p-0", "p-1", "p-2"])),
            Arc::new(ScriptedPortal::new()),
            ExtractionSettings::default(),
        );

        job.run(task_ctx(&browser, &results).await).await.unwrap();

        let result = results.try_dequeue().unwrap();
        assert_eq!(result.source_name, "a.xlsx");
        assert_eq!(result.source_path, std::path::PathBuf::from("/in/a.xlsx"));
        assert_eq!(result.table.len(), 6);
        assert_eq!(browser.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn extraction_job_closes_tab_when_plan_fails() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let results = ResultQueue::new();
        let job = ExtractionJob::new(
            Arc::new(StaticPlans::failing("sheet unreadable")),
            Arc::new(ScriptedPortal::new()),
            ExtractionSettings::default(),
        );

        let err = job.run(task_ctx(&browser, &results).await).await.unwrap_err();
        assert!(matches!(err, TaskError::Fatal { .. }));
        assert_eq!(browser.sessions_closed(), 1);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn pipeline_job_exposes_task_resources() {
        let browser = Arc::new(FakeBrowser::new("chromium"));
        let results = ResultQueue::new();

        let mut reg = StepRegistry::new();
        reg.register(
            Step::primary("open_portal", |args| async move {
                let page = args.get::<Arc<dyn Page>>(fields::PAGE)?;
                let item = args.get::<WorkItem>(fields::WORK_ITEM)?;
                page.goto(&format!("https://portal/{}", item.source_name)).await?;
                Ok::<_, TaskError>(args.get::<TaskId>(fields::TASK_ID)?.index() == 1)
            })
            .with_params([fields::PAGE, fields::WORK_ITEM, fields::TASK_ID]),
        )
        .unwrap();

        let job = PipelineJob::new(PipelineExecutor::new(Arc::new(reg)), ["open_portal"]);
        job.run(task_ctx(&browser, &results).await).await.unwrap();

        assert_eq!(browser.visited(), vec!["https://portal/a.xlsx".to_string()]);
        assert_eq!(browser.sessions_closed(), 1);
    }
}
