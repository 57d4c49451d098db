//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//!
//! ## Example output
//! ```text
//! [task-admitted] task="chromium#1" source="orgs-a.xlsx"
//! [unit-entered] task="chromium#1" unit=0 from_record=0
//! [record-not-found] task="chromium#1" unit=0 record=4 id="12345678900"
//! [session-restart] task="chromium#1" unit=0 record=7 attempt=1 delay=100ms err="session expired: logout"
//! [task-released] task="chromium#1"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render(e: &Event) -> String {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SubscriberPanicked => {
                format!("[subscriber-panicked] subscriber={task:?} info={reason:?}")
            }
            EventKind::SubscriberOverflow => {
                format!("[subscriber-overflow] subscriber={task:?} reason={reason:?}")
            }
            EventKind::ShutdownRequested => "[shutdown-requested]".to_string(),
            EventKind::AllStoppedWithin => "[all-stopped-within-grace]".to_string(),
            EventKind::GraceExceeded => format!("[grace-exceeded] stuck={reason:?}"),
            EventKind::HelperStopped => {
                format!("[helper-stopped] helper={task:?} delay={:?}ms", e.delay_ms)
            }
            EventKind::TaskAdmitted => {
                format!("[task-admitted] task={task:?} source={:?}", e.source)
            }
            EventKind::TaskStarted => {
                format!("[task-started] task={task:?} source={:?}", e.source)
            }
            EventKind::TaskCompleted => format!("[task-completed] task={task:?}"),
            EventKind::TaskFailed => format!("[task-failed] task={task:?} err={reason:?}"),
            EventKind::TaskReleased => format!("[task-released] task={task:?}"),
            EventKind::StepSucceeded => {
                format!("[step-ok] task={task:?} step={:?}", e.step)
            }
            EventKind::StepFailed => {
                format!("[step-failed] task={task:?} step={:?}", e.step)
            }
            EventKind::UnitEntered => format!(
                "[unit-entered] task={task:?} unit={:?} from_record={:?}",
                e.unit, e.record
            ),
            EventKind::UnitCompleted => {
                format!("[unit-completed] task={task:?} unit={:?}", e.unit)
            }
            EventKind::RecordNotFound => format!(
                "[record-not-found] task={task:?} unit={:?} record={:?} id={reason:?}",
                e.unit, e.record
            ),
            EventKind::SessionProbeLow => format!(
                "[session-low] task={task:?} unit={:?} remaining={reason}s",
                e.unit
            ),
            EventKind::SessionRestartScheduled => format!(
                "[session-restart] task={task:?} unit={:?} record={:?} attempt={:?} delay={:?}ms err={reason:?}",
                e.unit, e.record, e.attempt, e.delay_ms
            ),
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::render(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_restart_line() {
        let ev = Event::new(EventKind::SessionRestartScheduled)
            .with_task("chromium#1")
            .with_cursor(0, 7)
            .with_attempt(1)
            .with_reason("boom");
        let line = LogWriter::render(&ev);
        assert!(line.starts_with("[session-restart] task=\"chromium#1\""));
        assert!(line.contains("record=Some(7)"));
    }
}
