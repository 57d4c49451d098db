//! # Steps: named, boolean-returning units of pipeline work.
//!
//! A [`Step`] bundles:
//! - a name and a [`StepKind`] (primary step or one of the four hook kinds),
//! - the context fields it reads ([`Param`]),
//! - an async callback returning `Result<bool, TaskError>`,
//! - two [`StepEvent`]s fired after the callback: `on_success` / `on_fail`.
//!
//! ## Run contract
//! ```text
//! run(ctx)
//!   ├─► ctx carries "step"?          → ReservedArgument
//!   ├─► declared param has default?  → DefaultArgument
//!   ├─► declared param not in ctx?   → MissingArgument
//!   ├─► callback(args).await
//!   │      ├─ Err(e)        → propagate, no event fires
//!   │      ├─ Ok(non-bool)  → NonBooleanReturn, no event fires
//!   │      ├─ Ok(true)      → on_success.run(ctx)
//!   │      └─ Ok(false)     → on_fail.run(ctx)
//!   └─► Ok(bool)
//! ```
//!
//! ## Example
//! ```rust
//! use portalvisor::{ExecutionContext, Step, StepArgs, TaskError};
//!
//! let step = Step::primary("check_unit", |args: StepArgs| async move {
//!     let unit = args.get::<String>("unit")?;
//!     Ok::<_, TaskError>(!unit.is_empty())
//! })
//! .with_params(["unit"]);
//!
//! let ctx = ExecutionContext::new().with("unit", String::from("0001"));
//! assert!(futures::executor::block_on(step.run(&ctx)).unwrap());
//! ```

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{StepError, TaskError};

use super::context::{ExecutionContext, StepArgs, StepInfo};
use super::step_event::StepEvent;

/// Where a step sits in a pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Addressable by name in a pipeline request.
    Primary,
    /// Runs once before any requested step.
    BeforeAll,
    /// Runs before each requested step.
    BeforeEvery,
    /// Runs after each requested step.
    AfterEvery,
    /// Runs once after all requested steps.
    AfterAll,
}

impl StepKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Primary => "primary",
            StepKind::BeforeAll => "before_all",
            StepKind::BeforeEvery => "before_every",
            StepKind::AfterEvery => "after_every",
            StepKind::AfterAll => "after_all",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(StepKind::Primary),
            "before_all" => Ok(StepKind::BeforeAll),
            "before_every" => Ok(StepKind::BeforeEvery),
            "after_every" => Ok(StepKind::AfterEvery),
            "after_all" => Ok(StepKind::AfterAll),
            other => Err(StepError::UnknownStepKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// A context field a step reads.
///
/// Declared as `"name"`. The form `"name=value"` declares a default, which
/// is rejected: every input must be wired explicitly through the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    name: Arc<str>,
    default: Option<String>,
}

impl Param {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

impl From<&str> for Param {
    fn from(decl: &str) -> Self {
        match decl.split_once('=') {
            Some((name, default)) => Param {
                name: Arc::from(name.trim()),
                default: Some(default.trim().to_string()),
            },
            None => Param {
                name: Arc::from(decl.trim()),
                default: None,
            },
        }
    }
}

/// What a step callback handed back, before the boolean contract is checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepValue {
    /// A proper step result.
    Bool(bool),
    /// Any other value; carries its type name for the error message.
    Other(&'static str),
}

/// Conversion of callback return values into [`StepValue`].
pub trait IntoStepValue {
    /// Performs the conversion.
    fn into_step_value(self) -> StepValue;
}

impl IntoStepValue for bool {
    fn into_step_value(self) -> StepValue {
        StepValue::Bool(self)
    }
}

macro_rules! non_boolean {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoStepValue for $t {
                fn into_step_value(self) -> StepValue {
                    StepValue::Other(std::any::type_name::<$t>())
                }
            }
        )*
    };
}

non_boolean!(
    (),
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: IntoStepValue> IntoStepValue for Option<T> {
    fn into_step_value(self) -> StepValue {
        match self {
            Some(v) => match v.into_step_value() {
                StepValue::Bool(_) => StepValue::Other(std::any::type_name::<Option<T>>()),
                other => other,
            },
            None => StepValue::Other(std::any::type_name::<Option<T>>()),
        }
    }
}

type StepCallback =
    Arc<dyn Fn(StepArgs) -> BoxFuture<'static, Result<StepValue, TaskError>> + Send + Sync>;

/// A named unit of pipeline work.
pub struct Step {
    name: Arc<str>,
    kind: StepKind,
    params: Vec<Param>,
    callback: StepCallback,
    on_success: StepEvent,
    on_fail: StepEvent,
}

impl Step {
    /// Creates a step of the given kind.
    pub fn new<F, Fut, R>(name: impl Into<Arc<str>>, kind: StepKind, f: F) -> Self
    where
        F: Fn(StepArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: IntoStepValue,
    {
        let name = name.into();
        let callback: StepCallback = Arc::new(move |args| {
            let fut = f(args);
            async move { fut.await.map(IntoStepValue::into_step_value) }.boxed()
        });
        Self {
            on_success: StepEvent::new(Arc::clone(&name), "on_success"),
            on_fail: StepEvent::new(Arc::clone(&name), "on_fail"),
            name,
            kind,
            params: Vec::new(),
            callback,
        }
    }

    /// Creates a primary step.
    pub fn primary<F, Fut, R>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(StepArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: IntoStepValue,
    {
        Self::new(name, StepKind::Primary, f)
    }

    /// Declares the context fields this step reads.
    pub fn with_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step kind.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Event fired when the callback returns `true`.
    pub fn on_success(&self) -> &StepEvent {
        &self.on_success
    }

    /// Event fired when the callback returns `false`.
    pub fn on_fail(&self) -> &StepEvent {
        &self.on_fail
    }

    /// Rejects parameters declared with a default.
    pub(crate) fn validate(&self) -> Result<(), StepError> {
        match self.params.iter().find(|p| p.default.is_some()) {
            Some(p) => Err(StepError::DefaultArgument {
                step: self.name.to_string(),
                name: p.name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Runs the step against `ctx`, then fires the matching event.
    ///
    /// The event callback completes before this returns.
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<bool, TaskError> {
        self.validate()?;
        let info = StepInfo {
            name: Arc::clone(&self.name),
            kind: self.kind,
        };
        let args = ctx.select(info, self.params.iter().map(|p| Arc::clone(&p.name)))?;

        let ok = match (self.callback)(args).await? {
            StepValue::Bool(b) => b,
            StepValue::Other(found) => {
                return Err(StepError::NonBooleanReturn {
                    step: self.name.to_string(),
                    found,
                }
                .into());
            }
        };

        if ok {
            self.on_success.run(ctx).await?;
        } else {
            self.on_fail.run(ctx).await?;
        }
        Ok(ok)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(ev: &StepEvent) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        ev.bind(move |_| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();
        hits
    }

    #[test]
    fn kind_parses_and_rejects_unknown() {
        assert_eq!("after_every".parse::<StepKind>(), Ok(StepKind::AfterEvery));
        assert_eq!(
            "sometimes".parse::<StepKind>(),
            Err(StepError::UnknownStepKind {
                kind: "sometimes".into()
            })
        );
        assert_eq!(StepKind::BeforeAll.to_string(), "before_all");
    }

    #[test]
    fn param_parses_default() {
        let p = Param::from("timeout = 30");
        assert_eq!(p.name(), "timeout");
        assert_eq!(p.default_value(), Some("30"));
        assert_eq!(Param::from("page").default_value(), None);
    }

    #[tokio::test]
    async fn true_fires_on_success_only() {
        let step = Step::primary("ok", |_| async { Ok::<_, TaskError>(true) });
        let s = counter(step.on_success());
        let f = counter(step.on_fail());

        assert!(step.run(&ExecutionContext::new()).await.unwrap());
        assert_eq!(s.load(Ordering::SeqCst), 1);
        assert_eq!(f.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn false_fires_on_fail_only() {
        let step = Step::primary("nope", |_| async { Ok::<_, TaskError>(false) });
        let s = counter(step.on_success());
        let f = counter(step.on_fail());

        assert!(!step.run(&ExecutionContext::new()).await.unwrap());
        assert_eq!(s.load(Ordering::SeqCst), 0);
        assert_eq!(f.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn integer_return_is_rejected_without_events() {
        let step = Step::primary("count", |_| async { Ok::<_, TaskError>(42i64) });
        let s = counter(step.on_success());
        let f = counter(step.on_fail());

        let err = step.run(&ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::Step(StepError::NonBooleanReturn { found: "i64", .. })
        ));
        assert_eq!(s.load(Ordering::SeqCst) + f.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_error_propagates_without_events() {
        let step = Step::primary("boom", |_| async {
            Err::<bool, _>(TaskError::fatal("portal changed layout"))
        });
        let f = counter(step.on_fail());
        let err = step.run(&ExecutionContext::new()).await.unwrap_err();
        assert!(matches!(err, TaskError::Fatal { .. }));
        assert_eq!(f.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_param_is_rejected() {
        let step = Step::primary("typed", |_| async { Ok::<_, TaskError>(true) })
            .with_params(["page", "delay=5"]);
        let ctx = ExecutionContext::new().with("page", 1u8).with("delay", 5u8);
        let err = step.run(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::Step(StepError::DefaultArgument { ref name, .. }) if name == "delay"
        ));
    }

    #[tokio::test]
    async fn callback_reads_declared_fields_and_itself() {
        let step = Step::primary("echo", |args: StepArgs| async move {
            let n = *args.get::<u32>("n")?;
            Ok::<_, TaskError>(n == 7 && args.step().name.as_ref() == "echo")
        })
        .with_params(["n"]);
        let ctx = ExecutionContext::new().with("n", 7u32);
        assert!(step.run(&ctx).await.unwrap());
    }
}
