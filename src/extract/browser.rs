//! # Browser collaborator contract.
//!
//! The concrete automation driver lives outside this crate. The runtime only
//! needs the operations below. Each interaction is time-bounded by the driver;
//! exceeding its wait surfaces as [`TaskError::NavigationTimeout`].
//!
//! ```text
//! Browser ──new_session()──► Session ──new_page()──► Page
//!                              │                      ├─ goto / click / type_text / read_text
//!                              ├─ remaining_time_secs()
//!                              ├─ is_logged_out(timeout)
//!                              └─ close()
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TaskError;

/// Opaque element locator understood by the driver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locator(Arc<str>);

impl Locator {
    /// Wraps a driver-specific selector.
    pub fn new(selector: impl Into<Arc<str>>) -> Self {
        Self(selector.into())
    }

    /// The raw selector.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A browser process able to open authenticated-capable sessions.
#[async_trait]
pub trait Browser: Send + Sync + 'static {
    /// Stable identifier of the browser binary/kind (e.g. `"chromium"`).
    fn kind(&self) -> &str;

    /// Opens a fresh session (isolated cookies/storage).
    async fn new_session(&self) -> Result<Arc<dyn Session>, TaskError>;
}

/// One browser context lifetime.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Opens a page (tab) inside this session.
    async fn new_page(&self) -> Result<Arc<dyn Page>, TaskError>;

    /// Seconds left before the portal logs this session out.
    async fn remaining_time_secs(&self) -> Result<i64, TaskError>;

    /// True if the portal shows its logged-out state within `timeout`.
    async fn is_logged_out(&self, timeout: Duration) -> Result<bool, TaskError>;

    /// Releases the session. Best effort.
    async fn close(&self) {}
}

/// Low-level page primitives.
#[async_trait]
pub trait Page: Send + Sync + 'static {
    /// Navigates to `url`.
    async fn goto(&self, url: &str) -> Result<(), TaskError>;

    /// Clicks the element.
    async fn click(&self, target: &Locator) -> Result<(), TaskError>;

    /// Types `text` into the element.
    async fn type_text(&self, target: &Locator, text: &str) -> Result<(), TaskError>;

    /// Reads the element's text; `None` if the element is absent.
    async fn read_text(&self, target: &Locator) -> Result<Option<String>, TaskError>;
}

/// A session together with the page the task works in.
#[derive(Clone)]
pub struct Tab {
    /// Owning session.
    pub session: Arc<dyn Session>,
    /// Working page.
    pub page: Arc<dyn Page>,
}

impl Tab {
    /// Opens a new session on `browser` and a page inside it.
    ///
    /// If the page cannot be opened the half-built session is closed.
    pub async fn open(browser: &dyn Browser) -> Result<Self, TaskError> {
        let session = browser.new_session().await?;
        match session.new_page().await {
            Ok(page) => Ok(Self { session, page }),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    /// Closes the session.
    pub async fn close(&self) {
        self.session.close().await;
    }
}
