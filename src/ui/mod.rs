//! # UI side of the tick loop.
//!
//! The GUI itself is an external collaborator behind [`UiSurface`]. This
//! module owns servicing it and reporting whether it is still open.
//!
//! ```text
//! tick ──► UiPump::service()
//!            ├─ surface closed  → open_tx.send(false) → Closed
//!            ├─ BlockFlag held  → Skipped
//!            └─ otherwise       → surface.pump_events() → Serviced
//!
//! admission side reads `watch::Receiver<bool>` (is the UI still open?)
//! ```

mod block;
mod pump;

pub use block::{BlockFlag, BlockGuard};
pub use pump::{PumpStatus, UiPump, UiSurface};
