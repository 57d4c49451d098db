//! # UI pumping.
//!
//! [`UiPump::service`] runs once per tick and pumps one batch of events
//! unless the [`BlockFlag`] is held. Once the surface reports closed, the
//! `watch` flag read by the admission side flips to `false`.

use std::sync::Arc;

use tokio::sync::watch;

use super::block::BlockFlag;

/// The GUI event surface.
pub trait UiSurface: Send + Sync + 'static {
    /// False once the window has been closed.
    fn is_open(&self) -> bool;

    /// Services one batch of pending events. Must not block.
    fn pump_events(&self);

    /// Display refresh rate, if the surface knows it.
    fn refresh_rate_hz(&self) -> Option<f64> {
        None
    }
}

/// What one [`UiPump::service`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    /// Events were pumped.
    Serviced,
    /// The surface is held by an exclusive operation; nothing pumped.
    Skipped,
    /// The surface is closed.
    Closed,
}

/// Owns UI servicing and publishes whether the UI is still open.
pub struct UiPump {
    surface: Arc<dyn UiSurface>,
    block: BlockFlag,
    open_tx: watch::Sender<bool>,
}

impl UiPump {
    /// Creates a pump and the receiver the admission side watches.
    pub fn new(surface: Arc<dyn UiSurface>, block: BlockFlag) -> (Self, watch::Receiver<bool>) {
        let (open_tx, open_rx) = watch::channel(true);
        (
            Self {
                surface,
                block,
                open_tx,
            },
            open_rx,
        )
    }

    /// Services the surface once.
    pub fn service(&self) -> PumpStatus {
        if !self.surface.is_open() {
            self.open_tx.send_replace(false);
            return PumpStatus::Closed;
        }
        if self.block.is_held() {
            return PumpStatus::Skipped;
        }
        self.surface.pump_events();
        PumpStatus::Serviced
    }

    /// Rate reported by the surface.
    pub fn refresh_rate_hz(&self) -> Option<f64> {
        self.surface.refresh_rate_hz()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::FakeUi;

    #[test]
    fn held_flag_skips_pumping() {
        let ui = Arc::new(FakeUi::new());
        let block = BlockFlag::new();
        let (pump, open) = UiPump::new(ui.clone(), block.clone());

        assert_eq!(pump.service(), PumpStatus::Serviced);
        let guard = block.hold();
        assert_eq!(pump.service(), PumpStatus::Skipped);
        drop(guard);
        assert_eq!(pump.service(), PumpStatus::Serviced);
        assert_eq!(ui.pumped(), 2);
        assert!(*open.borrow());
    }

    #[test]
    fn closing_is_broadcast() {
        let ui = Arc::new(FakeUi::new());
        let (pump, open) = UiPump::new(ui.clone(), BlockFlag::new());
        ui.close();
        assert_eq!(pump.service(), PumpStatus::Closed);
        assert!(!*open.borrow());
        assert_eq!(ui.pumped(), 0);
    }
}
