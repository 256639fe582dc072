use crate::events::errors::EventBusError;
use crate::events::types::ScanEvent;

use super::core::ScanEventBus;

impl ScanEventBus {
    /// Publish unconditionally, best-effort. Absence of subscribers is
    /// tracked as a drop, not an error — the scan proceeds either way.
    pub fn publish(&self, event: ScanEvent) -> Result<usize, EventBusError> {
        match self.sender.send(event) {
            Ok(n) => {
                self.metrics.increment_published();
                Ok(n)
            }
            Err(_) => {
                self.metrics.increment_dropped();
                Ok(0)
            }
        }
    }
}
