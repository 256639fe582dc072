use tokio::sync::broadcast;

use crate::events::types::ScanEvent;

use super::core::ScanEventBus;

impl ScanEventBus {
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        let rx = self.sender.subscribe();
        self.metrics.update_subscriber_count(self.sender.receiver_count());
        rx
    }
}
