use std::sync::atomic::Ordering;

use super::core::ScanEventBus;

impl ScanEventBus {
    pub fn shutdown(&self) {
        if self.shutdown_flag.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}
