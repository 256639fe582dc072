use std::sync::atomic::Ordering;

use crate::events::config::EventBusConfig;

use super::core::ScanEventBus;

impl Default for ScanEventBus {
    fn default() -> Self {
        Self::with_config(EventBusConfig::default())
    }
}

impl Clone for ScanEventBus {
    fn clone(&self) -> Self {
        self.num_instances.fetch_add(1, Ordering::SeqCst);
        Self {
            sender: self.sender.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            shutdown: self.shutdown.clone(),
            shutdown_flag: self.shutdown_flag.clone(),
            num_instances: self.num_instances.clone(),
        }
    }
}

impl Drop for ScanEventBus {
    fn drop(&mut self) {
        if self.num_instances.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shutdown();
        }
    }
}
