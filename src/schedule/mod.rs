//! Scheduling: distributed-lock-gated periodic scan dispatch.

pub mod coordinator;
pub mod lock;
pub mod next_run;

pub use coordinator::ScheduleCoordinator;
pub use lock::{DistributedLock, InProcessLock};
pub use next_run::next_run;
