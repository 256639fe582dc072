pub mod builder;
pub mod types;

pub use builder::{MissingDomain, ScanRequestBuilder, WithDomain};
pub use types::{ScanConfig, ScanConfigDefaults};
