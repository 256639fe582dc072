pub mod constants;
pub mod domain;

pub use constants::*;
pub use domain::{host_of, is_third_party, registrable_domain};
