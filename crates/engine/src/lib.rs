mod constants;
mod error;
pub mod policy;
mod random;
mod registry;
mod service;
mod services;

pub use error::*;
pub use random::*;
pub use registry::ServiceKind;
pub use service::{Domain, DomainService, ServiceRuntime};
pub use services::*;
