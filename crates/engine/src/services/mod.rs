// Domain services - each service owns its stores and handles one domain
//
// Services implement `Domain`; `ServiceRuntime` adds the shared lifecycle
// and dispatch on top.

mod development;
mod market;
mod organization;
mod sales;
mod treasury;

pub use development::*;
pub use market::*;
pub use organization::*;
pub use sales::*;
pub use treasury::*;
