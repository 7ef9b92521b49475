pub mod filters;
pub mod registry;

pub use filters::{AgentFilters, ServiceFilters};
pub use registry::AgentRegistry;
