pub mod agent_registry;
pub mod message_bus;
pub mod orchestrator;
pub mod task_queue;

pub use agent_registry::{FindBestCriteria, OrchestrationAgent, OrchestrationRegistry, OrchestrationStatus};
pub use message_bus::MessageBus;
pub use orchestrator::{LoadBalancingPolicy, Orchestrator};
pub use task_queue::TaskQueue;
