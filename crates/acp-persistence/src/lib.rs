//! persistence gateway: typed row<->entity mappers, idempotent schema
//! migration, and transactional writes over the ACP relational store.
//!
//! grounded on the teacher binaries' startup-time `sled::open`/table-creation
//! discipline, generalized from an embedded kv store to `sqlx` because the
//! spec requires relational queries (`listByPartyAddress`, `listByStatus`)
//! that a flat kv store can't express without a hand-rolled secondary index.

pub mod agents;
pub mod agreements;
pub mod err;
pub mod escrows;
pub mod gateway;
pub mod predictions;
pub mod ratings;
pub mod services;
pub mod vault_store;

pub use agents::AgentsRepo;
pub use agreements::AgreementsRepo;
pub use escrows::EscrowsRepo;
pub use gateway::Gateway;
pub use predictions::PredictionsRepo;
pub use ratings::RatingsRepo;
pub use services::ServicesRepo;
pub use vault_store::GatewayVaultStore;
