pub mod chain_adapter;
pub mod conditions;
pub mod oracle;
pub mod store;

pub use chain_adapter::{ChainAdapter, InMemoryChainAdapter, TokenAccount};
pub use conditions::{parse_oracle_string, ComparisonOp, ConditionEvaluator, CustomConditionHandler, CustomConditionRegistry, OracleConfig};
pub use oracle::{
    AccountDataReader, HttpOracle, InMemoryAccountDataReader, OracleDispatcher, OracleSource, PythOracle, SwitchboardOracle,
};
pub use store::{CreateEscrowParams, EscrowEngine, ReleaseTo};
