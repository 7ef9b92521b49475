//! shared application state, handed to every handler via axum's
//! `State` extractor — the same `Arc<RwLock<AppState>>` shape
//! `ghettobox-vault::main` wires up, split into narrower `Arc`s per
//! component since ACP's engines already serialize their own state
//! internally (no crate-wide lock needed).

use std::sync::Arc;

use acp_agreements::AgreementStore;
use acp_escrow::{ConditionEvaluator, CustomConditionRegistry, EscrowEngine, HttpOracle, InMemoryAccountDataReader, InMemoryChainAdapter, OracleDispatcher, PythOracle, SwitchboardOracle};
use acp_orchestration::{MessageBus, OrchestrationRegistry, Orchestrator, TaskQueue};
use acp_persistence::{AgentsRepo, AgreementsRepo, EscrowsRepo, Gateway, GatewayVaultStore, PredictionsRepo, RatingsRepo, ServicesRepo};
use acp_predictions::PredictionLedger;
use acp_registry::AgentRegistry;
use acp_vault::KeypairVault;

use crate::config::Config;

pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub agreements: Arc<AgreementStore>,
    pub escrows: Arc<EscrowEngine>,
    pub predictions: Arc<PredictionLedger>,
    pub orchestration_registry: Arc<OrchestrationRegistry>,
    pub task_queue: Arc<TaskQueue>,
    pub message_bus: Arc<MessageBus>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub async fn build(gateway: Gateway, config: &Config) -> acp_types::AcpResult<Self> {
        let registry = Arc::new(
            AgentRegistry::hydrate(
                AgentsRepo::new(gateway.clone()),
                ServicesRepo::new(gateway.clone()),
                RatingsRepo::new(gateway.clone()),
            )
            .await?,
        );

        let agreements = Arc::new(AgreementStore::new(AgreementsRepo::new(gateway.clone())));

        let vault = Arc::new(KeypairVault::new(
            config.vault_secret.clone(),
            Arc::new(GatewayVaultStore::new(gateway.clone())),
        ));
        let chain = Arc::new(InMemoryChainAdapter::new());
        let oracles = OracleDispatcher::new()
            .register("pyth", Arc::new(PythOracle::new(InMemoryAccountDataReader::new())))
            .register("switchboard", Arc::new(SwitchboardOracle::new(InMemoryAccountDataReader::new())))
            .register("http", Arc::new(HttpOracle::new()));
        let evaluator = ConditionEvaluator::new(oracles, CustomConditionRegistry::with_builtins());
        let escrows = Arc::new(EscrowEngine::new(EscrowsRepo::new(gateway.clone()), vault, chain, evaluator));

        let predictions = Arc::new(PredictionLedger::new(PredictionsRepo::new(gateway.clone())));

        let orchestration_registry = Arc::new(OrchestrationRegistry::new(config.heartbeat_interval_ms));
        orchestration_registry.spawn_liveness_ticker();
        let task_queue = TaskQueue::new();
        let message_bus = MessageBus::new();
        let orchestrator = Orchestrator::new(orchestration_registry.clone(), task_queue.clone(), config.load_balancing);
        orchestrator.spawn_scheduling_loop();

        Ok(Self {
            registry,
            agreements,
            escrows,
            predictions,
            orchestration_registry,
            task_queue,
            message_bus,
            orchestrator,
        })
    }
}
