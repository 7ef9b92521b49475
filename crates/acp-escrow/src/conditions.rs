//! release/refund condition evaluation
//!
//! an empty condition list is vacuously true: an escrow with no release
//! conditions releases on the authorizer's say-so alone.

use std::collections::HashMap;
use std::sync::Arc;

use acp_types::escrow::{Condition, ConditionKind, Escrow};
use acp_types::now_millis;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::oracle::OracleDispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
}

impl ComparisonOp {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "eq" => Some(Self::Eq),
            _ => None,
        }
    }

    fn compare(&self, actual: f64, target: f64) -> bool {
        match self {
            Self::Gt => actual > target,
            Self::Lt => actual < target,
            Self::Gte => actual >= target,
            Self::Lte => actual <= target,
            Self::Eq => (actual - target).abs() < 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub source: String,
    pub feed_id: String,
    pub op: ComparisonOp,
    pub target: f64,
    pub json_path: Option<String>,
}

/// `"<type>:<feedId>:<op>:<target>[:<jsonPath>]"`, four or five fields.
/// `http` feed ids may themselves contain colons (`https://...`), so for
/// that source the op token is located by scanning rather than by a fixed
/// index. Anything unparseable is `None`, which the evaluator treats as
/// condition-false per the protocol's "invalid -> null -> false" rule.
pub fn parse_oracle_string(value: &str) -> Option<OracleConfig> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() < 4 {
        return None;
    }
    let source = parts[0].to_string();

    if source == "http" {
        let op_idx = parts
            .iter()
            .enumerate()
            .skip(2)
            .find_map(|(i, p)| ComparisonOp::parse(p).map(|_| i))?;
        let op = ComparisonOp::parse(parts[op_idx])?;
        let feed_id = parts[1..op_idx].join(":");
        let target: f64 = parts.get(op_idx + 1)?.parse().ok()?;
        let json_path = parts.get(op_idx + 2).map(|s| s.to_string());
        Some(OracleConfig { source, feed_id, op, target, json_path })
    } else {
        if parts.len() > 5 {
            return None;
        }
        let feed_id = parts[1].to_string();
        let op = ComparisonOp::parse(parts[2])?;
        let target: f64 = parts.get(3)?.parse().ok()?;
        let json_path = parts.get(4).map(|s| s.to_string());
        Some(OracleConfig { source, feed_id, op, target, json_path })
    }
}

#[async_trait]
pub trait CustomConditionHandler: Send + Sync {
    async fn evaluate(&self, escrow: &Escrow, args: &str) -> bool;
}

struct AlwaysTrue;
#[async_trait]
impl CustomConditionHandler for AlwaysTrue {
    async fn evaluate(&self, _escrow: &Escrow, _args: &str) -> bool {
        true
    }
}

struct AlwaysFalse;
#[async_trait]
impl CustomConditionHandler for AlwaysFalse {
    async fn evaluate(&self, _escrow: &Escrow, _args: &str) -> bool {
        false
    }
}

struct TimeWindow;
#[async_trait]
impl CustomConditionHandler for TimeWindow {
    async fn evaluate(&self, _escrow: &Escrow, args: &str) -> bool {
        let Some((start, end)) = args.split_once(':') else { return false };
        let (Ok(start), Ok(end)) = (start.parse::<i64>(), end.parse::<i64>()) else { return false };
        let now = now_millis();
        now >= start && now <= end
    }
}

struct MinAge;
#[async_trait]
impl CustomConditionHandler for MinAge {
    async fn evaluate(&self, escrow: &Escrow, args: &str) -> bool {
        let Ok(min_age_ms) = args.parse::<i64>() else { return false };
        now_millis() >= escrow.created_at + min_age_ms
    }
}

/// process-wide map of named predicates; additive, overwrites on duplicate
/// registration with a warning.
pub struct CustomConditionRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn CustomConditionHandler>>>,
}

impl CustomConditionRegistry {
    pub fn with_builtins() -> Self {
        let mut handlers: HashMap<String, Arc<dyn CustomConditionHandler>> = HashMap::new();
        handlers.insert("always_true".into(), Arc::new(AlwaysTrue));
        handlers.insert("always_false".into(), Arc::new(AlwaysFalse));
        handlers.insert("time_window".into(), Arc::new(TimeWindow));
        handlers.insert("min_age".into(), Arc::new(MinAge));
        Self {
            handlers: RwLock::new(handlers),
        }
    }

    pub async fn register(&self, name: impl Into<String>, handler: Arc<dyn CustomConditionHandler>) {
        let name = name.into();
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&name) {
            warn!(handler = %name, "custom condition registry: overwriting existing handler");
        }
        handlers.insert(name, handler);
    }

    /// handler exceptions are modeled as `false`: an absent handler
    /// (unknown name) also evaluates to `false`.
    pub async fn evaluate(&self, escrow: &Escrow, value: &str) -> bool {
        let (name, args) = value.split_once(':').unwrap_or((value, ""));
        let handler = self.handlers.read().await.get(name).cloned();
        match handler {
            Some(h) => h.evaluate(escrow, args).await,
            None => false,
        }
    }
}

pub struct ConditionEvaluator {
    pub oracles: OracleDispatcher,
    pub custom: CustomConditionRegistry,
}

impl ConditionEvaluator {
    pub fn new(oracles: OracleDispatcher, custom: CustomConditionRegistry) -> Self {
        Self { oracles, custom }
    }

    /// every condition must evaluate true; short-circuits on the first
    /// false. an empty list is vacuously true.
    pub async fn check_all(&self, escrow: &Escrow, conditions: &[Condition]) -> bool {
        for condition in conditions {
            if !self.check_one(escrow, condition).await {
                return false;
            }
        }
        true
    }

    async fn check_one(&self, escrow: &Escrow, condition: &Condition) -> bool {
        match condition.kind {
            ConditionKind::Time => condition
                .value
                .parse::<i64>()
                .map(|deadline| now_millis() >= deadline)
                .unwrap_or(false),
            ConditionKind::Signature => escrow.tx_signatures.iter().any(|s| s == &condition.value),
            ConditionKind::Oracle => {
                let Some(cfg) = parse_oracle_string(&condition.value) else {
                    return false;
                };
                match self.oracles.fetch(&cfg.source, &cfg.feed_id, cfg.json_path.as_deref()).await {
                    Ok(actual) => cfg.op.compare(actual, cfg.target),
                    Err(_) => false,
                }
            }
            ConditionKind::Custom => self.custom.evaluate(escrow, &condition.value).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_types::escrow::EscrowStatus;
    use acp_types::ids::EscrowId;

    fn sample_escrow() -> Escrow {
        Escrow {
            id: EscrowId::new(),
            chain: "solana".into(),
            buyer: "buyer".into(),
            seller: "seller".into(),
            arbiter: None,
            amount: "10".parse().unwrap(),
            token_mint: None,
            release_conditions: vec![],
            refund_conditions: vec![],
            expires_at: now_millis() + 1_000_000,
            description: None,
            agreement_hash: None,
            status: EscrowStatus::Funded,
            escrow_address: "addr".into(),
            tx_signatures: vec!["sig-1".into()],
            metadata: None,
            created_at: now_millis() - 10_000,
            funded_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn parse_oracle_string_handles_pyth() {
        let cfg = parse_oracle_string("pyth:BTC/USD:gt:50000").unwrap();
        assert_eq!(cfg.source, "pyth");
        assert_eq!(cfg.feed_id, "BTC/USD");
        assert_eq!(cfg.op, ComparisonOp::Gt);
        assert_eq!(cfg.target, 50000.0);
        assert!(cfg.json_path.is_none());
    }

    #[test]
    fn parse_oracle_string_handles_http_url_with_colons() {
        let cfg = parse_oracle_string("http:https://host/path:lt:100:data.price").unwrap();
        assert_eq!(cfg.feed_id, "https://host/path");
        assert_eq!(cfg.op, ComparisonOp::Lt);
        assert_eq!(cfg.target, 100.0);
        assert_eq!(cfg.json_path.as_deref(), Some("data.price"));
    }

    #[test]
    fn parse_oracle_string_rejects_malformed_op() {
        assert!(parse_oracle_string("pyth:BTC/USD:bogus:1").is_none());
    }

    #[tokio::test]
    async fn empty_condition_list_is_vacuously_true() {
        let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
        assert!(evaluator.check_all(&sample_escrow(), &[]).await);
    }

    #[tokio::test]
    async fn signature_condition_checks_tx_signatures() {
        let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
        let escrow = sample_escrow();
        let present = Condition { kind: ConditionKind::Signature, value: "sig-1".into(), description: None };
        let absent = Condition { kind: ConditionKind::Signature, value: "sig-missing".into(), description: None };
        assert!(evaluator.check_all(&escrow, &[present]).await);
        assert!(!evaluator.check_all(&escrow, &[absent]).await);
    }

    #[tokio::test]
    async fn custom_min_age_respects_threshold() {
        let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
        let escrow = sample_escrow();
        let satisfied = Condition { kind: ConditionKind::Custom, value: "min_age:1000".into(), description: None };
        let unsatisfied = Condition { kind: ConditionKind::Custom, value: "min_age:1000000000".into(), description: None };
        assert!(evaluator.check_all(&escrow, &[satisfied]).await);
        assert!(!evaluator.check_all(&escrow, &[unsatisfied]).await);
    }

    #[tokio::test]
    async fn unknown_custom_handler_is_false() {
        let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
        let condition = Condition { kind: ConditionKind::Custom, value: "does_not_exist".into(), description: None };
        assert!(!evaluator.check_all(&sample_escrow(), &[condition]).await);
    }

    #[tokio::test]
    async fn check_all_short_circuits_on_first_false() {
        let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
        let escrow = sample_escrow();
        let conditions = vec![
            Condition { kind: ConditionKind::Custom, value: "always_false".into(), description: None },
            Condition { kind: ConditionKind::Oracle, value: "pyth:unregistered:gt:1".into(), description: None },
        ];
        assert!(!evaluator.check_all(&escrow, &conditions).await);
    }
}
