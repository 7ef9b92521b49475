//! Brier-scored prediction ledger
//!
//! at most one active (unresolved) prediction per `(agentId, marketSlug)`;
//! resubmission updates that record in place. Resolution recomputes
//! aggregate stats from every resolved prediction for the agent, walked
//! in submission order so streaks stay meaningful.

use acp_persistence::PredictionsRepo;
use acp_types::ids::{AgentId, PredictionId};
use acp_types::now_millis;
use acp_types::prediction::{is_correct, validate_probability, validate_rationale, Prediction, PredictionStats, PredictionStatus};
use acp_types::{AcpError, AcpResult};
use tracing::info;

pub struct PredictionLedger {
    repo: PredictionsRepo,
}

impl PredictionLedger {
    pub fn new(repo: PredictionsRepo) -> Self {
        Self { repo }
    }

    /// rejects out-of-range probabilities and short/long rationale.
    /// updates the agent's existing unresolved prediction for this market
    /// if one exists, otherwise creates a new record.
    pub async fn submit(&self, agent_id: AgentId, market_slug: String, probability: f64, rationale: String) -> AcpResult<Prediction> {
        validate_probability(probability).map_err(AcpError::validation)?;
        validate_rationale(&rationale).map_err(AcpError::validation)?;

        let now = now_millis();
        let prediction = match self.repo.get_active(&agent_id, &market_slug).await? {
            Some(mut existing) => {
                existing.probability = probability;
                existing.rationale = rationale;
                existing
            }
            None => Prediction {
                id: PredictionId::new(),
                agent_id,
                market_slug,
                probability,
                rationale,
                status: PredictionStatus::Unresolved,
                outcome: None,
                brier_contribution: None,
                created_at: now,
                resolved_at: None,
            },
        };

        self.repo.save(&prediction).await?;
        Ok(prediction)
    }

    /// resolves every unresolved prediction on `market_slug` against
    /// `outcome`, then recomputes each affected agent's aggregate stats.
    pub async fn resolve(&self, market_slug: &str, outcome: u8) -> AcpResult<Vec<PredictionStats>> {
        if outcome > 1 {
            return Err(AcpError::validation("outcome must be 0 or 1"));
        }

        let pending = self.repo.list_by_market(market_slug).await?;
        if pending.is_empty() {
            return Ok(vec![]);
        }

        let now = now_millis();
        let mut stats = Vec::with_capacity(pending.len());
        for mut prediction in pending {
            prediction.status = PredictionStatus::Resolved;
            prediction.outcome = Some(outcome);
            prediction.brier_contribution = Some((prediction.probability - outcome as f64).powi(2));
            prediction.resolved_at = Some(now);
            self.repo.save(&prediction).await?;
            info!(prediction_id = %prediction.id, market_slug, "prediction:resolved");

            let agent_stats = self.recompute_stats(&prediction.agent_id).await?;
            self.repo.save_stats(&agent_stats).await?;
            stats.push(agent_stats);
        }
        Ok(stats)
    }

    /// walks every prediction the agent has ever submitted (in submission
    /// order) and rebuilds stats from scratch, since streaks depend on the
    /// full resolved-in-order history, not just the newly resolved batch.
    async fn recompute_stats(&self, agent_id: &AgentId) -> AcpResult<PredictionStats> {
        let history = self.repo.list_by_agent(agent_id).await?;
        let resolved: Vec<&Prediction> = history
            .iter()
            .filter(|p| p.status == PredictionStatus::Resolved)
            .collect();

        let mut stats = PredictionStats::zero(agent_id.clone());
        if resolved.is_empty() {
            return Ok(stats);
        }

        let mut sum_sq_error = 0.0;
        let mut correct = 0u64;
        let mut streak_current = 0u64;
        let mut streak_best = 0u64;

        for prediction in &resolved {
            let outcome = prediction.outcome.expect("resolved prediction must carry an outcome");
            let contribution = prediction.brier_contribution.unwrap_or((prediction.probability - outcome as f64).powi(2));
            sum_sq_error += contribution;

            if is_correct(prediction.probability, outcome) {
                correct += 1;
                streak_current += 1;
                streak_best = streak_best.max(streak_current);
            } else {
                streak_current = 0;
            }
        }

        stats.resolved = resolved.len() as u64;
        stats.correct = correct;
        stats.brier_score = sum_sq_error / resolved.len() as f64;
        stats.accuracy = correct as f64 / resolved.len() as f64;
        stats.streak_current = streak_current;
        stats.streak_best = streak_best;
        Ok(stats)
    }

    pub async fn stats(&self, agent_id: &AgentId) -> AcpResult<PredictionStats> {
        Ok(self.repo.get_stats(agent_id).await?.unwrap_or_else(|| PredictionStats::zero(agent_id.clone())))
    }

    /// requires at least 5 resolved predictions, sorted by Brier score
    /// ascending (lower is better).
    pub async fn leaderboard(&self) -> AcpResult<Vec<PredictionStats>> {
        self.repo.leaderboard(5).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_persistence::Gateway;

    async fn ledger() -> PredictionLedger {
        let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
        PredictionLedger::new(PredictionsRepo::new(gateway))
    }

    #[tokio::test]
    async fn submit_rejects_out_of_range_probability() {
        let ledger = ledger().await;
        let err = ledger
            .submit(AgentId::new(), "btc-100k".into(), 1.5, "well-reasoned analysis here".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AcpError::ValidationError(_)));
    }

    #[tokio::test]
    async fn submit_rejects_short_rationale() {
        let ledger = ledger().await;
        let err = ledger.submit(AgentId::new(), "btc-100k".into(), 0.6, "too short".into()).await.unwrap_err();
        assert!(matches!(err, AcpError::ValidationError(_)));
    }

    #[tokio::test]
    async fn resubmission_updates_existing_unresolved_record() {
        let ledger = ledger().await;
        let agent = AgentId::new();
        let first = ledger.submit(agent.clone(), "btc-100k".into(), 0.6, "reasoned analysis of market trends".into()).await.unwrap();
        let second = ledger.submit(agent.clone(), "btc-100k".into(), 0.8, "updated analysis after new data".into()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.probability, 0.8);
    }

    #[tokio::test]
    async fn resolve_computes_brier_contribution_and_marks_resolved() {
        let ledger = ledger().await;
        let agent = AgentId::new();
        ledger.submit(agent.clone(), "btc-100k".into(), 0.9, "strong conviction based on momentum".into()).await.unwrap();

        let stats = ledger.resolve("btc-100k", 1).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert!((stats[0].brier_score - 0.01).abs() < 1e-9);
        assert_eq!(stats[0].correct, 1);
    }

    #[tokio::test]
    async fn ten_predictions_match_seed_brier_score() {
        let ledger = ledger().await;
        let agent = AgentId::new();
        let outcomes = [1u8, 1, 1, 1, 1, 1, 1, 1, 0, 0];

        for (i, outcome) in outcomes.iter().enumerate() {
            let slug = format!("market-{i}");
            ledger.submit(agent.clone(), slug.clone(), 0.9, "consistent high-confidence forecast text".into()).await.unwrap();
            ledger.resolve(&slug, *outcome).await.unwrap();
        }

        let stats = ledger.stats(&agent).await.unwrap();
        assert_eq!(stats.resolved, 10);
        assert_eq!(stats.correct, 8);
        assert!((stats.brier_score - 0.17).abs() < 1e-9);
    }

    #[tokio::test]
    async fn leaderboard_excludes_agents_below_five_resolved() {
        let ledger = ledger().await;
        let agent = AgentId::new();
        for i in 0..3 {
            let slug = format!("market-{i}");
            ledger.submit(agent.clone(), slug.clone(), 0.7, "brief but sufficiently long rationale text".into()).await.unwrap();
            ledger.resolve(&slug, 1).await.unwrap();
        }

        let board = ledger.leaderboard().await.unwrap();
        assert!(board.is_empty());
    }
}
