use acp_types::ids::{AgentId, PredictionId};
use acp_types::prediction::{Prediction, PredictionStats, PredictionStatus};
use acp_types::{AcpError, AcpResult};
use sqlx::Row;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

fn status_str(s: PredictionStatus) -> &'static str {
    match s {
        PredictionStatus::Unresolved => "unresolved",
        PredictionStatus::Resolved => "resolved",
    }
}

fn status_from_str(s: &str) -> AcpResult<PredictionStatus> {
    Ok(match s {
        "unresolved" => PredictionStatus::Unresolved,
        "resolved" => PredictionStatus::Resolved,
        other => return Err(AcpError::StoreError(format!("unknown prediction status {other}"))),
    })
}

fn row_to_prediction(row: &sqlx::sqlite::SqliteRow) -> AcpResult<Prediction> {
    Ok(Prediction {
        id: PredictionId(row.try_get("id").store_err()?),
        agent_id: AgentId(row.try_get("agent_id").store_err()?),
        market_slug: row.try_get("market_slug").store_err()?,
        probability: row.try_get("probability").store_err()?,
        rationale: row.try_get("rationale").store_err()?,
        status: status_from_str(&row.try_get::<String, _>("status").store_err()?)?,
        outcome: row.try_get::<Option<i64>, _>("outcome").store_err()?.map(|o| o as u8),
        brier_contribution: row.try_get("brier_contribution").store_err()?,
        created_at: row.try_get("created_at").store_err()?,
        resolved_at: row.try_get("resolved_at").store_err()?,
    })
}

fn row_to_stats(row: &sqlx::sqlite::SqliteRow) -> AcpResult<PredictionStats> {
    Ok(PredictionStats {
        agent_id: AgentId(row.try_get("agent_id").store_err()?),
        resolved: row.try_get::<i64, _>("resolved").store_err()? as u64,
        correct: row.try_get::<i64, _>("correct").store_err()? as u64,
        brier_score: row.try_get("brier_score").store_err()?,
        accuracy: row.try_get("accuracy").store_err()?,
        streak_current: row.try_get::<i64, _>("streak_current").store_err()? as u64,
        streak_best: row.try_get::<i64, _>("streak_best").store_err()? as u64,
    })
}

pub struct PredictionsRepo {
    gateway: Gateway,
}

impl PredictionsRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, prediction: &Prediction) -> AcpResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO acp_predictions \
             (id, agent_id, market_slug, probability, rationale, status, outcome, \
              brier_contribution, created_at, resolved_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&prediction.id.0)
        .bind(&prediction.agent_id.0)
        .bind(&prediction.market_slug)
        .bind(prediction.probability)
        .bind(&prediction.rationale)
        .bind(status_str(prediction.status))
        .bind(prediction.outcome.map(|o| o as i64))
        .bind(prediction.brier_contribution)
        .bind(prediction.created_at)
        .bind(prediction.resolved_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get_active(&self, agent_id: &AgentId, market_slug: &str) -> AcpResult<Option<Prediction>> {
        let row = sqlx::query(
            "SELECT * FROM acp_predictions WHERE agent_id = ? AND market_slug = ? AND status = 'unresolved'",
        )
        .bind(&agent_id.0)
        .bind(market_slug)
        .fetch_optional(self.gateway.pool())
        .await
        .store_err()?;
        row.as_ref().map(row_to_prediction).transpose()
    }

    pub async fn list_by_market(&self, market_slug: &str) -> AcpResult<Vec<Prediction>> {
        let rows = sqlx::query("SELECT * FROM acp_predictions WHERE market_slug = ? AND status = 'unresolved'")
            .bind(market_slug)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_prediction).collect()
    }

    pub async fn list_by_agent(&self, agent_id: &AgentId) -> AcpResult<Vec<Prediction>> {
        let rows = sqlx::query("SELECT * FROM acp_predictions WHERE agent_id = ? ORDER BY created_at ASC")
            .bind(&agent_id.0)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_prediction).collect()
    }

    pub async fn save_stats(&self, stats: &PredictionStats) -> AcpResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO acp_prediction_stats \
             (agent_id, resolved, correct, brier_score, accuracy, streak_current, streak_best) \
             VALUES (?,?,?,?,?,?,?)",
        )
        .bind(&stats.agent_id.0)
        .bind(stats.resolved as i64)
        .bind(stats.correct as i64)
        .bind(stats.brier_score)
        .bind(stats.accuracy)
        .bind(stats.streak_current as i64)
        .bind(stats.streak_best as i64)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get_stats(&self, agent_id: &AgentId) -> AcpResult<Option<PredictionStats>> {
        let row = sqlx::query("SELECT * FROM acp_prediction_stats WHERE agent_id = ?")
            .bind(&agent_id.0)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_stats).transpose()
    }

    pub async fn leaderboard(&self, min_resolved: u64) -> AcpResult<Vec<PredictionStats>> {
        let rows = sqlx::query("SELECT * FROM acp_prediction_stats WHERE resolved >= ? ORDER BY brier_score ASC")
            .bind(min_resolved as i64)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_stats).collect()
    }
}
