use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, PredictionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Unresolved,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub agent_id: AgentId,
    pub market_slug: String,
    pub probability: f64,
    pub rationale: String,
    pub status: PredictionStatus,
    pub outcome: Option<u8>,
    pub brier_contribution: Option<f64>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionStats {
    pub agent_id: AgentId,
    pub resolved: u64,
    pub correct: u64,
    pub brier_score: f64,
    pub accuracy: f64,
    pub streak_current: u64,
    pub streak_best: u64,
}

impl PredictionStats {
    pub fn zero(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            resolved: 0,
            correct: 0,
            brier_score: 0.0,
            accuracy: 0.0,
            streak_current: 0,
            streak_best: 0,
        }
    }
}

pub fn validate_probability(p: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(format!("probability must be in [0,1], got {p}"))
    }
}

pub fn validate_rationale(r: &str) -> Result<(), String> {
    let len = r.chars().count();
    if (10..=800).contains(&len) {
        Ok(())
    } else {
        Err(format!("rationale must be 10..=800 characters, got {len}"))
    }
}

pub fn is_correct(probability: f64, outcome: u8) -> bool {
    (probability >= 0.5) == (outcome == 1)
}
