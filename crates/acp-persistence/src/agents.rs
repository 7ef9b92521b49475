use acp_types::agent::{Agent, AgentStatus, ReputationAggregate};
use acp_types::ids::{AgentId, Address};
use acp_types::{AcpError, AcpResult};
use sqlx::Row;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

pub struct AgentsRepo {
    gateway: Gateway,
}

fn status_str(s: AgentStatus) -> &'static str {
    match s {
        AgentStatus::Active => "active",
        AgentStatus::Inactive => "inactive",
        AgentStatus::Suspended => "suspended",
    }
}

fn status_from_str(s: &str) -> AcpResult<AgentStatus> {
    match s {
        "active" => Ok(AgentStatus::Active),
        "inactive" => Ok(AgentStatus::Inactive),
        "suspended" => Ok(AgentStatus::Suspended),
        other => Err(AcpError::StoreError(format!("unknown agent status {other}"))),
    }
}

fn row_to_agent(row: &sqlx::sqlite::SqliteRow) -> AcpResult<Agent> {
    let capabilities_raw: String = row.try_get("capabilities").store_err()?;
    let capabilities: Vec<String> = serde_json::from_str(&capabilities_raw)?;
    let metadata_raw: Option<String> = row.try_get("metadata").store_err()?;
    let metadata: Option<serde_json::Value> = metadata_raw.map(|s| serde_json::from_str(&s)).transpose()?;
    let status_raw: String = row.try_get("status").store_err()?;

    Ok(Agent {
        id: AgentId(row.try_get("id").store_err()?),
        address: Address(row.try_get("address").store_err()?),
        name: row.try_get("name").store_err()?,
        description: row.try_get("description").store_err()?,
        capabilities,
        status: status_from_str(&status_raw)?,
        reputation: ReputationAggregate {
            total_transactions: row.try_get::<i64, _>("total_transactions").store_err()? as u64,
            successful_transactions: row.try_get::<i64, _>("successful_transactions").store_err()? as u64,
            average_rating: row.try_get("average_rating").store_err()?,
            total_ratings: row.try_get::<i64, _>("total_ratings").store_err()? as u64,
            response_time_avg_ms: row.try_get("response_time_avg_ms").store_err()?,
        },
        metadata,
        created_at: row.try_get("created_at").store_err()?,
        updated_at: row.try_get("updated_at").store_err()?,
    })
}

impl AgentsRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, agent: &Agent) -> AcpResult<()> {
        let capabilities = serde_json::to_string(&agent.capabilities)?;
        let metadata = agent.metadata.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            "INSERT OR REPLACE INTO acp_agents \
             (id, address, name, description, capabilities, status, \
              total_transactions, successful_transactions, average_rating, \
              total_ratings, response_time_avg_ms, metadata, created_at, updated_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&agent.id.0)
        .bind(&agent.address.0)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(capabilities)
        .bind(status_str(agent.status))
        .bind(agent.reputation.total_transactions as i64)
        .bind(agent.reputation.successful_transactions as i64)
        .bind(agent.reputation.average_rating)
        .bind(agent.reputation.total_ratings as i64)
        .bind(agent.reputation.response_time_avg_ms)
        .bind(metadata)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get(&self, id: &AgentId) -> AcpResult<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM acp_agents WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_agent).transpose()
    }

    pub async fn get_by_address(&self, address: &str) -> AcpResult<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM acp_agents WHERE address = ?")
            .bind(address)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_agent).transpose()
    }

    pub async fn list(&self) -> AcpResult<Vec<Agent>> {
        let rows = sqlx::query("SELECT * FROM acp_agents")
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_agent).collect()
    }

    pub async fn update_status(&self, id: &AgentId, status: AgentStatus, updated_at: i64) -> AcpResult<()> {
        sqlx::query("UPDATE acp_agents SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status_str(status))
            .bind(updated_at)
            .bind(&id.0)
            .execute(self.gateway.pool())
            .await
            .store_err()?;
        Ok(())
    }

    /// deletes the agent and its owned services (and their ratings),
    /// honoring the exclusive-ownership rule in spec §3.
    pub async fn delete(&self, id: &AgentId) -> AcpResult<()> {
        let mut tx = self.gateway.pool().begin().await.store_err()?;
        sqlx::query(
            "DELETE FROM acp_ratings WHERE service_id IN (SELECT id FROM acp_services WHERE agent_id = ?)",
        )
        .bind(&id.0)
        .execute(&mut *tx)
        .await
        .store_err()?;
        sqlx::query("DELETE FROM acp_services WHERE agent_id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .store_err()?;
        sqlx::query("DELETE FROM acp_agents WHERE id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .store_err()?;
        tx.commit().await.store_err()?;
        Ok(())
    }
}
