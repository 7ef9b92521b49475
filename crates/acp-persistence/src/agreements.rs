use acp_types::agreement::{Agreement, AgreementStatus, Party, Term};
use acp_types::ids::{AgreementId, EscrowId};
use acp_types::{AcpError, AcpResult};
use sqlx::Row;
use std::str::FromStr;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

fn status_str(s: AgreementStatus) -> &'static str {
    match s {
        AgreementStatus::Draft => "draft",
        AgreementStatus::Proposed => "proposed",
        AgreementStatus::Signed => "signed",
        AgreementStatus::Executed => "executed",
        AgreementStatus::Completed => "completed",
        AgreementStatus::Cancelled => "cancelled",
        AgreementStatus::Disputed => "disputed",
    }
}

fn status_from_str(s: &str) -> AcpResult<AgreementStatus> {
    Ok(match s {
        "draft" => AgreementStatus::Draft,
        "proposed" => AgreementStatus::Proposed,
        "signed" => AgreementStatus::Signed,
        "executed" => AgreementStatus::Executed,
        "completed" => AgreementStatus::Completed,
        "cancelled" => AgreementStatus::Cancelled,
        "disputed" => AgreementStatus::Disputed,
        other => return Err(AcpError::StoreError(format!("unknown agreement status {other}"))),
    })
}

fn row_to_agreement(row: &sqlx::sqlite::SqliteRow) -> AcpResult<Agreement> {
    let parties_raw: String = row.try_get("parties").store_err()?;
    let terms_raw: String = row.try_get("terms").store_err()?;
    let total_value_raw: Option<String> = row.try_get("total_value").store_err()?;

    Ok(Agreement {
        id: AgreementId(row.try_get("id").store_err()?),
        hash: row.try_get("hash").store_err()?,
        title: row.try_get("title").store_err()?,
        description: row.try_get("description").store_err()?,
        parties: serde_json::from_str::<Vec<Party>>(&parties_raw)?,
        terms: serde_json::from_str::<Vec<Term>>(&terms_raw)?,
        total_value: total_value_raw
            .map(|s| rust_decimal::Decimal::from_str(&s))
            .transpose()
            .map_err(|e| AcpError::StoreError(format!("bad decimal: {e}")))?,
        currency: row.try_get("currency").store_err()?,
        start_date: row.try_get("start_date").store_err()?,
        end_date: row.try_get("end_date").store_err()?,
        escrow_id: row
            .try_get::<Option<String>, _>("escrow_id")
            .store_err()?
            .map(EscrowId),
        version: row.try_get::<i64, _>("version").store_err()? as u32,
        previous_version_hash: row.try_get("previous_version_hash").store_err()?,
        status: status_from_str(&row.try_get::<String, _>("status").store_err()?)?,
        created_at: row.try_get("created_at").store_err()?,
        updated_at: row.try_get("updated_at").store_err()?,
    })
}

pub struct AgreementsRepo {
    gateway: Gateway,
}

impl AgreementsRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, agreement: &Agreement) -> AcpResult<()> {
        let parties = serde_json::to_string(&agreement.parties)?;
        let terms = serde_json::to_string(&agreement.terms)?;

        sqlx::query(
            "INSERT OR REPLACE INTO acp_agreements \
             (id, hash, title, description, parties, terms, total_value, currency, \
              start_date, end_date, escrow_id, version, previous_version_hash, status, \
              created_at, updated_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&agreement.id.0)
        .bind(&agreement.hash)
        .bind(&agreement.title)
        .bind(&agreement.description)
        .bind(parties)
        .bind(terms)
        .bind(agreement.total_value.map(|v| v.to_string()))
        .bind(&agreement.currency)
        .bind(agreement.start_date)
        .bind(agreement.end_date)
        .bind(agreement.escrow_id.as_ref().map(|e| e.0.clone()))
        .bind(agreement.version as i64)
        .bind(&agreement.previous_version_hash)
        .bind(status_str(agreement.status))
        .bind(agreement.created_at)
        .bind(agreement.updated_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get(&self, id: &AgreementId) -> AcpResult<Option<Agreement>> {
        let row = sqlx::query("SELECT * FROM acp_agreements WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_agreement).transpose()
    }

    pub async fn get_by_hash(&self, hash: &str) -> AcpResult<Option<Agreement>> {
        let row = sqlx::query("SELECT * FROM acp_agreements WHERE hash = ?")
            .bind(hash)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_agreement).transpose()
    }

    /// every agreement whose party list contains `address` — open question
    /// (c) in spec §9: role filtering happens client-side, this returns all
    /// roles for the address.
    pub async fn list_by_party_address(&self, address: &str) -> AcpResult<Vec<Agreement>> {
        let rows = sqlx::query("SELECT * FROM acp_agreements WHERE parties LIKE ?")
            .bind(format!("%\"{address}\"%"))
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter()
            .map(row_to_agreement)
            .collect::<AcpResult<Vec<_>>>()
            .map(|agreements| {
                agreements
                    .into_iter()
                    .filter(|a| a.parties.iter().any(|p| p.address == address))
                    .collect()
            })
    }
}
