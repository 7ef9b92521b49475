use acp_types::escrow::{Condition, Escrow, EscrowStatus};
use acp_types::ids::EscrowId;
use acp_types::{AcpError, AcpResult};
use sqlx::Row;
use std::str::FromStr;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

fn status_str(s: EscrowStatus) -> &'static str {
    match s {
        EscrowStatus::Pending => "pending",
        EscrowStatus::Funded => "funded",
        EscrowStatus::Released => "released",
        EscrowStatus::Refunded => "refunded",
        EscrowStatus::Disputed => "disputed",
        EscrowStatus::Expired => "expired",
    }
}

fn status_from_str(s: &str) -> AcpResult<EscrowStatus> {
    Ok(match s {
        "pending" => EscrowStatus::Pending,
        "funded" => EscrowStatus::Funded,
        "released" => EscrowStatus::Released,
        "refunded" => EscrowStatus::Refunded,
        "disputed" => EscrowStatus::Disputed,
        "expired" => EscrowStatus::Expired,
        other => return Err(AcpError::StoreError(format!("unknown escrow status {other}"))),
    })
}

fn row_to_escrow(row: &sqlx::sqlite::SqliteRow) -> AcpResult<Escrow> {
    let release_raw: String = row.try_get("release_conditions").store_err()?;
    let refund_raw: String = row.try_get("refund_conditions").store_err()?;
    let tx_raw: String = row.try_get("tx_signatures").store_err()?;
    let amount_raw: String = row.try_get("amount").store_err()?;
    let metadata_raw: Option<String> = row.try_get("metadata").store_err()?;

    Ok(Escrow {
        id: EscrowId(row.try_get("id").store_err()?),
        chain: row.try_get("chain").store_err()?,
        buyer: row.try_get("buyer").store_err()?,
        seller: row.try_get("seller").store_err()?,
        arbiter: row.try_get("arbiter").store_err()?,
        amount: rust_decimal::Decimal::from_str(&amount_raw)
            .map_err(|e| AcpError::StoreError(format!("bad decimal: {e}")))?,
        token_mint: row.try_get("token_mint").store_err()?,
        release_conditions: serde_json::from_str::<Vec<Condition>>(&release_raw)?,
        refund_conditions: serde_json::from_str::<Vec<Condition>>(&refund_raw)?,
        expires_at: row.try_get("expires_at").store_err()?,
        description: row.try_get("description").store_err()?,
        agreement_hash: row.try_get("agreement_hash").store_err()?,
        status: status_from_str(&row.try_get::<String, _>("status").store_err()?)?,
        escrow_address: row.try_get("escrow_address").store_err()?,
        tx_signatures: serde_json::from_str(&tx_raw)?,
        metadata: metadata_raw.map(|s| serde_json::from_str(&s)).transpose()?,
        created_at: row.try_get("created_at").store_err()?,
        funded_at: row.try_get("funded_at").store_err()?,
        completed_at: row.try_get("completed_at").store_err()?,
    })
}

pub struct EscrowsRepo {
    gateway: Gateway,
}

impl EscrowsRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, escrow: &Escrow) -> AcpResult<()> {
        let release = serde_json::to_string(&escrow.release_conditions)?;
        let refund = serde_json::to_string(&escrow.refund_conditions)?;
        let tx = serde_json::to_string(&escrow.tx_signatures)?;
        let metadata = escrow.metadata.as_ref().map(serde_json::to_string).transpose()?;

        // plain INSERT OR REPLACE rewrites the whole row on a PK conflict and would
        // null out `encrypted_keypair`, which this statement never lists and which
        // the vault writes to independently via `GatewayVaultStore`; upsert instead
        // so every lifecycle save (fund/release/refund/dispute/resolve) leaves that
        // column untouched.
        sqlx::query(
            "INSERT INTO acp_escrows \
             (id, chain, buyer, seller, arbiter, amount, token_mint, release_conditions, \
              refund_conditions, expires_at, description, agreement_hash, status, \
              escrow_address, tx_signatures, metadata, created_at, funded_at, completed_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?) \
             ON CONFLICT(id) DO UPDATE SET \
                chain = excluded.chain, buyer = excluded.buyer, seller = excluded.seller, \
                arbiter = excluded.arbiter, amount = excluded.amount, token_mint = excluded.token_mint, \
                release_conditions = excluded.release_conditions, refund_conditions = excluded.refund_conditions, \
                expires_at = excluded.expires_at, description = excluded.description, \
                agreement_hash = excluded.agreement_hash, status = excluded.status, \
                escrow_address = excluded.escrow_address, tx_signatures = excluded.tx_signatures, \
                metadata = excluded.metadata, created_at = excluded.created_at, \
                funded_at = excluded.funded_at, completed_at = excluded.completed_at",
        )
        .bind(&escrow.id.0)
        .bind(&escrow.chain)
        .bind(&escrow.buyer)
        .bind(&escrow.seller)
        .bind(&escrow.arbiter)
        .bind(escrow.amount.to_string())
        .bind(&escrow.token_mint)
        .bind(release)
        .bind(refund)
        .bind(escrow.expires_at)
        .bind(&escrow.description)
        .bind(&escrow.agreement_hash)
        .bind(status_str(escrow.status))
        .bind(&escrow.escrow_address)
        .bind(tx)
        .bind(metadata)
        .bind(escrow.created_at)
        .bind(escrow.funded_at)
        .bind(escrow.completed_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get(&self, id: &EscrowId) -> AcpResult<Option<Escrow>> {
        let row = sqlx::query("SELECT * FROM acp_escrows WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_escrow).transpose()
    }

    pub async fn list(&self) -> AcpResult<Vec<Escrow>> {
        let rows = sqlx::query("SELECT * FROM acp_escrows")
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_escrow).collect()
    }

    /// returns escrows where `party` is buyer, seller, or arbiter — role
    /// filtering is left to the caller per spec §9 open question (c).
    pub async fn list_by_party(&self, party: &str) -> AcpResult<Vec<Escrow>> {
        let rows = sqlx::query("SELECT * FROM acp_escrows WHERE buyer = ? OR seller = ? OR arbiter = ?")
            .bind(party)
            .bind(party)
            .bind(party)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_escrow).collect()
    }

    pub async fn list_by_status(&self, status: EscrowStatus) -> AcpResult<Vec<Escrow>> {
        let rows = sqlx::query("SELECT * FROM acp_escrows WHERE status = ?")
            .bind(status_str(status))
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_escrow).collect()
    }

    pub async fn update_status(&self, id: &EscrowId, status: EscrowStatus) -> AcpResult<()> {
        sqlx::query("UPDATE acp_escrows SET status = ? WHERE id = ?")
            .bind(status_str(status))
            .bind(&id.0)
            .execute(self.gateway.pool())
            .await
            .store_err()?;
        Ok(())
    }
}
