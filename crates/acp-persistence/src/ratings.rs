use acp_types::ids::{RatingId, ServiceId};
use acp_types::service::Rating;
use acp_types::AcpResult;
use sqlx::Row;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

fn row_to_rating(row: &sqlx::sqlite::SqliteRow) -> AcpResult<Rating> {
    Ok(Rating {
        id: RatingId(row.try_get("id").store_err()?),
        service_id: ServiceId(row.try_get("service_id").store_err()?),
        rater_address: row.try_get("rater_address").store_err()?,
        rating: row.try_get::<i64, _>("rating").store_err()? as u8,
        review: row.try_get("review").store_err()?,
        transaction_id: row.try_get("transaction_id").store_err()?,
        created_at: row.try_get("created_at").store_err()?,
    })
}

pub struct RatingsRepo {
    gateway: Gateway,
}

impl RatingsRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, rating: &Rating) -> AcpResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO acp_ratings \
             (id, service_id, rater_address, rating, review, transaction_id, created_at) \
             VALUES (?,?,?,?,?,?,?)",
        )
        .bind(&rating.id.0)
        .bind(&rating.service_id.0)
        .bind(&rating.rater_address)
        .bind(rating.rating as i64)
        .bind(&rating.review)
        .bind(&rating.transaction_id)
        .bind(rating.created_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn list_by_service(&self, service_id: &ServiceId) -> AcpResult<Vec<Rating>> {
        let rows = sqlx::query("SELECT * FROM acp_ratings WHERE service_id = ?")
            .bind(&service_id.0)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_rating).collect()
    }
}
