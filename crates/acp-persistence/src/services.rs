use acp_types::ids::{AgentId, ServiceId};
use acp_types::service::{Capability, CapabilityCategory, Pricing, PricingModel, ServiceLevelAgreement, ServiceListing};
use acp_types::{AcpError, AcpResult};
use sqlx::Row;
use std::str::FromStr;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

fn category_str(c: CapabilityCategory) -> &'static str {
    match c {
        CapabilityCategory::Compute => "compute",
        CapabilityCategory::Data => "data",
        CapabilityCategory::Analytics => "analytics",
        CapabilityCategory::Trading => "trading",
        CapabilityCategory::Content => "content",
        CapabilityCategory::Research => "research",
        CapabilityCategory::Automation => "automation",
        CapabilityCategory::Other => "other",
    }
}

fn category_from_str(s: &str) -> AcpResult<CapabilityCategory> {
    Ok(match s {
        "compute" => CapabilityCategory::Compute,
        "data" => CapabilityCategory::Data,
        "analytics" => CapabilityCategory::Analytics,
        "trading" => CapabilityCategory::Trading,
        "content" => CapabilityCategory::Content,
        "research" => CapabilityCategory::Research,
        "automation" => CapabilityCategory::Automation,
        "other" => CapabilityCategory::Other,
        other => return Err(AcpError::StoreError(format!("unknown capability category {other}"))),
    })
}

fn pricing_model_str(m: PricingModel) -> &'static str {
    match m {
        PricingModel::PerRequest => "per_request",
        PricingModel::PerMinute => "per_minute",
        PricingModel::PerToken => "per_token",
        PricingModel::Flat => "flat",
        PricingModel::Custom => "custom",
    }
}

fn pricing_model_from_str(s: &str) -> AcpResult<PricingModel> {
    Ok(match s {
        "per_request" => PricingModel::PerRequest,
        "per_minute" => PricingModel::PerMinute,
        "per_token" => PricingModel::PerToken,
        "flat" => PricingModel::Flat,
        "custom" => PricingModel::Custom,
        other => return Err(AcpError::StoreError(format!("unknown pricing model {other}"))),
    })
}

fn row_to_service(row: &sqlx::sqlite::SqliteRow) -> AcpResult<ServiceListing> {
    let tags_raw: String = row.try_get("tags").store_err()?;
    let sla_raw: Option<String> = row.try_get("sla").store_err()?;
    let amount_raw: String = row.try_get("pricing_amount").store_err()?;

    Ok(ServiceListing {
        id: ServiceId(row.try_get("id").store_err()?),
        agent_id: AgentId(row.try_get("agent_id").store_err()?),
        capability: Capability {
            category: category_from_str(&row.try_get::<String, _>("capability_category").store_err()?)?,
            name: row.try_get("capability_name").store_err()?,
            description: row.try_get("capability_description").store_err()?,
        },
        pricing: Pricing {
            model: pricing_model_from_str(&row.try_get::<String, _>("pricing_model").store_err()?)?,
            amount: rust_decimal::Decimal::from_str(&amount_raw)
                .map_err(|e| AcpError::StoreError(format!("bad decimal amount: {e}")))?,
            currency: row.try_get("pricing_currency").store_err()?,
        },
        sla: sla_raw.map(|s| serde_json::from_str::<ServiceLevelAgreement>(&s)).transpose()?,
        tags: serde_json::from_str(&tags_raw)?,
        enabled: row.try_get::<i64, _>("enabled").store_err()? != 0,
        created_at: row.try_get("created_at").store_err()?,
        updated_at: row.try_get("updated_at").store_err()?,
    })
}

pub struct ServicesRepo {
    gateway: Gateway,
}

impl ServicesRepo {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn save(&self, svc: &ServiceListing) -> AcpResult<()> {
        let sla = svc.sla.as_ref().map(serde_json::to_string).transpose()?;
        let tags = serde_json::to_string(&svc.tags)?;

        sqlx::query(
            "INSERT OR REPLACE INTO acp_services \
             (id, agent_id, capability_category, capability_name, capability_description, \
              pricing_model, pricing_amount, pricing_currency, sla, tags, enabled, created_at, updated_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&svc.id.0)
        .bind(&svc.agent_id.0)
        .bind(category_str(svc.capability.category))
        .bind(&svc.capability.name)
        .bind(&svc.capability.description)
        .bind(pricing_model_str(svc.pricing.model))
        .bind(svc.pricing.amount.to_string())
        .bind(&svc.pricing.currency)
        .bind(sla)
        .bind(tags)
        .bind(svc.enabled as i64)
        .bind(svc.created_at)
        .bind(svc.updated_at)
        .execute(self.gateway.pool())
        .await
        .store_err()?;
        Ok(())
    }

    pub async fn get(&self, id: &ServiceId) -> AcpResult<Option<ServiceListing>> {
        let row = sqlx::query("SELECT * FROM acp_services WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        row.as_ref().map(row_to_service).transpose()
    }

    pub async fn list(&self) -> AcpResult<Vec<ServiceListing>> {
        let rows = sqlx::query("SELECT * FROM acp_services")
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_service).collect()
    }

    pub async fn list_by_agent(&self, agent_id: &AgentId) -> AcpResult<Vec<ServiceListing>> {
        let rows = sqlx::query("SELECT * FROM acp_services WHERE agent_id = ?")
            .bind(&agent_id.0)
            .fetch_all(self.gateway.pool())
            .await
            .store_err()?;
        rows.iter().map(row_to_service).collect()
    }
}
