//! write-through cache over the agent/service/rating tables.
//!
//! the registry hydrates eagerly at startup (spec §9 design note: prefer
//! eager hydration over the source's lazy-load so schema problems surface
//! immediately), then serves reads from the in-memory cache and writes
//! through the persistence gateway before updating it.

use std::collections::HashMap;

use acp_persistence::{AgentsRepo, RatingsRepo, ServicesRepo};
use acp_types::agent::{Agent, AgentProfile, AgentStatus, ReputationAggregate};
use acp_types::ids::{AgentId, RatingId, ServiceId};
use acp_types::keyed_lock::KeyedLock;
use acp_types::now_millis;
use acp_types::service::{Rating, ServiceListing};
use acp_types::{AcpError, AcpResult};
use tokio::sync::RwLock;
use tracing::info;

use crate::filters::{AgentFilters, ServiceFilters};

pub struct AgentRegistry {
    agents_repo: AgentsRepo,
    services_repo: ServicesRepo,
    ratings_repo: RatingsRepo,
    agents: RwLock<HashMap<AgentId, Agent>>,
    services: RwLock<HashMap<ServiceId, ServiceListing>>,
    address_index: RwLock<HashMap<String, AgentId>>,
    locks: KeyedLock<AgentId>,
}

impl AgentRegistry {
    /// hydrates the cache from the gateway; call once at startup.
    pub async fn hydrate(
        agents_repo: AgentsRepo,
        services_repo: ServicesRepo,
        ratings_repo: RatingsRepo,
    ) -> AcpResult<Self> {
        let agents = agents_repo.list().await?;
        let services = services_repo.list().await?;

        let mut agent_map = HashMap::new();
        let mut address_index = HashMap::new();
        for a in agents {
            address_index.insert(a.address.0.clone(), a.id.clone());
            agent_map.insert(a.id.clone(), a);
        }
        let mut service_map = HashMap::new();
        for s in services {
            service_map.insert(s.id.clone(), s);
        }

        info!(
            agents = agent_map.len(),
            services = service_map.len(),
            "agent registry: cache hydrated"
        );

        Ok(Self {
            agents_repo,
            services_repo,
            ratings_repo,
            agents: RwLock::new(agent_map),
            services: RwLock::new(service_map),
            address_index: RwLock::new(address_index),
            locks: KeyedLock::new(),
        })
    }

    pub async fn register(&self, profile: AgentProfile) -> AcpResult<Agent> {
        {
            let index = self.address_index.read().await;
            if index.contains_key(&profile.address.0) {
                return Err(AcpError::conflict(format!(
                    "agent with address {} already registered",
                    profile.address.0
                )));
            }
        }

        let now = now_millis();
        let agent = Agent {
            id: AgentId::new(),
            address: profile.address,
            name: profile.name,
            description: profile.description,
            capabilities: profile.capabilities,
            status: AgentStatus::Active,
            reputation: ReputationAggregate::zero(),
            metadata: profile.metadata,
            created_at: now,
            updated_at: now,
        };

        self.agents_repo.save(&agent).await?;
        eprintln!("DEBUG register id={}", agent.id);
        self.agents.write().await.insert(agent.id.clone(), agent.clone());
        self.address_index
            .write()
            .await
            .insert(agent.address.0.clone(), agent.id.clone());

        info!(agent_id = %agent.id, address = %agent.address, "agent:register");
        Ok(agent)
    }

    pub async fn get(&self, id: &AgentId) -> AcpResult<Agent> {
        eprintln!("DEBUG get id={}", id);
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AcpError::not_found(format!("agent {id} not found")))
    }

    pub async fn list_service(&self, agent_id: &AgentId, mut listing: ServiceListing) -> AcpResult<ServiceListing> {
        {
            let agents = self.agents.read().await;
            if !agents.contains_key(agent_id) {
                return Err(AcpError::not_found(format!("agent {agent_id} not found")));
            }
        }

        let now = now_millis();
        listing.agent_id = agent_id.clone();
        if listing.id.0.is_empty() {
            listing.id = ServiceId::new();
        }
        listing.created_at = now;
        listing.updated_at = now;

        self.services_repo.save(&listing).await?;
        self.services.write().await.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    /// linear scan over the cache; ranked by `averageRating *
    /// log10(totalTransactions + 1)` descending, ties broken by most recent
    /// update.
    pub async fn search_services(&self, filters: ServiceFilters) -> AcpResult<Vec<ServiceListing>> {
        let services = self.services.read().await;
        let agents = self.agents.read().await;

        let mut matches: Vec<ServiceListing> = services
            .values()
            .filter(|s| {
                if let Some(cat) = filters.category {
                    if s.capability.category != cat {
                        return false;
                    }
                }
                if let Some(cap) = &filters.capability {
                    let cap = cap.to_lowercase();
                    if !s.capability.name.to_lowercase().contains(&cap)
                        && !s.capability.description.to_lowercase().contains(&cap)
                    {
                        return false;
                    }
                }
                if let Some(max_price) = filters.max_price {
                    if s.pricing.amount > max_price {
                        return false;
                    }
                }
                if let Some(min_rating) = filters.min_rating {
                    let rating = agents.get(&s.agent_id).map(|a| a.reputation.average_rating).unwrap_or(0.0);
                    if rating < min_rating {
                        return false;
                    }
                }
                if let Some(q) = &filters.query {
                    let q = q.to_lowercase();
                    let agent_name = agents.get(&s.agent_id).map(|a| a.name.as_str()).unwrap_or("");
                    let haystack = format!(
                        "{} {} {}",
                        agent_name,
                        s.capability.description.to_lowercase(),
                        s.capability.name.to_lowercase()
                    );
                    if !haystack.to_lowercase().contains(&q) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let score = |s: &ServiceListing| {
                let rating = agents.get(&s.agent_id).map(|ag| ag.reputation.average_rating).unwrap_or(0.0);
                let tx = agents.get(&s.agent_id).map(|ag| ag.reputation.total_transactions).unwrap_or(0);
                rating * (tx as f64 + 1.0).log10()
            };
            score(b)
                .partial_cmp(&score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.updated_at.cmp(&a.updated_at))
        });

        Ok(matches)
    }

    pub async fn search_agents(&self, filters: AgentFilters) -> AcpResult<Vec<Agent>> {
        let agents = self.agents.read().await;
        let services = self.services.read().await;

        let mut matches: Vec<Agent> = agents
            .values()
            .filter(|a| {
                if let Some(cap) = &filters.capability {
                    let cap = cap.to_lowercase();
                    if !a.capabilities.iter().any(|c| c.to_lowercase().contains(&cap)) {
                        return false;
                    }
                }
                if let Some(min_rating) = filters.min_rating {
                    if a.reputation.average_rating < min_rating {
                        return false;
                    }
                }
                if let Some(q) = &filters.query {
                    let q = q.to_lowercase();
                    let caps = a.capabilities.join(" ").to_lowercase();
                    let haystack = format!("{} {} {}", a.name.to_lowercase(), a.description.to_lowercase(), caps);
                    if !haystack.contains(&q) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let score = |ag: &Agent| ag.reputation.average_rating * (ag.reputation.total_transactions as f64 + 1.0).log10();
            score(b)
                .partial_cmp(&score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.updated_at.cmp(&a.updated_at))
        });

        let _ = &services; // reserved for capability cross-reference in richer queries
        Ok(matches)
    }

    /// rolling average update under a per-agent logical lock, so concurrent
    /// raters can't race the `successful <= total` invariant.
    pub async fn rate_service(
        &self,
        service_id: &ServiceId,
        rater_address: &str,
        rating: u8,
        review: Option<String>,
    ) -> AcpResult<Rating> {
        Rating::validate_score(rating).map_err(AcpError::validation)?;

        let agent_id = {
            let services = self.services.read().await;
            services
                .get(service_id)
                .map(|s| s.agent_id.clone())
                .ok_or_else(|| AcpError::not_found(format!("service {service_id} not found")))?
        };

        let _guard = self.locks.lock(agent_id.clone()).await;

        let record = Rating {
            id: RatingId::new(),
            service_id: service_id.clone(),
            rater_address: rater_address.to_string(),
            rating,
            review,
            transaction_id: None,
            created_at: now_millis(),
        };
        self.ratings_repo.save(&record).await?;

        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| AcpError::not_found(format!("agent {agent_id} not found")))?;

        let n = agent.reputation.total_ratings as f64;
        let new_avg = (agent.reputation.average_rating * n + rating as f64) / (n + 1.0);
        agent.reputation.average_rating = (new_avg * 100.0).round() / 100.0;
        agent.reputation.total_ratings += 1;
        agent.updated_at = now_millis();

        self.agents_repo.save(agent).await?;
        Ok(record)
    }

    /// increments transaction counters and the rolling response-time mean
    /// under the same per-agent lock `rate_service` uses.
    pub async fn record_transaction(
        &self,
        agent_id: &AgentId,
        success: bool,
        response_time_ms: Option<f64>,
    ) -> AcpResult<ReputationAggregate> {
        let _guard = self.locks.lock(agent_id.clone()).await;

        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(agent_id)
            .ok_or_else(|| AcpError::not_found(format!("agent {agent_id} not found")))?;

        agent.reputation.total_transactions += 1;
        if success {
            agent.reputation.successful_transactions += 1;
        }

        if let Some(rt) = response_time_ms {
            let n = (agent.reputation.total_transactions - 1) as f64;
            agent.reputation.response_time_avg_ms = (agent.reputation.response_time_avg_ms * n + rt) / (n + 1.0);
        }

        debug_assert!(agent.reputation.successful_transactions <= agent.reputation.total_transactions);

        agent.updated_at = now_millis();
        self.agents_repo.save(agent).await?;
        Ok(agent.reputation.clone())
    }
}
