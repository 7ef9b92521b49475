use acp_types::service::CapabilityCategory;

#[derive(Debug, Clone, Default)]
pub struct ServiceFilters {
    pub category: Option<CapabilityCategory>,
    /// case-insensitive substring match against capability name
    pub capability: Option<String>,
    pub max_price: Option<rust_decimal::Decimal>,
    pub min_rating: Option<f64>,
    /// free text matched against `name + description + capability name`
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentFilters {
    pub capability: Option<String>,
    pub min_rating: Option<f64>,
    pub query: Option<String>,
}
