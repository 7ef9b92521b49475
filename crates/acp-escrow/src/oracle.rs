//! oracle condition sources
//!
//! three narrow readers: binary account layouts for Pyth and Switchboard,
//! and a bounded HTTP JSON reader. all are fronted by [`OracleDispatcher`],
//! which enforces the aggregate fetch deadline.

use std::collections::HashMap;
use std::time::Duration;

use acp_types::{AcpError, AcpResult};
use async_trait::async_trait;
use serde_json::Value;

pub const AGGREGATE_TIMEOUT: Duration = Duration::from_secs(30);
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait OracleSource: Send + Sync {
    /// `json_path` is only meaningful to sources that fetch structured
    /// data (`HttpOracle`); binary account-layout sources ignore it.
    async fn fetch(&self, feed_id: &str, json_path: Option<&str>) -> AcpResult<f64>;
}

/// supplies raw account bytes for the binary-layout oracles; an RPC client
/// in production, a fixed map in tests.
#[async_trait]
pub trait AccountDataReader: Send + Sync {
    async fn read_account(&self, address: &str) -> AcpResult<Vec<u8>>;
}

pub struct InMemoryAccountDataReader {
    accounts: HashMap<String, Vec<u8>>,
}

impl InMemoryAccountDataReader {
    pub fn new() -> Self {
        Self { accounts: HashMap::new() }
    }

    pub fn with_account(mut self, address: &str, data: Vec<u8>) -> Self {
        self.accounts.insert(address.to_string(), data);
        self
    }
}

impl Default for InMemoryAccountDataReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDataReader for InMemoryAccountDataReader {
    async fn read_account(&self, address: &str) -> AcpResult<Vec<u8>> {
        self.accounts
            .get(address)
            .cloned()
            .ok_or_else(|| AcpError::ExternalError(format!("no account data for {address}")))
    }
}

const PYTH_MANTISSA_OFFSET: usize = 208;
const PYTH_EXPO_OFFSET: usize = 216;

pub struct PythOracle<R: AccountDataReader> {
    reader: R,
}

impl<R: AccountDataReader> PythOracle<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: AccountDataReader> OracleSource for PythOracle<R> {
    async fn fetch(&self, feed_id: &str, _json_path: Option<&str>) -> AcpResult<f64> {
        let data = self.reader.read_account(feed_id).await?;
        let mantissa = read_i64_at(&data, PYTH_MANTISSA_OFFSET)?;
        let expo = read_i32_at(&data, PYTH_EXPO_OFFSET)?;
        Ok(mantissa as f64 * 10f64.powi(expo))
    }
}

/// switchboard aggregator layout: i128 mantissa followed by a u32 scale,
/// documented at these offsets for this deployment.
const SWITCHBOARD_MANTISSA_OFFSET: usize = 8;
const SWITCHBOARD_SCALE_OFFSET: usize = 24;

pub struct SwitchboardOracle<R: AccountDataReader> {
    reader: R,
}

impl<R: AccountDataReader> SwitchboardOracle<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: AccountDataReader> OracleSource for SwitchboardOracle<R> {
    async fn fetch(&self, feed_id: &str, _json_path: Option<&str>) -> AcpResult<f64> {
        let data = self.reader.read_account(feed_id).await?;
        let mantissa = read_i128_at(&data, SWITCHBOARD_MANTISSA_OFFSET)?;
        let scale = read_u32_at(&data, SWITCHBOARD_SCALE_OFFSET)?;
        Ok(mantissa as f64 / 10f64.powi(scale as i32))
    }
}

/// routes an oracle fetch to the right reader by source name and bounds
/// the whole call at the aggregate deadline.
pub struct OracleDispatcher {
    sources: HashMap<String, std::sync::Arc<dyn OracleSource>>,
}

impl OracleDispatcher {
    pub fn new() -> Self {
        Self { sources: HashMap::new() }
    }

    pub fn register(mut self, name: impl Into<String>, source: std::sync::Arc<dyn OracleSource>) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    pub async fn fetch(&self, source: &str, feed_id: &str, json_path: Option<&str>) -> AcpResult<f64> {
        let Some(oracle) = self.sources.get(source) else {
            return Err(AcpError::ExternalError(format!("unknown oracle source {source}")));
        };
        match tokio::time::timeout(AGGREGATE_TIMEOUT, oracle.fetch(feed_id, json_path)).await {
            Ok(result) => result,
            Err(_) => Err(AcpError::Timeout(format!("oracle {source} fetch exceeded {AGGREGATE_TIMEOUT:?}"))),
        }
    }
}

impl Default for OracleDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HttpOracle {
    client: reqwest::Client,
}

impl HttpOracle {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder().timeout(HTTP_TIMEOUT).build().unwrap_or_default(),
        }
    }
}

impl Default for HttpOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleSource for HttpOracle {
    /// `feed_id` is the bare URL; `json_path` comes from the condition
    /// string's optional fifth field. With no path, the fallback chain
    /// `price|result|value|data.price` is tried in order.
    async fn fetch(&self, feed_id: &str, json_path: Option<&str>) -> AcpResult<f64> {
        let body: Value = self
            .client
            .get(feed_id)
            .send()
            .await
            .map_err(|e| AcpError::ExternalError(format!("oracle http fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AcpError::ExternalError(format!("oracle http response not json: {e}")))?;

        if let Some(path) = json_path {
            return walk_dotted_path(&body, path)
                .ok_or_else(|| AcpError::ExternalError(format!("json path {path} not found")));
        }

        for fallback in ["price", "result", "value", "data.price"] {
            if let Some(v) = walk_dotted_path(&body, fallback) {
                return Ok(v);
            }
        }
        Err(AcpError::ExternalError("no known price field in oracle response".into()))
    }
}

fn walk_dotted_path(value: &Value, path: &str) -> Option<f64> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    current.as_f64()
}

fn read_i64_at(data: &[u8], offset: usize) -> AcpResult<i64> {
    let bytes: [u8; 8] = data
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AcpError::ExternalError("account data too short for i64 field".into()))?;
    Ok(i64::from_le_bytes(bytes))
}

fn read_i32_at(data: &[u8], offset: usize) -> AcpResult<i32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AcpError::ExternalError("account data too short for i32 field".into()))?;
    Ok(i32::from_le_bytes(bytes))
}

fn read_i128_at(data: &[u8], offset: usize) -> AcpResult<i128> {
    let bytes: [u8; 16] = data
        .get(offset..offset + 16)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AcpError::ExternalError("account data too short for i128 field".into()))?;
    Ok(i128::from_le_bytes(bytes))
}

fn read_u32_at(data: &[u8], offset: usize) -> AcpResult<u32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AcpError::ExternalError("account data too short for u32 field".into()))?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyth_account(mantissa: i64, expo: i32) -> Vec<u8> {
        let mut data = vec![0u8; 220];
        data[PYTH_MANTISSA_OFFSET..PYTH_MANTISSA_OFFSET + 8].copy_from_slice(&mantissa.to_le_bytes());
        data[PYTH_EXPO_OFFSET..PYTH_EXPO_OFFSET + 4].copy_from_slice(&expo.to_le_bytes());
        data
    }

    #[tokio::test]
    async fn pyth_oracle_decodes_mantissa_and_expo() {
        let reader = InMemoryAccountDataReader::new().with_account("BTC/USD", pyth_account(5_123_456, -2));
        let oracle = PythOracle::new(reader);
        let price = oracle.fetch("BTC/USD", None).await.unwrap();
        assert!((price - 51_234.56).abs() < 1e-6);
    }

    #[tokio::test]
    async fn pyth_oracle_errors_on_missing_account() {
        let reader = InMemoryAccountDataReader::new();
        let oracle = PythOracle::new(reader);
        assert!(oracle.fetch("unknown", None).await.is_err());
    }

    #[test]
    fn dotted_path_walks_nested_objects() {
        let value: Value = serde_json::json!({"data": {"price": 123.45}});
        assert_eq!(walk_dotted_path(&value, "data.price"), Some(123.45));
        assert_eq!(walk_dotted_path(&value, "data.missing"), None);
    }
}
