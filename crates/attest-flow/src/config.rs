// Configuration for the oracle issuance flow
//
// Loaded from TOML. Timeouts bound every suspension point of a run; the
// oracle identity is the only place the oracle's key is taken from.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use attest_ledger::{ProofType, Query};
use attest_oracle::OracleIdentity;
use serde::{Deserialize, Serialize};

/// Default datasource expression: last BTC/EUR trade price
pub const DEFAULT_EXPRESSION: &str = "json(https://www.therocktrading.com/api/ticker/BTCEUR).result.0.last";

/// Bounded waits, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Wait for the oracle's answer
    pub query_ms: u64,
    /// Wait for the oracle's counter-signature
    pub sign_ms: u64,
    /// Wait for the notary's decision
    pub notary_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            query_ms: 30_000,
            sign_ms: 30_000,
            notary_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn query(&self) -> Duration {
        Duration::from_millis(self.query_ms)
    }

    pub fn sign(&self) -> Duration {
        Duration::from_millis(self.sign_ms)
    }

    pub fn notary(&self) -> Duration {
        Duration::from_millis(self.notary_ms)
    }
}

/// Configuration of one issuance flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Amount of cash issued per successful run
    pub issued_amount: u64,
    /// How many times a run is restarted after a transient failure
    pub retry_attempts: u32,
    /// Log filter directive, e.g. `info` or `attest_flow=debug`
    pub log_level: String,
    /// Emit JSON log lines instead of pretty output
    pub json_logs: bool,
    /// Fact to request from the oracle
    pub query: Query,
    /// Bounded waits
    pub timeouts: TimeoutConfig,
    /// Oracle to query and collect the counter-signature from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<OracleIdentity>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            issued_amount: 10,
            retry_attempts: 0,
            log_level: "info".to_string(),
            json_logs: false,
            query: Query::new("URL", DEFAULT_EXPRESSION, ProofType::TlsNotary),
            timeouts: TimeoutConfig::default(),
            oracle: None,
        }
    }
}

impl FlowConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the oracle identity
    pub fn with_oracle(mut self, oracle: OracleIdentity) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Set the query sent to the oracle
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Set the issued amount
    pub fn with_issued_amount(mut self, amount: u64) -> Self {
        self.issued_amount = amount;
        self
    }

    /// Set all timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the wait for the oracle's answer
    pub fn with_query_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeouts.query_ms = timeout_ms;
        self
    }

    /// Set the wait for the oracle's counter-signature
    pub fn with_sign_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeouts.sign_ms = timeout_ms;
        self
    }

    /// Set the wait for the notary
    pub fn with_notary_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeouts.notary_ms = timeout_ms;
        self
    }

    /// Set the number of restarts after transient failures
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set logging options
    pub fn with_logging(mut self, level: impl Into<String>, json: bool) -> Self {
        self.log_level = level.into();
        self.json_logs = json;
        self
    }

    /// The configured oracle, which every run needs
    pub fn require_oracle(&self) -> Result<&OracleIdentity> {
        self.oracle
            .as_ref()
            .ok_or_else(|| anyhow!("no oracle identity configured"))
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FlowConfig = toml::from_str(content).context("invalid flow configuration")?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::KeyPair;

    #[test]
    fn test_default_config() {
        let config = FlowConfig::default();
        assert_eq!(config.issued_amount, 10);
        assert_eq!(config.retry_attempts, 0);
        assert_eq!(config.query.proof_type, ProofType::TlsNotary);
        assert_eq!(config.timeouts.query(), Duration::from_secs(30));
        assert!(config.require_oracle().is_err());
    }

    #[test]
    fn test_config_builder() {
        let oracle = OracleIdentity::new("Oracle", KeyPair::from_seed([3u8; 32]).public_key(), "http://oracle:8080");
        let config = FlowConfig::new()
            .with_oracle(oracle.clone())
            .with_issued_amount(25)
            .with_query_timeout(100)
            .with_sign_timeout(200)
            .with_notary_timeout(300)
            .with_retry_attempts(2)
            .with_logging("debug", true);

        assert_eq!(config.require_oracle().unwrap(), &oracle);
        assert_eq!(config.issued_amount, 25);
        assert_eq!(config.timeouts, TimeoutConfig { query_ms: 100, sign_ms: 200, notary_ms: 300 });
        assert_eq!(config.retry_attempts, 2);
        assert!(config.json_logs);
    }

    #[test]
    fn test_toml_round_trip() {
        let oracle = OracleIdentity::new("Oracle", KeyPair::from_seed([3u8; 32]).public_key(), "http://oracle:8080");
        let config = FlowConfig::new().with_oracle(oracle).with_retry_attempts(1);

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("TLS_PROOF"));
        assert_eq!(FlowConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_handwritten_toml() {
        let text = r#"
            issued_amount = 10
            retry_attempts = 1
            log_level = "info"
            json_logs = false

            [query]
            datasource = "URL"
            expression = "json(https://www.therocktrading.com/api/ticker/BTCEUR).result.0.last"
            proof_type = "TLS_PROOF"

            [timeouts]
            query_ms = 5000
            sign_ms = 5000
            notary_ms = 10000

            [oracle]
            name = "O=Oracle,L=London,C=GB"
            public_key = "0000000000000000000000000000000000000000000000000000000000000001"
            address = "http://localhost:8080"
        "#;

        let config = FlowConfig::from_toml_str(text).unwrap();
        assert_eq!(config.timeouts.notary(), Duration::from_secs(10));
        assert_eq!(config.require_oracle().unwrap().address, "http://localhost:8080");
    }

    #[test]
    fn test_rejects_unknown_proof_type() {
        let text = FlowConfig::default()
            .to_toml_string()
            .unwrap()
            .replace("TLS_PROOF", "CARRIER_PIGEON");
        assert!(FlowConfig::from_toml_str(&text).is_err());
    }
}
