use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the brokerage REST API. The `live`/`demo` CLI flag
    /// picks between the two well-known hosts when this is left empty.
    pub api_url: String,
    pub account_id: String,
    pub account_num: String,
    /// Login retry ceiling when the broker rate-limits authentication.
    pub login_max_attempts: u32,
    /// Base backoff between login retries; grows linearly per attempt.
    pub login_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// How many strategy endpoints to register at startup.
    pub strategies: u32,
    /// Flat file of route identifiers, one per line.
    pub routes_file: String,
    /// Balance cache refresh interval.
    pub balance_refresh_secs: u64,
    /// Capacity of the open-order submission queue.
    pub queue_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 443,
            },
            broker: BrokerConfig {
                api_url: String::new(),
                account_id: "0".to_string(),
                account_num: "0".to_string(),
                login_max_attempts: 5,
                login_backoff_secs: 2,
            },
            relay: RelayConfig {
                strategies: 1,
                routes_file: "routes.txt".to_string(),
                balance_refresh_secs: 300,
                queue_depth: 64,
            },
        }
    }
}
