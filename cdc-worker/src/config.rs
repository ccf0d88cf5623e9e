use std::num::NonZeroUsize;
use std::time;

use cdc_common::config::{EnvSecondsDuration, NonEmptyString, SalesforceConfig};
use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "::")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3302")]
    pub port: u16,

    /// Maximum number of record Ids fetched by a single query.
    #[envconfig(from = "BATCH_SIZE", default = "1")]
    pub batch_size: NonZeroUsize,

    /// Pause between two query windows, in seconds. 0 disables throttling.
    #[envconfig(from = "INTERVAL", default = "1")]
    pub interval: EnvSecondsDuration,

    #[envconfig(from = "TARGET_DELIVERY_STREAM")]
    pub target_delivery_stream: NonEmptyString,

    #[envconfig(from = "PRINT_SINK", default = "false")]
    pub print_sink: bool,

    /// How long entity field lists are cached for, in seconds. 0 describes entities on every notification.
    #[envconfig(from = "FIELD_CACHE_TTL_SECONDS", default = "0")]
    pub field_cache_ttl: EnvSecondsDuration,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(nested = true)]
    pub salesforce: SalesforceConfig,
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn interval(&self) -> time::Duration {
        self.interval.0
    }

    pub fn field_cache_ttl(&self) -> Option<time::Duration> {
        Some(self.field_cache_ttl.0).filter(|ttl| !ttl.is_zero())
    }
}
