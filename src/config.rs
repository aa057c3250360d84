//! Configuration parsing and validation for the relay server
//!
//! Every option can come from the command line or the environment, so the relay can be
//! deployed with the upstream API key held only in the server's environment.
use anyhow::{anyhow, bail};
use chat_relay::client::PoolConfig;
use chat_relay::upstream::{DEFAULT_UPSTREAM_URL, Upstream};
use clap::Parser;
use std::time::Duration;
use url::Url;

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The address to bind to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: String,

    /// API key injected into every upstream request.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Shared token callers must present as `Authorization: Bearer <token>`. Leave unset (or
    /// empty) to allow any caller.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// The upstream chat-completions endpoint.
    #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// Give up on an upstream call after this many seconds. Unbounded when unset.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Largest accepted request body in bytes. Unlimited when unset.
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = false)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "chat_relay")]
    pub metrics_prefix: String,
}

// Secrets stay out of the start-up log.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("bind", &self.bind)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("access_token", &redact(&self.access_token))
            .field("upstream_url", &self.upstream_url.as_str())
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("pool_idle_timeout_secs", &self.pool_idle_timeout_secs)
            .field("metrics", &self.metrics)
            .field("metrics_port", &self.metrics_port)
            .field("metrics_prefix", &self.metrics_prefix)
            .finish()
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if !matches!(self.upstream_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Upstream URL '{}' must use http or https",
                self.upstream_url
            ));
        }
        if self.upstream_timeout_secs == Some(0) {
            bail!("--upstream-timeout-secs must be greater than zero");
        }
        if self.max_body_bytes == Some(0) {
            bail!("--max-body-bytes must be greater than zero");
        }
        Ok(self)
    }

    pub fn upstream(&self) -> Upstream {
        Upstream::builder()
            .url(self.upstream_url.clone())
            .maybe_api_key(self.openai_api_key.clone().filter(|key| !key.is_empty()))
            .maybe_timeout(self.upstream_timeout_secs.map(Duration::from_secs))
            .build()
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
            max_idle_per_host: self.pool_max_idle_per_host,
        }
    }
}
