//! Command-line and environment configuration.
//!
//! Every flag has an `APISCOPE_*` environment fallback; the binary loads a
//! `.env` file first, so either works. The log filter also honors `RUST_LOG`.

use crate::http::HttpDefaults;
use crate::logging::{TracingConfig, TracingFormat};
use crate::server::DEFAULT_SHUTDOWN_GRACE;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "apiscope", version)]
#[command(about = "OpenAPI inspection and HTTP request tools over JSON-RPC on stdio")]
pub struct Args {
    /// OpenAPI document to load before serving.
    #[arg(long, env = "APISCOPE_DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Maximum log level.
    #[arg(long, env = "APISCOPE_LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Log output format.
    #[arg(long, env = "APISCOPE_LOG_FORMAT", value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,

    /// Target-specific log filter, e.g. `apiscope_server=debug,reqwest=warn`.
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// Log span enter and exit events.
    #[arg(long, env = "APISCOPE_LOG_SPANS")]
    pub log_spans: bool,

    /// Default per-attempt timeout of outbound requests, in milliseconds.
    #[arg(long, env = "APISCOPE_HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    pub http_timeout_ms: u64,

    /// Default number of retries of outbound requests.
    #[arg(long, env = "APISCOPE_HTTP_MAX_RETRIES", default_value_t = 0)]
    pub http_max_retries: u32,

    /// Most retries a single request may ask for.
    #[arg(long, env = "APISCOPE_HTTP_MAX_RETRIES_LIMIT", default_value_t = 10)]
    pub http_max_retries_limit: u32,

    /// Largest response body read from an outbound request, in bytes.
    #[arg(long, env = "APISCOPE_HTTP_MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub http_max_body_bytes: usize,

    /// Pause between retries of outbound requests, in milliseconds.
    #[arg(long, env = "APISCOPE_HTTP_RETRY_DELAY_MS", default_value_t = 500)]
    pub http_retry_delay_ms: u64,

    /// Deadline for every tool call, in milliseconds.
    #[arg(long, env = "APISCOPE_CALL_TIMEOUT_MS")]
    pub call_timeout_ms: Option<u64>,

    /// How long calls still running at end of input may take before they are cancelled.
    #[arg(long, env = "APISCOPE_SHUTDOWN_GRACE_MS", default_value_t = 5_000)]
    pub shutdown_grace_ms: u64,
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Logging setup.
    pub tracing: TracingConfig,
    /// Defaults for outbound requests.
    pub http: HttpDefaults,
    /// Deadline handed to every tool call.
    pub call_timeout: Option<Duration>,
    /// Document to load before serving.
    pub document: Option<PathBuf>,
    /// Time calls still running at end of input get before they are cancelled.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tracing: TracingConfig::default(),
            http: HttpDefaults::default(),
            call_timeout: None,
            document: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        let mut tracing = TracingConfig::new()
            .with_level(args.log_level)
            .with_format(args.log_format)
            .with_span_events(args.log_spans);
        if let Some(filter) = args.log_filter {
            tracing = tracing.with_env_filter(filter);
        }

        Self {
            tracing,
            http: HttpDefaults {
                timeout: Duration::from_millis(args.http_timeout_ms),
                max_retries: args.http_max_retries,
                max_retries_limit: args.http_max_retries_limit,
                retry_delay: Duration::from_millis(args.http_retry_delay_ms),
                max_body_bytes: args.http_max_body_bytes,
            },
            call_timeout: args.call_timeout_ms.map(Duration::from_millis),
            document: args.document,
            shutdown_grace: Duration::from_millis(args.shutdown_grace_ms),
        }
    }
}
