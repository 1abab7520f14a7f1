use serde::Deserialize;

// =============================================================================
// Constants
// =============================================================================

/// Default base URL for the winget.run community API
pub const DEFAULT_API_BASE_URL: &str = "https://api.winget.run";

/// Timeout for a single outbound API request in seconds (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for a local winget invocation in seconds (30 seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

/// Maximum attempts for a single outbound API call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retry attempts (500ms)
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Delay between prewarm fetches to respect upstream rate limits (100ms)
pub const DEFAULT_PREWARM_DELAY_MS: u64 = 100;

/// Minimum score a candidate must reach to count as a match
pub const MIN_MATCH_SCORE: i64 = 15;

/// Lower bound for the caller-supplied request timeout
pub const MIN_TIMEOUT_SECS: u64 = 5;

/// Upper bound for the caller-supplied request timeout
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Lookup configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LookupConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub probe: ProbeConfig,
    pub prewarm: PrewarmConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Retry policy configuration for outbound API calls
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

/// Local winget executable probe configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

/// Batch prewarm configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrewarmConfig {
    pub delay_ms: u64,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_PREWARM_DELAY_MS,
        }
    }
}
