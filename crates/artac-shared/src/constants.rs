/// Default base URL of the ARTAC backend API
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Id of the channel designated as the CEO conversation
pub const DEFAULT_CEO_CHANNEL_ID: &str = "ceo-direct";

/// Id of the agent that answers in the CEO channel
pub const CEO_AGENT_ID: &str = "ceo-agent";

/// Default local user identity
pub const DEFAULT_USER_ID: &str = "user-admin";
pub const DEFAULT_USER_NAME: &str = "Mission Admin";

/// Two messages with the same author and content closer than this are one event
pub const DUPLICATE_WINDOW_MS: i64 = 5_000;

/// Startup fetch / health ping timeout in milliseconds
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 5_000;

/// Health reconciliation period in seconds
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// Delay before the CEO chat endpoint is called
pub const DEFAULT_CEO_RESPONSE_DELAY_MS: u64 = 1_000;

/// Delay before a canned offline response is posted
pub const DEFAULT_OFFLINE_RESPONSE_DELAY_MS: u64 = 2_000;

/// Maximum number of search results returned
pub const MAX_SEARCH_RESULTS: usize = 100;
