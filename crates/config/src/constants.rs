//! Centralized constants for the voice console
//!
//! Single source of truth for default values and form limits used across
//! the crates. Prefer these over literals.

/// Network defaults
pub mod endpoints {
    /// Default bind host
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Default HTTP port
    pub const DEFAULT_PORT: u16 = 8080;

    /// Default REST backend the client talks to
    pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

    /// Default realtime (websocket) backend
    pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

    /// Path prefix of the chat channel
    pub const CHAT_PATH: &str = "/chat/v1";
}

/// Timeouts
pub mod timeouts {
    /// Server request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Client timeout for backend calls
    pub const BACKEND_TIMEOUT_SECS: u64 = 15;
}

/// Authentication
pub mod auth {
    /// Cookie holding the session token
    pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

    /// Public paths when none are configured
    pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/health", "/metrics", "/user/login", "/user/signup"];

    /// Lifetime of a login session
    pub const SESSION_TTL_HOURS: u64 = 24;
}

/// List views
pub mod listing {
    /// Debounce before a search edit is committed to the URL
    pub const SEARCH_DEBOUNCE_MS: u64 = 300;
    pub const MIN_SEARCH_DEBOUNCE_MS: u64 = 50;
    pub const MAX_SEARCH_DEBOUNCE_MS: u64 = 5_000;

    pub const DEFAULT_PAGE_SIZE: usize = 20;
    pub const MAX_PAGE_SIZE: usize = 100;
}

/// FAQ / route rule limits
pub mod routes {
    pub const MIN_SCORE_THRESHOLD: f64 = 0.7;
    pub const MAX_SCORE_THRESHOLD: f64 = 1.0;

    /// Threshold suggested for a new rule
    pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.9;

    pub const MIN_UTTERANCES: usize = 1;
    pub const MAX_UTTERANCES: usize = 20;
}

/// Custom function limits
pub mod tools {
    /// Valid function name pattern
    pub const NAME_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

    pub const MAX_NAME_LEN: usize = 64;

    pub const DEFAULT_HTTP_METHOD: &str = "POST";
}

/// Chat channel sentinels
pub mod chat {
    pub const BEGINNING_OF_STREAM: &str = "<beginning_of_stream>";
    pub const END_OF_STREAM: &str = "<end_of_stream>";

    /// Shown while the agent is producing a reply
    pub const TYPING_PLACEHOLDER: &str = "...";
}
