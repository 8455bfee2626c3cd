//! SDK-wide constants.

/// Header carrying the raw session credential on every processor call.
pub const CLIENT_TOKEN_HEADER: &str = "X-Client-Token";

/// Per-request timeout, seconds. The orchestrator imposes no timer of its
/// own; a transport timeout surfaces like any other transport error.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Oldest 3DS engine release whose API surface the SDK can drive. Engines
/// older than this take the continue-without-authentication fallback.
pub const MIN_ENGINE_VERSION: &str = "1.1.0";

/// Protocol version requested when the session credential does not list any.
pub const DEFAULT_THREE_DS_PROTOCOL_VERSION: &str = "2.1.0";

/// Upper bound on server-requested 3DS rounds after the first resume. The
/// wire protocol has no loop limit; without a bound a misbehaving server
/// could keep a checkout attempt authenticating forever.
pub const MAX_REQUIRED_ACTION_ROUNDS: u8 = 2;
