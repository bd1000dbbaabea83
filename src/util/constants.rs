// logmux - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logmux";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "logmux";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Source discovery
// =============================================================================

/// Default include glob patterns for sub-source (log file) discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log"];

/// Default exclude glob patterns. Literal patterns (no wildcards) also match
/// source directory names.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.gz", "*.zip", "*.bak", "*.tmp"];

/// Default root directory scanned for sources when neither the CLI nor the
/// config file names one.
pub const DEFAULT_SOURCE_ROOT: &str = ".";

// =============================================================================
// Live tail limits
// =============================================================================

/// How often a following stream re-checks its file for new content (ms).
pub const TAIL_POLL_INTERVAL_MS: u64 = 250;

/// How often the cancel flag is checked within each poll sleep interval (ms).
pub const TAIL_CANCEL_CHECK_INTERVAL_MS: u64 = 50;

/// Minimum user-configurable tail poll interval (ms).
pub const MIN_TAIL_POLL_INTERVAL_MS: u64 = 50;

/// Maximum user-configurable tail poll interval (ms).
pub const MAX_TAIL_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

/// Maximum size of a single emitted line in bytes.
///
/// A stream that produces no newline for this many bytes (binary content, a
/// file opened by mistake) is split into chunks of this size so the tailer's
/// line buffer stays bounded.
pub const MAX_LINE_BYTES: usize = 256 * 1_024; // 256 KiB

// =============================================================================
// Fan-in channel
// =============================================================================

/// Default capacity of the shared tailer -> aggregator channel.
///
/// Tailers block on send once this many lines are queued, which is the only
/// back-pressure applied to sources.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Maximum user-configurable channel capacity. Zero (rendezvous) is allowed.
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// How long a cancelled run waits for tailers to notice the cancel flag
/// before leaving them detached (ms).
pub const CANCEL_JOIN_GRACE_MS: u64 = 500;

/// How often the aggregator wakes from an idle receive to check the cancel
/// flag (ms).
pub const AGGREGATOR_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable forcing colour on ("1"/"true") or off ("0"/"false").
pub const COLOR_ENV_VAR: &str = "LOGMUX_COLOR";
