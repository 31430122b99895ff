//! Persisted key names.
//!
//! All keys live in the `study.` namespace; [`crate::state::PersistedState`]
//! adds the prefix, so these constants are the bare names.

/// Key namespace prefix.
pub const NAMESPACE: &str = "study.";

/// Write-once resolved variation name.
pub const VARIATION: &str = "variation";
/// Per-install salt the variation was derived from.
pub const CLIENT_SALT: &str = "clientSalt";
/// Enrollment time, set once.
pub const FIRST_RUN_TIMESTAMP: &str = "firstRunTimestamp";
/// Derived expiry, refreshed only if absent.
pub const EXPIRE_AT: &str = "expireAt";
/// Last time a prompt was dismissed.
pub const LAST_PROMPT_TIMESTAMP: &str = "lastPromptTimestamp";
/// Permanent opt-in marker.
pub const OPTED_IN_PROVIDER_KEY: &str = "optedInProviderKey";
/// Master on/off switch for prompting.
pub const API_ENABLED: &str = "apiEnabled";
/// Active policy interval, for diagnostics.
pub const INTERVAL_PROMPT_DAYS: &str = "intervalPromptDays";
/// Terminal marker: the reason the study ended on this install.
pub const ENDED_REASON: &str = "endedReason";

/// Keys removed by ending cleanup.
pub const PROMPT_STATE_KEYS: [&str; 4] = [
    LAST_PROMPT_TIMESTAMP,
    OPTED_IN_PROVIDER_KEY,
    INTERVAL_PROMPT_DAYS,
    API_ENABLED,
];

/// Every key the study writes, in display order.
pub const ALL: [&str; 9] = [
    VARIATION,
    CLIENT_SALT,
    FIRST_RUN_TIMESTAMP,
    EXPIRE_AT,
    LAST_PROMPT_TIMESTAMP,
    OPTED_IN_PROVIDER_KEY,
    API_ENABLED,
    INTERVAL_PROMPT_DAYS,
    ENDED_REASON,
];

/// Fully qualified storage key.
pub fn qualified(key: &str) -> String {
    format!("{NAMESPACE}{key}")
}
