// Constants module - centralized default values
//
// Defaults shared by the body capture policy, the sinks and the derived
// file naming live here so the configuration layer and the sinks agree.

// =============================================================================
// Body capture defaults
// =============================================================================

/// Default maximum body size captured for logging (2 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Rendering of a body that is absent
pub const BODY_NONE: &str = "<none>";

/// Rendering of a body the policy refuses to capture
pub const BODY_REDACTED: &str = "<redacted>";

/// Rendering of a body whose length could not be determined
pub const BODY_UNKNOWN_LENGTH: &str = "<unknown length>";

/// Rendering of a captured body that is neither UTF-8 nor ASCII
pub const BODY_NON_TEXTUAL: &str = "<non-textual data or unsupported encoding>";

// =============================================================================
// Record defaults
// =============================================================================

/// Placeholder for request fields that do not apply to a call
pub const FIELD_NIL: &str = "<nil>";

/// Label shared by the default sink set
pub const DEFAULT_LOGGER_LABEL: &str = "com.openapi.logger";

// =============================================================================
// Persisted log defaults
// =============================================================================

/// Stem used when neither an app name nor a prefix survives sanitisation
pub const DEFAULT_FILE_STEM: &str = "OpenAPILog";

/// Extension of the JSON file sink's backing file
pub const JSON_LOG_EXTENSION: &str = "json";

/// Extension of the optional plain-text destination
pub const TEXT_LOG_EXTENSION: &str = "log";

/// Timestamp format of persisted records (dd.MM.yyyy. HH:mm:ss, 24-hour)
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y. %H:%M:%S";

/// Field name of the capture timestamp in persisted records
pub const TIMESTAMP_FIELD: &str = "timestamp";
