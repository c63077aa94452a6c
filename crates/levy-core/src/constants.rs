/// levy system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest query text accepted by the engine, in characters.
pub const MAX_QUERY_CHARS: usize = 4_000;

/// Separator between the category and entity parts of a context key.
pub const CONTEXT_KEY_SEPARATOR: &str = "::";

/// Placeholder used for a missing context key part.
pub const EMPTY_KEY_PART: &str = "_";

/// Prefix for chunk ids synthesized from structured rules.
pub const RULE_CHUNK_PREFIX: &str = "rule";
