//! Default values for every tunable threshold.

// Decision
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.65;
pub const DEFAULT_SIMPLE_MAX_WORDS: usize = 18;

// Retrieval
pub const DEFAULT_SIMPLE_TOP_K: usize = 5;
pub const DEFAULT_ENHANCED_TOP_K: usize = 15;
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.5;
pub const DEFAULT_FINAL_K: usize = 5;
pub const DEFAULT_KEYWORD_MAX_TERMS: usize = 8;

// Validation
pub const DEFAULT_ACCEPT_ABOVE: f64 = 0.7;
pub const DEFAULT_REJECT_BELOW: f64 = 0.4;
pub const DEFAULT_MIN_ACCEPTED: usize = 3;
pub const DEFAULT_DEGRADED_CONFIDENCE_FACTOR: f64 = 0.6;

// Expansion
pub const DEFAULT_MIN_VARIANTS: usize = 2;
pub const DEFAULT_MAX_VARIANTS: usize = 4;

// Rerank
pub const DEFAULT_RERANK_SIMILARITY_WEIGHT: f64 = 0.35;
pub const DEFAULT_RERANK_VALIDATION_WEIGHT: f64 = 0.45;
pub const DEFAULT_RERANK_CITATION_WEIGHT: f64 = 0.20;
pub const DEFAULT_RERANK_SERVICE_BLEND: f64 = 0.2;

// Resilience
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// Feedback
pub const DEFAULT_RATIO_WEIGHT: f64 = 0.6;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.4;
pub const DEFAULT_RECENCY_DECAY: f64 = 0.3;
pub const DEFAULT_STALE_HALF_LIFE_DAYS: f64 = 0.0;

// Cost (abstract units per call)
pub const DEFAULT_EMBED_COST: f64 = 0.0001;
pub const DEFAULT_VECTOR_SEARCH_COST: f64 = 0.0002;
pub const DEFAULT_KEYWORD_SEARCH_COST: f64 = 0.0001;
pub const DEFAULT_ASSESS_COST: f64 = 0.0004;
pub const DEFAULT_RERANK_COST: f64 = 0.001;
pub const DEFAULT_EXPAND_COST: f64 = 0.002;

// Embedding cache
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_EMBEDDING_CACHE_TTL_SECS: u64 = 3_600;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
