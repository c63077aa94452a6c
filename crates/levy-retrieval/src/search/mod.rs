//! First-stage retrieval: dense vector search, citation-aware keyword
//! search, and the max-score hybrid merge.

pub mod hybrid;
pub mod keyword;
pub mod vector;

pub use hybrid::merge_max;
pub use keyword::{extract_citation_codes, extract_terms, KeywordRetriever};
pub use vector::VectorRetriever;
