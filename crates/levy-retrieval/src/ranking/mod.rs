//! Reranking: local composite score blended with the assessment service's order.

pub mod reranker;
pub mod scorer;

pub use reranker::{order_candidates, Reranker};
pub use scorer::{citation_bonus, composite};
