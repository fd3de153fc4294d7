pub mod config;
pub mod consolidate;
pub mod error;
pub mod json_bridge;
pub mod query;
pub mod schema;
pub mod store;

pub use config::{MnemosConfig, StoreConfig};
pub use consolidate::{Coalition, ConsolidationEngine, ConsolidationMetrics, ConsolidationPhase};
pub use error::{Result, StoreError};
pub use json_bridge::{EXPORT_VERSION, GraphExport};
pub use query::{PatternQuery, Predicate, Scope, SortKey, SortOrder};
pub use store::{CausalEdge, CausalLink, Embedding, PatternStore, SemanticEdge, StoreStats};
