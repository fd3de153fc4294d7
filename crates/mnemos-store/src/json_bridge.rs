use std::fs;
use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use mnemos_core::{Pattern, PatternId, Timestamp};

use crate::error::{Result, StoreError};
use crate::query::{PatternQuery, SortKey, SortOrder};
use crate::store::{
    CausalEdge, Embedding, PatternStore, SemanticEdge, StoreStats, check_edge, check_embedding,
};

pub const EXPORT_VERSION: u32 = 1;

/// Portable snapshot of the whole pattern graph. Semantic edges appear
/// once per undirected pair, with `source < target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub version: u32,
    pub exported_at: Timestamp,
    pub patterns: Vec<Pattern>,
    pub causal_edges: Vec<CausalEdge>,
    pub semantic_edges: Vec<SemanticEdge>,
    pub embeddings: Vec<Embedding>,
}

impl PatternStore {
    pub fn export_graph(&self) -> Result<GraphExport> {
        let patterns =
            self.search(&PatternQuery::new().sort_by(SortKey::FirstSeen, SortOrder::Ascending))?;
        let semantic_edges = self
            .semantic_edges()?
            .into_iter()
            .filter(|e| e.source < e.target)
            .collect();
        Ok(GraphExport {
            version: EXPORT_VERSION,
            exported_at: Timestamp::now(),
            patterns,
            causal_edges: self.causal_edges()?,
            semantic_edges,
            embeddings: self.embeddings()?,
        })
    }

    pub fn export_json_string(&self) -> Result<String> {
        let graph = self.export_graph()?;
        serde_json::to_string_pretty(&graph)
            .map_err(|e| StoreError::Validation(format!("JSON export failed: {e}")))
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json).map_err(|e| {
            StoreError::Validation(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Load a snapshot in one transaction. Patterns keep their counters and
    /// timestamps; every row passes the same checks as a direct write, and
    /// any failure leaves the store untouched.
    pub fn import_graph(&self, graph: &GraphExport) -> Result<StoreStats> {
        if graph.version != EXPORT_VERSION {
            return Err(StoreError::Validation(format!(
                "unsupported export version {} (expected {EXPORT_VERSION})",
                graph.version
            )));
        }

        let tx = self.conn().unchecked_transaction()?;
        for pattern in &graph.patterns {
            PatternStore::restore_on(&tx, pattern)?;
        }
        for edge in &graph.causal_edges {
            if !(edge.strength.is_finite() && (0.0..=1.0).contains(&edge.strength)) {
                return Err(StoreError::InvalidParameter(format!(
                    "link strength must be within [0, 1], got {}",
                    edge.strength
                )));
            }
            require_on(&tx, &edge.parent)?;
            require_on(&tx, &edge.child)?;
            PatternStore::link_on(&tx, &edge.parent, &edge.child, edge.kind, edge.strength, edge.created_at)?;
        }
        for edge in &graph.semantic_edges {
            check_edge(&edge.source, &edge.target, edge.weight)?;
            require_on(&tx, &edge.source)?;
            require_on(&tx, &edge.target)?;
            PatternStore::write_edge_pair(&tx, &edge.source, &edge.target, edge.weight, edge.kind, edge.updated_at)?;
        }
        for embedding in &graph.embeddings {
            check_embedding(&embedding.vector, embedding.dim)?;
            require_on(&tx, &embedding.pattern_id)?;
            PatternStore::write_embedding(
                &tx,
                &embedding.pattern_id,
                &embedding.vector,
                &embedding.model,
                embedding.updated_at,
            )?;
        }
        tx.commit()?;

        let summary = StoreStats {
            patterns: graph.patterns.len(),
            relationships: graph.causal_edges.len(),
            semantic_edges: graph.semantic_edges.len(),
            embeddings: graph.embeddings.len(),
        };
        tracing::info!(
            patterns = summary.patterns,
            relationships = summary.relationships,
            semantic_edges = summary.semantic_edges,
            embeddings = summary.embeddings,
            "graph imported"
        );
        Ok(summary)
    }

    pub fn import_json_str(&self, json: &str) -> Result<StoreStats> {
        let graph: GraphExport = serde_json::from_str(json)
            .map_err(|e| StoreError::Validation(format!("invalid JSON: {e}")))?;
        self.import_graph(&graph)
    }

    pub fn import_json_file(&self, path: &Path) -> Result<StoreStats> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::Validation(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json)
    }
}

fn require_on(conn: &Connection, id: &PatternId) -> Result<()> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patterns WHERE id = ?1)",
        [id.as_str()],
        |r| r.get(0),
    )?;
    if found {
        Ok(())
    } else {
        Err(StoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::{PatternType, RelationshipKind, WeightKind};
    use serde_json::json;

    fn populated() -> (PatternStore, PatternId, PatternId) {
        let store = PatternStore::open_in_memory().unwrap();
        let a = store
            .put(&Pattern::new(PatternType::Emergent, "a", json!({"v": 1})).unwrap())
            .unwrap();
        let b = store
            .put(&Pattern::new(PatternType::Resonance, "b", json!({"v": 2})).unwrap())
            .unwrap();
        store.put(&Pattern::new(PatternType::Emergent, "a", json!({"v": 1})).unwrap()).unwrap();
        store.link(&a, &b, RelationshipKind::Derivation, 0.8).unwrap();
        store.set_edge(&a, &b, 0.4, WeightKind::Semantic).unwrap();
        store.store_embedding(&b, &[0.5, 0.25], "m", 2).unwrap();
        (store, a, b)
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (source, a, b) = populated();
        let json = source.export_json_string().unwrap();

        let target = PatternStore::open_in_memory().unwrap();
        let summary = target.import_json_str(&json).unwrap();
        assert_eq!(summary, source.stats().unwrap());
        assert_eq!(target.stats().unwrap(), source.stats().unwrap());

        assert_eq!(target.get(&a).unwrap().occurrences, 2);
        assert_eq!(target.get_edge(&b, &a).unwrap().unwrap().weight, 0.4);
        assert_eq!(target.children_of(&a).unwrap()[0].other, b);
        assert_eq!(target.get_embedding(&b).unwrap().unwrap().vector, vec![0.5, 0.25]);
    }

    #[test]
    fn test_export_lists_each_pair_once() {
        let (store, _, _) = populated();
        let graph = store.export_graph().unwrap();
        assert_eq!(graph.semantic_edges.len(), 1);
        assert_eq!(graph.version, EXPORT_VERSION);
    }

    #[test]
    fn test_import_rejects_dangling_edge() {
        let (store, _, _) = populated();
        let mut graph = store.export_graph().unwrap();
        graph.patterns.truncate(1);

        let target = PatternStore::open_in_memory().unwrap();
        assert!(matches!(
            target.import_graph(&graph),
            Err(StoreError::NotFound(_))
        ));
        // the failed import rolled back its pattern writes
        assert_eq!(target.stats().unwrap().patterns, 0);
    }

    #[test]
    fn test_import_rejects_wrong_version() {
        let (store, _, _) = populated();
        let mut graph = store.export_graph().unwrap();
        graph.version = 99;
        assert!(matches!(
            store.import_graph(&graph),
            Err(StoreError::Validation(_))
        ));
    }
}
