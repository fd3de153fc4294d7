use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params,
    params_from_iter, types::Value as SqlValue,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mnemos_core::{Pattern, PatternId, RelationshipKind, Timestamp, WeightKind, canonical_json};

use crate::error::{Result, StoreError};
use crate::query::PatternQuery;
use crate::schema;

const PATTERN_COLUMNS: &str = "id, pattern_type, name, description, data, confidence, \
                               occurrences, first_seen, last_seen, metadata";

/// One end of a causal edge, seen from the other end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    pub other: PatternId,
    pub kind: RelationshipKind,
    pub strength: f64,
    pub created_at: Timestamp,
}

/// A directed parent → child row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    pub parent: PatternId,
    pub child: PatternId,
    pub kind: RelationshipKind,
    pub strength: f64,
    pub created_at: Timestamp,
}

/// One directed row of an undirected semantic edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticEdge {
    pub source: PatternId,
    pub target: PatternId,
    pub weight: f64,
    pub kind: WeightKind,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub pattern_id: PatternId,
    pub model: String,
    pub dim: usize,
    pub vector: Vec<f32>,
    pub updated_at: Timestamp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub patterns: usize,
    pub relationships: usize,
    /// Undirected pairs, i.e. half the directed rows.
    pub semantic_edges: usize,
    pub embeddings: usize,
}

pub struct PatternStore {
    conn: Connection,
}

impl PatternStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!(path = %path.display(), "pattern store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Flush and release the connection, surfacing any close error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Storage(e))?;
        tracing::info!("pattern store closed");
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Patterns ---

    /// Record a discovery. A new payload is inserted; a known payload has
    /// its occurrence count bumped by one and its last-seen refreshed.
    ///
    /// The id is always recomputed from `pattern.data`.
    pub fn put(&self, pattern: &Pattern) -> Result<PatternId> {
        let row = PatternRow::from_pattern(pattern)?;
        let now = Timestamp::now().as_sql();
        let occurrences: i64 = self.conn.query_row(
            "INSERT INTO patterns (id, pattern_type, name, description, data, confidence,
                                   occurrences, first_seen, last_seen, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                 occurrences = occurrences + 1,
                 last_seen = MAX(last_seen, ?10)
             RETURNING occurrences",
            params![
                row.id,
                row.pattern_type,
                row.name,
                row.description,
                row.data,
                row.confidence,
                row.first_seen,
                row.last_seen,
                row.metadata,
                now,
            ],
            |r| r.get(0),
        )?;
        tracing::debug!(id = %row.id, kind = %row.pattern_type, occurrences, "pattern recorded");
        Ok(PatternId::from_raw(row.id))
    }

    /// Write a pattern with its counters and timestamps as given,
    /// replacing any existing row with the same id.
    pub(crate) fn restore_on(conn: &Connection, pattern: &Pattern) -> Result<PatternId> {
        let row = PatternRow::from_pattern(pattern)?;
        conn.execute(
            "INSERT INTO patterns (id, pattern_type, name, description, data, confidence,
                                   occurrences, first_seen, last_seen, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 pattern_type = excluded.pattern_type,
                 name = excluded.name,
                 description = excluded.description,
                 confidence = excluded.confidence,
                 occurrences = excluded.occurrences,
                 first_seen = excluded.first_seen,
                 last_seen = excluded.last_seen,
                 metadata = excluded.metadata",
            params![
                row.id,
                row.pattern_type,
                row.name,
                row.description,
                row.data,
                row.confidence,
                row.occurrences,
                row.first_seen,
                row.last_seen,
                row.metadata,
            ],
        )?;
        Ok(PatternId::from_raw(row.id))
    }

    pub fn get(&self, id: &PatternId) -> Result<Pattern> {
        let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1");
        self.conn
            .query_row(&sql, [id.as_str()], PatternRow::read)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .into_pattern()
    }

    pub fn contains(&self, id: &PatternId) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM patterns WHERE id = ?1)",
            [id.as_str()],
            |r| r.get(0),
        )?)
    }

    fn require(&self, id: &PatternId) -> Result<()> {
        if self.contains(id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    pub fn search(&self, query: &PatternQuery) -> Result<Vec<Pattern>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<SqlValue> = Vec::new();

        if let Some(kind) = query.pattern_type {
            clauses.push("pattern_type = ?");
            args.push(SqlValue::Text(kind.as_str().to_string()));
        }
        if let Some(min) = query.min_confidence {
            if !min.is_finite() {
                return Err(StoreError::InvalidParameter(format!(
                    "min_confidence must be finite, got {min}"
                )));
            }
            clauses.push("confidence >= ?");
            args.push(SqlValue::Real(min));
        }
        if let Some(needle) = &query.name_contains {
            clauses.push("instr(lower(name), lower(?)) > 0");
            args.push(SqlValue::Text(needle.clone()));
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns {filter} {}",
            query.order_clause()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<PatternRow> = stmt
            .query_map(params_from_iter(args), PatternRow::read)?
            .collect::<std::result::Result<_, _>>()?;

        let mut out = Vec::new();
        for row in rows {
            let pattern = row.into_pattern()?;
            if query.accepts(&pattern) {
                out.push(pattern);
                if query.limit.is_some_and(|l| out.len() >= l) {
                    break;
                }
            }
        }
        Ok(out)
    }

    // --- Causal graph ---

    /// Append a parent → child edge. Repeated links add further rows.
    pub fn link(
        &self,
        parent: &PatternId,
        child: &PatternId,
        kind: RelationshipKind,
        strength: f64,
    ) -> Result<()> {
        if !(strength.is_finite() && (0.0..=1.0).contains(&strength)) {
            return Err(StoreError::InvalidParameter(format!(
                "link strength must be within [0, 1], got {strength}"
            )));
        }
        self.require(parent)?;
        self.require(child)?;
        Self::link_on(&self.conn, parent, child, kind, strength, Timestamp::now())
    }

    pub(crate) fn link_on(
        conn: &Connection,
        parent: &PatternId,
        child: &PatternId,
        kind: RelationshipKind,
        strength: f64,
        created_at: Timestamp,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO relationships (parent_id, child_id, kind, strength, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                parent.as_str(),
                child.as_str(),
                kind.as_str(),
                strength,
                created_at.as_sql()
            ],
        )?;
        Ok(())
    }

    pub fn parents_of(&self, id: &PatternId) -> Result<Vec<CausalLink>> {
        self.links(
            "SELECT parent_id, kind, strength, created_at FROM relationships
             WHERE child_id = ?1 ORDER BY id",
            id,
        )
    }

    pub fn children_of(&self, id: &PatternId) -> Result<Vec<CausalLink>> {
        self.links(
            "SELECT child_id, kind, strength, created_at FROM relationships
             WHERE parent_id = ?1 ORDER BY id",
            id,
        )
    }

    fn links(&self, sql: &str, id: &PatternId) -> Result<Vec<CausalLink>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows: Vec<(String, String, f64, i64)> = stmt
            .query_map([id.as_str()], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
            .collect::<std::result::Result<_, _>>()?;
        rows.into_iter()
            .map(|(other, kind, strength, created_at)| {
                Ok(CausalLink {
                    other: PatternId::from_raw(other),
                    kind: kind.parse()?,
                    strength,
                    created_at: Timestamp::from_sql(created_at),
                })
            })
            .collect()
    }

    /// Breadth-first walk up the causal graph. Each ancestor appears once,
    /// at the depth it was first reached; `start` is never included.
    pub fn ancestors(&self, start: &PatternId, max_depth: usize) -> Result<Vec<(PatternId, usize)>> {
        self.walk(
            "SELECT parent_id FROM relationships WHERE child_id = ?1 ORDER BY id",
            start,
            max_depth,
        )
    }

    /// Breadth-first walk down the causal graph.
    pub fn descendants(
        &self,
        start: &PatternId,
        max_depth: usize,
    ) -> Result<Vec<(PatternId, usize)>> {
        self.walk(
            "SELECT child_id FROM relationships WHERE parent_id = ?1 ORDER BY id",
            start,
            max_depth,
        )
    }

    fn walk(&self, sql: &str, start: &PatternId, max_depth: usize) -> Result<Vec<(PatternId, usize)>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut visited: HashSet<String> = HashSet::from([start.as_str().to_string()]);
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(start.as_str().to_string(), 0)]);
        let mut found = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let next: Vec<String> = stmt
                .query_map([current.as_str()], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            for id in next {
                if visited.insert(id.clone()) {
                    found.push((PatternId::from_raw(id.clone()), depth + 1));
                    queue.push_back((id, depth + 1));
                }
            }
        }
        Ok(found)
    }

    pub fn causal_edges(&self) -> Result<Vec<CausalEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT parent_id, child_id, kind, strength, created_at FROM relationships ORDER BY id",
        )?;
        let rows: Vec<(String, String, String, f64, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))?
            .collect::<std::result::Result<_, _>>()?;
        rows.into_iter()
            .map(|(parent, child, kind, strength, created_at)| {
                Ok(CausalEdge {
                    parent: PatternId::from_raw(parent),
                    child: PatternId::from_raw(child),
                    kind: kind.parse()?,
                    strength,
                    created_at: Timestamp::from_sql(created_at),
                })
            })
            .collect()
    }

    // --- Semantic graph ---

    /// Set the undirected weight between `a` and `b`. Both directed rows
    /// are written in one immediate transaction.
    pub fn set_edge(&self, a: &PatternId, b: &PatternId, weight: f64, kind: WeightKind) -> Result<()> {
        check_edge(a, b, weight)?;
        self.require(a)?;
        self.require(b)?;
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        Self::write_edge_pair(&tx, a, b, weight, kind, Timestamp::now())?;
        tx.commit()?;
        Ok(())
    }

    /// Apply several undirected edge writes in one immediate transaction.
    /// Any invalid entry rolls back the whole batch.
    pub fn set_edges(&self, writes: &[(PatternId, PatternId, f64, WeightKind)]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let now = Timestamp::now();
        for (a, b, weight, kind) in writes {
            check_edge(a, b, *weight)?;
            self.require(a)?;
            self.require(b)?;
            Self::write_edge_pair(&tx, a, b, *weight, *kind, now)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn write_edge_pair(
        conn: &Connection,
        a: &PatternId,
        b: &PatternId,
        weight: f64,
        kind: WeightKind,
        updated_at: Timestamp,
    ) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO semantic_edges (source_id, target_id, weight, kind, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(source_id, target_id) DO UPDATE SET
                 weight = excluded.weight,
                 kind = excluded.kind,
                 updated_at = excluded.updated_at",
        )?;
        for (source, target) in [(a, b), (b, a)] {
            stmt.execute(params![
                source.as_str(),
                target.as_str(),
                weight,
                kind.as_str(),
                updated_at.as_sql()
            ])?;
        }
        Ok(())
    }

    pub fn get_edge(&self, a: &PatternId, b: &PatternId) -> Result<Option<SemanticEdge>> {
        let row = self
            .conn
            .query_row(
                "SELECT source_id, target_id, weight, kind, updated_at FROM semantic_edges
                 WHERE source_id = ?1 AND target_id = ?2",
                [a.as_str(), b.as_str()],
                read_edge_row,
            )
            .optional()?;
        row.map(EdgeRow::into_edge).transpose()
    }

    /// Neighbors with weight at least `min_weight`, heaviest first,
    /// ties broken by id.
    pub fn neighbors(&self, id: &PatternId, min_weight: f64, limit: usize) -> Result<Vec<(PatternId, f64)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT target_id, weight FROM semantic_edges
             WHERE source_id = ?1 AND weight >= ?2
             ORDER BY weight DESC, target_id ASC
             LIMIT ?3",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(PatternId, f64)> = stmt
            .query_map(params![id.as_str(), min_weight, limit], |r| {
                Ok((PatternId::from_raw(r.get::<_, String>(0)?), r.get(1)?))
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Weights of every edge with both ends in `ids`, keyed in both
    /// directions.
    pub fn edge_weights_among(&self, ids: &[PatternId]) -> Result<HashMap<(PatternId, PatternId), f64>> {
        let members: HashSet<&str> = ids.iter().map(|id| id.as_str()).collect();
        let mut stmt = self
            .conn
            .prepare_cached("SELECT target_id, weight FROM semantic_edges WHERE source_id = ?1")?;
        let mut weights = HashMap::new();
        for source in ids {
            let rows: Vec<(String, f64)> = stmt
                .query_map([source.as_str()], |r| Ok((r.get(0)?, r.get(1)?)))?
                .collect::<std::result::Result<_, _>>()?;
            for (target, weight) in rows {
                if members.contains(target.as_str()) {
                    weights.insert((source.clone(), PatternId::from_raw(target)), weight);
                }
            }
        }
        Ok(weights)
    }

    /// Every directed row, ordered by source then target.
    pub fn semantic_edges(&self) -> Result<Vec<SemanticEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, target_id, weight, kind, updated_at FROM semantic_edges
             ORDER BY source_id, target_id",
        )?;
        let rows: Vec<EdgeRow> = stmt
            .query_map([], read_edge_row)?
            .collect::<std::result::Result<_, _>>()?;
        rows.into_iter().map(EdgeRow::into_edge).collect()
    }

    // --- Embeddings ---

    pub fn store_embedding(&self, id: &PatternId, vector: &[f32], model: &str, dim: usize) -> Result<()> {
        check_embedding(vector, dim)?;
        self.require(id)?;
        Self::write_embedding(&self.conn, id, vector, model, Timestamp::now())
    }

    pub(crate) fn write_embedding(
        conn: &Connection,
        id: &PatternId,
        vector: &[f32],
        model: &str,
        updated_at: Timestamp,
    ) -> Result<()> {
        let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
        conn.execute(
            "INSERT INTO embeddings (pattern_id, model, dim, vector, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(pattern_id) DO UPDATE SET
                 model = excluded.model,
                 dim = excluded.dim,
                 vector = excluded.vector,
                 updated_at = excluded.updated_at",
            params![
                id.as_str(),
                model,
                vector.len() as i64,
                bytes,
                updated_at.as_sql()
            ],
        )?;
        Ok(())
    }

    pub fn get_embedding(&self, id: &PatternId) -> Result<Option<Embedding>> {
        let row: Option<(String, i64, Vec<u8>, i64)> = self
            .conn
            .query_row(
                "SELECT model, dim, vector, updated_at FROM embeddings WHERE pattern_id = ?1",
                [id.as_str()],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        let Some((model, dim, bytes, updated_at)) = row else {
            return Ok(None);
        };
        let dim = usize::try_from(dim)
            .map_err(|_| StoreError::Validation(format!("negative embedding dim for {id}")))?;
        if bytes.len() != dim * 4 {
            return Err(StoreError::Validation(format!(
                "embedding for {id} holds {} bytes, expected {}",
                bytes.len(),
                dim * 4
            )));
        }
        let vector = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Some(Embedding {
            pattern_id: id.clone(),
            model,
            dim,
            vector,
            updated_at: Timestamp::from_sql(updated_at),
        }))
    }

    pub fn embeddings(&self) -> Result<Vec<Embedding>> {
        let mut stmt = self
            .conn
            .prepare("SELECT pattern_id FROM embeddings ORDER BY pattern_id")?;
        let ids: Vec<String> = stmt
            .query_map([], |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(e) = self.get_embedding(&PatternId::from_raw(id))? {
                out.push(e);
            }
        }
        Ok(out)
    }

    // --- Stats ---

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok(StoreStats {
            patterns: count("patterns")?,
            relationships: count("relationships")?,
            semantic_edges: count("semantic_edges")? / 2,
            embeddings: count("embeddings")?,
        })
    }
}

pub(crate) fn check_edge(a: &PatternId, b: &PatternId, weight: f64) -> Result<()> {
    if a == b {
        return Err(StoreError::InvalidParameter(format!(
            "semantic edge from {a} to itself"
        )));
    }
    if !(weight.is_finite() && weight >= 0.0) {
        return Err(StoreError::InvalidParameter(format!(
            "edge weight must be finite and non-negative, got {weight}"
        )));
    }
    Ok(())
}

pub(crate) fn check_embedding(vector: &[f32], dim: usize) -> Result<()> {
    if dim == 0 || vector.len() != dim {
        return Err(StoreError::InvalidParameter(format!(
            "embedding has {} components, declared dim {dim}",
            vector.len()
        )));
    }
    if let Some(bad) = vector.iter().find(|v| !v.is_finite()) {
        return Err(StoreError::InvalidParameter(format!(
            "embedding component {bad} is not finite"
        )));
    }
    Ok(())
}

/// Pattern columns as stored.
struct PatternRow {
    id: String,
    pattern_type: String,
    name: String,
    description: String,
    data: String,
    confidence: f64,
    occurrences: i64,
    first_seen: i64,
    last_seen: i64,
    metadata: Option<String>,
}

impl PatternRow {
    /// Validate and canonicalize a pattern for writing. The id is derived
    /// from the data, whatever `pattern.id` says.
    fn from_pattern(pattern: &Pattern) -> Result<Self> {
        let mut checked = pattern.clone();
        checked.id = PatternId::for_data(&pattern.data)?;
        checked.validate()?;
        let metadata = match &checked.metadata {
            Some(m) => Some(canonical_json(&Value::Object(m.clone()))?),
            None => None,
        };
        Ok(Self {
            data: canonical_json(&Value::Object(checked.data.clone()))?,
            id: checked.id.as_str().to_string(),
            pattern_type: checked.pattern_type.as_str().to_string(),
            name: checked.name,
            description: checked.description,
            confidence: checked.confidence,
            occurrences: i64::try_from(checked.occurrences.max(1)).unwrap_or(i64::MAX),
            first_seen: checked.first_seen.as_sql(),
            last_seen: checked.last_seen.as_sql(),
            metadata,
        })
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pattern_type: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            data: row.get(4)?,
            confidence: row.get(5)?,
            occurrences: row.get(6)?,
            first_seen: row.get(7)?,
            last_seen: row.get(8)?,
            metadata: row.get(9)?,
        })
    }

    fn into_pattern(self) -> Result<Pattern> {
        Ok(Pattern {
            pattern_type: self.pattern_type.parse()?,
            data: parse_object(&self.id, &self.data)?,
            metadata: self
                .metadata
                .as_deref()
                .map(|m| parse_object(&self.id, m))
                .transpose()?,
            id: PatternId::from_raw(self.id),
            name: self.name,
            description: self.description,
            confidence: self.confidence,
            occurrences: u64::try_from(self.occurrences).unwrap_or(0),
            first_seen: Timestamp::from_sql(self.first_seen),
            last_seen: Timestamp::from_sql(self.last_seen),
        })
    }
}

fn parse_object(id: &str, text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Validation(format!("stored JSON for {id} is not an object"))),
        Err(e) => Err(StoreError::Validation(format!("stored JSON for {id} is corrupt: {e}"))),
    }
}

struct EdgeRow {
    source: String,
    target: String,
    weight: f64,
    kind: String,
    updated_at: i64,
}

fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok(EdgeRow {
        source: row.get(0)?,
        target: row.get(1)?,
        weight: row.get(2)?,
        kind: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl EdgeRow {
    fn into_edge(self) -> Result<SemanticEdge> {
        Ok(SemanticEdge {
            source: PatternId::from_raw(self.source),
            target: PatternId::from_raw(self.target),
            weight: self.weight,
            kind: self.kind.parse()?,
            updated_at: Timestamp::from_sql(self.updated_at),
        })
    }
}
