//! Pattern value types and the content-derived id.
//!
//! A pattern's id is a pure function of its data payload: keys are sorted
//! recursively, the result is serialized compactly, hashed with BLAKE3, and
//! the first [`PATTERN_ID_HEX_LEN`] hex characters are kept. Rediscovering
//! the same payload therefore lands on the same row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{MAX_CANONICAL_DEPTH, PATTERN_ID_HEX_LEN};
use crate::error::{CoreError, Result};
use crate::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    /// Derive the id of a data payload.
    pub fn for_data(data: &Map<String, Value>) -> Result<Self> {
        let canonical = canonical_json(&Value::Object(data.clone()))?;
        let digest = blake3::hash(canonical.as_bytes()).to_hex();
        Ok(Self(digest.as_str()[..PATTERN_ID_HEX_LEN].to_string()))
    }

    /// Wrap an id read back from storage or supplied by a caller.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize with keys sorted at every level and no insignificant whitespace.
pub fn canonical_json(value: &Value) -> Result<String> {
    let sorted = sort_keys(value, 0)?;
    serde_json::to_string(&sorted)
        .map_err(|e| CoreError::Validation(format!("cannot serialize payload: {e}")))
}

fn sort_keys(value: &Value, depth: usize) -> Result<Value> {
    if depth > MAX_CANONICAL_DEPTH {
        return Err(CoreError::Validation(format!(
            "payload nested deeper than {MAX_CANONICAL_DEPTH} levels"
        )));
    }
    Ok(match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for k in keys {
                out.insert(k.clone(), sort_keys(&map[k], depth + 1)?);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| sort_keys(v, depth + 1))
                .collect::<Result<_>>()?,
        ),
        other => other.clone(),
    })
}

/// Closed set of observation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Resonance,
    Cluster,
    Burst,
    PhaseTransition,
    Consolidation,
    Emergent,
    Exploratory,
}

impl PatternType {
    pub const ALL: [PatternType; 7] = [
        Self::Resonance,
        Self::Cluster,
        Self::Burst,
        Self::PhaseTransition,
        Self::Consolidation,
        Self::Emergent,
        Self::Exploratory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resonance => "resonance",
            Self::Cluster => "cluster",
            Self::Burst => "burst",
            Self::PhaseTransition => "phase_transition",
            Self::Consolidation => "consolidation",
            Self::Emergent => "emergent",
            Self::Exploratory => "exploratory",
        }
    }

    /// Check `data` against the typed payload of this kind, if it has one.
    pub fn validate_payload(&self, data: &Map<String, Value>) -> Result<()> {
        let value = Value::Object(data.clone());
        let checked = match self {
            Self::Cluster => serde_json::from_value::<ClusterPayload>(value).map(drop),
            Self::Burst => serde_json::from_value::<BurstPayload>(value).map(drop),
            Self::PhaseTransition => serde_json::from_value::<PhasePayload>(value).map(drop),
            _ => Ok(()),
        };
        checked.map_err(|e| {
            CoreError::Validation(format!("{} payload rejected: {e}", self.as_str()))
        })
    }
}

impl FromStr for PatternType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown pattern type '{s}'")))
    }
}

/// Data of a `cluster` pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterPayload {
    pub step: u64,
    pub members: Vec<String>,
    pub strength: f64,
}

/// Data of a `burst` pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BurstPayload {
    pub step: u64,
    pub parent: String,
    pub children: Vec<String>,
    pub memories: usize,
}

/// Data of a `phase_transition` pattern.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhasePayload {
    pub theta: f64,
    pub phi: f64,
    pub psi: f64,
}

fn to_object(payload: impl Serialize) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CoreError::Validation("payload is not an object".into())),
        Err(e) => Err(CoreError::Validation(format!("cannot serialize payload: {e}"))),
    }
}

/// Directed causal relationship kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Derivation,
    Resonance,
    Composition,
    Decomposition,
    Amplification,
    Conflict,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 6] = [
        Self::Derivation,
        Self::Resonance,
        Self::Composition,
        Self::Decomposition,
        Self::Amplification,
        Self::Conflict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Derivation => "derivation",
            Self::Resonance => "resonance",
            Self::Composition => "composition",
            Self::Decomposition => "decomposition",
            Self::Amplification => "amplification",
            Self::Conflict => "conflict",
        }
    }
}

impl FromStr for RelationshipKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown relationship kind '{s}'")))
    }
}

/// What a semantic-graph weight measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    #[default]
    Semantic,
    CoOccurrence,
    Composite,
}

impl WeightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::CoOccurrence => "co_occurrence",
            Self::Composite => "composite",
        }
    }
}

impl FromStr for WeightKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "semantic" => Ok(Self::Semantic),
            "co_occurrence" => Ok(Self::CoOccurrence),
            "composite" => Ok(Self::Composite),
            _ => Err(CoreError::Validation(format!("unknown weight kind '{s}'"))),
        }
    }
}

/// A discovered observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub pattern_type: PatternType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data: Map<String, Value>,
    pub confidence: f64,
    pub occurrences: u64,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Pattern {
    /// A new observation seen once, now, with full confidence.
    ///
    /// `data` must be a JSON object that canonicalizes and satisfies the
    /// typed payload of `pattern_type`.
    pub fn new(pattern_type: PatternType, name: &str, data: Value) -> Result<Self> {
        let Value::Object(data) = data else {
            return Err(CoreError::Validation(
                "pattern data must be a JSON object".into(),
            ));
        };
        pattern_type.validate_payload(&data)?;
        let now = Timestamp::now();
        Ok(Self {
            id: PatternId::for_data(&data)?,
            pattern_type,
            name: name.to_string(),
            description: String::new(),
            data,
            confidence: 1.0,
            occurrences: 1,
            first_seen: now,
            last_seen: now,
            metadata: None,
        })
    }

    pub fn cluster(name: &str, payload: &ClusterPayload) -> Result<Self> {
        Self::new(PatternType::Cluster, name, Value::Object(to_object(payload)?))
    }

    pub fn burst(name: &str, payload: &BurstPayload) -> Result<Self> {
        Self::new(PatternType::Burst, name, Value::Object(to_object(payload)?))
    }

    pub fn phase_transition(name: &str, payload: PhasePayload) -> Result<Self> {
        Self::new(
            PatternType::PhaseTransition,
            name,
            Value::Object(to_object(payload)?),
        )
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Typed view of a `cluster` pattern's data.
    pub fn cluster_payload(&self) -> Option<ClusterPayload> {
        if self.pattern_type != PatternType::Cluster {
            return None;
        }
        serde_json::from_value(Value::Object(self.data.clone())).ok()
    }

    /// Typed view of a `burst` pattern's data.
    pub fn burst_payload(&self) -> Option<BurstPayload> {
        if self.pattern_type != PatternType::Burst {
            return None;
        }
        serde_json::from_value(Value::Object(self.data.clone())).ok()
    }

    /// Full validation as performed before a write: confidence range,
    /// typed payload, and the id matching the data.
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)) {
            return Err(CoreError::Validation(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        self.pattern_type.validate_payload(&self.data)?;
        if let Some(metadata) = &self.metadata {
            canonical_json(&Value::Object(metadata.clone()))?;
        }
        let expected = PatternId::for_data(&self.data)?;
        if expected != self.id {
            return Err(CoreError::Validation(format!(
                "id {} does not match payload (expected {expected})",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_ignores_key_order() {
        let a = Pattern::new(PatternType::Exploratory, "a", json!({"x": 1, "y": {"b": 2, "a": 1}})).unwrap();
        let b = Pattern::new(PatternType::Exploratory, "b", json!({"y": {"a": 1, "b": 2}, "x": 1})).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str().len(), PATTERN_ID_HEX_LEN);
    }

    #[test]
    fn test_id_differs_by_value() {
        let a = Pattern::new(PatternType::Exploratory, "a", json!({"v": 1})).unwrap();
        let b = Pattern::new(PatternType::Exploratory, "b", json!({"v": 2})).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_canonical_json_sorted_compact() {
        let s = canonical_json(&json!({"b": [ {"z": 1, "a": 2} ], "a": null})).unwrap();
        assert_eq!(s, r#"{"a":null,"b":[{"a":2,"z":1}]}"#);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = Pattern::new(PatternType::Exploratory, "x", json!([1, 2])).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_too_deep_rejected() {
        let mut v = json!(1);
        for _ in 0..(MAX_CANONICAL_DEPTH + 2) {
            v = json!({ "k": v });
        }
        assert!(Pattern::new(PatternType::Exploratory, "deep", v).is_err());
    }

    #[test]
    fn test_typed_payload_enforced() {
        assert!(Pattern::new(PatternType::Cluster, "bad", json!({"members": "nope"})).is_err());
        let payload = ClusterPayload {
            step: 3,
            members: vec!["a".into(), "b".into()],
            strength: 0.9,
        };
        let p = Pattern::cluster("c", &payload).unwrap();
        assert_eq!(p.pattern_type, PatternType::Cluster);
        assert_eq!(p.cluster_payload(), Some(payload));
        assert!(p.burst_payload().is_none());
    }

    #[test]
    fn test_validate_catches_confidence_and_forged_id() {
        let p = Pattern::new(PatternType::Emergent, "e", json!({"v": 1})).unwrap();
        assert!(p.clone().with_confidence(1.5).validate().is_err());
        assert!(p.clone().with_confidence(f64::NAN).validate().is_err());
        let mut forged = p.clone();
        forged.id = PatternId::from_raw("0000000000000000");
        assert!(forged.validate().is_err());
        p.validate().unwrap();
    }

    #[test]
    fn test_kind_strings_roundtrip() {
        for t in PatternType::ALL {
            assert_eq!(t.as_str().parse::<PatternType>().unwrap(), t);
        }
        for k in RelationshipKind::ALL {
            assert_eq!(k.as_str().parse::<RelationshipKind>().unwrap(), k);
        }
        assert_eq!("co_occurrence".parse::<WeightKind>().unwrap(), WeightKind::CoOccurrence);
        assert!("bogus".parse::<PatternType>().is_err());
    }
}
